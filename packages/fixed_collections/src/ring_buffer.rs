use std::any::type_name;
use std::iter::{Chain, FusedIterator};
use std::mem::MaybeUninit;
use std::num::NonZero;
use std::ops::{Index, IndexMut, Range};
use std::{fmt, mem, slice, thread};

use tracing::{debug, trace};

use crate::{BorrowableSlots, DropPolicy, RingBufferBuilder};

/// A fixed-capacity double-ended queue over a ring of slots.
///
/// Items can be pushed and popped at both ends in constant time. Pushing into a full buffer
/// always succeeds by discarding the item at the *opposite* end: [`push_back()`][1] discards the
/// oldest item at the front and [`push_front()`][2] discards the newest item at the back.
///
/// The buffer either allocates its own storage ([`new()`][3]) or works inside caller-supplied
/// memory ([`with_storage()`][4]), in which case the caller keeps ownership of that memory and the
/// buffer never frees it. The choice is made at construction and cannot be changed later.
///
/// # Example
///
/// ```
/// use fixed_collections::RingBuffer;
/// use new_zealand::nz;
///
/// let mut ring = RingBuffer::<u32>::new(nz!(4));
///
/// for value in 1..=5 {
///     ring.push_back(value);
/// }
///
/// // The first value was discarded to make room for the fifth.
/// assert_eq!(ring.len(), 4);
/// assert!(ring.iter().eq(&[2, 3, 4, 5]));
///
/// assert_eq!(ring.pop_front(), 2);
/// assert_eq!(ring.pop_back(), 5);
/// ```
///
/// [1]: Self::push_back
/// [2]: Self::push_front
/// [3]: Self::new
/// [4]: Self::with_storage
pub struct RingBuffer<'b, T> {
    slots: BorrowableSlots<'b, T>,

    /// Slot the next `push_back()` writes to, one past the newest item.
    head: usize,

    /// Slot of the oldest item.
    tail: usize,

    /// Number of items. When equal to capacity, `head == tail`.
    len: usize,

    drop_policy: DropPolicy,
}

impl<'b, T> RingBuffer<'b, T> {
    #[must_use]
    pub(crate) fn new_inner(slots: BorrowableSlots<'b, T>, drop_policy: DropPolicy) -> Self {
        debug!(
            capacity = slots.capacity(),
            borrowed = slots.is_borrowed(),
            item_type = type_name::<T>(),
            ?drop_policy,
            "creating RingBuffer"
        );

        Self {
            slots,
            head: 0,
            tail: 0,
            len: 0,
            drop_policy,
        }
    }

    /// Creates a buffer that allocates storage for `capacity` items.
    #[must_use]
    pub fn new(capacity: NonZero<usize>) -> Self {
        Self::builder().capacity(capacity).build()
    }

    /// Creates a buffer that uses caller-supplied memory as its storage. The capacity is the
    /// length of the storage.
    ///
    /// The buffer never frees this memory. Items still in the buffer when it is dropped are
    /// torn down, leaving the storage uninitialized for the caller to reuse.
    ///
    /// # Example
    ///
    /// ```
    /// use std::mem::MaybeUninit;
    ///
    /// use fixed_collections::RingBuffer;
    ///
    /// let mut storage = [MaybeUninit::<u32>::uninit(); 2];
    ///
    /// {
    ///     let mut ring = RingBuffer::with_storage(&mut storage);
    ///     ring.push_front(9);
    ///     ring.push_front(8);
    ///     assert!(ring.iter().eq(&[8, 9]));
    /// }
    ///
    /// // The storage is still ours.
    /// storage[0].write(1);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the storage is empty.
    #[must_use]
    pub fn with_storage(storage: &'b mut [MaybeUninit<T>]) -> Self {
        Self::builder().storage(storage).build()
    }

    /// Starts building a new [`RingBuffer`].
    ///
    /// Use this when you want to customize the buffer configuration.
    pub fn builder() -> RingBufferBuilder<'b, T> {
        RingBufferBuilder::new()
    }

    #[must_use]
    #[expect(missing_docs, reason = "self-explanatory")]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// The number of items in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    #[expect(missing_docs, reason = "self-explanatory")]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the buffer holds `capacity()` items, meaning the next push discards an item.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len >= self.capacity()
    }

    /// Whether the storage was supplied by the caller rather than allocated by the buffer.
    #[must_use]
    pub fn is_borrowed(&self) -> bool {
        self.slots.is_borrowed()
    }

    /// Appends an item at the back, returning a reference to it in its final position.
    ///
    /// If the buffer is full, the item at the front (the oldest) is discarded first and torn
    /// down according to the drop policy.
    pub fn push_back(&mut self, value: T) -> &mut T {
        let evicted = if self.is_full() {
            let evicted_index = self.tail;
            self.tail = self.wrap_increment(self.tail);

            // SAFETY: Every slot of a full buffer holds an item. The slot is overwritten below.
            Some(unsafe { self.slots.take(evicted_index) })
        } else {
            self.len = self
                .len
                .checked_add(1)
                .expect("guarded by is_full() check above");
            None
        };

        let index = self.head;
        self.head = self.wrap_increment(self.head);

        self.finish_push(index, value, evicted, "push_back")
    }

    /// Prepends an item at the front, returning a reference to it in its final position.
    ///
    /// If the buffer is full, the item at the back (the newest) is discarded first and torn
    /// down according to the drop policy.
    pub fn push_front(&mut self, value: T) -> &mut T {
        let evicted = if self.is_full() {
            self.head = self.wrap_decrement(self.head);

            // SAFETY: Every slot of a full buffer holds an item. The slot is overwritten below,
            // as the new tail lands on the same slot the head just retreated to.
            Some(unsafe { self.slots.take(self.head) })
        } else {
            self.len = self
                .len
                .checked_add(1)
                .expect("guarded by is_full() check above");
            None
        };

        self.tail = self.wrap_decrement(self.tail);

        self.finish_push(self.tail, value, evicted, "push_front")
    }

    fn finish_push(
        &mut self,
        index: usize,
        value: T,
        evicted: Option<T>,
        operation: &str,
    ) -> &mut T {
        let drop_policy = self.drop_policy;
        let stored = self.slots.write(index, value);

        // Torn down last, so the buffer is consistent even if the item panics when dropped.
        if let Some(evicted) = evicted {
            trace!(
                operation,
                index,
                item_type = type_name::<T>(),
                "full RingBuffer discarded an item"
            );

            drop_policy.teardown(evicted);
        }

        stored
    }

    /// Removes and returns the item at the back (the newest).
    ///
    /// # Panics
    ///
    /// Panics if the buffer is empty.
    pub fn pop_back(&mut self) -> T {
        self.try_pop_back().unwrap_or_else(|| {
            panic!(
                "pop_back() on empty RingBuffer of {}",
                type_name::<T>()
            )
        })
    }

    /// Removes and returns the item at the front (the oldest).
    ///
    /// # Panics
    ///
    /// Panics if the buffer is empty.
    pub fn pop_front(&mut self) -> T {
        self.try_pop_front().unwrap_or_else(|| {
            panic!(
                "pop_front() on empty RingBuffer of {}",
                type_name::<T>()
            )
        })
    }

    /// Removes and returns the item at the back (the newest), or `None` if the buffer is empty.
    pub fn try_pop_back(&mut self) -> Option<T> {
        self.len = self.len.checked_sub(1)?;
        self.head = self.wrap_decrement(self.head);

        // SAFETY: The buffer was not empty, so the slot before the head holds the newest item.
        // The item is now outside the live range and will not be read again.
        Some(unsafe { self.slots.take(self.head) })
    }

    /// Removes and returns the item at the front (the oldest), or `None` if the buffer is empty.
    pub fn try_pop_front(&mut self) -> Option<T> {
        self.len = self.len.checked_sub(1)?;

        let index = self.tail;
        self.tail = self.wrap_increment(self.tail);

        // SAFETY: The buffer was not empty, so the tail holds the oldest item.
        // The item is now outside the live range and will not be read again.
        Some(unsafe { self.slots.take(index) })
    }

    /// The item at the front (the oldest), if any.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// The item at the back (the newest), if any.
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.get(self.len.checked_sub(1)?)
    }

    /// The item at logical position `index`, counting from the front, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        let physical = self.physical_index(index)?;

        // SAFETY: Every physical slot of a logical index below len holds an item.
        Some(unsafe { self.slots.get_unchecked(physical) })
    }

    /// The item at logical position `index`, counting from the front, if any.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let physical = self.physical_index(index)?;

        // SAFETY: Every physical slot of a logical index below len holds an item.
        Some(unsafe { self.slots.get_unchecked_mut(physical) })
    }

    /// Removes every item, tearing each down according to the drop policy.
    pub fn clear(&mut self) {
        let len = mem::take(&mut self.len);
        let tail = self.tail;

        self.head = 0;
        self.tail = 0;

        if !self.drop_policy.drops_items() || !mem::needs_drop::<T>() {
            return;
        }

        let mut index = tail;

        for _ in 0..len {
            // SAFETY: The `len` slots starting at the old tail held the items. The buffer is
            // already empty so none of them will be touched again.
            unsafe { self.slots.drop_in_place(index) };

            index = self.wrap_increment(index);
        }
    }

    /// The items as two slices: the first starts at the front, the second (possibly empty)
    /// continues where the ring wraps around.
    #[must_use]
    pub fn as_slices(&self) -> (&[T], &[T]) {
        let (first, second) = self.slice_ranges();

        // SAFETY: Both ranges cover exactly the live items.
        unsafe { (self.slots.initialized(first), self.slots.initialized(second)) }
    }

    /// The items as two slices: the first starts at the front, the second (possibly empty)
    /// continues where the ring wraps around.
    #[must_use]
    pub fn as_mut_slices(&mut self) -> (&mut [T], &mut [T]) {
        let (first, second) = self.slice_ranges();

        // SAFETY: Both ranges cover exactly the live items. The wrapped range always ends
        // before the tail, where the first range starts.
        unsafe { self.slots.initialized_pair_mut(first, second) }
    }

    /// Visits every item from front to back.
    pub fn iter(&self) -> RingBufferIter<'_, T> {
        RingBufferIter {
            slots: self.slots.as_uninit_slice(),
            position: self.tail,
            remaining: self.len,
        }
    }

    /// Visits every item from front to back, allowing modification.
    pub fn iter_mut(&mut self) -> RingBufferIterMut<'_, T> {
        let (first, second) = self.as_mut_slices();

        RingBufferIterMut {
            inner: first.iter_mut().chain(second.iter_mut()),
        }
    }

    /// Physical slot of the item at logical `index`, or `None` if there is no such item.
    fn physical_index(&self, index: usize) -> Option<usize> {
        if index >= self.len {
            return None;
        }

        // Cannot overflow because both terms are less than capacity.
        let offset = self.tail.wrapping_add(index);

        Some(offset.checked_sub(self.capacity()).unwrap_or(offset))
    }

    /// Slot ranges of the live items, split where the ring wraps around.
    fn slice_ranges(&self) -> (Range<usize>, Range<usize>) {
        let until_wrap = self
            .capacity()
            .checked_sub(self.tail)
            .expect("tail is always less than capacity");

        if self.len <= until_wrap {
            // Cannot overflow because the sum is at most capacity.
            (self.tail..self.tail.wrapping_add(self.len), 0..0)
        } else {
            // Cannot underflow because len > until_wrap.
            (self.tail..self.capacity(), 0..self.len.wrapping_sub(until_wrap))
        }
    }

    fn wrap_increment(&self, index: usize) -> usize {
        // Cannot overflow because index is less than capacity.
        let next = index.wrapping_add(1);

        if next == self.capacity() { 0 } else { next }
    }

    fn wrap_decrement(&self, index: usize) -> usize {
        index
            .checked_sub(1)
            .unwrap_or_else(|| self.capacity().wrapping_sub(1))
    }
}

impl<T> Index<usize> for RingBuffer<'_, T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.get(index).unwrap_or_else(|| {
            panic!(
                "index {index} out of bounds in RingBuffer of {} items of {}",
                self.len,
                type_name::<T>()
            )
        })
    }
}

impl<T> IndexMut<usize> for RingBuffer<'_, T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        let len = self.len;

        self.get_mut(index).unwrap_or_else(|| {
            panic!(
                "index {index} out of bounds in RingBuffer of {len} items of {}",
                type_name::<T>()
            )
        })
    }
}

impl<'r, T> IntoIterator for &'r RingBuffer<'_, T> {
    type Item = &'r T;
    type IntoIter = RingBufferIter<'r, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'r, T> IntoIterator for &'r mut RingBuffer<'_, T> {
    type Item = &'r mut T;
    type IntoIter = RingBufferIterMut<'r, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T> fmt::Debug for RingBuffer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("capacity", &self.capacity())
            .field("len", &self.len)
            .field("head", &self.head)
            .field("tail", &self.tail)
            .field("borrowed", &self.is_borrowed())
            .field("drop_policy", &self.drop_policy)
            .finish()
    }
}

impl<T> Drop for RingBuffer<'_, T> {
    fn drop(&mut self) {
        let was_empty = self.is_empty();

        if !was_empty {
            trace!(
                len = self.len,
                item_type = type_name::<T>(),
                "dropping non-empty RingBuffer"
            );
        }

        self.clear();

        // If we are already panicking, we do not want to panic again because that will
        // simply obscure whatever the original panic was, leading to debug difficulties.
        if self.drop_policy == DropPolicy::MustNotDropItems && !thread::panicking() {
            assert!(
                was_empty,
                "dropped a non-empty RingBuffer of {} with a policy that says it must be empty when dropped",
                type_name::<T>()
            );
        }
    }
}

/// Iterator over the items of a [`RingBuffer`], from front to back.
///
/// Created by [`RingBuffer::iter()`]. Walks the ring starting at the oldest item, wrapping
/// around at the end of the storage, for exactly as many steps as there are items.
pub struct RingBufferIter<'r, T> {
    slots: &'r [MaybeUninit<T>],

    /// Physical slot of the next item from the front.
    position: usize,

    /// Items not yet yielded from either end. The next item from the back is this many
    /// positions past the next item from the front, minus one.
    remaining: usize,
}

impl<'r, T> RingBufferIter<'r, T> {
    fn item_at(&self, logical: usize) -> &'r T {
        // Cannot overflow because the position and offset are both less than capacity.
        let offset = self.position.wrapping_add(logical);
        let physical = offset.checked_sub(self.slots.len()).unwrap_or(offset);

        let slot = self
            .slots
            .get(physical)
            .expect("logical positions within the live range map to slots in bounds");

        // SAFETY: The iterator only visits the live range of the buffer, which the shared
        // borrow of the buffer keeps intact.
        unsafe { slot.assume_init_ref() }
    }
}

impl<'r, T> Iterator for RingBufferIter<'r, T> {
    type Item = &'r T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let item = self.item_at(0);

        self.remaining = self.remaining.wrapping_sub(1);

        // Cannot overflow because position is less than capacity.
        let next = self.position.wrapping_add(1);
        self.position = if next == self.slots.len() { 0 } else { next };

        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for RingBufferIter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        self.remaining = self.remaining.wrapping_sub(1);

        Some(self.item_at(self.remaining))
    }
}

impl<T> ExactSizeIterator for RingBufferIter<'_, T> {}

impl<T> FusedIterator for RingBufferIter<'_, T> {}

impl<T> Clone for RingBufferIter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots,
            position: self.position,
            remaining: self.remaining,
        }
    }
}

impl<T> fmt::Debug for RingBufferIter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBufferIter")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("remaining", &self.remaining)
            .finish()
    }
}

/// Iterator over the items of a [`RingBuffer`], from front to back, allowing modification.
///
/// Created by [`RingBuffer::iter_mut()`].
pub struct RingBufferIterMut<'r, T> {
    inner: Chain<slice::IterMut<'r, T>, slice::IterMut<'r, T>>,
}

impl<'r, T> Iterator for RingBufferIterMut<'r, T> {
    type Item = &'r mut T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for RingBufferIterMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<T> ExactSizeIterator for RingBufferIterMut<'_, T> {}

impl<T> FusedIterator for RingBufferIterMut<'_, T> {}

impl<T> fmt::Debug for RingBufferIterMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBufferIterMut")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("remaining", &self.inner.size_hint().0)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use new_zealand::nz;
    use rand::Rng;
    use static_assertions::{assert_impl_all, assert_not_impl_any};
    use testing::{DEFAULT_SEED, DropTracker, seeded_rng};

    use super::*;

    assert_impl_all!(RingBuffer<'static, u32>: Send, Sync, fmt::Debug);
    assert_not_impl_any!(RingBuffer<'static, Rc<u32>>: Send, Sync);

    fn contents<T: Copy>(ring: &RingBuffer<'_, T>) -> Vec<T> {
        ring.iter().copied().collect()
    }

    #[test]
    fn push_back_then_pop_front_is_fifo() {
        let mut ring = RingBuffer::<u32>::new(nz!(4));

        ring.push_back(1);
        ring.push_back(2);

        assert_eq!(ring.pop_front(), 1);
        assert_eq!(ring.pop_front(), 2);
        assert!(ring.is_empty());
    }

    #[test]
    fn push_back_then_pop_back_is_lifo() {
        let mut ring = RingBuffer::<u32>::new(nz!(4));

        ring.push_back(1);
        ring.push_back(2);

        assert_eq!(ring.pop_back(), 2);
        assert_eq!(ring.pop_back(), 1);
    }

    #[test]
    fn push_front_then_pop_front_is_lifo() {
        let mut ring = RingBuffer::<u32>::new(nz!(4));

        ring.push_front(1);
        ring.push_front(2);

        assert_eq!(ring.pop_front(), 2);
        assert_eq!(ring.pop_back(), 1);
    }

    #[test]
    fn push_back_into_full_discards_front() {
        let mut ring = RingBuffer::<u32>::new(nz!(4));

        for value in 1..=5 {
            ring.push_back(value);
        }

        assert_eq!(ring.len(), 4);
        assert!(ring.is_full());
        assert_eq!(contents(&ring), vec![2, 3, 4, 5]);
    }

    #[test]
    fn push_front_into_full_discards_back() {
        let mut ring = RingBuffer::<u32>::new(nz!(4));

        for value in 1..=5 {
            ring.push_front(value);
        }

        assert_eq!(ring.len(), 4);
        assert_eq!(contents(&ring), vec![5, 4, 3, 2]);
    }

    #[test]
    fn overwrite_keeps_last_pushed_for_many_wraps() {
        let mut ring = RingBuffer::<u32>::new(nz!(3));

        for value in 0..100 {
            ring.push_back(value);
        }

        assert_eq!(contents(&ring), vec![97, 98, 99]);

        for value in 0..100 {
            ring.push_front(value);
        }

        assert_eq!(contents(&ring), vec![99, 98, 97]);
    }

    #[test]
    fn push_returns_reference_to_stored_item() {
        let mut ring = RingBuffer::<u32>::new(nz!(2));

        *ring.push_back(1) += 10;
        *ring.push_front(2) += 20;
        *ring.push_back(3) += 30;

        assert_eq!(contents(&ring), vec![11, 33]);
    }

    #[test]
    fn borrowed_storage_is_not_freed() {
        let mut storage = [MaybeUninit::<u32>::uninit(); 2];

        {
            let mut ring = RingBuffer::with_storage(&mut storage);
            assert!(ring.is_borrowed());

            ring.push_front(9);
            ring.push_front(8);

            assert_eq!(contents(&ring), vec![8, 9]);
        }

        // The caller still owns the memory and can keep using it.
        storage[0].write(5);
        storage[1].write(6);

        // SAFETY: Both slots were written above.
        let values = unsafe { [storage[0].assume_init(), storage[1].assume_init()] };
        assert_eq!(values, [5, 6]);
    }

    #[test]
    fn borrowed_storage_items_are_torn_down_once() {
        let drops = Rc::new(Cell::new(0));
        let mut storage = [const { MaybeUninit::<DropTracker>::uninit() }; 3];

        {
            let mut ring = RingBuffer::with_storage(&mut storage);

            for id in 0..5 {
                ring.push_back(DropTracker::new(id, &drops));
            }

            // Two items were discarded by overwriting.
            assert_eq!(drops.get(), 2);
        }

        assert_eq!(drops.get(), 5);
    }

    #[test]
    fn index_maps_from_front() {
        let mut ring = RingBuffer::<u32>::new(nz!(3));

        for value in 1..=4 {
            ring.push_back(value);
        }

        assert_eq!(ring[0], 2);
        assert_eq!(ring[1], 3);
        assert_eq!(ring[2], 4);

        ring[1] = 30;
        assert_eq!(ring.get(1), Some(&30));
        assert_eq!(ring.get(3), None);
        assert_eq!(ring.front(), Some(&2));
        assert_eq!(ring.back(), Some(&4));
    }

    #[test]
    #[should_panic]
    fn index_beyond_len_panics() {
        let mut ring = RingBuffer::<u32>::new(nz!(3));
        ring.push_back(1);

        _ = ring[1];
    }

    #[test]
    #[should_panic]
    fn index_mut_beyond_len_panics() {
        let mut ring = RingBuffer::<u32>::new(nz!(3));
        ring[0] = 1;
    }

    #[test]
    #[should_panic]
    fn pop_back_empty_panics() {
        let mut ring = RingBuffer::<u32>::new(nz!(3));
        _ = ring.pop_back();
    }

    #[test]
    #[should_panic]
    fn pop_front_empty_panics() {
        let mut ring = RingBuffer::<u32>::new(nz!(3));
        ring.push_back(1);
        _ = ring.pop_back();

        _ = ring.pop_front();
    }

    #[test]
    fn try_pop_empty_returns_none() {
        let mut ring = RingBuffer::<u32>::new(nz!(1));

        assert_eq!(ring.try_pop_back(), None);
        assert_eq!(ring.try_pop_front(), None);
        assert_eq!(ring.front(), None);
        assert_eq!(ring.back(), None);
    }

    #[test]
    fn capacity_one_overwrites_single_slot() {
        let mut ring = RingBuffer::<u32>::new(nz!(1));

        ring.push_back(1);
        ring.push_back(2);
        ring.push_front(3);

        assert_eq!(contents(&ring), vec![3]);
        assert_eq!(ring.pop_back(), 3);
        assert!(ring.is_empty());
    }

    #[test]
    fn iter_is_restartable_and_double_ended() {
        let mut ring = RingBuffer::<u32>::new(nz!(4));

        for value in 1..=6 {
            ring.push_back(value);
        }

        let iter = ring.iter();
        assert_eq!(iter.len(), 4);

        assert_eq!(iter.clone().collect::<Vec<_>>(), vec![&3, &4, &5, &6]);
        assert_eq!(iter.rev().collect::<Vec<_>>(), vec![&6, &5, &4, &3]);

        let mut iter = ring.iter();
        assert_eq!(iter.next(), Some(&3));
        assert_eq!(iter.next_back(), Some(&6));
        assert_eq!(iter.next(), Some(&4));
        assert_eq!(iter.next_back(), Some(&5));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);

        // Restarting gives the same sequence again.
        assert_eq!(contents(&ring), vec![3, 4, 5, 6]);
    }

    #[test]
    fn iter_mut_modifies_across_wrap() {
        let mut ring = RingBuffer::<u32>::new(nz!(4));

        for value in 1..=6 {
            ring.push_back(value);
        }

        for item in &mut ring {
            *item *= 10;
        }

        assert_eq!(contents(&ring), vec![30, 40, 50, 60]);
        assert_eq!(ring.iter_mut().len(), 4);
        assert_eq!(ring.iter_mut().next_back().map(|item| *item), Some(60));
    }

    #[test]
    fn as_slices_split_at_wrap() {
        let mut ring = RingBuffer::<u32>::new(nz!(4));

        for value in 1..=3 {
            ring.push_back(value);
        }

        assert_eq!(ring.as_slices(), (&[1, 2, 3][..], &[][..]));

        ring.push_back(4);
        ring.push_back(5);

        assert_eq!(ring.as_slices(), (&[2, 3, 4][..], &[5][..]));

        let (first, second) = ring.as_mut_slices();
        first[0] = 20;
        second[0] = 50;

        assert_eq!(contents(&ring), vec![20, 3, 4, 50]);
    }

    #[test]
    fn clear_tears_down_every_item() {
        let drops = Rc::new(Cell::new(0));
        let mut ring = RingBuffer::<DropTracker>::new(nz!(3));

        for id in 0..4 {
            ring.push_front(DropTracker::new(id, &drops));
        }

        assert_eq!(drops.get(), 1);

        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(drops.get(), 4);

        ring.push_back(DropTracker::new(10, &drops));
        assert_eq!(ring.front().map(DropTracker::id), Some(10));

        drop(ring);
        assert_eq!(drops.get(), 5);
    }

    #[test]
    fn popped_items_are_not_dropped_by_buffer() {
        let drops = Rc::new(Cell::new(0));
        let mut ring = RingBuffer::<DropTracker>::new(nz!(3));

        ring.push_back(DropTracker::new(1, &drops));
        ring.push_back(DropTracker::new(2, &drops));

        let popped = ring.pop_front();
        assert_eq!(popped.id(), 1);
        assert_eq!(drops.get(), 0);

        drop(ring);
        assert_eq!(drops.get(), 1);

        drop(popped);
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn forget_items_policy_never_drops() {
        let drops = Rc::new(Cell::new(0));

        {
            let mut ring = RingBuffer::<DropTracker>::builder()
                .capacity(nz!(2))
                .drop_policy(DropPolicy::ForgetItems)
                .build();

            for id in 0..5 {
                ring.push_back(DropTracker::new(id, &drops));
            }
        }

        assert_eq!(drops.get(), 0);
    }

    #[test]
    #[should_panic]
    fn drop_item_with_forbidden_to_drop_policy_panics() {
        let mut ring = RingBuffer::<u32>::builder()
            .capacity(nz!(2))
            .drop_policy(DropPolicy::MustNotDropItems)
            .build();

        ring.push_back(1);
    }

    #[test]
    fn drop_itemless_with_forbidden_to_drop_policy_ok() {
        let mut ring = RingBuffer::<u32>::builder()
            .capacity(nz!(2))
            .drop_policy(DropPolicy::MustNotDropItems)
            .build();

        ring.push_back(1);
        _ = ring.pop_front();
    }

    #[test]
    fn random_operations_match_bounded_deque() {
        const CAPACITY: NonZero<usize> = nz!(5);

        let mut rng = seeded_rng(DEFAULT_SEED);
        let mut ring = RingBuffer::<u64>::new(CAPACITY);
        let mut model = VecDeque::<u64>::new();

        for step in 0..5_000_u64 {
            match rng.random_range(0..4) {
                0 => {
                    ring.push_back(step);

                    if model.len() == CAPACITY.get() {
                        _ = model.pop_front();
                    }
                    model.push_back(step);
                }
                1 => {
                    ring.push_front(step);

                    if model.len() == CAPACITY.get() {
                        _ = model.pop_back();
                    }
                    model.push_front(step);
                }
                2 => assert_eq!(ring.try_pop_back(), model.pop_back()),
                _ => assert_eq!(ring.try_pop_front(), model.pop_front()),
            }

            assert_eq!(ring.len(), model.len());
            assert!(ring.iter().eq(model.iter()));
            assert!(ring.iter().rev().eq(model.iter().rev()));

            for (index, expected) in model.iter().enumerate() {
                assert_eq!(ring.get(index), Some(expected));
            }
        }
    }

    #[test]
    fn debug_output_names_type() {
        let ring = RingBuffer::<u32>::new(nz!(2));
        let debug_output = format!("{ring:?}");

        assert!(debug_output.contains("RingBuffer"));
        assert!(debug_output.contains("borrowed: false"));
    }
}
