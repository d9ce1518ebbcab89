use std::any::type_name;
use std::num::NonZero;
use std::ops::{Index, IndexMut};
use std::{fmt, mem, slice, thread};

use tracing::{debug, trace};

use crate::{DropPolicy, OwnedSlots, SwappingPoolBuilder};

/// A fixed-capacity object pool that keeps its items packed into a contiguous prefix of slots.
///
/// Items live in slots `0..len()`, so iterating over them is a plain slice traversal with no
/// occupancy checks. The price is index stability: releasing an item moves the last item of the
/// pool into the freed slot. Do not hold on to an index across the release of another item
/// unless you re-resolve it using the relocation reported by [`release()`][1].
///
/// # Example
///
/// ```
/// use fixed_collections::SwappingPool;
/// use new_zealand::nz;
///
/// let mut pool = SwappingPool::<char>::new(nz!(3));
///
/// pool.insert('A');
/// pool.insert('B');
/// pool.insert('C');
///
/// // Releasing slot 0 moves the last item ('C') into it.
/// let relocated_from = pool.release(0);
/// assert_eq!(relocated_from, Some(2));
///
/// assert_eq!(pool.as_slice(), &['C', 'B']);
/// ```
///
/// [1]: Self::release
pub struct SwappingPool<T> {
    slots: OwnedSlots<T>,

    /// Slots `0..head_count` hold live items, the rest are vacant.
    head_count: usize,

    drop_policy: DropPolicy,
}

/// The outcome of [`SwappingPool::allocate()`].
#[derive(Debug)]
#[expect(
    clippy::exhaustive_enums,
    reason = "a pool either has a vacant slot or it is full, there is no third option"
)]
pub enum SwappingAllocation<'p, T> {
    /// The first vacant slot after the occupied prefix. Use the inserter to place a value into it.
    Vacant(SwappingPoolInserter<'p, T>),

    /// The pool is full and no slot was allocated.
    ///
    /// This is a degenerate outcome, not an error: the pool hands out its first live item
    /// without consuming any capacity. Writing through `existing` modifies that item in place.
    /// Check [`SwappingPool::is_full()`] first if this is not what you want.
    Full {
        /// Always 0, the index of `existing`.
        index: usize,

        /// The live item in the first slot.
        existing: &'p mut T,
    },
}

impl<'p, T> SwappingAllocation<'p, T> {
    /// Returns the inserter if a vacant slot was found, or `None` if the pool was full.
    #[must_use]
    pub fn vacant(self) -> Option<SwappingPoolInserter<'p, T>> {
        match self {
            Self::Vacant(inserter) => Some(inserter),
            Self::Full { .. } => None,
        }
    }

    /// Whether the pool was full at the time of allocation.
    #[must_use]
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full { .. })
    }
}

/// Places a value into the first vacant slot of a [`SwappingPool`].
///
/// The slot is only claimed when [`insert()`][Self::insert] is called. Dropping the inserter
/// without inserting leaves the pool unchanged.
pub struct SwappingPoolInserter<'p, T> {
    pool: &'p mut SwappingPool<T>,
}

impl<'p, T> SwappingPoolInserter<'p, T> {
    /// The index the value will have once inserted, until another item is released.
    #[must_use]
    pub fn index(&self) -> usize {
        self.pool.head_count
    }

    /// Inserts the value into the slot, returning an exclusive reference to it.
    pub fn insert(self, value: T) -> &'p mut T {
        let pool = self.pool;
        let index = pool.head_count;

        pool.head_count = index
            .checked_add(1)
            .expect("an inserter only exists while the pool has a vacant slot");

        pool.slots.write(index, value)
    }
}

impl<T> fmt::Debug for SwappingPoolInserter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwappingPoolInserter")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("index", &self.index())
            .finish()
    }
}

impl<T> SwappingPool<T> {
    #[must_use]
    pub(crate) fn new_inner(capacity: NonZero<usize>, drop_policy: DropPolicy) -> Self {
        debug!(
            capacity = capacity.get(),
            item_type = type_name::<T>(),
            ?drop_policy,
            "creating SwappingPool"
        );

        Self {
            slots: OwnedSlots::owned(capacity),
            head_count: 0,
            drop_policy,
        }
    }

    /// Creates a pool with the given capacity and the default configuration.
    ///
    /// The backing storage for all `capacity` items is allocated up front. No further
    /// allocations happen for the lifetime of the pool.
    #[must_use]
    pub fn new(capacity: NonZero<usize>) -> Self {
        Self::builder().capacity(capacity).build()
    }

    /// Starts building a new [`SwappingPool`].
    ///
    /// Use this when you want to customize the pool configuration beyond the capacity.
    pub fn builder() -> SwappingPoolBuilder<T> {
        SwappingPoolBuilder::new()
    }

    /// The total number of slots in the pool.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// The number of live items, which are always in slots `0..len()`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.head_count
    }

    #[must_use]
    #[expect(missing_docs, reason = "self-explanatory")]
    pub fn is_empty(&self) -> bool {
        self.head_count == 0
    }

    /// Whether every slot holds a live item. Check this before [`allocate()`][Self::allocate]
    /// unless you are prepared to handle [`SwappingAllocation::Full`].
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.head_count >= self.capacity()
    }

    /// Hands out the first slot after the occupied prefix.
    ///
    /// If the pool is full, no slot is allocated and the live item in slot 0 is returned via
    /// [`SwappingAllocation::Full`] instead.
    pub fn allocate(&mut self) -> SwappingAllocation<'_, T> {
        if self.is_full() {
            trace!(
                item_type = type_name::<T>(),
                "allocate() on full SwappingPool returned slot 0"
            );

            // SAFETY: A full pool holds live items in every slot, including slot 0.
            let existing = unsafe { self.slots.get_unchecked_mut(0) };

            return SwappingAllocation::Full { index: 0, existing };
        }

        SwappingAllocation::Vacant(SwappingPoolInserter { pool: self })
    }

    /// Inserts a value after the last live item and returns its index.
    ///
    /// # Panics
    ///
    /// Panics if the pool is full.
    pub fn insert(&mut self, value: T) -> usize {
        match self.allocate() {
            SwappingAllocation::Vacant(inserter) => {
                let index = inserter.index();
                inserter.insert(value);
                index
            }
            SwappingAllocation::Full { .. } => {
                panic!(
                    "cannot insert into a full SwappingPool of {}",
                    type_name::<T>()
                )
            }
        }
    }

    /// Inserts a value after the last live item and returns its index, or returns the value
    /// back if the pool is full.
    ///
    /// # Errors
    ///
    /// Returns the value if there is no vacant slot.
    pub fn try_insert(&mut self, value: T) -> Result<usize, T> {
        match self.allocate() {
            SwappingAllocation::Vacant(inserter) => {
                let index = inserter.index();
                inserter.insert(value);
                Ok(index)
            }
            SwappingAllocation::Full { .. } => Err(value),
        }
    }

    /// Removes the item at `index` and tears it down according to the pool's drop policy.
    ///
    /// To keep the live items contiguous, the last live item is moved into the freed slot.
    /// Returns the index that item was moved from, or `None` if `index` was the last live item
    /// and nothing had to move. Every other item keeps its index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not less than [`len()`][Self::len].
    pub fn release(&mut self, index: usize) -> Option<usize> {
        let (item, relocated_from) = self.take_inner(index, "release");
        self.drop_policy.teardown(item);
        relocated_from
    }

    /// Removes the item at `index` and returns it to the caller, together with the index the
    /// last live item was moved from to fill the gap (if any).
    ///
    /// # Panics
    ///
    /// Panics if `index` is not less than [`len()`][Self::len].
    #[must_use]
    pub fn take(&mut self, index: usize) -> (T, Option<usize>) {
        self.take_inner(index, "take")
    }

    fn take_inner(&mut self, index: usize, operation: &str) -> (T, Option<usize>) {
        assert!(
            index < self.head_count,
            "{operation}({index}) index out of the {} live items in SwappingPool of {}",
            self.head_count,
            type_name::<T>()
        );

        let last = self
            .head_count
            .checked_sub(1)
            .expect("guarded by index < head_count above");

        self.head_count = last;

        // SAFETY: index was in the occupied prefix so it holds an initialized item. The slot is
        // either refilled by relocation below or left outside the shrunken prefix.
        let item = unsafe { self.slots.take(index) };

        if index == last {
            return (item, None);
        }

        // SAFETY: `last` was in the occupied prefix so it holds an initialized item, and the
        // item at `index` was moved out above. After relocation, `last` is outside the prefix.
        unsafe {
            self.slots.relocate(last, index);
        }

        (item, Some(last))
    }

    /// Forgets every item without tearing any of them down.
    ///
    /// This is a fast reset. Item types that own resources (heap memory, handles) leak them.
    /// Use [`release_all()`][Self::release_all] to tear items down according to the drop policy.
    pub fn clear(&mut self) {
        self.head_count = 0;
    }

    /// Removes every item, tearing each down according to the pool's drop policy.
    pub fn release_all(&mut self) {
        let len = mem::take(&mut self.head_count);

        if self.drop_policy.drops_items() && mem::needs_drop::<T>() {
            for index in 0..len {
                // SAFETY: Every index below the former head count holds an initialized item.
                // The head count is already zero so none of them will be touched again.
                unsafe { self.slots.drop_in_place(index) };
            }
        }
    }

    /// # Panics
    ///
    /// Panics if `index` is not less than [`len()`][Self::len].
    #[must_use]
    pub fn get(&self, index: usize) -> &T {
        self.as_slice().get(index).unwrap_or_else(|| {
            panic!(
                "get({index}) index out of the {} live items in SwappingPool of {}",
                self.head_count,
                type_name::<T>()
            )
        })
    }

    /// # Panics
    ///
    /// Panics if `index` is not less than [`len()`][Self::len].
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> &mut T {
        let len = self.head_count;

        self.as_mut_slice().get_mut(index).unwrap_or_else(|| {
            panic!(
                "get_mut({index}) index out of the {len} live items in SwappingPool of {}",
                type_name::<T>()
            )
        })
    }

    /// The live items, in slot order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: Every slot in the occupied prefix holds an initialized item.
        unsafe { self.slots.initialized(0..self.head_count) }
    }

    /// The live items, in slot order.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: Every slot in the occupied prefix holds an initialized item.
        unsafe { self.slots.initialized_mut(0..self.head_count) }
    }

    /// Visits every live item, in slot order.
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Visits every live item, in slot order, allowing modification.
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// Returns the index of the slot holding `item`, or `None` if `item` is not a live item
    /// of this pool.
    #[must_use]
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.slots
            .index_of(item)
            .filter(|&index| index < self.head_count)
    }
}

impl<T> Index<usize> for SwappingPool<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.get(index)
    }
}

impl<T> IndexMut<usize> for SwappingPool<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        self.get_mut(index)
    }
}

impl<'p, T> IntoIterator for &'p SwappingPool<T> {
    type Item = &'p T;
    type IntoIter = slice::Iter<'p, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'p, T> IntoIterator for &'p mut SwappingPool<T> {
    type Item = &'p mut T;
    type IntoIter = slice::IterMut<'p, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T> fmt::Debug for SwappingPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwappingPool")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("capacity", &self.capacity())
            .field("len", &self.head_count)
            .field("drop_policy", &self.drop_policy)
            .finish()
    }
}

impl<T> Drop for SwappingPool<T> {
    fn drop(&mut self) {
        let was_empty = self.is_empty();

        if !was_empty {
            trace!(
                len = self.head_count,
                item_type = type_name::<T>(),
                "dropping non-empty SwappingPool"
            );
        }

        self.release_all();

        // If we are already panicking, we do not want to panic again because that will
        // simply obscure whatever the original panic was, leading to debug difficulties.
        if self.drop_policy == DropPolicy::MustNotDropItems && !thread::panicking() {
            assert!(
                was_empty,
                "dropped a non-empty SwappingPool of {} with a policy that says it must be empty when dropped",
                type_name::<T>()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::indexing_slicing,
        reason = "we do not need to worry about these things when writing test code"
    )]

    use std::cell::Cell;
    use std::rc::Rc;

    use new_zealand::nz;
    use rand::Rng;
    use static_assertions::{assert_impl_all, assert_not_impl_any};
    use testing::{DEFAULT_SEED, DropTracker, seeded_rng};

    use super::*;

    assert_impl_all!(SwappingPool<u32>: Send, Sync, fmt::Debug);
    assert_not_impl_any!(SwappingPool<Rc<u32>>: Send, Sync);

    #[test]
    fn smoke_test() {
        let mut pool = SwappingPool::<u32>::new(nz!(4));

        assert!(pool.is_empty());
        assert_eq!(pool.capacity(), 4);

        assert_eq!(pool.insert(1), 0);
        assert_eq!(pool.insert(2), 1);
        assert_eq!(pool.insert(3), 2);

        assert_eq!(pool.len(), 3);
        assert!(!pool.is_full());
        assert_eq!(pool.as_slice(), &[1, 2, 3]);

        pool[1] = 20;
        *pool.get_mut(2) += 10;

        assert_eq!(pool.iter().copied().collect::<Vec<_>>(), vec![1, 20, 13]);
    }

    #[test]
    fn release_first_moves_last_into_gap() {
        let mut pool = SwappingPool::<char>::new(nz!(3));

        _ = pool.insert('A');
        _ = pool.insert('B');
        _ = pool.insert('C');

        assert_eq!(pool.release(0), Some(2));

        assert_eq!(pool.len(), 2);
        assert_eq!(pool[0], 'C');
        assert_eq!(pool[1], 'B');
    }

    #[test]
    fn release_last_relocates_nothing() {
        let mut pool = SwappingPool::<char>::new(nz!(3));

        _ = pool.insert('A');
        _ = pool.insert('B');
        _ = pool.insert('C');

        assert_eq!(pool.release(2), None);
        assert_eq!(pool.as_slice(), &['A', 'B']);
    }

    #[test]
    fn release_only_item_empties_pool() {
        let mut pool = SwappingPool::<String>::new(nz!(2));

        _ = pool.insert("only".to_string());

        assert_eq!(pool.release(0), None);
        assert!(pool.is_empty());
        assert!(pool.as_slice().is_empty());
    }

    #[test]
    fn released_item_is_dropped_not_the_relocated_one() {
        let drops = Rc::new(Cell::new(0));
        let mut pool = SwappingPool::<DropTracker>::new(nz!(3));

        for id in 0..3 {
            _ = pool.insert(DropTracker::new(id, &drops));
        }

        _ = pool.release(0);
        assert_eq!(drops.get(), 1);

        let ids = pool.iter().map(DropTracker::id).collect::<Vec<_>>();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn take_returns_item_and_relocation() {
        let drops = Rc::new(Cell::new(0));
        let mut pool = SwappingPool::<DropTracker>::new(nz!(3));

        for id in 0..3 {
            _ = pool.insert(DropTracker::new(id, &drops));
        }

        let (item, relocated_from) = pool.take(1);
        assert_eq!(item.id(), 1);
        assert_eq!(relocated_from, Some(2));
        assert_eq!(drops.get(), 0);
        assert_eq!(pool[1].id(), 2);
    }

    #[test]
    #[should_panic]
    fn release_beyond_len_panics() {
        let mut pool = SwappingPool::<u32>::new(nz!(4));
        _ = pool.insert(1);

        _ = pool.release(1);
    }

    #[test]
    #[should_panic]
    fn release_from_empty_panics() {
        let mut pool = SwappingPool::<u32>::new(nz!(4));
        _ = pool.release(0);
    }

    #[test]
    #[should_panic]
    fn get_beyond_len_panics() {
        let mut pool = SwappingPool::<u32>::new(nz!(4));
        _ = pool.insert(1);

        _ = pool.get(1);
    }

    #[test]
    #[should_panic]
    fn get_mut_beyond_len_panics() {
        let mut pool = SwappingPool::<u32>::new(nz!(4));
        _ = pool.get_mut(0);
    }

    #[test]
    fn allocate_on_full_pool_is_degenerate() {
        let mut pool = SwappingPool::<u32>::new(nz!(2));

        _ = pool.insert(10);
        _ = pool.insert(11);

        match pool.allocate() {
            SwappingAllocation::Full { index, existing } => {
                assert_eq!(index, 0);
                assert_eq!(*existing, 10);
            }
            SwappingAllocation::Vacant(_) => panic!("full pool must not hand out a vacant slot"),
        }

        assert_eq!(pool.len(), 2);
        assert!(pool.allocate().is_full());
    }

    #[test]
    fn abandoned_inserter_is_noop() {
        let mut pool = SwappingPool::<u32>::new(nz!(2));

        _ = pool.allocate();
        assert!(pool.is_empty());

        let inserter = pool.allocate().vacant().expect("pool is empty");
        assert_eq!(inserter.index(), 0);
        *inserter.insert(5) += 1;

        assert_eq!(pool.as_slice(), &[6]);
    }

    #[test]
    #[should_panic]
    fn insert_into_full_panics() {
        let mut pool = SwappingPool::<u32>::new(nz!(1));
        _ = pool.insert(1);
        _ = pool.insert(2);
    }

    #[test]
    fn try_insert_into_full_returns_value() {
        let mut pool = SwappingPool::<u32>::new(nz!(1));

        assert_eq!(pool.try_insert(1), Ok(0));
        assert_eq!(pool.try_insert(2), Err(2));
    }

    #[test]
    fn clear_does_not_tear_down() {
        let drops = Rc::new(Cell::new(0));
        let mut pool = SwappingPool::<DropTracker>::new(nz!(3));

        for id in 0..3 {
            _ = pool.insert(DropTracker::new(id, &drops));
        }

        pool.clear();
        assert!(pool.is_empty());
        drop(pool);

        assert_eq!(drops.get(), 0);
    }

    #[test]
    fn release_all_tears_down_once() {
        let drops = Rc::new(Cell::new(0));
        let mut pool = SwappingPool::<DropTracker>::new(nz!(3));

        for id in 0..3 {
            _ = pool.insert(DropTracker::new(id, &drops));
        }

        pool.release_all();
        assert!(pool.is_empty());
        assert_eq!(drops.get(), 3);

        drop(pool);
        assert_eq!(drops.get(), 3);
    }

    #[test]
    fn drop_tears_down_remaining_items_once() {
        let drops = Rc::new(Cell::new(0));

        {
            let mut pool = SwappingPool::<DropTracker>::new(nz!(4));

            for id in 0..4 {
                _ = pool.insert(DropTracker::new(id, &drops));
            }

            _ = pool.release(1);
            assert_eq!(drops.get(), 1);
        }

        assert_eq!(drops.get(), 4);
    }

    #[test]
    fn forget_items_policy_never_drops() {
        let drops = Rc::new(Cell::new(0));

        {
            let mut pool = SwappingPool::<DropTracker>::builder()
                .capacity(nz!(3))
                .drop_policy(DropPolicy::ForgetItems)
                .build();

            for id in 0..3 {
                _ = pool.insert(DropTracker::new(id, &drops));
            }

            // The released item is forgotten but compaction still happens.
            assert_eq!(pool.release(0), Some(2));
            assert_eq!(pool[0].id(), 2);
        }

        assert_eq!(drops.get(), 0);
    }

    #[test]
    #[should_panic]
    fn drop_item_with_forbidden_to_drop_policy_panics() {
        let mut pool = SwappingPool::<u32>::builder()
            .capacity(nz!(2))
            .drop_policy(DropPolicy::MustNotDropItems)
            .build();

        _ = pool.insert(123);
    }

    #[test]
    fn index_of_resolves_live_items() {
        let mut pool = SwappingPool::<u64>::new(nz!(3));
        _ = pool.insert(1);
        _ = pool.insert(2);

        assert_eq!(pool.index_of(&pool[1]), Some(1));

        let outsider = 2_u64;
        assert_eq!(pool.index_of(&outsider), None);
    }

    #[test]
    fn into_iterator_for_references() {
        let mut pool = SwappingPool::<u32>::new(nz!(3));
        _ = pool.insert(1);
        _ = pool.insert(2);

        for item in &mut pool {
            *item *= 3;
        }

        let mut sum = 0;
        for item in &pool {
            sum += *item;
        }

        assert_eq!(sum, 9);
    }

    #[test]
    fn holds_references_to_locals() {
        let first = String::from("first");
        let second = String::from("second");
        let mut pool = SwappingPool::<&str>::new(nz!(2));

        _ = pool.insert(&first);
        _ = pool.insert(&second);
        assert_eq!(pool.release(0), Some(1));

        assert_eq!(pool.as_slice(), &["second"]);
    }

    #[test]
    fn random_operations_keep_prefix_dense() {
        const CAPACITY: NonZero<usize> = nz!(16);

        let mut rng = seeded_rng(DEFAULT_SEED);
        let mut pool = SwappingPool::<u64>::new(CAPACITY);
        let mut model: Vec<u64> = Vec::new();

        for step in 0..2_000_u64 {
            let insert = model.is_empty() || rng.random_bool(0.55);

            if insert && !pool.is_full() {
                let index = pool.insert(step);
                assert_eq!(index, model.len());
                model.push(step);
            } else if !model.is_empty() {
                let index = rng.random_range(0..model.len());
                let last = model.len() - 1;

                let relocated_from = pool.release(index);

                // Exactly one relocation unless the last item itself was released.
                if index == last {
                    assert_eq!(relocated_from, None);
                } else {
                    assert_eq!(relocated_from, Some(last));
                }

                _ = model.swap_remove(index);
            }

            assert_eq!(pool.len(), model.len());
            assert_eq!(pool.as_slice(), model.as_slice());
        }
    }
}
