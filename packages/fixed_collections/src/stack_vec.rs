use std::any::type_name;
use std::mem::{self, MaybeUninit};
use std::ops::{Index, IndexMut};
use std::{fmt, slice};

use crate::index_of_in;

/// A vector of at most `CAPACITY` items, stored inline without any heap allocation.
///
/// # Example
///
/// ```
/// use fixed_collections::StackVec;
///
/// let mut digits = StackVec::<u8, 4>::new();
///
/// for digit in [3, 1, 4, 1, 5] {
///     if digits.try_push(digit).is_err() {
///         break;
///     }
/// }
///
/// assert_eq!(digits.as_slice(), &[3, 1, 4, 1]);
/// assert_eq!(digits.pop(), Some(1));
/// ```
pub struct StackVec<T, const CAPACITY: usize> {
    slots: [MaybeUninit<T>; CAPACITY],

    /// Items occupy slots `[0, len)`.
    len: usize,
}

impl<T, const CAPACITY: usize> StackVec<T, CAPACITY> {
    /// Creates an empty vector.
    ///
    /// A zero `CAPACITY` is rejected at compile time.
    #[must_use]
    pub const fn new() -> Self {
        const {
            assert!(CAPACITY > 0, "StackVec capacity must be non-zero");
        }

        Self {
            slots: [const { MaybeUninit::uninit() }; CAPACITY],
            len: 0,
        }
    }

    #[must_use]
    #[expect(missing_docs, reason = "self-explanatory")]
    pub const fn capacity(&self) -> usize {
        CAPACITY
    }

    #[must_use]
    #[expect(missing_docs, reason = "self-explanatory")]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    #[expect(missing_docs, reason = "self-explanatory")]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    #[expect(missing_docs, reason = "self-explanatory")]
    pub fn is_full(&self) -> bool {
        self.len >= CAPACITY
    }

    /// Appends an item, returning a reference to it.
    ///
    /// # Panics
    ///
    /// Panics if the vector is full.
    pub fn push(&mut self, value: T) -> &mut T {
        self.try_push(value).unwrap_or_else(|_| {
            panic!(
                "push() into full StackVec of {CAPACITY} items of {}",
                type_name::<T>()
            )
        })
    }

    /// Appends an item, returning a reference to it, or hands the item back if the vector
    /// is full.
    pub fn try_push(&mut self, value: T) -> Result<&mut T, T> {
        let index = self.len;

        let Some(slot) = self.slots.get_mut(index) else {
            return Err(value);
        };

        // Cannot overflow because len < CAPACITY.
        self.len = index.wrapping_add(1);

        Ok(slot.write(value))
    }

    /// Removes and returns the last item, or `None` if the vector is empty.
    pub fn pop(&mut self) -> Option<T> {
        let index = self.len.checked_sub(1)?;
        self.len = index;

        let slot = self
            .slots
            .get(index)
            .expect("len never exceeds CAPACITY");

        // SAFETY: The slot held the last item and is now outside [0, len).
        Some(unsafe { slot.assume_init_read() })
    }

    /// The item at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    /// The item at `index`, if any.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    /// Drops every item.
    pub fn clear(&mut self) {
        let items: *mut [T] = self.as_mut_slice();
        self.len = 0;

        // SAFETY: The pointer covers exactly the items that were in [0, len). The vector is
        // already empty so none of them will be touched again.
        unsafe { items.drop_in_place() };
    }

    /// Identifies the position of an item by reference, if it belongs to this vector.
    #[must_use]
    pub fn index_of(&self, item: &T) -> Option<usize> {
        index_of_in(&self.slots, item).filter(|index| *index < self.len)
    }

    #[must_use]
    #[expect(missing_docs, reason = "self-explanatory")]
    pub fn as_slice(&self) -> &[T] {
        let items = self
            .slots
            .get(..self.len)
            .expect("len never exceeds CAPACITY");

        // SAFETY: Slots [0, len) hold the items and MaybeUninit<T> has the same layout as T.
        unsafe { slice::from_raw_parts(items.as_ptr().cast::<T>(), items.len()) }
    }

    #[must_use]
    #[expect(missing_docs, reason = "self-explanatory")]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let items = self
            .slots
            .get_mut(..self.len)
            .expect("len never exceeds CAPACITY");

        // SAFETY: Slots [0, len) hold the items and MaybeUninit<T> has the same layout as T.
        unsafe { slice::from_raw_parts_mut(items.as_mut_ptr().cast::<T>(), items.len()) }
    }

    #[expect(missing_docs, reason = "self-explanatory")]
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    #[expect(missing_docs, reason = "self-explanatory")]
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }
}

impl<T, const CAPACITY: usize> Default for StackVec<T, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const CAPACITY: usize> Index<usize> for StackVec<T, CAPACITY> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.get(index).unwrap_or_else(|| {
            panic!(
                "index {index} out of bounds in StackVec of {} items of {}",
                self.len,
                type_name::<T>()
            )
        })
    }
}

impl<T, const CAPACITY: usize> IndexMut<usize> for StackVec<T, CAPACITY> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        let len = self.len;

        self.get_mut(index).unwrap_or_else(|| {
            panic!(
                "index {index} out of bounds in StackVec of {len} items of {}",
                type_name::<T>()
            )
        })
    }
}

impl<'v, T, const CAPACITY: usize> IntoIterator for &'v StackVec<T, CAPACITY> {
    type Item = &'v T;
    type IntoIter = slice::Iter<'v, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'v, T, const CAPACITY: usize> IntoIterator for &'v mut StackVec<T, CAPACITY> {
    type Item = &'v mut T;
    type IntoIter = slice::IterMut<'v, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T: fmt::Debug, const CAPACITY: usize> fmt::Debug for StackVec<T, CAPACITY> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackVec")
            .field("capacity", &CAPACITY)
            .field("items", &self.as_slice())
            .finish()
    }
}

impl<T, const CAPACITY: usize> Drop for StackVec<T, CAPACITY> {
    fn drop(&mut self) {
        if mem::needs_drop::<T>() {
            self.clear();
        }
    }
}
