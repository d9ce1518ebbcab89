use std::any::type_name;
use std::num::NonZero;
use std::ops::{Index, IndexMut};
use std::{fmt, mem, slice};

use tracing::debug;

use crate::OwnedSlots;

/// A vector whose capacity is fixed once, at initialization time, and never grows.
///
/// The vector supports deferred initialization: [`new()`][1] is a `const fn` that creates an
/// empty placeholder with no storage, which is later given its storage by [`init()`][2]. This
/// makes it possible to declare the vector before its capacity is known. Using any item
/// operation before initialization is a programmer error and panics.
///
/// Items are stored contiguously in `[0, len)`.
///
/// # Example
///
/// ```
/// use fixed_collections::FixedVec;
/// use new_zealand::nz;
///
/// let mut numbers = FixedVec::<u32>::new();
/// assert!(!numbers.is_initialized());
///
/// numbers.init(nz!(3));
/// numbers.push(10);
/// numbers.push(30);
/// numbers.insert(1, 20);
///
/// assert!(numbers.is_full());
/// assert_eq!(numbers.as_slice(), &[10, 20, 30]);
/// assert!(numbers.try_push(40).is_err());
/// ```
///
/// [1]: Self::new
/// [2]: Self::init
pub struct FixedVec<T> {
    slots: Option<OwnedSlots<T>>,

    /// Items occupy slots `[0, len)`.
    len: usize,
}

impl<T> FixedVec<T> {
    /// Creates an uninitialized vector without storage. Call [`init()`][Self::init] before use.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: None,
            len: 0,
        }
    }

    /// Creates a vector with storage for `capacity` items.
    #[must_use]
    pub fn with_capacity(capacity: NonZero<usize>) -> Self {
        let mut vec = Self::new();
        vec.init(capacity);
        vec
    }

    /// Allocates storage for `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if the vector has already been initialized.
    pub fn init(&mut self, capacity: NonZero<usize>) {
        assert!(
            self.slots.is_none(),
            "init() called on an already initialized FixedVec of {}",
            type_name::<T>()
        );

        debug!(
            capacity = capacity.get(),
            item_type = type_name::<T>(),
            "initializing FixedVec"
        );

        self.slots = Some(OwnedSlots::owned(capacity));
    }

    #[must_use]
    #[expect(missing_docs, reason = "self-explanatory")]
    pub fn is_initialized(&self) -> bool {
        self.slots.is_some()
    }

    /// The number of items the vector can hold.
    ///
    /// # Panics
    ///
    /// Panics if the vector has not been initialized.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots().capacity()
    }

    /// The number of items in the vector. An uninitialized vector is empty.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    #[expect(missing_docs, reason = "self-explanatory")]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the vector holds `capacity()` items.
    ///
    /// # Panics
    ///
    /// Panics if the vector has not been initialized.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len >= self.capacity()
    }

    /// Appends an item, returning a reference to it.
    ///
    /// # Panics
    ///
    /// Panics if the vector is full or has not been initialized.
    pub fn push(&mut self, value: T) -> &mut T {
        let len = self.len;

        self.try_push(value).unwrap_or_else(|_| {
            panic!(
                "push() into full FixedVec of {len} items of {}",
                type_name::<T>()
            )
        })
    }

    /// Appends an item, returning a reference to it, or hands the item back if the vector
    /// is full.
    ///
    /// # Panics
    ///
    /// Panics if the vector has not been initialized.
    pub fn try_push(&mut self, value: T) -> Result<&mut T, T> {
        if self.is_full() {
            return Err(value);
        }

        let index = self.len;

        // Cannot overflow because len < capacity.
        self.len = index.wrapping_add(1);

        Ok(self.slots_mut().write(index, value))
    }

    /// Inserts an item at position `at`, shifting the items after it up by one position.
    ///
    /// # Panics
    ///
    /// Panics if the vector is full, if `at > len()` or if the vector has not been initialized.
    pub fn insert(&mut self, at: usize, value: T) -> &mut T {
        let len = self.len;

        assert!(
            !self.is_full(),
            "insert() into full FixedVec of {len} items of {}",
            type_name::<T>()
        );
        assert!(
            at <= len,
            "insert() at index {at} beyond the end of FixedVec of {len} items of {}",
            type_name::<T>()
        );

        let slots = self.slots_mut();

        if at < len {
            // SAFETY: Slots [at, len) hold the items and slot `len` is vacant because the
            // vector is not full.
            unsafe { slots.shift_up(at..len) };
        }

        // Cannot overflow because len < capacity.
        self.len = len.wrapping_add(1);

        self.slots_mut().write(at, value)
    }

    /// Removes and returns the last item, or `None` if the vector is empty.
    ///
    /// # Panics
    ///
    /// Panics if the vector has not been initialized.
    pub fn pop(&mut self) -> Option<T> {
        let len = self.len;
        let slots = self.slots_mut();

        let index = len.checked_sub(1)?;

        // SAFETY: The slot holds the last item and is outside [0, len) once len is updated.
        let value = unsafe { slots.take(index) };
        self.len = index;

        Some(value)
    }

    /// The item at `index`, if any.
    ///
    /// # Panics
    ///
    /// Panics if the vector has not been initialized.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    /// The item at `index`, if any.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    /// Drops every item, keeping the storage.
    ///
    /// # Panics
    ///
    /// Panics if the vector has not been initialized.
    pub fn clear(&mut self) {
        let len = mem::take(&mut self.len);
        let slots = self.slots_mut();

        if len == 0 || !mem::needs_drop::<T>() {
            return;
        }

        for index in 0..len {
            // SAFETY: Slots [0, len) held the items and len is already zero.
            unsafe { slots.drop_in_place(index) };
        }
    }

    /// Identifies the position of an item by reference, if it belongs to this vector.
    #[must_use]
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.slots()
            .index_of(item)
            .filter(|index| *index < self.len)
    }

    /// The items in `[0, len)`.
    ///
    /// # Panics
    ///
    /// Panics if the vector has not been initialized.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: Slots [0, len) hold the items.
        unsafe { self.slots().initialized(0..self.len) }
    }

    /// The items in `[0, len)`.
    ///
    /// # Panics
    ///
    /// Panics if the vector has not been initialized.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.len;

        // SAFETY: Slots [0, len) hold the items.
        unsafe { self.slots_mut().initialized_mut(0..len) }
    }

    #[expect(missing_docs, reason = "self-explanatory")]
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    #[expect(missing_docs, reason = "self-explanatory")]
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    fn slots(&self) -> &OwnedSlots<T> {
        self.slots.as_ref().unwrap_or_else(|| uninitialized::<T>())
    }

    fn slots_mut(&mut self) -> &mut OwnedSlots<T> {
        self.slots.as_mut().unwrap_or_else(|| uninitialized::<T>())
    }
}

#[cold]
fn uninitialized<T>() -> ! {
    panic!("using an uninitialized FixedVec of {}", type_name::<T>())
}

impl<T> Default for FixedVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for FixedVec<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.get(index).unwrap_or_else(|| {
            panic!(
                "index {index} out of bounds in FixedVec of {} items of {}",
                self.len,
                type_name::<T>()
            )
        })
    }
}

impl<T> IndexMut<usize> for FixedVec<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        let len = self.len;

        self.get_mut(index).unwrap_or_else(|| {
            panic!(
                "index {index} out of bounds in FixedVec of {len} items of {}",
                type_name::<T>()
            )
        })
    }
}

impl<'v, T> IntoIterator for &'v FixedVec<T> {
    type Item = &'v T;
    type IntoIter = slice::Iter<'v, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'v, T> IntoIterator for &'v mut FixedVec<T> {
    type Item = &'v mut T;
    type IntoIter = slice::IterMut<'v, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T> fmt::Debug for FixedVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedVec")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field(
                "capacity",
                &self.slots.as_ref().map(OwnedSlots::capacity),
            )
            .field("len", &self.len)
            .finish()
    }
}

impl<T> Drop for FixedVec<T> {
    fn drop(&mut self) {
        // An uninitialized vector has nothing to tear down.
        if self.is_initialized() {
            self.clear();
        }
    }
}
