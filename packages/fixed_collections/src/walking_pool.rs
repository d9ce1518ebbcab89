use std::any::type_name;
use std::iter::{FusedIterator, Zip};
use std::mem::{self, MaybeUninit};
use std::num::NonZero;
use std::ops::{Index, IndexMut};
use std::{fmt, slice, thread};

use tracing::{debug, trace};

use crate::{DropPolicy, OwnedSlots, WalkingPoolBuilder};

/// A fixed-capacity object pool in which an item never changes its slot index for as long as
/// it stays in the pool.
///
/// Freed slots are reused by walking a cursor forward through the pool (wrapping around at the
/// end) until a vacant slot is found. The cursor continues from where the previous allocation
/// left off, so slots are handed out in a round-robin fashion rather than always reusing the
/// lowest free index.
///
/// There are multiple ways to insert items into the pool:
///
/// * [`insert()`][1] - inserts a value and returns its index, panicking if the pool is full.
/// * [`try_insert()`][2] - inserts a value and returns its index, handing the value back if the
///   pool is full.
/// * [`allocate()`][3] - finds a vacant slot and lets you learn its index via
///   [`WalkingPoolInserter::index()`] before constructing the value in place. When the pool is
///   full, this returns [`WalkingAllocation::Full`] instead of allocating.
///
/// # Traversal
///
/// [`slots()`][4] visits every slot in the pool, vacant ones included, leaving it up to the
/// caller whether to skip vacant slots. [`iter()`][5] and [`iter_mut()`][6] visit only live items.
///
/// # Example
///
/// ```
/// use fixed_collections::WalkingPool;
/// use new_zealand::nz;
///
/// let mut pool = WalkingPool::<String>::new(nz!(3));
///
/// let alice = pool.insert("Alice".to_string());
/// let bob = pool.insert("Bob".to_string());
/// let charlie = pool.insert("Charlie".to_string());
/// assert!(pool.is_full());
///
/// pool.release(bob);
///
/// // Other items keep their indexes.
/// assert_eq!(pool[alice], "Alice");
/// assert_eq!(pool[charlie], "Charlie");
///
/// // The freed slot is reused.
/// let dave = pool.insert("Dave".to_string());
/// assert_eq!(dave, bob);
/// ```
///
/// [1]: Self::insert
/// [2]: Self::try_insert
/// [3]: Self::allocate
/// [4]: Self::slots
/// [5]: Self::iter
/// [6]: Self::iter_mut
pub struct WalkingPool<T> {
    slots: OwnedSlots<T>,

    /// One entry per slot, `true` if the slot holds a live item. A slot is only ever read
    /// through `slots` if its entry here is `true`.
    alive: Box<[bool]>,

    /// Where the next search for a vacant slot starts. Always in bounds.
    current_index: usize,

    free_count: usize,

    drop_policy: DropPolicy,
}

/// The outcome of [`WalkingPool::allocate()`].
#[derive(Debug)]
#[expect(
    clippy::exhaustive_enums,
    reason = "a pool either has a vacant slot or it is full, there is no third option"
)]
pub enum WalkingAllocation<'p, T> {
    /// A vacant slot was found. Use the inserter to place a value into it.
    Vacant(WalkingPoolInserter<'p, T>),

    /// The pool is full and no slot was allocated.
    ///
    /// This is a degenerate outcome, not an error: the pool hands out the live item at its
    /// current scan cursor without consuming any capacity. Writing through `existing` modifies
    /// that item in place. Check [`WalkingPool::is_full()`] first if this is not what you want.
    Full {
        /// The index of the live item at the scan cursor.
        index: usize,

        /// The live item at the scan cursor.
        existing: &'p mut T,
    },
}

impl<'p, T> WalkingAllocation<'p, T> {
    /// Returns the inserter if a vacant slot was found, or `None` if the pool was full.
    #[must_use]
    pub fn vacant(self) -> Option<WalkingPoolInserter<'p, T>> {
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

/// Places a value into a vacant slot of a [`WalkingPool`].
///
/// The slot is only claimed when [`insert()`][Self::insert] is called. Dropping the inserter
/// without inserting leaves the pool unchanged.
pub struct WalkingPoolInserter<'p, T> {
    pool: &'p mut WalkingPool<T>,
    index: usize,
}

impl<'p, T> WalkingPoolInserter<'p, T> {
    /// The index the value will have once inserted.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Inserts the value into the slot, returning an exclusive reference to it.
    pub fn insert(self, value: T) -> &'p mut T {
        let Self { pool, index } = self;

        *pool
            .alive
            .get_mut(index)
            .expect("inserter index is always within pool capacity") = true;

        pool.free_count = pool
            .free_count
            .checked_sub(1)
            .expect("an inserter only exists while the pool has a vacant slot");

        pool.current_index = pool.next_index(index);

        pool.slots.write(index, value)
    }
}

impl<T> fmt::Debug for WalkingPoolInserter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkingPoolInserter")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("index", &self.index)
            .finish()
    }
}

/// The state of one slot as seen by [`WalkingPool::slots()`].
#[derive(Debug)]
#[expect(
    clippy::exhaustive_enums,
    reason = "a slot is either alive or vacant, there is no third option"
)]
pub enum Slot<'p, T> {
    /// The slot holds a live item.
    Alive(&'p T),

    /// The slot is free.
    Vacant,
}

impl<'p, T> Slot<'p, T> {
    /// Returns the item if the slot is alive.
    #[must_use]
    pub fn alive(self) -> Option<&'p T> {
        match self {
            Self::Alive(item) => Some(item),
            Self::Vacant => None,
        }
    }

    #[must_use]
    #[expect(missing_docs, reason = "self-explanatory")]
    pub fn is_alive(&self) -> bool {
        matches!(self, Self::Alive(_))
    }
}

/// Iterator over every slot of a [`WalkingPool`], in index order, including vacant slots.
///
/// Created by [`WalkingPool::slots()`].
pub struct WalkingSlots<'p, T> {
    inner: Zip<slice::Iter<'p, bool>, slice::Iter<'p, MaybeUninit<T>>>,
}

impl<'p, T> Iterator for WalkingSlots<'p, T> {
    type Item = Slot<'p, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let (alive, item) = self.inner.next()?;

        Some(if *alive {
            // SAFETY: Slots marked alive always hold an initialized item and the shared borrow
            // of the pool held by the iterator prevents the item from being released meanwhile.
            Slot::Alive(unsafe { item.assume_init_ref() })
        } else {
            Slot::Vacant
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for WalkingSlots<'_, T> {}

impl<T> FusedIterator for WalkingSlots<'_, T> {}

impl<T> fmt::Debug for WalkingSlots<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkingSlots")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("remaining", &self.inner.len())
            .finish()
    }
}

impl<T> WalkingPool<T> {
    #[must_use]
    pub(crate) fn new_inner(capacity: NonZero<usize>, drop_policy: DropPolicy) -> Self {
        debug!(
            capacity = capacity.get(),
            item_type = type_name::<T>(),
            ?drop_policy,
            "creating WalkingPool"
        );

        Self {
            slots: OwnedSlots::owned(capacity),
            alive: vec![false; capacity.get()].into_boxed_slice(),
            current_index: 0,
            free_count: capacity.get(),
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

    /// Starts building a new [`WalkingPool`].
    ///
    /// Use this when you want to customize the pool configuration beyond the capacity.
    pub fn builder() -> WalkingPoolBuilder<T> {
        WalkingPoolBuilder::new()
    }

    /// The total number of slots in the pool.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// The number of live items in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.capacity()
            .checked_sub(self.free_count)
            .expect("free count never exceeds capacity")
    }

    #[must_use]
    #[expect(missing_docs, reason = "self-explanatory")]
    pub fn is_empty(&self) -> bool {
        self.free_count == self.capacity()
    }

    /// Whether every slot holds a live item. Check this before [`allocate()`][Self::allocate]
    /// unless you are prepared to handle [`WalkingAllocation::Full`].
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.free_count == 0
    }

    /// Whether the slot at `index` holds a live item.
    ///
    /// # Panics
    ///
    /// Panics if the index is not less than the capacity.
    #[must_use]
    pub fn is_alive(&self, index: usize) -> bool {
        *self.alive.get(index).unwrap_or_else(|| {
            panic!(
                "is_alive({index}) index out of bounds in WalkingPool of {} slots of {}",
                self.alive.len(),
                type_name::<T>()
            )
        })
    }

    /// Finds a vacant slot, starting from the scan cursor and wrapping around at the end.
    ///
    /// If the pool is full, no slot is allocated and the live item at the scan cursor is
    /// returned via [`WalkingAllocation::Full`] instead.
    pub fn allocate(&mut self) -> WalkingAllocation<'_, T> {
        #[cfg(debug_assertions)]
        self.integrity_check();

        if self.is_full() {
            let index = self.current_index;

            trace!(
                index,
                item_type = type_name::<T>(),
                "allocate() on full WalkingPool returned a live slot"
            );

            // SAFETY: Every slot of a full pool holds a live item.
            let existing = unsafe { self.slots.get_unchecked_mut(index) };

            return WalkingAllocation::Full { index, existing };
        }

        let index = self.next_vacant_index();

        WalkingAllocation::Vacant(WalkingPoolInserter { pool: self, index })
    }

    /// Inserts a value into a vacant slot and returns the slot index.
    ///
    /// # Panics
    ///
    /// Panics if the pool is full.
    pub fn insert(&mut self, value: T) -> usize {
        match self.allocate() {
            WalkingAllocation::Vacant(inserter) => {
                let index = inserter.index();
                inserter.insert(value);
                index
            }
            WalkingAllocation::Full { .. } => {
                panic!("cannot insert into a full WalkingPool of {}", type_name::<T>())
            }
        }
    }

    /// Inserts a value into a vacant slot and returns the slot index, or returns the value
    /// back if the pool is full.
    ///
    /// # Errors
    ///
    /// Returns the value if there is no vacant slot.
    pub fn try_insert(&mut self, value: T) -> Result<usize, T> {
        match self.allocate() {
            WalkingAllocation::Vacant(inserter) => {
                let index = inserter.index();
                inserter.insert(value);
                Ok(index)
            }
            WalkingAllocation::Full { .. } => Err(value),
        }
    }

    /// Removes the item at `index` and tears it down according to the pool's drop policy.
    ///
    /// No other item changes its index.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds or the slot is vacant.
    pub fn release(&mut self, index: usize) {
        let item = self.take_inner(index, "release");
        self.drop_policy.teardown(item);
    }

    /// Removes the item at `index` and returns it to the caller.
    ///
    /// No other item changes its index.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds or the slot is vacant.
    #[must_use]
    pub fn take(&mut self, index: usize) -> T {
        self.take_inner(index, "take")
    }

    fn take_inner(&mut self, index: usize, operation: &str) -> T {
        assert!(
            self.is_alive(index),
            "{operation}({index}) slot was vacant in WalkingPool of {}",
            type_name::<T>()
        );

        *self
            .alive
            .get_mut(index)
            .expect("bounds checked by is_alive() above") = false;

        self.free_count = self
            .free_count
            .checked_add(1)
            .expect("the slot was alive so free count must be below capacity");

        // SAFETY: The slot was alive, so it holds an initialized item. We just marked it vacant,
        // so the item will not be read from the slot again.
        unsafe { self.slots.take(index) }
    }

    /// # Panics
    ///
    /// Panics if the index is out of bounds or the slot is vacant.
    #[must_use]
    pub fn get(&self, index: usize) -> &T {
        assert!(
            self.is_alive(index),
            "get({index}) slot was vacant in WalkingPool of {}",
            type_name::<T>()
        );

        // SAFETY: Alive slots hold an initialized item.
        unsafe { self.slots.get_unchecked(index) }
    }

    /// # Panics
    ///
    /// Panics if the index is out of bounds or the slot is vacant.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> &mut T {
        assert!(
            self.is_alive(index),
            "get_mut({index}) slot was vacant in WalkingPool of {}",
            type_name::<T>()
        );

        // SAFETY: Alive slots hold an initialized item.
        unsafe { self.slots.get_unchecked_mut(index) }
    }

    /// Returns the index of the slot holding `item`, or `None` if `item` is not a live item
    /// of this pool.
    #[must_use]
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.slots
            .index_of(item)
            .filter(|&index| self.is_alive(index))
    }

    /// Visits every slot of the pool in index order, vacant slots included.
    pub fn slots(&self) -> WalkingSlots<'_, T> {
        WalkingSlots {
            inner: self.alive.iter().zip(self.slots.as_uninit_slice()),
        }
    }

    /// Visits every live item with its index, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots()
            .enumerate()
            .filter_map(|(index, slot)| slot.alive().map(|item| (index, item)))
    }

    /// Visits every live item with its index, in index order, allowing modification.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        self.alive
            .iter()
            .zip(self.slots.as_uninit_mut_slice())
            .enumerate()
            .filter_map(|(index, (alive, item))| {
                // SAFETY: Slots marked alive always hold an initialized item.
                alive.then(|| (index, unsafe { item.assume_init_mut() }))
            })
    }

    fn next_index(&self, index: usize) -> usize {
        // Cannot overflow because index is less than capacity.
        let next = index.wrapping_add(1);

        if next >= self.capacity() { 0 } else { next }
    }

    /// Only called on a pool with at least one vacant slot, so the scan always terminates.
    fn next_vacant_index(&self) -> usize {
        debug_assert!(!self.is_full());

        let mut index = self.current_index;

        while self.is_alive(index) {
            index = self.next_index(index);
        }

        index
    }

    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    #[cfg(debug_assertions)]
    pub(crate) fn integrity_check(&self) {
        let observed_alive = self.alive.iter().filter(|alive| **alive).count();

        assert!(
            observed_alive == self.len(),
            "alive slot count {observed_alive} does not match len {} in WalkingPool of {}",
            self.len(),
            type_name::<T>()
        );

        assert!(
            self.current_index < self.capacity(),
            "scan cursor {} out of bounds in WalkingPool of {}",
            self.current_index,
            type_name::<T>()
        );
    }
}

impl<T> Index<usize> for WalkingPool<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.get(index)
    }
}

impl<T> IndexMut<usize> for WalkingPool<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        self.get_mut(index)
    }
}

impl<'p, T> IntoIterator for &'p WalkingPool<T> {
    type Item = Slot<'p, T>;
    type IntoIter = WalkingSlots<'p, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots()
    }
}

impl<T> fmt::Debug for WalkingPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkingPool")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("current_index", &self.current_index)
            .field("drop_policy", &self.drop_policy)
            .finish()
    }
}

impl<T> Drop for WalkingPool<T> {
    fn drop(&mut self) {
        let was_empty = self.is_empty();

        if !was_empty {
            trace!(
                len = self.len(),
                item_type = type_name::<T>(),
                "dropping non-empty WalkingPool"
            );
        }

        if self.drop_policy.drops_items() && mem::needs_drop::<T>() {
            for (index, alive) in self.alive.iter_mut().enumerate() {
                if mem::take(alive) {
                    // SAFETY: The slot was alive so it holds an initialized item. We marked it
                    // vacant before dropping so it cannot be dropped twice.
                    unsafe { self.slots.drop_in_place(index) };
                }
            }
        }

        // If we are already panicking, we do not want to panic again because that will
        // simply obscure whatever the original panic was, leading to debug difficulties.
        if self.drop_policy == DropPolicy::MustNotDropItems && !thread::panicking() {
            assert!(
                was_empty,
                "dropped a non-empty WalkingPool of {} with a policy that says it must be empty when dropped",
                type_name::<T>()
            );
        }
    }
}
