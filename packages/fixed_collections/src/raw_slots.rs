use std::any::type_name;
use std::mem::MaybeUninit;
use std::num::NonZero;
use std::ops::Range;
use std::ptr;
use std::slice;

use num_integer::Integer;

/// Memory that can back a [`RawSlots`] block.
///
/// Implementations must hand out the same slice, with the same length, on every call.
pub(crate) trait SlotStorage {
    type Item;

    fn uninit_slice(&self) -> &[MaybeUninit<Self::Item>];

    fn uninit_mut_slice(&mut self) -> &mut [MaybeUninit<Self::Item>];
}

impl<T> SlotStorage for Box<[MaybeUninit<T>]> {
    type Item = T;

    fn uninit_slice(&self) -> &[MaybeUninit<T>] {
        self
    }

    fn uninit_mut_slice(&mut self) -> &mut [MaybeUninit<T>] {
        self
    }
}

/// Storage that either belongs to the container or is borrowed from the caller, who then
/// remains responsible for the memory.
#[derive(Debug)]
pub(crate) enum Storage<'b, T> {
    Owned(Box<[MaybeUninit<T>]>),

    Borrowed(&'b mut [MaybeUninit<T>]),
}

impl<T> SlotStorage for Storage<'_, T> {
    type Item = T;

    fn uninit_slice(&self) -> &[MaybeUninit<T>] {
        match self {
            Self::Owned(slots) => slots,
            Self::Borrowed(slots) => slots,
        }
    }

    fn uninit_mut_slice(&mut self) -> &mut [MaybeUninit<T>] {
        match self {
            Self::Owned(slots) => slots,
            Self::Borrowed(slots) => slots,
        }
    }
}

/// Fixed-capacity block of possibly-uninitialized item slots backing every container in this
/// crate.
///
/// `RawSlots` does not know which slots hold a value - that is tracked by the owning container.
/// Dropping `RawSlots` releases owned memory without running any item destructors, so the owning
/// container must tear down its occupied slots first.
#[derive(Debug)]
pub(crate) struct RawSlots<S> {
    storage: S,
}

/// Slots in memory that always belongs to the container.
pub(crate) type OwnedSlots<T> = RawSlots<Box<[MaybeUninit<T>]>>;

/// Slots in memory that belongs either to the container or to the caller.
pub(crate) type BorrowableSlots<'b, T> = RawSlots<Storage<'b, T>>;

impl<T> OwnedSlots<T> {
    /// Allocates a block of `capacity` uninitialized slots.
    #[must_use]
    pub(crate) fn owned(capacity: NonZero<usize>) -> Self {
        Self {
            storage: Box::new_uninit_slice(capacity.get()),
        }
    }
}

impl<'b, T> BorrowableSlots<'b, T> {
    /// Allocates a block of `capacity` uninitialized slots.
    #[must_use]
    pub(crate) fn owned(capacity: NonZero<usize>) -> Self {
        Self {
            storage: Storage::Owned(Box::new_uninit_slice(capacity.get())),
        }
    }

    /// Uses caller-supplied memory as the block. The capacity is the length of the slice.
    ///
    /// # Panics
    ///
    /// Panics if the slice is empty.
    #[must_use]
    pub(crate) fn borrowed(storage: &'b mut [MaybeUninit<T>]) -> Self {
        assert!(
            !storage.is_empty(),
            "borrowed storage for items of {} must have non-zero capacity",
            type_name::<T>()
        );

        Self {
            storage: Storage::Borrowed(storage),
        }
    }

    #[must_use]
    pub(crate) fn is_borrowed(&self) -> bool {
        matches!(self.storage, Storage::Borrowed(_))
    }
}

impl<T, S: SlotStorage<Item = T>> RawSlots<S> {
    #[must_use]
    pub(crate) fn capacity(&self) -> usize {
        self.as_uninit_slice().len()
    }

    #[must_use]
    pub(crate) fn as_uninit_slice(&self) -> &[MaybeUninit<T>] {
        self.storage.uninit_slice()
    }

    #[must_use]
    pub(crate) fn as_uninit_mut_slice(&mut self) -> &mut [MaybeUninit<T>] {
        self.storage.uninit_mut_slice()
    }

    fn slot(&self, index: usize) -> &MaybeUninit<T> {
        let capacity = self.capacity();

        self.as_uninit_slice().get(index).unwrap_or_else(|| {
            panic!(
                "slot {index} index out of bounds in storage of {capacity} slots of {}",
                type_name::<T>()
            )
        })
    }

    fn slot_mut(&mut self, index: usize) -> &mut MaybeUninit<T> {
        let capacity = self.capacity();

        self.as_uninit_mut_slice().get_mut(index).unwrap_or_else(|| {
            panic!(
                "slot {index} index out of bounds in storage of {capacity} slots of {}",
                type_name::<T>()
            )
        })
    }

    /// Writes a value into a slot, returning a reference to it. Any value already in the slot
    /// is overwritten without being dropped.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub(crate) fn write(&mut self, index: usize, value: T) -> &mut T {
        self.slot_mut(index).write(value)
    }

    /// # Safety
    ///
    /// The slot must hold an initialized value.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[must_use]
    pub(crate) unsafe fn get_unchecked(&self, index: usize) -> &T {
        // SAFETY: Forwarding guarantee from the caller.
        unsafe { self.slot(index).assume_init_ref() }
    }

    /// # Safety
    ///
    /// The slot must hold an initialized value.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[must_use]
    pub(crate) unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        // SAFETY: Forwarding guarantee from the caller.
        unsafe { self.slot_mut(index).assume_init_mut() }
    }

    /// Moves the value out of a slot, leaving the slot logically uninitialized.
    ///
    /// # Safety
    ///
    /// The slot must hold an initialized value and the caller must treat the slot as
    /// uninitialized afterwards.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[must_use]
    pub(crate) unsafe fn take(&mut self, index: usize) -> T {
        // SAFETY: Forwarding guarantee from the caller.
        unsafe { self.slot(index).assume_init_read() }
    }

    /// Runs the destructor of the value in a slot, leaving the slot uninitialized.
    ///
    /// # Safety
    ///
    /// The slot must hold an initialized value and the caller must treat the slot as
    /// uninitialized afterwards.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub(crate) unsafe fn drop_in_place(&mut self, index: usize) {
        // SAFETY: Forwarding guarantee from the caller.
        unsafe { self.slot_mut(index).assume_init_drop() }
    }

    /// Moves the raw representation of the value at `from` into the slot at `to` without
    /// running any clone or drop logic. Afterwards the value lives at `to` and `from` is
    /// logically uninitialized.
    ///
    /// # Safety
    ///
    /// `from` must hold an initialized value. Any value in `to` must already have been taken
    /// out or torn down, as it is overwritten without being dropped.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds or if the indexes are equal.
    pub(crate) unsafe fn relocate(&mut self, from: usize, to: usize) {
        assert!(
            from != to,
            "cannot relocate slot {from} onto itself in storage of {}",
            type_name::<T>()
        );

        let capacity = self.capacity();
        assert!(
            from < capacity && to < capacity,
            "cannot relocate slot {from} to slot {to} in storage of {capacity} slots of {}",
            type_name::<T>()
        );

        let base = self.as_uninit_mut_slice().as_mut_ptr();

        // SAFETY: Both indexes are in bounds (asserted above) and refer to different slots of
        // the same block, so the two single-slot spans do not overlap.
        unsafe {
            ptr::copy_nonoverlapping(base.add(from), base.add(to), 1);
        }
    }

    /// Shifts the values in `range` up by one slot, so that slot `range.start` becomes
    /// logically uninitialized and the last value moves to `range.end`.
    ///
    /// # Safety
    ///
    /// Every slot in `range` must hold an initialized value and `range.end` must not hold a value
    /// that still needs to be dropped.
    ///
    /// # Panics
    ///
    /// Panics if `range.end` is out of bounds.
    pub(crate) unsafe fn shift_up(&mut self, range: Range<usize>) {
        assert!(
            range.end < self.capacity(),
            "cannot shift slots {range:?} up by one in storage of {} slots of {}",
            self.capacity(),
            type_name::<T>()
        );

        let count = range.len();
        let base = self.as_uninit_mut_slice().as_mut_ptr();

        // SAFETY: range.end < capacity so both source and target spans are within the block.
        // The spans overlap, which `ptr::copy` permits.
        unsafe {
            let source = base.add(range.start);
            ptr::copy(source, source.add(1), count);
        }
    }

    /// # Safety
    ///
    /// Every slot in `range` must hold an initialized value.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    #[must_use]
    pub(crate) unsafe fn initialized(&self, range: Range<usize>) -> &[T] {
        let slots = self.as_uninit_slice().get(range.clone()).unwrap_or_else(|| {
            panic!(
                "slots {range:?} out of bounds in storage of {} slots of {}",
                self.capacity(),
                type_name::<T>()
            )
        });

        // SAFETY: MaybeUninit<T> has the same layout as T and the caller guarantees that
        // every slot in the range is initialized.
        unsafe { slice::from_raw_parts(slots.as_ptr().cast::<T>(), slots.len()) }
    }

    /// # Safety
    ///
    /// Every slot in `range` must hold an initialized value.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    #[must_use]
    pub(crate) unsafe fn initialized_mut(&mut self, range: Range<usize>) -> &mut [T] {
        let capacity = self.capacity();

        let slots = self
            .as_uninit_mut_slice()
            .get_mut(range.clone())
            .unwrap_or_else(|| {
                panic!(
                    "slots {range:?} out of bounds in storage of {capacity} slots of {}",
                    type_name::<T>()
                )
            });

        // SAFETY: Forwarding guarantee from the caller.
        unsafe { assume_init_mut(slots) }
    }

    /// Two disjoint ranges of initialized values, borrowed mutably at the same time. The `low`
    /// range must end at or before the start of the `high` range.
    ///
    /// # Safety
    ///
    /// Every slot in both ranges must hold an initialized value.
    ///
    /// # Panics
    ///
    /// Panics if either range is out of bounds or if the ranges are out of order.
    #[must_use]
    pub(crate) unsafe fn initialized_pair_mut(
        &mut self,
        high: Range<usize>,
        low: Range<usize>,
    ) -> (&mut [T], &mut [T]) {
        assert!(
            low.end <= high.start,
            "slots {low:?} must precede slots {high:?} in storage of {}",
            type_name::<T>()
        );

        let capacity = self.capacity();
        let (below, above) = self.as_uninit_mut_slice().split_at_mut(high.start);

        let high_len = high.len();
        let (Some(high_slots), Some(low_slots)) = (above.get_mut(..high_len), below.get_mut(low))
        else {
            panic!(
                "slots out of bounds in storage of {capacity} slots of {}",
                type_name::<T>()
            );
        };

        // SAFETY: Forwarding guarantee from the caller.
        unsafe { (assume_init_mut(high_slots), assume_init_mut(low_slots)) }
    }

    /// Identifies the slot that `item` refers to, if it refers to a slot of this block.
    ///
    /// Only the address is considered. Whether the slot holds a value is up to the caller.
    #[must_use]
    pub(crate) fn index_of(&self, item: &T) -> Option<usize> {
        index_of_in(self.as_uninit_slice(), item)
    }
}

/// # Safety
///
/// Every slot must hold an initialized value.
unsafe fn assume_init_mut<T>(slots: &mut [MaybeUninit<T>]) -> &mut [T] {
    // SAFETY: MaybeUninit<T> has the same layout as T and the caller guarantees that
    // every slot is initialized.
    unsafe { slice::from_raw_parts_mut(slots.as_mut_ptr().cast::<T>(), slots.len()) }
}

/// Resolves the slot index of `item` within `slots` by address. Zero-sized items have no
/// distinguishable addresses, so they never resolve.
#[must_use]
pub(crate) fn index_of_in<T>(slots: &[MaybeUninit<T>], item: &T) -> Option<usize> {
    let item_size = size_of::<T>();

    if item_size == 0 {
        return None;
    }

    let offset = ptr::from_ref(item)
        .addr()
        .checked_sub(slots.as_ptr().addr())?;

    let (index, misalignment) = offset.div_rem(&item_size);

    (misalignment == 0 && index < slots.len()).then_some(index)
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
    use testing::DropTracker;

    use super::*;

    #[test]
    fn owned_has_requested_capacity() {
        let slots = OwnedSlots::<u64>::owned(nz!(7));
        assert_eq!(slots.capacity(), 7);

        let slots = BorrowableSlots::<u64>::owned(nz!(7));
        assert_eq!(slots.capacity(), 7);
        assert!(!slots.is_borrowed());
    }

    #[test]
    fn borrowed_uses_slice_length() {
        let mut storage = [const { MaybeUninit::<u64>::uninit() }; 5];
        let slots = BorrowableSlots::borrowed(&mut storage);

        assert_eq!(slots.capacity(), 5);
        assert!(slots.is_borrowed());
    }

    #[test]
    #[should_panic]
    fn borrowed_empty_panics() {
        let mut storage: [MaybeUninit<u64>; 0] = [];
        _ = BorrowableSlots::borrowed(&mut storage);
    }

    #[test]
    fn write_take_roundtrip() {
        let mut slots = OwnedSlots::<String>::owned(nz!(2));

        slots.write(1, "hello".to_string()).push_str(" world");

        // SAFETY: Slot 1 was written above.
        assert_eq!(unsafe { slots.get_unchecked(1) }, "hello world");

        // SAFETY: Slot 1 was written above and is not used after taking.
        let value = unsafe { slots.take(1) };
        assert_eq!(value, "hello world");
    }

    #[test]
    #[should_panic]
    fn write_out_of_bounds_panics() {
        let mut slots = OwnedSlots::<u32>::owned(nz!(2));
        slots.write(2, 1);
    }

    #[test]
    fn drop_in_place_runs_destructor() {
        let drops = Rc::new(Cell::new(0));
        let mut slots = OwnedSlots::<DropTracker>::owned(nz!(1));

        slots.write(0, DropTracker::new(0, &drops));
        assert_eq!(drops.get(), 0);

        // SAFETY: Slot 0 was written above.
        unsafe { slots.drop_in_place(0) };
        assert_eq!(drops.get(), 1);

        // Dropping the storage does not touch items.
        drop(slots);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn relocate_moves_without_drop() {
        let drops = Rc::new(Cell::new(0));
        let mut slots = OwnedSlots::<DropTracker>::owned(nz!(3));

        slots.write(2, DropTracker::new(22, &drops));

        // SAFETY: Slot 2 is initialized, slot 0 is not.
        unsafe { slots.relocate(2, 0) };
        assert_eq!(drops.get(), 0);

        // SAFETY: The value now lives in slot 0.
        let moved = unsafe { slots.take(0) };
        assert_eq!(moved.id(), 22);
        drop(moved);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    #[should_panic]
    fn relocate_onto_itself_panics() {
        let mut slots = OwnedSlots::<u32>::owned(nz!(3));
        slots.write(1, 5);

        // SAFETY: Never reached past the assertion.
        unsafe { slots.relocate(1, 1) };
    }

    #[test]
    fn shift_up_moves_range() {
        let mut slots = OwnedSlots::<u32>::owned(nz!(4));
        slots.write(0, 10);
        slots.write(1, 11);
        slots.write(2, 12);

        // SAFETY: Slots 1 and 2 are initialized, slot 3 is not.
        unsafe { slots.shift_up(1..3) };
        slots.write(1, 99);

        // SAFETY: All four slots are initialized now.
        assert_eq!(unsafe { slots.initialized(0..4) }, &[10, 99, 11, 12]);
    }

    #[test]
    #[should_panic]
    fn shift_up_past_capacity_panics() {
        let mut slots = OwnedSlots::<u32>::owned(nz!(2));
        slots.write(0, 1);
        slots.write(1, 2);

        // SAFETY: Never reached past the assertion.
        unsafe { slots.shift_up(0..2) };
    }

    #[test]
    fn initialized_mut_allows_modification() {
        let mut slots = OwnedSlots::<u32>::owned(nz!(3));
        slots.write(0, 1);
        slots.write(1, 2);

        // SAFETY: Slots 0 and 1 are initialized.
        for value in unsafe { slots.initialized_mut(0..2) } {
            *value *= 10;
        }

        // SAFETY: Slots 0 and 1 are initialized.
        assert_eq!(unsafe { slots.initialized(0..2) }, &[10, 20]);
    }

    #[test]
    fn initialized_pair_mut_borrows_both_ranges() {
        let mut slots = OwnedSlots::<u32>::owned(nz!(5));
        slots.write(0, 1);
        slots.write(3, 4);
        slots.write(4, 5);

        // SAFETY: Slots 0, 3 and 4 are initialized.
        let (high, low) = unsafe { slots.initialized_pair_mut(3..5, 0..1) };
        assert_eq!(high, &[4, 5]);
        assert_eq!(low, &[1]);

        high[0] = 40;
        low[0] = 10;

        // SAFETY: Slot 0 is initialized.
        assert_eq!(unsafe { slots.initialized(0..1) }, &[10]);
    }

    #[test]
    #[should_panic]
    fn initialized_pair_mut_out_of_order_panics() {
        let mut slots = OwnedSlots::<u32>::owned(nz!(4));
        slots.write(0, 1);
        slots.write(3, 4);

        // SAFETY: Never reached past the assertion.
        _ = unsafe { slots.initialized_pair_mut(0..1, 3..4) };
    }

    #[test]
    fn index_of_resolves_own_slots_only() {
        let mut slots = OwnedSlots::<u64>::owned(nz!(4));
        slots.write(0, 1);
        slots.write(3, 4);

        // SAFETY: Slot 3 is initialized.
        let item = unsafe { slots.get_unchecked(3) };
        assert_eq!(slots.index_of(item), Some(3));

        let outsider = 4_u64;
        assert_eq!(slots.index_of(&outsider), None);
    }

    #[test]
    fn index_of_zero_sized_is_none() {
        let mut slots = OwnedSlots::<()>::owned(nz!(2));
        slots.write(0, ());

        // SAFETY: Slot 0 is initialized.
        let item = unsafe { slots.get_unchecked(0) };
        assert_eq!(slots.index_of(item), None);
    }
}
