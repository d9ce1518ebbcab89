use std::any::type_name;
use std::fmt;
use std::mem::MaybeUninit;
use std::num::NonZero;

use crate::{BorrowableSlots, DropPolicy, RingBuffer};

/// Builder for creating an instance of [`RingBuffer`].
///
/// The choice between self-allocated and caller-supplied storage is made here and cannot be
/// changed after the buffer is built:
///
/// * With only [`capacity()`][1], the buffer allocates its own storage and frees it when dropped.
/// * With [`storage()`][2], the buffer uses caller-supplied memory and never frees it. The
///   capacity defaults to the length of the storage and may be lowered via [`capacity()`][1].
///
/// # Examples
///
/// ```
/// use std::mem::MaybeUninit;
///
/// use fixed_collections::RingBuffer;
/// use new_zealand::nz;
///
/// // Self-allocated storage.
/// let owned = RingBuffer::<u32>::builder().capacity(nz!(8)).build();
/// assert!(!owned.is_borrowed());
///
/// // Caller-supplied storage, using only the first 4 slots.
/// let mut storage = [MaybeUninit::<u32>::uninit(); 16];
/// let borrowed = RingBuffer::builder()
///     .storage(&mut storage)
///     .capacity(nz!(4))
///     .build();
/// assert!(borrowed.is_borrowed());
/// assert_eq!(borrowed.capacity(), 4);
/// ```
///
/// [1]: Self::capacity
/// [2]: Self::storage
#[must_use]
pub struct RingBufferBuilder<'b, T> {
    capacity: Option<NonZero<usize>>,
    storage: Option<&'b mut [MaybeUninit<T>]>,
    drop_policy: DropPolicy,
}

impl<T> fmt::Debug for RingBufferBuilder<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBufferBuilder")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("capacity", &self.capacity)
            .field(
                "storage_len",
                &self.storage.as_ref().map(|storage| storage.len()),
            )
            .field("drop_policy", &self.drop_policy)
            .finish()
    }
}

impl<'b, T> RingBufferBuilder<'b, T> {
    pub(crate) fn new() -> Self {
        Self {
            capacity: None,
            storage: None,
            drop_policy: DropPolicy::default(),
        }
    }

    /// Sets the number of items the buffer can hold.
    ///
    /// Mandatory unless [`storage()`][Self::storage] is used, in which case it must not exceed
    /// the length of the storage.
    pub fn capacity(mut self, capacity: NonZero<usize>) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Uses caller-supplied memory as the backing storage.
    ///
    /// The buffer reads and writes within this memory but never frees it. Items still in the
    /// buffer when it is dropped are torn down according to the drop policy, leaving the storage
    /// uninitialized again for the caller to reuse.
    pub fn storage(mut self, storage: &'b mut [MaybeUninit<T>]) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Sets the [drop policy][DropPolicy] for the buffer. This governs how items discarded when
    /// pushing into a full buffer and items remaining when the buffer is dropped are torn down.
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Builds the ring buffer with the specified configuration.
    ///
    /// # Panics
    ///
    /// Panics if neither capacity nor storage has been set, if the storage is empty or if the
    /// capacity exceeds the length of the storage.
    #[must_use]
    pub fn build(self) -> RingBuffer<'b, T> {
        let slots = match self.storage {
            Some(storage) => {
                let capacity = self.capacity.map_or(storage.len(), NonZero::get);

                assert!(
                    capacity <= storage.len(),
                    "RingBuffer capacity {capacity} exceeds the {} slots of supplied storage for {}",
                    storage.len(),
                    type_name::<T>()
                );

                let (used, _) = storage.split_at_mut(capacity);
                BorrowableSlots::borrowed(used)
            }
            None => BorrowableSlots::owned(self.capacity.expect(
                "capacity must be set using .capacity() or .storage() before calling .build()",
            )),
        };

        RingBuffer::new_inner(slots, self.drop_policy)
    }
}
