use std::mem;

/// Determines how items are torn down when they leave a container.
///
/// This governs items released from a pool, items discarded by a full
/// [`RingBuffer`][crate::RingBuffer] and any items still present when the container
/// itself is dropped. By default, such items are dropped.
///
/// # Examples
///
/// ```
/// use fixed_collections::{DropPolicy, SwappingPool};
/// use new_zealand::nz;
///
/// // The drop policy is set at pool creation time.
/// let pool = SwappingPool::<u32>::builder()
///     .capacity(nz!(16))
///     .drop_policy(DropPolicy::MustNotDropItems)
///     .build();
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum DropPolicy {
    /// Items are dropped when they leave the container and when the container is dropped.
    /// This is the default.
    #[default]
    MayDropItems,

    /// Items are dropped when explicitly released but the container will panic if it still
    /// contains items when it is dropped.
    ///
    /// This may be valuable if there are external requirements before the items can be dropped.
    /// For example, it may be known that unsafe code holds pointers to the items, with items
    /// only released after such pointers have been discarded.
    MustNotDropItems,

    /// Items are never dropped. Released, discarded and remaining items are forgotten instead.
    ///
    /// This skips the teardown work for item types that own no resources. For item types that
    /// do own resources (heap memory, handles), those resources are leaked.
    ForgetItems,
}

impl DropPolicy {
    /// Disposes of an item that has left the container.
    pub(crate) fn teardown<T>(self, item: T) {
        match self {
            Self::MayDropItems | Self::MustNotDropItems => drop(item),
            Self::ForgetItems => mem::forget(item),
        }
    }

    /// Whether items still inside the container need their destructor run in place.
    #[must_use]
    pub(crate) fn drops_items(self) -> bool {
        !matches!(self, Self::ForgetItems)
    }
}
