use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::num::NonZero;

use crate::{DropPolicy, WalkingPool};

/// Builder for creating an instance of [`WalkingPool`].
///
/// The capacity is mandatory, whereas other settings are optional. If you only need to set the
/// capacity, [`WalkingPool::new()`][1] is a shorthand for that.
///
/// # Examples
///
/// ```
/// use fixed_collections::{DropPolicy, WalkingPool};
/// use new_zealand::nz;
///
/// let pool = WalkingPool::<u32>::builder()
///     .capacity(nz!(64))
///     .drop_policy(DropPolicy::MayDropItems)
///     .build();
///
/// assert_eq!(pool.capacity(), 64);
/// ```
///
/// [1]: WalkingPool::new
#[must_use]
pub struct WalkingPoolBuilder<T> {
    capacity: Option<NonZero<usize>>,
    drop_policy: DropPolicy,

    _item: PhantomData<T>,
}

impl<T> fmt::Debug for WalkingPoolBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkingPoolBuilder")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("capacity", &self.capacity)
            .field("drop_policy", &self.drop_policy)
            .finish()
    }
}

impl<T> WalkingPoolBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            capacity: None,
            drop_policy: DropPolicy::default(),
            _item: PhantomData,
        }
    }

    /// Sets the number of slots in the pool. The pool never grows beyond this.
    pub fn capacity(mut self, capacity: NonZero<usize>) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Sets the [drop policy][DropPolicy] for the pool. This governs how released items
    /// and items remaining when the pool is dropped are torn down.
    ///
    /// # Examples
    ///
    /// ```
    /// use fixed_collections::{DropPolicy, WalkingPool};
    /// use new_zealand::nz;
    ///
    /// let pool = WalkingPool::<u32>::builder()
    ///     .capacity(nz!(8))
    ///     .drop_policy(DropPolicy::ForgetItems)
    ///     .build();
    /// ```
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Builds the pool with the specified configuration.
    ///
    /// # Panics
    ///
    /// Panics if no capacity has been set.
    #[must_use]
    pub fn build(self) -> WalkingPool<T> {
        let capacity = self
            .capacity
            .expect("capacity must be set using .capacity() before calling .build()");

        WalkingPool::new_inner(capacity, self.drop_policy)
    }
}
