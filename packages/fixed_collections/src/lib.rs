#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Fixed-capacity containers that allocate all their storage up front and never allocate per
//! item afterwards.
//!
//! * [`WalkingPool`] - object pool with stable indexes. Vacant slots are found by walking
//!   forward from a cursor, so reuse favors slots ahead of the most recent allocation.
//! * [`SwappingPool`] - object pool that keeps its items densely packed in `[0, len)`.
//!   Releasing an item moves the last item into the vacated slot, so indexes are not stable.
//! * [`RingBuffer`] - double-ended queue that overwrites the opposite end when full. It can
//!   allocate its own storage or work inside caller-supplied memory.
//! * [`FixedVec`] - vector with a capacity chosen once, optionally after construction.
//! * [`StackVec`] - vector with a compile-time capacity and inline storage.
//!
//! The pools and the ring buffer take a [`DropPolicy`] that governs how released, discarded and
//! remaining items are torn down.
//!
//! # Allocating in a full pool
//!
//! Allocating in a full pool is not an error. Instead of a vacant slot, the pool hands out an
//! existing item that the caller may inspect or overwrite. This is reported explicitly as a
//! [`Full`][WalkingAllocation::Full] allocation and consumes no capacity.
//!
//! ```
//! use fixed_collections::{SwappingAllocation, SwappingPool};
//! use new_zealand::nz;
//!
//! let mut pool = SwappingPool::<&str>::new(nz!(1));
//! pool.insert("only");
//!
//! match pool.allocate() {
//!     SwappingAllocation::Vacant(inserter) => {
//!         inserter.insert("never happens");
//!     }
//!     SwappingAllocation::Full { index, existing } => {
//!         assert_eq!(index, 0);
//!         assert_eq!(*existing, "only");
//!     }
//! }
//!
//! assert_eq!(pool.len(), 1);
//! ```
//!
//! # Overwriting ring buffer
//!
//! ```
//! use fixed_collections::RingBuffer;
//! use new_zealand::nz;
//!
//! let mut recent = RingBuffer::<u32>::new(nz!(3));
//!
//! for sample in 1..=10 {
//!     recent.push_back(sample);
//! }
//!
//! assert!(recent.iter().eq(&[8, 9, 10]));
//! ```

mod drop_policy;
mod fixed_vec;
mod raw_slots;
mod ring_buffer;
mod ring_buffer_builder;
mod stack_vec;
mod swapping_pool;
mod swapping_pool_builder;
mod walking_pool;
mod walking_pool_builder;

pub use drop_policy::*;
pub use fixed_vec::*;
pub(crate) use raw_slots::*;
pub use ring_buffer::*;
pub use ring_buffer_builder::*;
pub use stack_vec::*;
pub use swapping_pool::*;
pub use swapping_pool_builder::*;
pub use walking_pool::*;
pub use walking_pool_builder::*;
