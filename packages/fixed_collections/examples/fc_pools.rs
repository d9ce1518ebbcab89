//! Basic usage of the two object pools in the `fixed_collections` crate:
//!
//! * Creating a pool with a fixed capacity.
//! * Constructing items in place through an inserter.
//! * Releasing items and watching them get torn down.
//! * Iterating over the live items.
//!
//! The crate's own trace events are printed alongside the output.

use fixed_collections::{SwappingPool, WalkingAllocation, WalkingPool};
use new_zealand::nz;
use tracing::Level;

/// Announces its construction and destruction so the pool lifecycle is visible.
struct Noisy {
    a: i32,
    b: i32,
}

impl Noisy {
    fn new(a: i32, b: i32) -> Self {
        println!("Created!");
        Self { a, b }
    }
}

impl Drop for Noisy {
    fn drop(&mut self) {
        println!("Destroyed!");
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(Level::TRACE)
        .init();

    walking_pool();
    swapping_pool();
}

fn walking_pool() {
    println!("\nWALKING POOL\n");

    let mut pool = WalkingPool::<Noisy>::new(nz!(32));

    // The inserter knows its index before the item exists, which lets the item refer to
    // its own slot if it needs to.
    if let WalkingAllocation::Vacant(inserter) = pool.allocate() {
        let index = inserter.index();
        let item = inserter.insert(Noisy::new(10, 10));
        println!("Item at index {index}: {}, {}", item.a, item.b);
    }

    let second = pool.insert(Noisy::new(20, 20));
    pool.release(second);

    // Released slots behind the cursor are only revisited after the cursor wraps around.
    let third = pool.insert(Noisy::new(30, 30));
    println!("Third item went to index {third}");

    // The pool drops the remaining items here, when leaving the scope.
}

fn swapping_pool() {
    println!("\nSWAPPING POOL\n");

    let mut pool = SwappingPool::<Noisy>::new(nz!(32));

    let first = pool.insert(Noisy::new(10, 10));

    // Releasing tears the item down and frees its slot for reuse.
    _ = pool.release(first);

    for i in 0..40 {
        // Do not add a new one if full.
        if !pool.is_full() {
            pool.insert(Noisy::new(i, i));
        }
    }

    // Releasing from the middle moves the last item into the gap.
    if let Some(relocated_from) = pool.release(5) {
        println!("Item from index {relocated_from} moved to index 5");
    }

    for item in &pool {
        println!("My struct: {}, {}", item.a, item.b);
    }

    // The pool drops the remaining items here, when leaving the scope.
}
