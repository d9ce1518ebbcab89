//! Using the overwriting ring buffer of the `fixed_collections` crate:
//!
//! * Keeping only the most recent samples of an unbounded stream.
//! * Pushing at either end and seeing which end gets discarded when full.
//! * Running the buffer inside memory owned by the caller.

use std::mem::MaybeUninit;

use fixed_collections::RingBuffer;
use new_zealand::nz;
use tracing::Level;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(Level::TRACE)
        .init();

    let mut recent = RingBuffer::<u32>::new(nz!(4));

    // Only the last 4 samples survive.
    for sample in 1..=10 {
        recent.push_back(sample);
    }

    println!("Most recent samples: {:?}", recent.iter().collect::<Vec<_>>());

    // Pushing at the front of a full buffer discards the newest item instead.
    recent.push_front(0);
    println!("After push_front(0): {:?}", recent.iter().collect::<Vec<_>>());

    println!("Oldest: {:?}, newest: {:?}", recent.front(), recent.back());

    // The caller can provide the memory, for example from the stack.
    let mut storage = [MaybeUninit::<u32>::uninit(); 2];

    {
        let mut ring = RingBuffer::with_storage(&mut storage);

        ring.push_front(9);
        ring.push_front(8);

        println!(
            "Ring over caller storage (borrowed: {}): {:?}",
            ring.is_borrowed(),
            ring.iter().collect::<Vec<_>>()
        );

        while let Some(value) = ring.try_pop_front() {
            println!("Popped {value}");
        }
    }

    // The buffer is gone but the storage is still ours to use.
    if let Some(slot) = storage.first_mut() {
        slot.write(42);
        println!("Storage is still usable after the buffer is dropped");
    }
}
