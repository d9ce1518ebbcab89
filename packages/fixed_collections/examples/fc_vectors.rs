//! The fixed-capacity vectors of the `fixed_collections` crate:
//!
//! * `FixedVec` declared first and given its capacity later.
//! * `StackVec` with a compile-time capacity and no heap allocation at all.

use fixed_collections::{FixedVec, StackVec};
use new_zealand::nz;

fn main() {
    tracing_subscriber::fmt().init();

    // The vector can be declared before its capacity is decided.
    let mut names = FixedVec::<String>::new();
    println!("Initialized: {}", names.is_initialized());

    names.init(nz!(3));
    names.push("Alice".to_string());
    names.push("Charlie".to_string());
    names.insert(1, "Bob".to_string());

    println!("Names: {:?}", names.as_slice());

    if let Err(rejected) = names.try_push("Dave".to_string()) {
        println!("No room for {rejected}, capacity is {}", names.capacity());
    }

    let mut digits = StackVec::<u8, 4>::new();

    for digit in [3, 1, 4, 1, 5, 9] {
        if digits.try_push(digit).is_err() {
            println!("Stack vector is full, dropping {digit}");
        }
    }

    println!("Digits: {:?}", digits.as_slice());

    while let Some(digit) = digits.pop() {
        println!("Popped {digit}");
    }
}
