#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for testing and examples in `fixed_collections` packages.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Seed used by [`seeded_rng()`] when a test has no reason to pick its own.
pub const DEFAULT_SEED: u64 = 42;

/// Runs a test with a timeout to prevent infinite hangs.
///
/// Container operations are bounded and never block, so a test that does not finish within
/// the timeout has hit a scan or wraparound loop that fails to terminate. The timeout is
/// 10 seconds under normal conditions and 60 seconds under Miri.
///
/// When the `MUTATION_TESTING` environment variable is set to "1", the watchdog
/// is disabled and the test function is executed directly. This allows mutation
/// testing to properly detect hanging mutations.
///
/// # Panics
///
/// Panics if the test exceeds the timeout (when not in mutation testing mode).
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// with_watchdog(|| {
///     // Your test code here
///     assert_eq!(2 + 2, 4);
/// });
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if std::env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return test_fn();
    }

    let (tx, rx) = mpsc::channel();

    let test_handle = thread::spawn(move || {
        let result = test_fn();
        // If this fails, the receiver has timed out.
        drop(tx.send(result));
    });

    let timeout = if cfg!(miri) {
        Duration::from_secs(60)
    } else {
        Duration::from_secs(10)
    };

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            test_handle.join().expect("Test thread should not panic");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("Test exceeded {} second timeout", timeout.as_secs());
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => match test_handle.join() {
            Ok(()) => panic!("Test thread disconnected unexpectedly"),
            Err(e) => std::panic::resume_unwind(e),
        },
    }
}

/// Creates a deterministic random number generator for randomized operation sequences.
///
/// Tests take the generator as an explicit argument instead of reaching for a global source,
/// so any failing sequence can be replayed from its seed.
#[must_use]
pub fn seeded_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// An item that counts how many times values of its kind have been dropped.
///
/// Every tracker created from the same counter increments it exactly once when dropped,
/// which lets tests verify that containers tear down each item exactly once (or never,
/// when the container is configured to forget items).
#[derive(Debug)]
pub struct DropTracker {
    id: usize,
    drops: Rc<Cell<usize>>,
}

impl DropTracker {
    /// Creates a tracker with the given identity, reporting drops to `drops`.
    #[must_use]
    pub fn new(id: usize, drops: &Rc<Cell<usize>>) -> Self {
        Self {
            id,
            drops: Rc::clone(drops),
        }
    }

    /// The identity given to the tracker at creation time.
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }
}

impl Drop for DropTracker {
    #[cfg_attr(test, mutants::skip)] // Verified by the tests of the containers using it.
    fn drop(&mut self) {
        self.drops.set(
            self.drops
                .get()
                .checked_add(1)
                .expect("test code never drops usize::MAX items"),
        );
    }
}
