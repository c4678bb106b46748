//! [`Config`] defines how a queued thread waits for its turn.

use std::fmt;
use std::hint::spin_loop;
#[cfg(not(feature = "loom"))]
use std::thread::yield_now;

#[cfg(feature = "loom")]
use loom::thread::yield_now;

/// [`Config`] defines how a queued thread waits before it is admitted.
///
/// A queued thread polls its admission flag [`spin_count`](Config::spin_count) times, calling
/// [`backoff`](Config::backoff) in between, and then parks until the thread releasing the lock
/// wakes it up.
pub trait Config: fmt::Debug + Default {
    /// Defines the number of times to poll the admission flag before parking.
    #[inline]
    #[must_use]
    fn spin_count() -> usize {
        if cfg!(feature = "loom") { 0 } else { 128 }
    }

    /// Defines the backoff function to use when spinning.
    #[inline]
    fn backoff(spin_count: usize) {
        if spin_count % 16 == 0 {
            yield_now();
        } else {
            spin_loop();
        }
    }
}

/// Default configuration.
#[derive(Debug, Default)]
pub struct DefaultConfig;

impl Config for DefaultConfig {}

/// Configuration that parks a queued thread right away.
#[derive(Debug, Default)]
pub struct ParkImmediately;

impl Config for ParkImmediately {
    #[inline]
    fn spin_count() -> usize {
        0
    }
}
