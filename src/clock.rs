//! Elapsed-time sources for time-boxed search.
//!
//! The search never reads a process-wide timer; it is handed a [`Clock`]
//! so that runs can be reproduced with a [`FixedClock`] in tests.

use std::time::{Duration, Instant};

/// Monotonic elapsed time since a fixed start.
pub trait Clock {
    /// Time elapsed since the clock was started.
    fn elapsed(&self) -> Duration;

    /// Elapsed time in seconds.
    fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    /// Starts a new stopwatch.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::start()
    }
}

impl Clock for Stopwatch {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// A clock that never advances.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedClock(pub Duration);

impl Clock for FixedClock {
    fn elapsed(&self) -> Duration {
        self.0
    }
}
