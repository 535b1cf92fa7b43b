//! Time management utilities
//!
//! The voice manager never reads the system clock directly. Expiry and
//! snapshot interpolation are polled against a [`Clock`] once per tick, so a
//! host can hand in its own frame clock and tests can step time by hand.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

/// Monotonic time source measured in seconds
pub trait Clock: Send + Sync {
    /// Seconds elapsed since the clock's origin. Never decreases.
    fn now(&self) -> f64;
}

/// Clock backed by [`Instant`], origin at construction
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock whose origin is now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Manually stepped clock
///
/// Clones share the same time, so one handle can be given to the manager and
/// another kept by the host (or test) to advance it.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    seconds: Arc<Mutex<f64>>,
}

impl ManualClock {
    /// Create a clock starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock starting at the given time
    pub fn starting_at(seconds: f64) -> Self {
        Self {
            seconds: Arc::new(Mutex::new(seconds.max(0.0))),
        }
    }

    /// Move time forward. Negative or non-finite steps are ignored.
    pub fn advance(&self, seconds: f64) {
        if seconds.is_finite() && seconds > 0.0 {
            *self.seconds.lock() += seconds;
        }
    }

    /// Jump to an absolute time, never backwards
    pub fn set(&self, seconds: f64) {
        let mut now = self.seconds.lock();
        if seconds.is_finite() && seconds > *now {
            *now = seconds;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.seconds.lock()
    }
}
