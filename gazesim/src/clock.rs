//! Clock abstraction for deterministic simulation.
//!
//! Production code uses `SystemClock` (monotonic real time).
//! Tests use `TestClock` with manual time advancement.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Millisecond time source driving every duration comparison in the
/// simulator.
pub trait Clock {
    /// Milliseconds since the clock's origin. Expected to be
    /// non-decreasing; consumers clamp if it is not.
    fn now_ms(&self) -> f64;
}

/// Production clock measuring real monotonic time from its creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Test clock with manually controlled time, starting at zero.
/// Single-threaded, like the loop that reads it.
#[derive(Debug, Default)]
pub struct TestClock {
    ms: Cell<f64>,
}

impl TestClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock at an arbitrary timestamp.
    pub fn at(ms: f64) -> Self {
        Self { ms: Cell::new(ms) }
    }

    /// Advance time by the given duration.
    pub fn advance(&self, duration: Duration) {
        self.advance_ms(duration.as_secs_f64() * 1000.0);
    }

    /// Advance time by a number of milliseconds.
    pub fn advance_ms(&self, ms: f64) {
        self.ms.set(self.ms.get() + ms);
    }

    /// Set the timestamp explicitly. May move backwards, which is how
    /// tests provoke clock anomalies.
    pub fn set_ms(&self, ms: f64) {
        self.ms.set(ms);
    }
}

impl Clock for TestClock {
    fn now_ms(&self) -> f64 {
        self.ms.get()
    }
}
