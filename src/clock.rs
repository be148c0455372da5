//! Clock sources used by region timers.
//!
//! A clock returns a monotonically non-decreasing offset from an arbitrary, fixed origin. The
//! profiler reports every timestamp as such an offset, so trace events and timer intervals share
//! one time base. Tests substitute [`TickClock`], which advances by a fixed step on every read
//! and makes all durations exact.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A monotonic time source.
pub trait Clock: Send + Sync + Debug {
    /// The current reading, as an offset from the clock's origin.
    fn now(&self) -> Duration;
}

/// Wall-clock time measured with [`Instant`] from the moment the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    #[must_use]
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
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A deterministic clock: the first read returns `start`, and each subsequent read returns the
/// previous value plus `step`.
#[derive(Debug)]
pub struct TickClock {
    next_tick: AtomicU64,
    start: Duration,
    step: Duration,
}

impl TickClock {
    /// A clock that starts at zero and advances one second per read.
    #[must_use]
    pub fn new() -> Self {
        Self::with_step(Duration::ZERO, Duration::from_secs(1))
    }

    #[must_use]
    pub fn with_step(start: Duration, step: Duration) -> Self {
        Self {
            next_tick: AtomicU64::new(0),
            start,
            step,
        }
    }

    /// How many times the clock has been read.
    pub fn reads(&self) -> u64 {
        self.next_tick.load(Ordering::Relaxed)
    }

    /// The reading returned by read number `tick`, counting from zero. Saturates at
    /// `Duration::MAX`.
    fn at_tick(&self, tick: u64) -> Duration {
        const NANOS_PER_SEC: u128 = 1_000_000_000;
        let offset = self.step.as_nanos().saturating_mul(u128::from(tick));
        let secs = u64::try_from(offset / NANOS_PER_SEC).unwrap_or(u64::MAX);
        let nanos = u32::try_from(offset % NANOS_PER_SEC).unwrap_or(0);
        self.start.saturating_add(Duration::new(secs, nanos))
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TickClock {
    fn now(&self) -> Duration {
        self.at_tick(self.next_tick.fetch_add(1, Ordering::Relaxed))
    }
}
