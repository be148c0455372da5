use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::error::ProfilerError;

/// Accumulates elapsed time over any number of start/stop cycles.
///
/// Only completed intervals count towards [`Timer::elapsed`]. A canceled interval records its
/// end timestamp but its duration is discarded.
pub struct Timer {
    clock: Arc<dyn Clock>,
    begin_ts: Duration,
    end_ts: Duration,
    elapsed: Duration,
    running: bool,
}

impl Timer {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            begin_ts: Duration::ZERO,
            end_ts: Duration::ZERO,
            elapsed: Duration::ZERO,
            running: false,
        }
    }

    /// Opens a new interval at the current clock reading.
    pub fn start(&mut self) -> Result<(), ProfilerError> {
        if self.running {
            return Err(ProfilerError::TimerAlreadyRunning);
        }
        self.begin_ts = self.clock.now();
        self.running = true;
        Ok(())
    }

    /// Closes the open interval, adds it to the total and returns its duration.
    pub fn stop(&mut self) -> Result<Duration, ProfilerError> {
        let interval = self.close()?;
        self.elapsed += interval;
        Ok(interval)
    }

    /// Closes the open interval without adding it to the total. Returns the discarded duration.
    pub fn cancel(&mut self) -> Result<Duration, ProfilerError> {
        self.close()
    }

    fn close(&mut self) -> Result<Duration, ProfilerError> {
        if !self.running {
            return Err(ProfilerError::TimerNotRunning);
        }
        self.end_ts = self.clock.now();
        self.running = false;
        // A clock that misbehaves must not produce a negative interval.
        Ok(self.end_ts.saturating_sub(self.begin_ts))
    }

    /// Total duration of all completed intervals.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Begin timestamp of the most recent interval.
    #[must_use]
    pub fn begin_ts(&self) -> Duration {
        self.begin_ts
    }

    /// End timestamp of the most recent closed interval.
    #[must_use]
    pub fn end_ts(&self) -> Duration {
        self.end_ts
    }

    /// Reads the timer's clock without affecting any interval.
    pub(crate) fn now(&self) -> Duration {
        self.clock.now()
    }
}

impl Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("begin_ts", &self.begin_ts)
            .field("end_ts", &self.end_ts)
            .field("elapsed", &self.elapsed)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}
