//! Host clock adapter.
//!
//! Monotonic time comes from `std::time::Instant`, measured from adapter
//! construction.  Wall-clock time comes from `SystemTime` and stamps input
//! transitions, so it must survive restarts.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::app::ports::Clock;

pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    /// Microseconds since construction (monotonic).
    fn mono_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Milliseconds since the Unix epoch.  A clock set before 1970 reads 0.
    fn wall_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64)
    }
}
