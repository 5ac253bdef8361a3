//! System clock

use std::time::{Duration, Instant as StdInstant};

use theremin_hal::{Clock, Instant};

/// Monotonic clock measuring from its own creation
///
/// `sleep` blocks the calling thread.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: StdInstant,
}

impl SystemClock {
    /// Start a clock at [`Instant::ZERO`]
    pub fn new() -> Self {
        Self {
            origin: StdInstant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        let elapsed = self.origin.elapsed().as_nanos();
        Instant::from_nanos(u64::try_from(elapsed).unwrap_or(u64::MAX))
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
