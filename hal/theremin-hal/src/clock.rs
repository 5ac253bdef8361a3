//! Monotonic clock abstraction
//!
//! The scheduler never looks at calendar time. It needs a monotonic
//! timestamp, duration arithmetic and a way to block the thread until a
//! deadline.

use core::ops::{Add, Sub};
use core::time::Duration;

/// Point on a monotonic timeline, in nanoseconds since the clock's origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Instant(u64);

impl Instant {
    /// The clock's origin
    pub const ZERO: Instant = Instant(0);

    /// Create an instant from nanoseconds since the origin
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Create an instant from microseconds since the origin
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros * 1_000)
    }

    /// Nanoseconds since the origin
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Time elapsed from `earlier` to `self`, or zero if `earlier` is later
    pub fn saturating_duration_since(self, earlier: Instant) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }

    /// Time elapsed from `earlier` to `self`, if `earlier` is not later
    pub fn checked_duration_since(self, earlier: Instant) -> Option<Duration> {
        self.0.checked_sub(earlier.0).map(Duration::from_nanos)
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Instant {
        // u64 nanoseconds cover ~584 years; saturate rather than wrap
        let nanos = u64::try_from(rhs.as_nanos()).unwrap_or(u64::MAX);
        Instant(self.0.saturating_add(nanos))
    }
}

impl Sub<Instant> for Instant {
    type Output = Duration;

    fn sub(self, rhs: Instant) -> Duration {
        self.saturating_duration_since(rhs)
    }
}

/// Monotonic time source
pub trait Clock {
    /// Current time
    ///
    /// Successive calls never go backwards.
    fn now(&self) -> Instant;

    /// Block the calling thread for at least `duration`
    fn sleep(&mut self, duration: Duration);
}
