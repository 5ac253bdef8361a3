//! Cross-thread distance hand-off
//!
//! The sensor thread publishes the latest reading of each channel into a
//! single-slot signal; any other thread reads it without waiting for the
//! next measurement.

use parking_lot::Mutex;

#[derive(Debug, Default, Clone, Copy)]
struct Slot {
    latest: Option<f64>,
    updates: u64,
}

/// Latest distance of one sensor, in metres
///
/// `None` until the first read completes, and whenever the last read saw no
/// usable echo.
#[derive(Debug, Default)]
pub struct DistanceSignal {
    slot: Mutex<Slot>,
}

impl DistanceSignal {
    /// Create an empty signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored distance
    pub fn publish(&self, distance: Option<f64>) {
        let mut slot = self.slot.lock();
        slot.latest = distance;
        slot.updates += 1;
    }

    /// Most recently published distance
    pub fn latest(&self) -> Option<f64> {
        self.slot.lock().latest
    }

    /// Number of reads published so far
    pub fn updates(&self) -> u64 {
        self.slot.lock().updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_empty() {
        let signal = DistanceSignal::new();
        assert_eq!(signal.latest(), None);
        assert_eq!(signal.updates(), 0);
    }

    #[test]
    fn test_latest_wins() {
        let signal = DistanceSignal::new();
        signal.publish(Some(0.2));
        signal.publish(None);
        signal.publish(Some(0.3));
        assert_eq!(signal.latest(), Some(0.3));
        assert_eq!(signal.updates(), 3);
    }

    #[test]
    fn test_cross_thread() {
        let signal = Arc::new(DistanceSignal::new());
        let writer = {
            let signal = signal.clone();
            thread::spawn(move || {
                for i in 0..100 {
                    signal.publish(Some(f64::from(i) / 100.0));
                }
            })
        };
        writer.join().unwrap();

        assert_eq!(signal.latest(), Some(0.99));
        assert_eq!(signal.updates(), 100);
    }
}
