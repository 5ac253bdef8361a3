//! Median filter over echo durations
//!
//! Rejects single wild echoes (multipath, a stray reflection) that a mean
//! would smear into the result.

use core::time::Duration;

/// Median of `samples`, sorting them in place
///
/// Even-length input averages the two middle values. Empty input has no
/// median.
pub fn median(samples: &mut [Duration]) -> Option<Duration> {
    if samples.is_empty() {
        return None;
    }

    samples.sort_unstable();
    let mid = samples.len() / 2;

    if samples.len() % 2 == 1 {
        Some(samples[mid])
    } else {
        Some((samples[mid - 1] + samples[mid]) / 2)
    }
}
