// src/engine/backoff.rs

//! Polling backoff schedule.

use std::time::Duration;

/// Lower bound of the wait between status polls, in milliseconds.
pub const BACKOFF_MIN_MS: f64 = 1000.0;

/// Upper bound of the wait between status polls, in milliseconds.
pub const BACKOFF_MAX_MS: f64 = 3000.0;

/// Wait before poll number `attempt`.
///
/// Grows by a factor of two every five attempts, starting at `min_ms` and
/// saturating at `max_ms`. Always within `[min_ms, max_ms]` and
/// non-decreasing in `attempt`.
pub fn backoff(min_ms: f64, max_ms: f64, attempt: u32) -> Duration {
    let grown = 2f64.powf(f64::from(attempt) / 5.0) * min_ms;
    let millis = grown.clamp(min_ms, max_ms.max(min_ms));
    Duration::from_millis(millis as u64)
}
