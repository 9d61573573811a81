//! Time utility functions

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// Source of both the monotonic and the wall-clock time of a request
pub trait Clock: Send + Sync {
    /// Monotonic time used for the request duration
    fn now_instant(&self) -> Instant;

    /// Wall-clock time used for the record timestamp
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Clock backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_instant(&self) -> Instant {
        Instant::now()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Capture the moment a request enters the pipeline
pub fn start(clock: &dyn Clock) -> Instant {
    clock.now_instant()
}

/// Time elapsed since `start`, zero if the clock went backwards
pub fn elapsed(start: Instant, clock: &dyn Clock) -> Duration {
    clock.now_instant().saturating_duration_since(start)
}

/// Convert a duration to seconds rounded to 3 decimal places
pub fn duration_seconds(duration: Duration) -> f64 {
    let micros = duration.as_micros() as f64;
    (micros / 1_000.0).round() / 1_000.0
}

/// Format timestamp as `YYYY-MM-DDTHH:MM:SSZ`
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
