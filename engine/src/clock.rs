//! Wall-clock access for time-dependent decisions.
//!
//! Version names embed a creation time and retention compares against "now".
//! Both read the time through [`Clock`] so callers and tests can pin it.

use crate::Timestamp;
use chrono::Utc;

/// Milliseconds in one day, the unit of the retention day window.
pub const MILLIS_PER_DAY: Timestamp = 24 * 60 * 60 * 1000;

/// A source of the current time in milliseconds since the Unix epoch.
pub trait Clock {
    fn now_millis(&self) -> Timestamp;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> Timestamp {
        Utc::now().timestamp_millis()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now_millis(&self) -> Timestamp {
        self.0
    }
}

/// Current system time in milliseconds since the Unix epoch.
pub fn now_millis() -> Timestamp {
    SystemClock.now_millis()
}

/// `days` whole days in milliseconds, saturating instead of overflowing.
pub fn days_to_millis(days: i64) -> Timestamp {
    days.saturating_mul(MILLIS_PER_DAY)
}
