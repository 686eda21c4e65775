//! Clock abstraction used for record timestamps and story expiry.
//!
//! Production code reads the wall clock through [`SystemClock`]; tests swap
//! in a [`ManualClock`] so that expiry windows can be crossed without
//! sleeping.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current UTC instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by `chrono::Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write();
        *now += by;
    }

    /// Jump to an absolute instant
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.write() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

/// Returns the current Unix timestamp in seconds.
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_timestamp_is_reasonable() {
        let ts = now_timestamp();
        // Should be after 2024-01-01 (1704067200)
        assert!(ts > 1704067200, "Timestamp {} is too old", ts);
        // Should be before 2100-01-01 (4102444800)
        assert!(ts < 4102444800, "Timestamp {} is too far in future", ts);
    }

    #[test]
    fn test_manual_clock_advances() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::hours(25));
        assert_eq!(clock.now(), start + Duration::hours(25));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }
}
