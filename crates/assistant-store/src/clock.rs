//! Time source for timestamps and staleness checks.
//!
//! Documents carry naive local timestamps (no offset), so the clock hands out
//! [`NaiveDateTime`] read from the host's local time. Components take an
//! `Arc<dyn Clock>` so tests can pin time with [`ManualClock`].

use chrono::{Duration, Local, NaiveDateTime};
use std::sync::{Arc, Mutex};

/// Format used for every timestamp written to disk.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub fn system() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse an ISO-8601 timestamp as written by [`format_timestamp`].
///
/// Accepts any fractional precision (or none). A trailing offset is not
/// expected; values carrying one are rejected rather than silently shifted.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    raw.trim().parse::<NaiveDateTime>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_format_and_parse_timestamp() {
        let raw = format_timestamp(noon());
        assert_eq!(raw, "2024-03-01T12:00:00.000000");
        assert_eq!(parse_timestamp(&raw), Some(noon()));
    }

    #[test]
    fn test_parse_accepts_missing_fraction() {
        assert_eq!(parse_timestamp("2024-03-01T12:00:00"), Some(noon()));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(noon());
        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), noon() + Duration::seconds(90));

        clock.set(noon());
        assert_eq!(clock.now(), noon());
    }
}
