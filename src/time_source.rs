//! Clock abstraction for real and simulated time.
//!
//! The engine never calls `Local::now()` directly; it reads the time through a
//! [`TimeSource`] handed to it at construction. The daemon uses
//! [`RealTimeSource`], while `slowburn preview` and the test suite drive a
//! [`ManualTimeSource`] that only moves when told to.

use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDateTime, TimeZone};
use std::sync::Mutex;
use std::time::{Duration as StdDuration, Instant};

/// Trait for abstracting time operations.
pub trait TimeSource: Send + Sync {
    /// Get the current wall-clock time.
    fn now(&self) -> DateTime<Local>;

    /// Monotonic reading for measuring elapsed time. Unaffected by wall-clock
    /// steps.
    fn instant(&self) -> Instant;

    /// Check if this is a simulated time source.
    fn is_simulated(&self) -> bool;
}

/// Real-time implementation that uses the system clock.
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Simulated clock that stands still until moved with [`set`](Self::set) or
/// [`advance`](Self::advance).
///
/// `advance` moves both the wall clock and the monotonic reading; `set` only
/// moves the wall clock, like an NTP step or a manual clock change.
pub struct ManualTimeSource {
    origin: Instant,
    state: Mutex<ManualClock>,
}

struct ManualClock {
    wall: DateTime<Local>,
    elapsed: StdDuration,
}

impl ManualTimeSource {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            origin: Instant::now(),
            state: Mutex::new(ManualClock {
                wall: start,
                elapsed: StdDuration::ZERO,
            }),
        }
    }

    /// Build a clock from a `YYYY-MM-DD HH:MM:SS` string in local time.
    pub fn at(datetime: &str) -> Result<Self, String> {
        parse_datetime(datetime).map(Self::new)
    }

    /// Jump the wall clock to an absolute time, forwards or backwards.
    pub fn set(&self, time: DateTime<Local>) {
        self.lock().wall = time;
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: StdDuration) {
        let mut clock = self.lock();
        clock.wall += ChronoDuration::from_std(duration).unwrap_or(ChronoDuration::zero());
        clock.elapsed += duration;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualClock> {
        // A poisoned clock still holds a valid timestamp
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Local> {
        self.lock().wall
    }

    fn instant(&self) -> Instant {
        self.origin + self.lock().elapsed
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

/// Parse a datetime string in the format "YYYY-MM-DD HH:MM:SS" as local time.
pub fn parse_datetime(s: &str) -> Result<DateTime<Local>, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| format!("Invalid datetime format: {e}. Use YYYY-MM-DD HH:MM:SS"))
        .and_then(|naive| {
            Local
                .from_local_datetime(&naive)
                .earliest()
                .ok_or_else(|| "Nonexistent local time (DST gap)".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_manual_source_stands_still_until_advanced() {
        let clock = ManualTimeSource::at("2025-03-14 21:00:00").unwrap();
        let first = clock.now();
        assert_eq!(clock.now(), first);

        clock.advance(StdDuration::from_secs(90));
        assert_eq!(clock.now().minute(), 1);
        assert_eq!(clock.now().second(), 30);
        assert!(clock.is_simulated());
    }

    #[test]
    fn test_set_moves_wall_clock_only() {
        let clock = ManualTimeSource::at("2025-03-14 21:00:00").unwrap();
        let start = clock.instant();

        clock.advance(StdDuration::from_secs(10));
        clock.set(clock.now() - ChronoDuration::hours(1));
        assert_eq!(clock.now().hour(), 20);
        assert_eq!(clock.instant() - start, StdDuration::from_secs(10));
    }

    #[test]
    fn test_parse_datetime_rejects_garbage() {
        assert!(parse_datetime("21:00").is_err());
        assert!(parse_datetime("2025-13-01 00:00:00").is_err());
        assert!(parse_datetime("2025-01-01 00:00:00").is_ok());
    }

    #[test]
    fn test_real_source_is_not_simulated() {
        assert!(!RealTimeSource.is_simulated());
    }
}
