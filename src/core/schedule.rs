//! The nightly schedule window and its progress query.
//!
//! A window is a start and end time of day plus the weekdays it applies to.
//! Unlike sunrise/sunset style periods it never wraps past midnight: an end at
//! or before the start is a zero-length window that is "complete" as soon as
//! the start time is reached.

use chrono::{DateTime, Local, NaiveTime, Timelike, Weekday};
use std::fmt;
use std::time::Duration;

use crate::common::constants::{
    FALLBACK_TICK_PERIOD, MINIMUM_CADENCE_WINDOW_MINUTES, MINUTES_PER_DAY, TICKS_PER_WINDOW,
};

/// Set of enabled weekdays, stored as a bitmask with Sunday as bit 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const ALL: WeekdaySet = WeekdaySet(0b0111_1111);
    pub const NONE: WeekdaySet = WeekdaySet(0);

    /// Build from indices where 0 = Sunday … 6 = Saturday. Out of range
    /// indices are ignored.
    pub fn from_indices<I: IntoIterator<Item = u8>>(indices: I) -> Self {
        let mut set = WeekdaySet::NONE;
        for index in indices {
            set.insert_index(index);
        }
        set
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.contains_index(day.num_days_from_sunday() as u8)
    }

    pub fn contains_index(&self, index: u8) -> bool {
        index < 7 && self.0 & (1 << index) != 0
    }

    pub fn insert(&mut self, day: Weekday) {
        self.insert_index(day.num_days_from_sunday() as u8);
    }

    pub fn remove(&mut self, day: Weekday) {
        self.0 &= !(1 << day.num_days_from_sunday());
    }

    fn insert_index(&mut self, index: u8) {
        if index < 7 {
            self.0 |= 1 << index;
        }
    }

    /// Enabled day indices in ascending order (Sunday first).
    pub fn indices(&self) -> impl Iterator<Item = u8> + '_ {
        (0u8..7).filter(|i| self.contains_index(*i))
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl Default for WeekdaySet {
    fn default() -> Self {
        WeekdaySet::ALL
    }
}

/// Configured daily window during which intensity ramps from 0 to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleWindow {
    start_minute: u16,
    end_minute: u16,
    days: WeekdaySet,
    enabled: bool,
}

impl Default for ScheduleWindow {
    /// 21:00 → 22:00, every day, enabled.
    fn default() -> Self {
        Self::new(21 * 60, 22 * 60)
    }
}

impl ScheduleWindow {
    /// Window from minutes since midnight. Values past the end of the day are
    /// clamped to 23:59.
    pub fn new(start_minute: u16, end_minute: u16) -> Self {
        Self {
            start_minute: start_minute.min(MINUTES_PER_DAY - 1),
            end_minute: end_minute.min(MINUTES_PER_DAY - 1),
            days: WeekdaySet::ALL,
            enabled: true,
        }
    }

    /// Window from times of day; seconds are dropped.
    pub fn from_times(start: NaiveTime, end: NaiveTime) -> Self {
        Self::new(minute_of_day(start), minute_of_day(end))
    }

    pub fn with_days(mut self, days: WeekdaySet) -> Self {
        self.days = days;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn start_minute(&self) -> u16 {
        self.start_minute
    }

    pub fn end_minute(&self) -> u16 {
        self.end_minute
    }

    pub fn days(&self) -> WeekdaySet {
        self.days
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn contains_day(&self, day: Weekday) -> bool {
        self.days.contains(day)
    }

    /// Window length in minutes, zero for degenerate windows.
    pub fn duration_minutes(&self) -> u16 {
        self.end_minute.saturating_sub(self.start_minute)
    }

    /// True when both windows share start and end, i.e. the tick cadence
    /// derived from them is identical.
    pub fn same_span(&self, other: &ScheduleWindow) -> bool {
        self.start_minute == other.start_minute && self.end_minute == other.end_minute
    }

    /// Raw (pre-curve) progress through the window at `now` on `weekday`.
    ///
    /// - 0 when the schedule is disabled or the day is not enabled
    /// - 0 before the start, 1 at or after the end
    /// - linear in between, measured with second precision
    ///
    /// When `end <= start` the result is 1 as soon as `now >= start`.
    pub fn progress(&self, now: NaiveTime, weekday: Weekday) -> f64 {
        if !self.enabled || !self.days.contains(weekday) {
            return 0.0;
        }

        let now_minutes = now.num_seconds_from_midnight() as f64 / 60.0;
        let start = f64::from(self.start_minute);
        let end = f64::from(self.end_minute);

        if now_minutes < start {
            0.0
        } else if now_minutes >= end {
            1.0
        } else {
            ((now_minutes - start) / (end - start)).clamp(0.0, 1.0)
        }
    }

    /// [`progress`](Self::progress) for a full local timestamp.
    pub fn progress_at(&self, now: &DateTime<Local>) -> f64 {
        use chrono::Datelike;
        self.progress(now.time(), now.weekday())
    }

    /// Period of the recurring timer: the window is split into
    /// `TICKS_PER_WINDOW` equal steps, falling back to a fixed period for
    /// zero-length windows.
    pub fn tick_period(&self) -> Duration {
        let minutes = self.duration_minutes();
        if minutes == 0 {
            return FALLBACK_TICK_PERIOD;
        }
        let minutes = f64::from(minutes).max(MINIMUM_CADENCE_WINDOW_MINUTES);
        Duration::from_secs_f64(minutes * 60.0 / TICKS_PER_WINDOW)
    }
}

impl fmt::Display for ScheduleWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02} → {:02}:{:02}",
            self.start_minute / 60,
            self.start_minute % 60,
            self.end_minute / 60,
            self.end_minute % 60
        )
    }
}

fn minute_of_day(time: NaiveTime) -> u16 {
    (time.hour() * 60 + time.minute()) as u16
}
