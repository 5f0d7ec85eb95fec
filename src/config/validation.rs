//! Configuration validation.
//!
//! Checks every field before the engine sees it so configuration errors are
//! reported once, at load time, with the offending value in the message.

use anyhow::{Context, Result};
use chrono::NaiveTime;
use std::collections::HashSet;

use super::{Config, DayEntry};
use crate::common::constants::{DEFAULT_END, DEFAULT_START};

/// Parse a time of day in `HH:MM` or `HH:MM:SS` form.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .with_context(|| format!("Invalid time '{value}', expected HH:MM"))
}

/// Map a `days` entry to its index, 0 = Sunday … 6 = Saturday.
pub fn parse_day(entry: &DayEntry) -> Result<u8> {
    match entry {
        DayEntry::Index(index) if *index < 7 => Ok(*index),
        DayEntry::Index(index) => {
            anyhow::bail!("Day index {index} out of range, expected 0 (Sunday) to 6 (Saturday)")
        }
        DayEntry::Name(name) => {
            let index = match name.trim().to_ascii_lowercase().as_str() {
                "sun" | "sunday" => 0,
                "mon" | "monday" => 1,
                "tue" | "tues" | "tuesday" => 2,
                "wed" | "wednesday" => 3,
                "thu" | "thurs" | "thursday" => 4,
                "fri" | "friday" => 5,
                "sat" | "saturday" => 6,
                _ => anyhow::bail!("Unknown day '{name}'"),
            };
            Ok(index)
        }
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    let start = parse_time_of_day(config.start.as_deref().unwrap_or(DEFAULT_START))
        .context("start")?;
    let end = parse_time_of_day(config.end.as_deref().unwrap_or(DEFAULT_END)).context("end")?;

    if let Some(days) = &config.days {
        let mut seen = HashSet::new();
        for entry in days {
            let index = parse_day(entry).context("days")?;
            if !seen.insert(index) {
                anyhow::bail!("days lists the same day twice ({entry:?})");
            }
        }
        if seen.is_empty() && config.schedule_enabled != Some(false) {
            log_warning!("No days enabled, the schedule will never run");
        }
    }

    if end <= start {
        log_warning!(
            "end ({}) is not after start ({}), intensity will jump to full at the start time",
            end.format("%H:%M"),
            start.format("%H:%M")
        );
    }

    Ok(())
}
