//! Configuration for slowburn: TOML loading, validation and hot reload.
//!
//! ## Configuration Sources
//!
//! The configuration lives in `slowburn.toml`, looked up in:
//! 1. The directory given with `--config <dir>`
//! 2. **XDG_CONFIG_HOME**/slowburn/slowburn.toml
//!
//! A missing file is not an error: the built-in defaults apply. slowburn never
//! writes this file; settings editors own it.
//!
//! ## Configuration Structure
//!
//! ```toml
//! schedule_enabled = true   # Turn the nightly ramp on or off
//! start = "21:00"           # Window start (HH:MM)
//! end = "22:00"             # Window end (HH:MM); at or before start means "instantly full"
//! days = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"]
//! curve = "linear"          # linear | ease-in | ease-out | ease-in-out | exponential | logarithmic
//! mode = "blur"             # random | blur | pixel-freeze | pixel-blackout | sleepy-emoji
//!                           # | distortion | messages | side-swipe
//! ```
//!
//! Invalid values are rejected with a message naming the field.

pub mod loading;
pub mod validation;
pub mod watcher;

#[cfg(test)]
mod tests;

use anyhow::Result;
use serde::Deserialize;

use crate::common::constants::*;
use crate::core::{AccelerationCurve, EngineSettings, ModeSelection, ScheduleWindow, WeekdaySet};

pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};
pub use watcher::start_config_watcher;

/// User settings as read from `slowburn.toml`. Every field is optional.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Whether the schedule drives the intensity at all.
    pub schedule_enabled: Option<bool>,
    /// Window start time (`HH:MM` or `HH:MM:SS`).
    pub start: Option<String>,
    /// Window end time (`HH:MM` or `HH:MM:SS`).
    pub end: Option<String>,
    /// Enabled weekdays by name (`sun`, `monday`, ...) or index (0 = Sunday).
    pub days: Option<Vec<DayEntry>>,
    /// Acceleration curve applied to the window progress.
    pub curve: Option<AccelerationCurve>,
    /// Effect mode or `random` for a different mode each day.
    pub mode: Option<ModeSelection>,
}

/// One entry of the `days` list.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum DayEntry {
    Index(u8),
    Name(String),
}

impl Config {
    /// Build the schedule window, applying defaults for missing fields.
    pub fn schedule_window(&self) -> Result<ScheduleWindow> {
        let start = validation::parse_time_of_day(self.start.as_deref().unwrap_or(DEFAULT_START))?;
        let end = validation::parse_time_of_day(self.end.as_deref().unwrap_or(DEFAULT_END))?;

        let days = match &self.days {
            Some(entries) => WeekdaySet::from_indices(
                entries
                    .iter()
                    .map(validation::parse_day)
                    .collect::<Result<Vec<_>>>()?,
            ),
            None => WeekdaySet::ALL,
        };

        Ok(ScheduleWindow::from_times(start, end)
            .with_days(days)
            .with_enabled(self.schedule_enabled.unwrap_or(DEFAULT_SCHEDULE_ENABLED)))
    }

    /// Everything the engine needs, with defaults applied.
    pub fn engine_settings(&self) -> Result<EngineSettings> {
        Ok(EngineSettings {
            window: self.schedule_window()?,
            curve: self.curve.unwrap_or_default(),
            mode: self.mode.unwrap_or_default(),
        })
    }

    /// Log the effective configuration.
    pub fn log_config(&self) {
        let Ok(settings) = self.engine_settings() else {
            return;
        };
        let window = settings.window;

        log_block_start!("Loaded configuration");
        log_indented!(
            "Schedule: {}",
            if window.is_enabled() { "enabled" } else { "disabled" }
        );
        log_indented!("Window: {} ({} min)", window, window.duration_minutes());
        if window.duration_minutes() == 0 {
            log_indented!("End is not after start, intensity jumps to full at the start time");
        }
        log_indented!("Days: {}", describe_days(window.days()));
        log_indented!("Curve: {}", settings.curve.display_name());
        log_indented!("Mode: {}", settings.mode);
    }
}

fn describe_days(days: WeekdaySet) -> String {
    const NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
    if days == WeekdaySet::ALL {
        return "every day".to_string();
    }
    if days.is_empty() {
        return "none".to_string();
    }
    days.indices()
        .map(|i| NAMES[i as usize])
        .collect::<Vec<_>>()
        .join(", ")
}
