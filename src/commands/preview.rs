//! Preview command: evaluate the schedule at an arbitrary instant.
//!
//! Builds a real [`IntensityEngine`] on a clock frozen at the requested time,
//! so the numbers shown are exactly what the daemon would publish then.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Local};
use std::sync::Arc;
use std::time::Duration;

use crate::config;
use crate::core::{EffectMode, EngineParams, EngineSettings, IntensityEngine};
use crate::logger::Log;
use crate::time_source::{ManualTimeSource, TimeSource};
use crate::timer::ThreadScheduler;

/// What the engine reports at a given instant.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewReport {
    pub at: DateTime<Local>,
    pub settings: EngineSettings,
    pub active_today: bool,
    pub progress: f64,
    pub intensity: f64,
    pub mode: EffectMode,
    pub tick_period: Duration,
}

impl PreviewReport {
    /// Evaluate `settings` on an engine whose clock reads `at`.
    pub fn evaluate(settings: EngineSettings, at: DateTime<Local>, debug_enabled: bool) -> Self {
        let clock = Arc::new(ManualTimeSource::new(at));
        let engine = IntensityEngine::new(EngineParams {
            settings,
            clock,
            scheduler: Arc::new(ThreadScheduler::new()),
            debug_enabled,
        });

        let window = settings.window;
        let report = Self {
            at,
            settings,
            active_today: window.is_enabled() && window.contains_day(at.weekday()),
            progress: window.progress_at(&at),
            intensity: engine.intensity(),
            mode: engine.resolved_mode(),
            tick_period: window.tick_period(),
        };

        engine.shutdown();
        report
    }

    fn log(&self) {
        let window = self.settings.window;

        log_block_start!("Preview for {}", self.at.format("%A %Y-%m-%d %H:%M:%S"));
        log_indented!("Window: {}", window);
        log_indented!(
            "Active today: {}",
            if self.active_today { "yes" } else { "no" }
        );
        log_indented!("Progress: {:.1}%", self.progress * 100.0);
        log_indented!(
            "Intensity: {:.1}% ({} curve)",
            self.intensity * 100.0,
            self.settings.curve.display_name()
        );
        log_indented!("Mode: {} ({})", self.mode.display_name(), self.settings.mode);
        log_indented!("Tick period: {:.2}s", self.tick_period.as_secs_f64());
    }
}

/// Handle `slowburn preview <datetime>`.
pub fn handle_preview_command(at: &str, debug_enabled: bool) -> Result<()> {
    let clock = ManualTimeSource::at(at).map_err(anyhow::Error::msg)?;
    let at = clock.now();
    Log::set_timestamp_source(Arc::new(clock));

    log_version!();

    let config = config::load().context("Failed to load configuration")?;
    let settings = config.engine_settings()?;
    if debug_enabled {
        config.log_config();
    }

    PreviewReport::evaluate(settings, at, debug_enabled).log();
    log_end!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AccelerationCurve, ModeSelection, ScheduleWindow, WeekdaySet};
    use crate::time_source::parse_datetime;

    fn settings(curve: AccelerationCurve) -> EngineSettings {
        EngineSettings {
            window: ScheduleWindow::new(21 * 60, 22 * 60),
            curve,
            mode: ModeSelection::Random,
        }
    }

    #[test]
    fn test_preview_inside_window() {
        let at = parse_datetime("2025-03-12 21:30:00").unwrap();
        let report = PreviewReport::evaluate(settings(AccelerationCurve::EaseIn), at, false);

        assert!(report.active_today);
        assert!((report.progress - 0.5).abs() < 1e-9);
        assert!((report.intensity - 0.25).abs() < 1e-9);
        // Ordinal 71 selects index 1
        assert_eq!(report.mode, EffectMode::PixelFreeze);
        assert_eq!(report.tick_period, Duration::from_secs(6));
    }

    #[test]
    fn test_preview_on_disabled_day() {
        let at = parse_datetime("2025-03-12 21:30:00").unwrap();
        let mut settings = settings(AccelerationCurve::Linear);
        settings.window = settings.window.with_days(WeekdaySet::from_indices([0, 6]));

        let report = PreviewReport::evaluate(settings, at, false);
        assert!(!report.active_today);
        assert_eq!(report.intensity, 0.0);
    }
}
