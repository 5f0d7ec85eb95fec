//! Application coordinator that manages the complete lifecycle of slowburn.
//!
//! This module handles resource acquisition, initialization, and orchestration
//! of the daemon. It manages:
//! - Configuration loading
//! - Engine construction with the real clock and thread-backed timers
//! - Signal handler setup and the config watcher
//! - The main loop that routes control messages to the engine and logs what
//!   the engine publishes
//!
//! The `Slowburn` struct uses a builder pattern to support different startup contexts:
//! - Normal startup: `Slowburn::new(debug_enabled).run()`
//! - Test animation on start: `Slowburn::new(debug_enabled).with_startup(StartupAction::Test).run()`

use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::SystemTime;

use crate::{
    args::StartupAction,
    common::constants::*,
    config,
    core::{ControlState, EngineEvent, EngineParams, IntensityEngine},
    signals::{ControlMessage, setup_signal_handler},
    time_source::RealTimeSource,
    timer::ThreadScheduler,
};

/// Builder for configuring and running the slowburn daemon.
///
/// # Examples
///
/// ```no_run
/// use slowburn::Slowburn;
/// use slowburn::args::StartupAction;
///
/// # fn main() -> anyhow::Result<()> {
/// // Normal application startup
/// Slowburn::new(false).run()?;
///
/// // Start pinned at 40% intensity
/// Slowburn::new(false)
///     .with_startup(StartupAction::Manual(0.4))
///     .run()?;
/// # Ok(())
/// # }
/// ```
pub struct Slowburn {
    debug_enabled: bool,
    startup: StartupAction,
}

impl Slowburn {
    /// Create a new runner with defaults matching normal run
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            startup: StartupAction::None,
        }
    }

    /// Run an action as soon as the engine is up
    pub fn with_startup(mut self, startup: StartupAction) -> Self {
        self.startup = startup;
        self
    }

    /// Execute the daemon until a shutdown signal arrives.
    pub fn run(self) -> Result<()> {
        log_version!();
        if self.debug_enabled {
            log_pipe!();
            log_debug!("Debug mode enabled, showing timer and control transitions");
        }

        let config = config::load().context("Configuration failed")?;
        let settings = config.engine_settings()?;
        config.log_config();

        let (sender, receiver) = mpsc::channel();
        setup_signal_handler(sender.clone(), self.debug_enabled)?;

        // Hot reload is optional, the daemon runs fine without it
        if let Err(e) = config::get_config_path()
            .and_then(|path| config::start_config_watcher(path, sender.clone(), self.debug_enabled))
        {
            log_pipe!();
            log_warning!("Config file watching unavailable: {}", e);
            log_indented!("Restart slowburn to apply configuration changes");
        }

        let engine = IntensityEngine::new(EngineParams {
            settings,
            clock: Arc::new(RealTimeSource),
            scheduler: Arc::new(ThreadScheduler::new()),
            debug_enabled: self.debug_enabled,
        });
        let events = engine.subscribe();

        log_block_start!("Starting slowburn...");
        let mut monitor = IntensityMonitor::new(self.debug_enabled);
        monitor.report_current(&engine);

        match self.startup {
            StartupAction::None => {}
            StartupAction::Test => {
                let _ = sender.send(ControlMessage::StartTest);
            }
            StartupAction::Manual(value) => {
                let _ = sender.send(ControlMessage::Manual(value));
            }
        }

        let mut last_wake = SystemTime::now();
        loop {
            match receiver.recv_timeout(LOOP_POLL_INTERVAL) {
                Ok(message) => {
                    if !handle_message(&engine, message, self.debug_enabled) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            let now = SystemTime::now();
            match now.duration_since(last_wake) {
                Ok(gap) if gap < CLOCK_JUMP_THRESHOLD => {}
                _ => {
                    if self.debug_enabled {
                        log_pipe!();
                        log_debug!("Wall clock jumped, recomputing intensity");
                    }
                    engine.refresh();
                }
            }
            last_wake = now;

            for event in events.try_iter() {
                monitor.observe(&engine, event);
            }
        }

        engine.shutdown();
        log_end!();
        Ok(())
    }
}

/// Apply one control message. Returns `false` once the daemon should stop.
fn handle_message(engine: &IntensityEngine, message: ControlMessage, debug_enabled: bool) -> bool {
    match message {
        ControlMessage::StartTest => {
            log_block_start!(
                "Running the {}s test animation",
                TEST_ANIMATION_DURATION.as_secs()
            );
            engine.start_test();
        }
        ControlMessage::Manual(value) => {
            if !engine.set_manual_intensity(value) {
                log_pipe!();
                log_warning!("Test animation running, manual intensity ignored");
            }
        }
        ControlMessage::ResumeAutomatic => {
            if engine.control_state().is_testing() {
                log_pipe!();
                log_info!("Test animation running, the schedule resumes when it ends");
            }
            engine.resume_automatic();
        }
        ControlMessage::Reload(config) => match config.engine_settings() {
            Ok(settings) => {
                if debug_enabled {
                    log_pipe!();
                    log_debug!("Applying reloaded configuration");
                }
                config.log_config();
                engine.apply_settings(settings);
            }
            Err(e) => {
                log_pipe!();
                log_warning!("Ignoring reloaded configuration: {:#}", e);
            }
        },
        ControlMessage::Shutdown => {
            log_block_start!("Shutting down slowburn...");
            return false;
        }
    }
    true
}

/// Turns engine events into log lines without flooding the output.
struct IntensityMonitor {
    debug_enabled: bool,
    visible: bool,
    last_percent: Option<u32>,
}

impl IntensityMonitor {
    fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            visible: false,
            last_percent: None,
        }
    }

    fn report_current(&mut self, engine: &IntensityEngine) {
        log_decorated!("Control: {}", engine.control_state());
        self.intensity_changed(engine, engine.intensity());
    }

    fn observe(&mut self, engine: &IntensityEngine, event: EngineEvent) {
        match event {
            EngineEvent::IntensityChanged(value) => self.intensity_changed(engine, value),
            EngineEvent::ControlChanged(state) => {
                log_block_start!("Control: {}", state);
                if state == ControlState::Automatic {
                    // Force the next intensity line so the handover is visible
                    self.last_percent = None;
                }
            }
            EngineEvent::SettingsChanged(settings) => {
                if self.debug_enabled {
                    log_pipe!();
                    log_debug!(
                        "Settings: {} {}, {} curve, {} mode",
                        settings.window,
                        if settings.window.is_enabled() { "enabled" } else { "disabled" },
                        settings.curve,
                        settings.mode
                    );
                }
            }
        }
    }

    fn intensity_changed(&mut self, engine: &IntensityEngine, value: f64) {
        let visible = value > 0.0;
        if visible != self.visible {
            self.visible = visible;
            if visible {
                log_block_start!("Overlay shown ({})", engine.resolved_mode().display_name());
            } else {
                log_block_start!("Overlay hidden");
            }
        }

        let percent = (value * 100.0).round() as u32;
        let step = if self.debug_enabled { 1 } else { INTENSITY_LOG_STEP };
        let bucket = percent / step;
        if self.last_percent.map(|last| last / step) != Some(bucket) {
            log_indented!("Intensity: {}%", percent);
        }
        self.last_percent = Some(percent);
    }
}
