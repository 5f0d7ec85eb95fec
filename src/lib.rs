//! # Slowburn Library
//!
//! Internal library for the slowburn binary application
//!
//! This library exists to enable testing of the engine internals and provide clean
//! separation between CLI dispatch (main.rs) and application logic.
//!
//! ## Architecture
//!
//! - **Entry Point**: `Slowburn` struct runs the daemon with resource management
//! - **Core Logic**: `core` module with the schedule window, acceleration curves,
//!   mode resolution and the `IntensityEngine`
//! - **Timing**: `time_source` for real and simulated clocks, `timer` for the
//!   recurring timer abstraction the engine schedules against
//! - **Configuration**: `config` module for TOML-based settings with hot-reload
//! - **Commands**: `commands` module for one-shot CLI commands (preview)
//! - **Infrastructure**: Signal handling and logging

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

// Public API modules
pub mod args;
pub mod commands;
pub mod common;
pub mod config;
pub mod core;
pub mod signals;
pub mod time_source;
pub mod timer;

// Internal modules
mod slowburn;

// Re-export for binary
pub use crate::core::{
    AccelerationCurve, ControlState, EffectMode, EngineEvent, EngineParams, EngineSettings,
    IntensityEngine, IntensityHandle, ModeSelection, ScheduleWindow, WeekdaySet,
};
pub use slowburn::Slowburn;
