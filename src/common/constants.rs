//! Application-wide constants and default values.
//!
//! Everything the engine and the configuration layer fall back to lives here so
//! the defaults stay in one place.

use std::time::Duration;

// # Application Metadata
pub const APP_NAME: &str = "slowburn";
pub const CONFIG_FILE_NAME: &str = "slowburn.toml";

// # Schedule Defaults
pub const DEFAULT_START: &str = "21:00"; // 9pm
pub const DEFAULT_END: &str = "22:00"; // 10pm
pub const DEFAULT_SCHEDULE_ENABLED: bool = true;

/// Minutes in a day; start and end minutes live in `[0, MINUTES_PER_DAY)`.
pub const MINUTES_PER_DAY: u16 = 1440;

// # Timer Cadence
/// Number of recurring ticks spread across the configured window.
pub const TICKS_PER_WINDOW: f64 = 600.0;

/// Smallest window duration used for cadence math (in minutes).
pub const MINIMUM_CADENCE_WINDOW_MINUTES: f64 = 1e-3;

/// Recurring timer period used when the window has zero or negative duration.
pub const FALLBACK_TICK_PERIOD: Duration = Duration::from_secs(6);

// # Test Animation
/// Length of the test animation that sweeps intensity from 0 to 1.
pub const TEST_ANIMATION_DURATION: Duration = Duration::from_secs(30);

/// Sampling period of the test animation (20 Hz).
pub const TEST_FRAME_PERIOD: Duration = Duration::from_millis(50);

// # Config Watcher
/// Debounce for file change events, editors tend to write in several steps.
pub const CONFIG_DEBOUNCE_MS: u64 = 500;

// # Main Loop
/// How long the main loop waits for a control message before checking the
/// wall clock and draining engine events.
pub const LOOP_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// A wall clock gap longer than this between two loop iterations is treated
/// as a suspend/resume or a clock change and triggers a refresh.
pub const CLOCK_JUMP_THRESHOLD: Duration = Duration::from_secs(5);

/// Intensity steps (in whole percent) logged outside debug mode.
pub const INTENSITY_LOG_STEP: u32 = 10;

// # Exit Codes
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
