//! Control state and the published outputs of the engine.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::curve::AccelerationCurve;
use super::mode::ModeSelection;
use super::schedule::ScheduleWindow;

/// Which control path currently owns the published intensity.
///
/// Exactly one variant is active; the data of the others does not exist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlState {
    /// Intensity follows the schedule window on every tick.
    Automatic,
    /// Intensity is pinned to a user supplied value.
    Manual { value: f64 },
    /// The 30 second preview animation is running, timed from a monotonic
    /// start reading.
    Testing { started: Instant },
}

impl ControlState {
    pub fn is_automatic(&self) -> bool {
        matches!(self, ControlState::Automatic)
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, ControlState::Manual { .. })
    }

    pub fn is_testing(&self) -> bool {
        matches!(self, ControlState::Testing { .. })
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ControlState::Automatic => "automatic",
            ControlState::Manual { .. } => "manual",
            ControlState::Testing { .. } => "testing",
        }
    }
}

impl fmt::Display for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlState::Manual { value } => write!(f, "manual ({:.0}%)", value * 100.0),
            other => f.write_str(other.display_name()),
        }
    }
}

/// Change notifications delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The published intensity changed.
    IntensityChanged(f64),
    /// The control state moved to a different variant.
    ControlChanged(ControlState),
    /// Window, curve or mode selection was replaced.
    SettingsChanged(EngineSettings),
}

/// Configuration owned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EngineSettings {
    pub window: ScheduleWindow,
    pub curve: AccelerationCurve,
    pub mode: ModeSelection,
}

/// Lock-free, shareable view of the current intensity.
///
/// Renderers hold a clone and read it from any thread.
#[derive(Debug, Clone, Default)]
pub struct IntensityHandle(Arc<AtomicU64>);

impl IntensityHandle {
    pub fn new(value: f64) -> Self {
        Self(Arc::new(AtomicU64::new(value.to_bits())))
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    /// Store a new value; returns true when it differs from the previous one.
    pub(crate) fn set(&self, value: f64) -> bool {
        let previous = self.0.swap(value.to_bits(), Ordering::AcqRel);
        previous != value.to_bits()
    }

    /// Presentation shells show the overlay only while intensity is positive.
    pub fn is_visible(&self) -> bool {
        self.get() > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_reports_changes() {
        let handle = IntensityHandle::new(0.0);
        assert!(!handle.is_visible());
        assert!(handle.set(0.25));
        assert!(!handle.set(0.25));
        assert_eq!(handle.get(), 0.25);
        assert!(handle.clone().is_visible());
    }

    #[test]
    fn test_control_state_display() {
        assert_eq!(ControlState::Automatic.to_string(), "automatic");
        assert_eq!(ControlState::Manual { value: 0.4 }.to_string(), "manual (40%)");
    }
}
