//! The intensity scheduling engine.
//!
//! [`IntensityEngine`] owns the published effect intensity and decides, at any
//! moment, which of three control paths computes it:
//!
//! - **Automatic**: a recurring timer samples the schedule window and shapes
//!   its progress with the configured acceleration curve
//! - **Manual**: a user supplied value pins the intensity
//! - **Testing**: a 30 second animation sweeps from 0 to 1, then hands control
//!   back to the schedule
//!
//! Testing wins over Manual, which wins over Automatic. Scheduled ticks never
//! touch the intensity outside Automatic.
//!
//! ## Timers
//!
//! The recurring timer spreads 600 ticks across the window, so its period is
//! re-derived whenever start or end change. The old timer is cancelled before
//! the replacement is installed. Every callback carries the generation it was
//! registered with and is ignored once a newer timer took its place, which
//! covers fires that raced their own cancellation.
//!
//! ## Publication
//!
//! Renderers read intensity through a lock-free [`IntensityHandle`] or receive
//! [`EngineEvent`]s from [`IntensityEngine::subscribe`].

pub mod control;
pub mod curve;
pub mod mode;
pub mod schedule;

pub use control::{ControlState, EngineEvent, EngineSettings, IntensityHandle};
pub use curve::AccelerationCurve;
pub use mode::{EffectMode, ModeSelection};
pub use schedule::{ScheduleWindow, WeekdaySet};

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::common::constants::{TEST_ANIMATION_DURATION, TEST_FRAME_PERIOD};
use crate::time_source::TimeSource;
use crate::timer::{Scheduler, TimerCallback, TimerHandle};

/// Dependencies and initial configuration for an [`IntensityEngine`].
pub struct EngineParams {
    pub settings: EngineSettings,
    pub clock: Arc<dyn TimeSource>,
    pub scheduler: Arc<dyn Scheduler>,
    pub debug_enabled: bool,
}

/// A registered timer together with the generation its callback checks.
#[derive(Debug, Clone, Copy)]
struct TimerSlot {
    handle: TimerHandle,
    generation: u64,
}

struct EngineState {
    settings: EngineSettings,
    control: ControlState,
    recurring: Option<TimerSlot>,
    test_timer: Option<TimerSlot>,
    next_generation: u64,
}

impl EngineState {
    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

struct Shared {
    state: Mutex<EngineState>,
    intensity: IntensityHandle,
    clock: Arc<dyn TimeSource>,
    scheduler: Arc<dyn Scheduler>,
    subscribers: Mutex<Vec<Sender<EngineEvent>>>,
    debug_enabled: bool,
}

/// Drives the published effect intensity from schedule, manual input and the
/// test animation.
///
/// One instance per process is expected; share it behind an `Arc`. Dropping
/// the engine cancels its timers.
pub struct IntensityEngine {
    shared: Arc<Shared>,
}

impl IntensityEngine {
    /// Create the engine, start the recurring timer and publish the intensity
    /// for the current time.
    pub fn new(params: EngineParams) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(EngineState {
                settings: params.settings,
                control: ControlState::Automatic,
                recurring: None,
                test_timer: None,
                next_generation: 0,
            }),
            intensity: IntensityHandle::new(0.0),
            clock: params.clock,
            scheduler: params.scheduler,
            subscribers: Mutex::new(Vec::new()),
            debug_enabled: params.debug_enabled,
        });

        {
            let mut state = shared.lock();
            shared.install_recurring(&mut state);
            shared.recompute(&state);
        }

        Self { shared }
    }

    /// Engine with default settings (21:00 → 22:00, every day, linear, blur).
    pub fn with_defaults(clock: Arc<dyn TimeSource>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self::new(EngineParams {
            settings: EngineSettings::default(),
            clock,
            scheduler,
            debug_enabled: false,
        })
    }

    // # Read API

    /// Currently published intensity in `[0, 1]`.
    pub fn intensity(&self) -> f64 {
        self.shared.intensity.get()
    }

    /// Shareable lock-free view of the intensity.
    pub fn intensity_handle(&self) -> IntensityHandle {
        self.shared.intensity.clone()
    }

    /// Concrete mode for today, recomputed on every call so a new day picks a
    /// new random mode without a restart.
    pub fn resolved_mode(&self) -> EffectMode {
        let today = self.shared.clock.now().date_naive();
        self.shared.lock().settings.mode.resolve(today)
    }

    pub fn control_state(&self) -> ControlState {
        self.shared.lock().control
    }

    pub fn settings(&self) -> EngineSettings {
        self.shared.lock().settings
    }

    pub fn schedule(&self) -> ScheduleWindow {
        self.shared.lock().settings.window
    }

    pub fn curve(&self) -> AccelerationCurve {
        self.shared.lock().settings.curve
    }

    pub fn mode_selection(&self) -> ModeSelection {
        self.shared.lock().settings.mode
    }

    /// Receive every future [`EngineEvent`]. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut subscribers) = self.shared.subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }

    // # Configuration

    /// Replace the schedule window. A new start or end re-derives the tick
    /// cadence and swaps the recurring timer.
    pub fn set_schedule(&self, window: ScheduleWindow) {
        let shared = &self.shared;
        let mut state = shared.lock();
        let span_changed = !state.settings.window.same_span(&window);
        state.settings.window = window;

        if span_changed {
            shared.install_recurring(&mut state);
        }

        shared.notify(EngineEvent::SettingsChanged(state.settings));
        shared.recompute(&state);
    }

    /// Replace the acceleration curve. A running test animation picks it up on
    /// its next frame.
    pub fn set_curve(&self, curve: AccelerationCurve) {
        let shared = &self.shared;
        let mut state = shared.lock();
        state.settings.curve = curve;
        shared.notify(EngineEvent::SettingsChanged(state.settings));
        shared.recompute(&state);
    }

    pub fn set_mode(&self, mode: ModeSelection) {
        let shared = &self.shared;
        let mut state = shared.lock();
        state.settings.mode = mode;
        shared.notify(EngineEvent::SettingsChanged(state.settings));
        shared.recompute(&state);
    }

    /// Apply window, curve and mode in one step, e.g. after a config reload.
    pub fn apply_settings(&self, settings: EngineSettings) {
        let shared = &self.shared;
        let mut state = shared.lock();
        let span_changed = !state.settings.window.same_span(&settings.window);
        state.settings = settings;

        if span_changed {
            shared.install_recurring(&mut state);
        }

        shared.notify(EngineEvent::SettingsChanged(state.settings));
        shared.recompute(&state);
    }

    // # Control

    /// Pin the intensity to `value`, clamped to `[0, 1]`.
    ///
    /// Refused while the test animation runs: only a new `start_test` or the
    /// animation's own completion can end Testing. Returns whether the value
    /// was applied.
    pub fn set_manual_intensity(&self, value: f64) -> bool {
        let shared = &self.shared;
        let mut state = shared.lock();

        if state.control.is_testing() {
            if shared.debug_enabled {
                log_debug!("Ignoring manual intensity while the test animation runs");
            }
            return false;
        }

        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };
        shared.set_control(&mut state, ControlState::Manual { value });
        shared.publish(value);
        true
    }

    /// Leave manual mode and publish the schedule's intensity for right now.
    /// Has no effect while the test animation runs.
    pub fn resume_automatic(&self) {
        let shared = &self.shared;
        let mut state = shared.lock();

        match state.control {
            ControlState::Testing { .. } => {
                if shared.debug_enabled {
                    log_debug!("Test animation running, automatic mode resumes when it ends");
                }
            }
            ControlState::Manual { .. } | ControlState::Automatic => {
                shared.set_control(&mut state, ControlState::Automatic);
                shared.recompute(&state);
            }
        }
    }

    /// Start the 30 second test animation, restarting it if one is running.
    ///
    /// Overrides manual mode. Intensity restarts at 0 and follows the current
    /// curve; when the animation ends control returns to the schedule.
    pub fn start_test(&self) {
        let shared = &self.shared;
        let mut state = shared.lock();

        if let Some(slot) = state.test_timer.take() {
            shared.scheduler.cancel(slot.handle);
        }

        let started = shared.clock.instant();
        shared.set_control(&mut state, ControlState::Testing { started });
        shared.publish(0.0);

        let generation = state.bump_generation();
        let callback = test_frame_callback(shared, generation);
        let handle = shared
            .scheduler
            .schedule_repeating(TEST_FRAME_PERIOD, callback);
        state.test_timer = Some(TimerSlot { handle, generation });

        if shared.debug_enabled {
            log_debug!(
                "Test animation started ({}s, {} curve)",
                TEST_ANIMATION_DURATION.as_secs(),
                state.settings.curve
            );
        }
    }

    /// Recompute the automatic intensity now instead of waiting for the next
    /// tick, e.g. after the system resumed from sleep.
    pub fn refresh(&self) {
        let state = self.shared.lock();
        self.shared.recompute(&state);
    }

    /// Cancel every timer. The engine stops updating afterwards.
    pub fn shutdown(&self) {
        let shared = &self.shared;
        let mut state = shared.lock();
        for slot in [state.recurring.take(), state.test_timer.take()]
            .into_iter()
            .flatten()
        {
            shared.scheduler.cancel(slot.handle);
        }
    }
}

impl Drop for IntensityEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        // Every mutation leaves the state consistent, so a poisoned lock is still usable
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cancel the current recurring timer and install one at the cadence of
    /// the current window.
    fn install_recurring(self: &Arc<Self>, state: &mut EngineState) {
        if let Some(slot) = state.recurring.take() {
            self.scheduler.cancel(slot.handle);
        }

        let period = state.settings.window.tick_period();
        let generation = state.bump_generation();
        let handle = self
            .scheduler
            .schedule_repeating(period, recurring_callback(self, generation));
        state.recurring = Some(TimerSlot { handle, generation });

        if self.debug_enabled {
            log_debug!(
                "Recurring timer every {:.2}s for window {}",
                period.as_secs_f64(),
                state.settings.window
            );
        }
    }

    /// Publish the schedule-derived intensity when in Automatic.
    fn recompute(&self, state: &EngineState) {
        if !state.control.is_automatic() {
            return;
        }
        let now = self.clock.now();
        let progress = state.settings.window.progress_at(&now);
        self.publish(state.settings.curve.apply(progress));
    }

    fn publish(&self, value: f64) {
        if self.intensity.set(value) {
            self.notify(EngineEvent::IntensityChanged(value));
        }
    }

    fn set_control(&self, state: &mut EngineState, control: ControlState) {
        if state.control != control {
            state.control = control;
            self.notify(EngineEvent::ControlChanged(control));
        }
    }

    fn notify(&self, event: EngineEvent) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }

    fn on_recurring_tick(&self, generation: u64) {
        let state = self.lock();
        if state.recurring.map(|slot| slot.generation) != Some(generation) {
            return;
        }
        self.recompute(&state);
    }

    fn on_test_frame(&self, generation: u64) {
        let mut state = self.lock();
        if state.test_timer.map(|slot| slot.generation) != Some(generation) {
            return;
        }

        let ControlState::Testing { started } = state.control else {
            // Control left Testing without cancelling the animation
            if let Some(slot) = state.test_timer.take() {
                self.scheduler.cancel(slot.handle);
            }
            return;
        };

        let elapsed = self
            .clock
            .instant()
            .saturating_duration_since(started)
            .as_secs_f64();
        let progress = (elapsed / TEST_ANIMATION_DURATION.as_secs_f64()).min(1.0);
        self.publish(state.settings.curve.apply(progress));

        if progress >= 1.0 {
            if let Some(slot) = state.test_timer.take() {
                self.scheduler.cancel(slot.handle);
            }
            self.set_control(&mut state, ControlState::Automatic);
            self.recompute(&state);

            if self.debug_enabled {
                log_debug!(
                    "Test animation complete, schedule resumes at {:.0}%",
                    self.intensity.get() * 100.0
                );
            }
        }
    }
}

fn recurring_callback(shared: &Arc<Shared>, generation: u64) -> TimerCallback {
    let weak: Weak<Shared> = Arc::downgrade(shared);
    Arc::new(move || {
        if let Some(shared) = weak.upgrade() {
            shared.on_recurring_tick(generation);
        }
    })
}

fn test_frame_callback(shared: &Arc<Shared>, generation: u64) -> TimerCallback {
    let weak: Weak<Shared> = Arc::downgrade(shared);
    Arc::new(move || {
        if let Some(shared) = weak.upgrade() {
            shared.on_test_frame(generation);
        }
    })
}
