use std::sync::Arc;
use std::time::Duration;

use slowburn::time_source::{ManualTimeSource, TimeSource};
use slowburn::timer::ManualScheduler;
use slowburn::{
    AccelerationCurve, ControlState, EngineEvent, EngineParams, EngineSettings, IntensityEngine,
    ModeSelection, ScheduleWindow,
};

// Helper bundling an engine with its simulated clock and scheduler
struct Rig {
    clock: Arc<ManualTimeSource>,
    scheduler: Arc<ManualScheduler>,
    engine: IntensityEngine,
}

fn rig(at: &str, window: ScheduleWindow, curve: AccelerationCurve) -> Rig {
    let clock = Arc::new(ManualTimeSource::at(at).unwrap());
    let scheduler = Arc::new(ManualScheduler::new());
    let engine = IntensityEngine::new(EngineParams {
        settings: EngineSettings {
            window,
            curve,
            mode: ModeSelection::default(),
        },
        clock: clock.clone(),
        scheduler: scheduler.clone(),
        debug_enabled: false,
    });
    Rig {
        clock,
        scheduler,
        engine,
    }
}

fn default_window() -> ScheduleWindow {
    ScheduleWindow::new(21 * 60, 22 * 60)
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_linear_evening_ramp() {
    let r = rig(
        "2025-03-12 20:59:00",
        default_window(),
        AccelerationCurve::Linear,
    );
    assert_eq!(r.engine.intensity(), 0.0);

    r.scheduler.advance(&r.clock, Duration::from_secs(31 * 60));
    assert_close(r.engine.intensity(), 0.5);

    r.scheduler.advance(&r.clock, Duration::from_secs(30 * 60));
    assert_eq!(r.engine.intensity(), 1.0);

    // Past the end the intensity stays full
    r.scheduler.advance(&r.clock, Duration::from_secs(15 * 60));
    assert_eq!(r.engine.intensity(), 1.0);
}

#[test]
fn test_exponential_short_window_midpoint() {
    let r = rig(
        "2025-03-12 00:05:00",
        ScheduleWindow::new(0, 10),
        AccelerationCurve::Exponential,
    );
    assert_close(r.engine.intensity(), 0.03125);
    assert_eq!(r.scheduler.live_periods(), vec![Duration::from_secs(1)]);
}

#[test]
fn test_test_animation_hands_back_to_schedule() {
    let r = rig(
        "2025-03-12 21:30:00",
        default_window(),
        AccelerationCurve::Linear,
    );
    let events = r.engine.subscribe();

    r.engine.start_test();
    assert!(r.engine.control_state().is_testing());
    assert_eq!(r.engine.intensity(), 0.0);

    r.scheduler.advance(&r.clock, Duration::from_secs(15));
    assert!(r.engine.intensity() > 0.45 && r.engine.intensity() < 0.55);

    r.scheduler.advance(&r.clock, Duration::from_secs(15 + 6));
    assert_eq!(r.engine.control_state(), ControlState::Automatic);
    let expected = r.engine.schedule().progress_at(&r.clock.now());
    assert_close(r.engine.intensity(), expected);
    assert_eq!(r.scheduler.live_count(), 1);

    let controls: Vec<ControlState> = events
        .try_iter()
        .filter_map(|event| match event {
            EngineEvent::ControlChanged(state) => Some(state),
            _ => None,
        })
        .collect();
    assert_eq!(controls.len(), 2);
    assert!(controls[0].is_testing());
    assert_eq!(controls[1], ControlState::Automatic);
}

#[test]
fn test_manual_then_resume() {
    let r = rig(
        "2025-03-12 21:15:00",
        default_window(),
        AccelerationCurve::EaseIn,
    );

    assert!(r.engine.set_manual_intensity(1.7));
    assert_eq!(r.engine.intensity(), 1.0);
    assert!(r.engine.set_manual_intensity(-0.3));
    assert_eq!(r.engine.intensity(), 0.0);

    // Ticks leave the pinned value alone
    r.scheduler.advance(&r.clock, Duration::from_secs(15 * 60));
    assert_eq!(r.engine.intensity(), 0.0);

    r.engine.resume_automatic();
    assert_eq!(r.engine.control_state(), ControlState::Automatic);
    assert_close(r.engine.intensity(), 0.25);
}

#[test]
fn test_window_change_replaces_timer_once() {
    let r = rig(
        "2025-03-12 12:00:00",
        default_window(),
        AccelerationCurve::Linear,
    );
    assert_eq!(r.scheduler.live_periods(), vec![Duration::from_secs(6)]);

    r.engine.set_schedule(ScheduleWindow::new(21 * 60, 21 * 60 + 10));
    assert_eq!(r.scheduler.live_periods(), vec![Duration::from_secs(1)]);
    assert_eq!(r.scheduler.scheduled_total(), 2);
    assert_eq!(r.scheduler.cancelled_total(), 1);

    r.engine.set_schedule(ScheduleWindow::new(21 * 60, 21 * 60 + 10));
    assert_eq!(r.scheduler.scheduled_total(), 2);
    assert_eq!(r.scheduler.live_count(), 1);
}

#[test]
fn test_handle_tracks_engine() {
    let r = rig(
        "2025-03-12 21:00:00",
        default_window(),
        AccelerationCurve::Linear,
    );
    let handle = r.engine.intensity_handle();
    assert!(!handle.is_visible());

    r.scheduler.advance(&r.clock, Duration::from_secs(6));
    assert!(handle.is_visible());
    assert_eq!(handle.get(), r.engine.intensity());
}

#[test]
fn test_dropping_engine_cancels_timers() {
    let r = rig(
        "2025-03-12 21:30:00",
        default_window(),
        AccelerationCurve::Linear,
    );
    r.engine.start_test();
    assert_eq!(r.scheduler.live_count(), 2);

    let Rig {
        scheduler, engine, ..
    } = r;
    drop(engine);
    assert_eq!(scheduler.live_count(), 0);
}
