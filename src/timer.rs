//! Repeating timer primitive used by the intensity engine.
//!
//! The engine only needs two operations: start a repeating callback and cancel
//! it. [`ThreadScheduler`] backs each timer with a dedicated thread, which is
//! what the daemon uses. With the `testing-support` feature the
//! [`ManualScheduler`] double is available, firing callbacks only when a test
//! advances virtual time and counting live handles so leaks are observable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Callback invoked on every timer fire.
pub type TimerCallback = Arc<dyn Fn() + Send + Sync>;

/// Opaque identifier of a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Scheduling primitive consumed by the engine.
///
/// Implementations must never run a callback synchronously from inside
/// `schedule_repeating` or `cancel`; the engine calls both while holding its
/// own state lock.
#[cfg_attr(test, mockall::automock)]
pub trait Scheduler: Send + Sync {
    /// Run `callback` every `period` until cancelled. The first fire happens
    /// one period from now.
    fn schedule_repeating(&self, period: Duration, callback: TimerCallback) -> TimerHandle;

    /// Stop a timer. Unknown or already cancelled handles are ignored.
    fn cancel(&self, handle: TimerHandle);
}

/// Thread-per-timer scheduler.
///
/// Each timer thread waits on a channel with a deadline; dropping the sender
/// on cancel wakes it immediately so it exits without another fire. Deadlines
/// are computed from the start instant, so the cadence does not drift with
/// callback run time.
pub struct ThreadScheduler {
    next_id: AtomicU64,
    timers: Mutex<HashMap<TimerHandle, Sender<()>>>,
}

impl ThreadScheduler {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Number of timers that have not been cancelled.
    pub fn live_count(&self) -> usize {
        self.timers.lock().map(|t| t.len()).unwrap_or(0)
    }
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule_repeating(&self, period: Duration, callback: TimerCallback) -> TimerHandle {
        let handle = TimerHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        let period = period.max(Duration::from_millis(1));
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        if let Ok(mut timers) = self.timers.lock() {
            timers.insert(handle, stop_tx);
        }

        thread::spawn(move || {
            let start = Instant::now();
            let mut fires: u32 = 0;
            loop {
                fires = fires.saturating_add(1);
                let deadline = start + period * fires;
                let wait = deadline.saturating_duration_since(Instant::now());
                match stop_rx.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => callback(),
                    // Cancelled: sender dropped (or an explicit stop message)
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Ok(mut timers) = self.timers.lock() {
            timers.remove(&handle);
        }
    }
}

#[cfg(any(test, feature = "testing-support"))]
pub use manual::ManualScheduler;

#[cfg(any(test, feature = "testing-support"))]
mod manual {
    use super::*;
    use crate::time_source::ManualTimeSource;

    struct ManualTimer {
        period: Duration,
        next_due: Duration,
        callback: TimerCallback,
    }

    #[derive(Default)]
    struct ManualState {
        next_id: u64,
        elapsed: Duration,
        timers: HashMap<TimerHandle, ManualTimer>,
        cancelled: HashMap<TimerHandle, TimerCallback>,
        scheduled_total: usize,
        cancelled_total: usize,
    }

    /// Deterministic scheduler for tests.
    ///
    /// Timers fire only inside [`advance`](Self::advance), which also moves the
    /// paired [`ManualTimeSource`] so callbacks observe the time they were due.
    #[derive(Default)]
    pub struct ManualScheduler {
        state: Mutex<ManualState>,
    }

    impl ManualScheduler {
        pub fn new() -> Self {
            Self::default()
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
            self.state.lock().unwrap_or_else(|e| e.into_inner())
        }

        /// Number of timers currently alive.
        pub fn live_count(&self) -> usize {
            self.lock().timers.len()
        }

        /// Periods of all live timers, shortest first.
        pub fn live_periods(&self) -> Vec<Duration> {
            let mut periods: Vec<_> = self.lock().timers.values().map(|t| t.period).collect();
            periods.sort();
            periods
        }

        /// Handles of all live timers in creation order.
        pub fn live_handles(&self) -> Vec<TimerHandle> {
            let mut handles: Vec<_> = self.lock().timers.keys().copied().collect();
            handles.sort();
            handles
        }

        /// Total `schedule_repeating` calls so far.
        pub fn scheduled_total(&self) -> usize {
            self.lock().scheduled_total
        }

        /// Total effective `cancel` calls so far.
        pub fn cancelled_total(&self) -> usize {
            self.lock().cancelled_total
        }

        /// Invoke a cancelled timer's callback once, emulating a fire that
        /// raced its own cancellation. Returns false for unknown handles.
        pub fn fire_stale(&self, handle: TimerHandle) -> bool {
            let callback = self.lock().cancelled.get(&handle).cloned();
            match callback {
                Some(callback) => {
                    callback();
                    true
                }
                None => false,
            }
        }

        /// Advance virtual time by `by`, firing every timer that comes due in
        /// order and keeping `clock` in step.
        pub fn advance(&self, clock: &ManualTimeSource, by: Duration) {
            let target = self.lock().elapsed + by;

            loop {
                let due = {
                    let mut state = self.lock();
                    let next = state
                        .timers
                        .iter()
                        .filter(|(_, timer)| timer.next_due <= target)
                        .min_by_key(|(handle, timer)| (timer.next_due, **handle))
                        .map(|(handle, timer)| (*handle, timer.next_due));

                    match next {
                        Some((handle, next_due)) => {
                            let step = next_due.saturating_sub(state.elapsed);
                            state.elapsed = next_due;
                            let timer = state.timers.get_mut(&handle);
                            timer.map(|timer| {
                                timer.next_due += timer.period;
                                (step, Arc::clone(&timer.callback))
                            })
                        }
                        None => {
                            let step = target.saturating_sub(state.elapsed);
                            state.elapsed = target;
                            drop(state);
                            clock.advance(step);
                            return;
                        }
                    }
                };

                // Fire outside the lock so callbacks may schedule or cancel
                if let Some((step, callback)) = due {
                    clock.advance(step);
                    callback();
                }
            }
        }
    }

    impl Scheduler for ManualScheduler {
        fn schedule_repeating(&self, period: Duration, callback: TimerCallback) -> TimerHandle {
            let mut state = self.lock();
            state.next_id += 1;
            let handle = TimerHandle(state.next_id);
            let period = period.max(Duration::from_millis(1));
            let next_due = state.elapsed + period;
            state.timers.insert(
                handle,
                ManualTimer {
                    period,
                    next_due,
                    callback,
                },
            );
            state.scheduled_total += 1;
            handle
        }

        fn cancel(&self, handle: TimerHandle) {
            let mut state = self.lock();
            if let Some(timer) = state.timers.remove(&handle) {
                state.cancelled.insert(handle, timer.callback);
                state.cancelled_total += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_source::{ManualTimeSource, TimeSource};
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, TimerCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        let callback: TimerCallback = Arc::new(move || {
            inner.fetch_add(1, Ordering::SeqCst);
        });
        (count, callback)
    }

    #[test]
    fn test_manual_scheduler_fires_on_cadence() {
        let clock = ManualTimeSource::at("2025-01-01 21:00:00").unwrap();
        let scheduler = ManualScheduler::new();
        let (count, callback) = counter();

        scheduler.schedule_repeating(Duration::from_secs(6), callback);
        scheduler.advance(&clock, Duration::from_secs(5));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        scheduler.advance(&clock, Duration::from_secs(13));
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(clock.now().format("%H:%M:%S").to_string(), "21:00:18");
    }

    #[test]
    fn test_manual_scheduler_cancel_stops_fires() {
        let clock = ManualTimeSource::at("2025-01-01 21:00:00").unwrap();
        let scheduler = ManualScheduler::new();
        let (count, callback) = counter();

        let handle = scheduler.schedule_repeating(Duration::from_secs(1), callback);
        scheduler.advance(&clock, Duration::from_secs(2));
        scheduler.cancel(handle);
        scheduler.cancel(handle);
        scheduler.advance(&clock, Duration::from_secs(10));

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.live_count(), 0);
        assert_eq!(scheduler.cancelled_total(), 1);
        assert!(scheduler.fire_stale(handle));
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_thread_scheduler_fires_and_cancels() {
        let scheduler = ThreadScheduler::new();
        let (count, callback) = counter();

        let handle = scheduler.schedule_repeating(Duration::from_millis(10), callback);
        thread::sleep(Duration::from_millis(80));
        scheduler.cancel(handle);
        assert_eq!(scheduler.live_count(), 0);

        // Allow a fire that was already in flight to land
        thread::sleep(Duration::from_millis(30));
        let after_cancel = count.load(Ordering::SeqCst);
        assert!(after_cancel >= 2, "expected several fires, got {after_cancel}");

        thread::sleep(Duration::from_millis(60));
        assert_eq!(count.load(Ordering::SeqCst), after_cancel);
    }
}
