//! Signal handling and the control message channel.
//!
//! POSIX signals and the config watcher both talk to the main loop through a
//! single `mpsc` channel of [`ControlMessage`]s:
//!
//! - `SIGUSR1` starts the test animation
//! - `SIGUSR2` leaves manual mode
//! - `SIGINT`, `SIGTERM`, `SIGHUP` shut down

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR1, SIGUSR2},
    iterator::Signals,
};
use std::sync::mpsc::Sender;
use std::thread;

use crate::config::Config;

/// Requests delivered to the main loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    /// Run the 30 second test animation.
    StartTest,
    /// Pin the intensity to a value.
    Manual(f64),
    /// Return from manual mode to the schedule.
    ResumeAutomatic,
    /// The configuration file changed.
    Reload(Box<Config>),
    /// Stop the daemon.
    Shutdown,
}

/// Map a received signal number to its control message.
pub fn message_for_signal(signal: i32) -> Option<ControlMessage> {
    match signal {
        SIGUSR1 => Some(ControlMessage::StartTest),
        SIGUSR2 => Some(ControlMessage::ResumeAutomatic),
        SIGINT | SIGTERM | SIGHUP => Some(ControlMessage::Shutdown),
        _ => None,
    }
}

/// Install signal handlers and forward them to `sender` from a background
/// thread.
pub fn setup_signal_handler(sender: Sender<ControlMessage>, debug_enabled: bool) -> Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR1, SIGUSR2])
        .context("failed to register signal handlers")?;

    thread::spawn(move || {
        for signal in signals.forever() {
            let Some(message) = message_for_signal(signal) else {
                continue;
            };

            if debug_enabled {
                log_pipe!();
                log_debug!("Received signal {signal}: {message:?}");
            }

            let shutting_down = message == ControlMessage::Shutdown;
            if sender.send(message).is_err() || shutting_down {
                break;
            }
        }
    });

    Ok(())
}
