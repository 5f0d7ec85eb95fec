//! File watching for hot config reloading.
//!
//! Watches the directory containing `slowburn.toml` and, after a short
//! debounce, reloads the file and hands the new configuration to the main
//! loop. A file that fails to parse is reported and ignored; the engine keeps
//! running with the previous settings.

use anyhow::{Context, Result};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use super::Config;
use crate::common::constants::CONFIG_DEBOUNCE_MS;
use crate::signals::ControlMessage;

/// Start watching `config_path` for changes.
///
/// Spawns a background thread that owns the watcher for the rest of the
/// process lifetime.
pub fn start_config_watcher(
    config_path: PathBuf,
    sender: Sender<ControlMessage>,
    debug_enabled: bool,
) -> Result<()> {
    let watch_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .context("Config path has no parent directory")?;

    if !watch_dir.exists() {
        if debug_enabled {
            log_pipe!();
            log_debug!(
                "Config directory {} does not exist, hot reload disabled",
                watch_dir.display()
            );
        }
        return Ok(());
    }

    let (tx, rx) = mpsc::channel();
    let file_name = config_path.file_name().map(|n| n.to_os_string());

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                let relevant = matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) && event
                    .paths
                    .iter()
                    .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                if relevant {
                    let _ = tx.send(event);
                }
            }
        },
        NotifyConfig::default(),
    )
    .context("Failed to create file watcher")?;

    // Watch the directory rather than the file so editor rename-and-replace saves are seen
    watcher
        .watch(&watch_dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch directory: {}", watch_dir.display()))?;

    if debug_enabled {
        log_pipe!();
        log_debug!("Watching {} for changes", config_path.display());
    }

    thread::spawn(move || {
        let _watcher = watcher;
        let debounce = Duration::from_millis(CONFIG_DEBOUNCE_MS);

        while rx.recv().is_ok() {
            // Swallow the burst of events a single save produces
            loop {
                match rx.recv_timeout(debounce) {
                    Ok(_) => continue,
                    Err(RecvTimeoutError::Timeout) => break,
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            }

            let config = if config_path.exists() {
                match super::load_from_path(&config_path) {
                    Ok(config) => config,
                    Err(e) => {
                        log_pipe!();
                        log_error!("Config reload failed: {e:#}");
                        log_indented!("Keeping the previous settings");
                        continue;
                    }
                }
            } else {
                Config::default()
            };

            if sender.send(ControlMessage::Reload(Box::new(config))).is_err() {
                break;
            }
        }
    });

    Ok(())
}
