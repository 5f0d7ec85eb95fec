//! Structured logging with box-drawing output.
//!
//! Every line slowburn prints goes through the macros in this module so the
//! daemon output reads as one continuous tree:
//!
//! ```text
//! ┏ slowburn v0.3.0 ━━╸
//! ┃
//! ┣ Loaded configuration
//! ┃   Window: 21:00 → 22:00
//! ┣[INFO] Intensity 42%
//! ╹
//! ```
//!
//! ## Conventions
//!
//! - `log_block_start!` opens a new conceptual block (blank pipe, then `┣ message`).
//! - `log_decorated!` continues the current block.
//! - `log_indented!` lists details that belong to the line above it.
//! - `log_pipe!` inserts vertical spacing before a leveled message.
//! - `log_info!`, `log_warning!`, `log_error!`, `log_debug!`, `log_critical!` carry
//!   a colored `[LEVEL]` tag.
//! - `log_version!` / `log_end!` open and close the whole run.
//!
//! Output can be silenced at runtime with [`Log::set_enabled`] and routed to a
//! file with [`Log::start_file_logging`]. When a simulated clock is installed
//! with [`Log::set_timestamp_source`], every line is prefixed with the
//! simulated wall-clock time.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};
use std::sync::{Arc, OnceLock};

use crate::time_source::TimeSource;

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

// Clock used for timestamp prefixes, only consulted when it is simulated
static TIMESTAMP_SOURCE: OnceLock<Arc<dyn TimeSource>> = OnceLock::new();

// Channel for routing output to file when --log is active
static LOG_CHANNEL: OnceLock<Sender<LogMessage>> = OnceLock::new();

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// Main logging interface. See the module docs for the macro conventions.
pub struct Log;

impl Log {
    /// Enable or disable logging.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Install the clock used for timestamp prefixes. Only the first call wins.
    pub fn set_timestamp_source(source: Arc<dyn TimeSource>) {
        let _ = TIMESTAMP_SOURCE.set(source);
    }

    /// Start file logging to the specified path.
    ///
    /// Output is written by a background thread until the returned guard drops.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(tx.clone())
            .map_err(|_| anyhow::anyhow!("Logger channel already initialized"))?;

        let handle = std::thread::spawn(move || {
            let mut file = std::fs::File::create(&file_path)?;

            loop {
                match rx.recv() {
                    Ok(LogMessage::Formatted(text)) => file.write_all(text.as_bytes())?,
                    Ok(LogMessage::Shutdown) | Err(_) => {
                        file.flush()?;
                        break;
                    }
                }
            }

            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// Timestamp prefix for simulated runs, `[HH:MM:SS] `.
    ///
    /// Empty when no simulated clock is installed. Public for macro access.
    pub fn get_timestamp_prefix() -> String {
        match TIMESTAMP_SOURCE.get() {
            Some(source) if source.is_simulated() => {
                format!("[{}] ", source.now().format("%H:%M:%S"))
            }
            _ => String::new(),
        }
    }
}

/// Guard for file logging that flushes and joins the writer thread on drop.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Route a formatted line to the log file when active, otherwise to stdout.
pub fn write_output(text: &str) {
    if let Some(tx) = LOG_CHANNEL.get() {
        let _ = tx.send(LogMessage::Formatted(strip_ansi_codes(text)));
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

/// Render one log line: `marker` follows the timestamp prefix, `lead` is an
/// optional pipe line emitted before it.
#[doc(hidden)]
pub fn emit(lead: bool, marker: &str, message: std::fmt::Arguments<'_>) {
    if !Log::is_enabled() {
        return;
    }
    let prefix = Log::get_timestamp_prefix();
    let formatted = if lead {
        format!("{prefix}┃\n{prefix}{marker}{message}\n")
    } else {
        format!("{prefix}{marker}{message}\n")
    };
    write_output(&formatted);
}

// # Logging Macros

/// Log a decorated message as part of the current block.
#[macro_export]
macro_rules! log_decorated {
    ($fmt:literal $($arg:tt)*) => {
        $crate::logger::emit(false, "┣ ", format_args!($fmt $($arg)*))
    };
    ($expr:expr) => {
        $crate::logger::emit(false, "┣ ", format_args!("{}", $expr))
    };
}

/// Log an indented detail line.
#[macro_export]
macro_rules! log_indented {
    ($fmt:literal $($arg:tt)*) => {
        $crate::logger::emit(false, "┃   ", format_args!($fmt $($arg)*))
    };
    ($expr:expr) => {
        $crate::logger::emit(false, "┃   ", format_args!("{}", $expr))
    };
}

/// Log an empty pipe for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {
        $crate::logger::emit(false, "┃", format_args!(""))
    };
}

/// Start a new block of related messages.
#[macro_export]
macro_rules! log_block_start {
    ($fmt:literal $($arg:tt)*) => {
        $crate::logger::emit(true, "┣ ", format_args!($fmt $($arg)*))
    };
    ($expr:expr) => {
        $crate::logger::emit(true, "┣ ", format_args!("{}", $expr))
    };
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => {
        $crate::logger::emit(
            false,
            "┏ ",
            format_args!("slowburn v{} ━━╸", env!("CARGO_PKG_VERSION")),
        )
    };
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {
        $crate::logger::emit(false, "╹", format_args!(""))
    };
}

/// Log a warning with a yellow `[WARNING]` tag.
#[macro_export]
macro_rules! log_warning {
    ($fmt:literal $($arg:tt)*) => {
        $crate::logger::emit(false, "┣[\x1b[33mWARNING\x1b[0m] ", format_args!($fmt $($arg)*))
    };
    ($expr:expr) => {
        $crate::logger::emit(false, "┣[\x1b[33mWARNING\x1b[0m] ", format_args!("{}", $expr))
    };
}

/// Log an error with a red `[ERROR]` tag.
#[macro_export]
macro_rules! log_error {
    ($fmt:literal $($arg:tt)*) => {
        $crate::logger::emit(false, "┣[\x1b[31mERROR\x1b[0m] ", format_args!($fmt $($arg)*))
    };
    ($expr:expr) => {
        $crate::logger::emit(false, "┣[\x1b[31mERROR\x1b[0m] ", format_args!("{}", $expr))
    };
}

/// Log an error that terminates the run, closing the tree with `┗`.
#[macro_export]
macro_rules! log_error_exit {
    ($fmt:literal $($arg:tt)*) => {
        $crate::logger::emit(true, "┗[\x1b[31mERROR\x1b[0m] ", format_args!($fmt $($arg)*))
    };
    ($expr:expr) => {
        $crate::logger::emit(true, "┗[\x1b[31mERROR\x1b[0m] ", format_args!("{}", $expr))
    };
}

/// Log an informational message with a green `[INFO]` tag.
#[macro_export]
macro_rules! log_info {
    ($fmt:literal $($arg:tt)*) => {
        $crate::logger::emit(false, "┣[\x1b[32mINFO\x1b[0m] ", format_args!($fmt $($arg)*))
    };
    ($expr:expr) => {
        $crate::logger::emit(false, "┣[\x1b[32mINFO\x1b[0m] ", format_args!("{}", $expr))
    };
}

/// Log an operational message with a green `[DEBUG]` tag.
#[macro_export]
macro_rules! log_debug {
    ($fmt:literal $($arg:tt)*) => {
        $crate::logger::emit(false, "┣[\x1b[32mDEBUG\x1b[0m] ", format_args!($fmt $($arg)*))
    };
    ($expr:expr) => {
        $crate::logger::emit(false, "┣[\x1b[32mDEBUG\x1b[0m] ", format_args!("{}", $expr))
    };
}

/// Log a critical message with a red `[CRITICAL]` tag.
#[macro_export]
macro_rules! log_critical {
    ($fmt:literal $($arg:tt)*) => {
        $crate::logger::emit(false, "┣[\x1b[31mCRITICAL\x1b[0m] ", format_args!($fmt $($arg)*))
    };
    ($expr:expr) => {
        $crate::logger::emit(false, "┣[\x1b[31mCRITICAL\x1b[0m] ", format_args!("{}", $expr))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_strip_ansi_codes() {
        assert_eq!(
            strip_ansi_codes("┣[\x1b[33mWARNING\x1b[0m] careful"),
            "┣[WARNING] careful"
        );
        assert_eq!(strip_ansi_codes("plain"), "plain");
    }

    #[test]
    #[serial]
    fn test_set_enabled_toggles() {
        Log::set_enabled(false);
        assert!(!Log::is_enabled());
        // Silenced output must not panic
        log_info!("hidden {}", 1);
        Log::set_enabled(true);
        assert!(Log::is_enabled());
    }
}
