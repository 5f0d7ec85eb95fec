//! Command-line argument parsing.
//!
//! Turns `std::env::args()` into a [`CliAction`]. Flags may appear anywhere;
//! the first bare word selects the command.

/// What the daemon does right after start-up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StartupAction {
    /// Follow the schedule.
    #[default]
    None,
    /// Run the test animation immediately.
    Test,
    /// Start pinned at a manual intensity.
    Manual(f64),
}

/// Parsed command-line arguments and their intended action.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the daemon.
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        log_file: Option<String>,
        startup: StartupAction,
    },
    /// Evaluate the configuration at a given instant and exit.
    Preview {
        debug_enabled: bool,
        config_dir: Option<String>,
        at: String,
    },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to invalid arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments. The first item is the program name and
    /// is skipped.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ParsedArgs {
            action: parse_action(args.into_iter().skip(1).map(|s| s.as_ref().to_string())),
        }
    }
}

fn parse_action(args: impl Iterator<Item = String>) -> CliAction {
    let mut debug_enabled = false;
    let mut config_dir: Option<String> = None;
    let mut log_file: Option<String> = None;
    let mut words: Vec<String> = Vec::new();

    let mut args = args.peekable();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return CliAction::ShowHelp,
            "--version" | "-V" | "-v" => return CliAction::ShowVersion,
            "--debug" | "-d" => debug_enabled = true,
            "--config" | "-c" => match args.next() {
                Some(dir) => config_dir = Some(dir),
                None => {
                    log_error!("--config requires a directory argument");
                    return CliAction::ShowHelpDueToError;
                }
            },
            "--log" | "-l" => match args.next() {
                Some(file) => log_file = Some(file),
                None => {
                    log_error!("--log requires a file argument");
                    return CliAction::ShowHelpDueToError;
                }
            },
            flag if flag.starts_with('-') && flag.parse::<f64>().is_err() => {
                log_warning!("Unknown option: {}", flag);
                return CliAction::ShowHelpDueToError;
            }
            _ => words.push(arg),
        }
    }

    let mut words = words.into_iter();
    let command = words.next();
    let rest: Vec<String> = words.collect();

    let run = |startup| CliAction::Run {
        debug_enabled,
        config_dir: config_dir.clone(),
        log_file: log_file.clone(),
        startup,
    };

    match command.as_deref() {
        None if rest.is_empty() => run(StartupAction::None),
        Some("help") | Some("h") => CliAction::ShowHelp,
        Some("test") | Some("t") if rest.is_empty() => run(StartupAction::Test),
        Some("manual") | Some("m") => match rest.as_slice() {
            [value] => match value.parse::<f64>() {
                Ok(value) if value.is_finite() => run(StartupAction::Manual(value)),
                _ => {
                    log_error!("Manual intensity must be a number between 0 and 1, got '{}'", value);
                    CliAction::ShowHelpDueToError
                }
            },
            _ => {
                log_error!("Usage: slowburn manual <0..1>");
                CliAction::ShowHelpDueToError
            }
        },
        Some("preview") | Some("p") => match rest.as_slice() {
            [datetime] => CliAction::Preview {
                debug_enabled,
                config_dir: config_dir.clone(),
                at: datetime.clone(),
            },
            [date, time] => CliAction::Preview {
                debug_enabled,
                config_dir: config_dir.clone(),
                at: format!("{date} {time}"),
            },
            _ => {
                log_error!("Usage: slowburn preview <YYYY-MM-DD> <HH:MM:SS>");
                CliAction::ShowHelpDueToError
            }
        },
        Some(other) => {
            log_warning!("Unknown command: {}", other);
            CliAction::ShowHelpDueToError
        }
        None => CliAction::ShowHelpDueToError,
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("slowburn [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-l, --log <file>       Write log output to a file");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("manual, m <0..1>       Start pinned at a manual intensity");
    log_indented!("preview, p <datetime>  Show the intensity the schedule gives at a time");
    log_indented!("                       Format: YYYY-MM-DD HH:MM:SS");
    log_indented!("test, t                Start with the 30 second test animation");
    log_block_start!("Signals:");
    log_indented!("SIGUSR1                Run the test animation");
    log_indented!("SIGUSR2                Leave manual mode and follow the schedule");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliAction {
        let mut full = vec!["slowburn"];
        full.extend_from_slice(args);
        ParsedArgs::parse(full).action
    }

    #[test]
    fn test_no_args_runs_daemon() {
        assert_eq!(
            parse(&[]),
            CliAction::Run {
                debug_enabled: false,
                config_dir: None,
                log_file: None,
                startup: StartupAction::None,
            }
        );
    }

    #[test]
    fn test_flags_anywhere() {
        assert_eq!(
            parse(&["test", "--debug", "-c", "/tmp/cfg", "--log", "out.log"]),
            CliAction::Run {
                debug_enabled: true,
                config_dir: Some("/tmp/cfg".into()),
                log_file: Some("out.log".into()),
                startup: StartupAction::Test,
            }
        );
    }

    #[test]
    fn test_manual_command() {
        assert_eq!(
            parse(&["manual", "0.4"]),
            CliAction::Run {
                debug_enabled: false,
                config_dir: None,
                log_file: None,
                startup: StartupAction::Manual(0.4),
            }
        );
        // Out of range values are clamped by the engine, not rejected here
        assert!(matches!(
            parse(&["m", "-0.3"]),
            CliAction::Run {
                startup: StartupAction::Manual(_),
                ..
            }
        ));
        assert_eq!(parse(&["manual", "lots"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["manual"]), CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_preview_command() {
        let expected = CliAction::Preview {
            debug_enabled: false,
            config_dir: None,
            at: "2025-03-12 21:30:00".into(),
        };
        assert_eq!(parse(&["preview", "2025-03-12", "21:30:00"]), expected);
        assert_eq!(parse(&["p", "2025-03-12 21:30:00"]), expected);
        assert_eq!(parse(&["preview"]), CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(parse(&["--help"]), CliAction::ShowHelp);
        assert_eq!(parse(&["help"]), CliAction::ShowHelp);
        assert_eq!(parse(&["test", "-V"]), CliAction::ShowVersion);
    }

    #[test]
    fn test_unknown_input() {
        assert_eq!(parse(&["--bogus"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["dance"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["--config"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["test", "extra"]), CliAction::ShowHelpDueToError);
    }
}
