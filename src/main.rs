//! Main application entry point and high-level flow coordination.
//!
//! Parses the command line, handles the early exits (help, version, argument
//! errors) and hands everything else to the library:
//!
//! - `Slowburn`: the daemon, optionally starting in test or manual mode
//! - `commands::preview`: one-shot evaluation of the schedule at a given time
//!
//! Errors bubble up as `anyhow` chains and are printed once here.

use anyhow::Result;

use slowburn::args::{self, CliAction, ParsedArgs};
use slowburn::common::constants::{EXIT_FAILURE, EXIT_SUCCESS};
use slowburn::logger::Log;
use slowburn::{Slowburn, commands, config, log_block_start, log_error_exit};

fn main() {
    let code = match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            log_error_exit!("{}", e);
            for cause in e.chain().skip(1) {
                eprintln!("  {cause}");
            }
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}

fn run() -> Result<()> {
    let parsed_args = ParsedArgs::parse(std::env::args());

    match parsed_args.action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::Run {
            debug_enabled,
            config_dir,
            log_file,
            startup,
        } => {
            config::set_config_dir(config_dir)?;

            // Keep the guard alive until the daemon stops so buffered lines get flushed
            let _log_guard = match log_file {
                Some(path) => {
                    log_block_start!("Logging to {}", path);
                    Some(Log::start_file_logging(path)?)
                }
                None => None,
            };

            Slowburn::new(debug_enabled).with_startup(startup).run()
        }
        CliAction::Preview {
            debug_enabled,
            config_dir,
            at,
        } => {
            config::set_config_dir(config_dir)?;
            commands::preview::handle_preview_command(&at, debug_enabled)
        }
    }
}
