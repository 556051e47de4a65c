//! CLI command implementations

mod dataset;
mod fit;
mod hitl;
mod presets;

use crate::cli::args::{Cli, Command};
use crate::cli::LogLevel;

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let log_level = if cli.quiet {
        LogLevel::Quiet
    } else if cli.verbose {
        LogLevel::Verbose
    } else {
        LogLevel::Normal
    };

    match cli.command {
        Command::Fit(args) => fit::run_fit(args, log_level),
        Command::Dataset(args) => dataset::run_dataset(args, log_level),
        Command::Hitl(args) => hitl::run_hitl(args, log_level),
        Command::Presets(args) => presets::run_presets(args, log_level),
    }
}
