//! CLI module for anotar
//!
//! Argument structs, manual string-to-typed-value coercion, and the
//! command dispatch.

mod args;
mod coerce;
mod commands;
mod logging;

pub use args::{
    parse_args, Cli, Command, DatasetArgs, FitArgs, HitlArgs, HitlCommand, HitlTrainArgs,
    PresetsArgs, PresetsCommand, RawModelArgs,
};
pub use coerce::{
    parse_alphas_arg, parse_bool_arg, parse_float_arg, parse_int_arg, parse_map_arg,
};
pub use commands::run_command;
pub use logging::LogLevel;
