//! CLI output levels

/// Output level for CLI commands
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Suppress everything except errors
    Quiet,
    /// Default output
    Normal,
    /// Extra detail
    Verbose,
}

/// Print a message when the active level permits it
pub fn log(level: LogLevel, required: LogLevel, msg: &str) {
    if level != LogLevel::Quiet && (level == required || required == LogLevel::Normal) {
        println!("{msg}");
    }
}
