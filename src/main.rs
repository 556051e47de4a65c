//! Anotar CLI
//!
//! Entry point for estimator invocation, dataset export, preset handling,
//! and the human-in-the-loop training loop.
//!
//! # Usage
//!
//! ```bash
//! # Fit a model by name
//! anotar fit --model ridgeRegression --train-data X.csv --train-target y.csv \
//!     --test-data Xt.csv --alpha 0.5
//!
//! # Export a built-in dataset to CSV
//! anotar dataset diabetes --data-path X.csv --target-path y.csv
//!
//! # Run the staggered active-learning loop
//! anotar hitl train hitl.yaml
//!
//! # List presets discovered in a directory
//! anotar presets list --dir presets/
//! ```

use anotar::cli::{run_command, Cli};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
