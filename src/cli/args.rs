//! CLI argument structs
//!
//! Hyperparameters on `fit` are deliberately raw strings: they are
//! coerced by the helpers in [`crate::cli::coerce`] with per-model
//! defaults, mirroring how invocations arrive from the pipeline frontend.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Anotar: estimator invocation & annotation training
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "anotar")]
#[command(author = "PAIML")]
#[command(version)]
#[command(about = "Linear-model invocation CLI and human-in-the-loop annotation training")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Fit a linear model by registry name and write its predictions
    Fit(FitArgs),

    /// Load a dataset and export feature/target CSVs
    Dataset(DatasetArgs),

    /// Human-in-the-loop active-learning training
    Hitl(HitlArgs),

    /// Inspect or run presets discovered from a directory
    Presets(PresetsArgs),
}

/// Raw (string-typed) hyperparameters shared by every model wrapper.
///
/// Absent values fall back to each wrapper's documented defaults at
/// coercion time.
#[derive(Args, Debug, Clone, PartialEq, Default)]
pub struct RawModelArgs {
    /// Regularization strength
    #[arg(long)]
    pub alpha: Option<String>,

    /// Comma-separated alpha grid for the *CV models
    #[arg(long)]
    pub alphas: Option<String>,

    /// Elastic-net mixing parameter in [0, 1]
    #[arg(long)]
    pub l1_ratio: Option<String>,

    /// Whether to fit an intercept term
    #[arg(long)]
    pub fit_intercept: Option<String>,

    /// Maximum solver iterations
    #[arg(long)]
    pub max_iter: Option<String>,

    /// Solver convergence tolerance
    #[arg(long)]
    pub tol: Option<String>,

    /// Tweedie power parameter
    #[arg(long)]
    pub power: Option<String>,

    /// GLM link function (auto, identity, log, logit)
    #[arg(long)]
    pub link: Option<String>,

    /// Number of cross-validation folds for the *CV models
    #[arg(long)]
    pub folds: Option<String>,

    /// Seed for the cross-validation shuffle
    #[arg(long)]
    pub seed: Option<String>,
}

/// Arguments for the fit command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct FitArgs {
    /// Registry name of the model to fit (e.g. leastSquares, ridgeRegression)
    #[arg(short, long)]
    pub model: String,

    /// CSV with the training feature matrix
    #[arg(long)]
    pub train_data: PathBuf,

    /// CSV with the training targets
    #[arg(long)]
    pub train_target: PathBuf,

    /// CSV with the test feature matrix
    #[arg(long)]
    pub test_data: PathBuf,

    /// Where to write the JSON fit report (stdout when absent)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub params: RawModelArgs,
}

/// Arguments for the dataset command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct DatasetArgs {
    /// Dataset source: diabetes, winequality, iris, or csv
    pub source: String,

    /// Where to write the feature matrix CSV
    #[arg(short = 'd', long)]
    pub data_path: PathBuf,

    /// Where to write the target CSV
    #[arg(short = 't', long)]
    pub target_path: Option<PathBuf>,

    /// Existing feature CSV to slice (source = csv)
    #[arg(long)]
    pub orig_data_path: Option<PathBuf>,

    /// Existing target CSV to slice (source = csv)
    #[arg(long)]
    pub orig_target_path: Option<PathBuf>,

    /// First feature row to keep (default 0)
    #[arg(long)]
    pub lower_limit_data: Option<usize>,

    /// One past the last feature row to keep (default: all rows)
    #[arg(long)]
    pub upper_limit_data: Option<usize>,

    /// First target row to keep (default 0)
    #[arg(long)]
    pub lower_limit_target: Option<usize>,

    /// One past the last target row to keep (default: all rows)
    #[arg(long)]
    pub upper_limit_target: Option<usize>,
}

/// Arguments for the hitl command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct HitlArgs {
    #[command(subcommand)]
    pub command: HitlCommand,
}

/// Hitl subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum HitlCommand {
    /// Run the staggered active-learning loop from a YAML spec
    Train(HitlTrainArgs),
}

/// Arguments for hitl train
#[derive(Args, Debug, Clone, PartialEq)]
pub struct HitlTrainArgs {
    /// Path to the YAML training spec
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Override number of epochs
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Override learning rate
    #[arg(short, long)]
    pub lr: Option<f32>,

    /// Override per-class loss weights ("0:1.0,1:2.5")
    #[arg(long)]
    pub class_weight: Option<String>,

    /// Resume from this epoch's saved state
    #[arg(short, long)]
    pub resume_epoch: Option<usize>,

    /// Validate the config and print a summary without training
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the presets command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct PresetsArgs {
    /// Directory to walk for preset YAML files
    #[arg(long)]
    pub dir: PathBuf,

    /// Merge preset entries under their bare names instead of
    /// namespacing them by file stem
    #[arg(long)]
    pub flatten: bool,

    #[command(subcommand)]
    pub command: PresetsCommand,
}

/// Preset subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum PresetsCommand {
    /// List every registered preset
    List,

    /// Show one preset's model and arguments
    Show {
        /// Preset name
        name: String,
    },

    /// Fit the model a preset describes
    Run {
        /// Preset name
        name: String,

        /// CSV with the training feature matrix
        #[arg(long)]
        train_data: PathBuf,

        /// CSV with the training targets
        #[arg(long)]
        train_target: PathBuf,

        /// CSV with the test feature matrix
        #[arg(long)]
        test_data: PathBuf,

        /// Where to write the JSON fit report (stdout when absent)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fit() {
        let cli = parse_args([
            "anotar",
            "fit",
            "--model",
            "ridgeRegression",
            "--train-data",
            "X.csv",
            "--train-target",
            "y.csv",
            "--test-data",
            "Xt.csv",
            "--alpha",
            "0.5",
        ])
        .unwrap();

        match cli.command {
            Command::Fit(args) => {
                assert_eq!(args.model, "ridgeRegression");
                assert_eq!(args.params.alpha.as_deref(), Some("0.5"));
                assert!(args.params.tol.is_none());
            }
            other => panic!("expected fit, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_dataset() {
        let cli = parse_args([
            "anotar",
            "dataset",
            "diabetes",
            "-d",
            "X.csv",
            "-t",
            "y.csv",
            "--upper-limit-data",
            "100",
        ])
        .unwrap();

        match cli.command {
            Command::Dataset(args) => {
                assert_eq!(args.source, "diabetes");
                assert_eq!(args.upper_limit_data, Some(100));
                assert_eq!(args.lower_limit_data, None);
            }
            other => panic!("expected dataset, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_hitl_train_overrides() {
        let cli = parse_args([
            "anotar",
            "hitl",
            "train",
            "spec.yaml",
            "--epochs",
            "30",
            "--resume-epoch",
            "12",
        ])
        .unwrap();

        match cli.command {
            Command::Hitl(args) => {
                let HitlCommand::Train(train) = args.command;
                assert_eq!(train.epochs, Some(30));
                assert_eq!(train.resume_epoch, Some(12));
                assert!(!train.dry_run);
            }
            other => panic!("expected hitl, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_presets_run() {
        let cli = parse_args([
            "anotar",
            "presets",
            "--dir",
            "presets/",
            "--flatten",
            "run",
            "baseline",
            "--train-data",
            "X.csv",
            "--train-target",
            "y.csv",
            "--test-data",
            "Xt.csv",
        ])
        .unwrap();

        match cli.command {
            Command::Presets(args) => {
                assert!(args.flatten);
                match args.command {
                    PresetsCommand::Run { name, .. } => assert_eq!(name, "baseline"),
                    other => panic!("expected run, got {other:?}"),
                }
            }
            other => panic!("expected presets, got {other:?}"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = parse_args(["anotar", "presets", "--dir", "p", "list", "--quiet"]).unwrap();
        assert!(cli.quiet);
        assert!(!cli.verbose);
    }
}
