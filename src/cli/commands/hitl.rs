//! Hitl command implementation

use crate::cli::logging::log;
use crate::cli::{HitlArgs, HitlCommand, HitlTrainArgs, LogLevel};
use crate::datasets::{Fold, ImageFolderDataset};
use crate::hitl::{
    load_spec, FileOracle, SoftmaxClassifier, StaggeredTrainer, TrainOutcome,
};

pub fn run_hitl(args: HitlArgs, level: LogLevel) -> Result<(), String> {
    match args.command {
        HitlCommand::Train(args) => run_train(args, level),
    }
}

fn run_train(args: HitlTrainArgs, level: LogLevel) -> Result<(), String> {
    let mut spec = load_spec(&args.config).map_err(|e| e.to_string())?;
    spec.apply_overrides(&args).map_err(|e| e.to_string())?;

    log(
        level,
        LogLevel::Normal,
        &format!("Annotation training from {}", args.config.display()),
    );
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "  epochs: {}  batch: {}  lr: {}  sampling: {}",
            spec.training.epochs,
            spec.training.batch_size,
            spec.training.learning_rate,
            spec.sampling.strategy,
        ),
    );

    if args.dry_run {
        log(level, LogLevel::Normal, "Dry run - config validated successfully");
        return Ok(());
    }

    let (height, width) = (spec.data.image_height, spec.data.image_width);
    let train = ImageFolderDataset::load(
        &spec.data.images_dir,
        &spec.data.labels_csv,
        Fold::Train,
        spec.data.fraction,
        height,
        width,
        spec.training.seed,
    )
    .map_err(|e| e.to_string())?;
    let val = ImageFolderDataset::load(
        &spec.data.images_dir,
        &spec.data.labels_csv,
        Fold::Test,
        spec.data.fraction,
        height,
        width,
        spec.training.seed,
    )
    .map_err(|e| e.to_string())?;

    log(
        level,
        LogLevel::Verbose,
        &format!("  {} train images, {} validation images", train.len(), val.len()),
    );

    let model = SoftmaxClassifier::new(spec.data.num_classes, height * width);

    let oracle = FileOracle::new(spec.output.epochs_dir.clone());
    let mut trainer = StaggeredTrainer::new(spec, model, train, val, Box::new(oracle))
        .map_err(|e| e.to_string())?;
    if let Some(epoch) = args.resume_epoch {
        trainer = trainer.resume_from(epoch);
    }

    match trainer.train().map_err(|e| e.to_string())? {
        TrainOutcome::PausedForFeedback { epoch } => {
            log(
                level,
                LogLevel::Normal,
                &format!(
                    "Paused for annotation at epoch {epoch}. Write the \
                     query_*_rects_selected.csv files into the epoch directory and rerun \
                     with --resume-epoch {epoch}."
                ),
            );
        }
        TrainOutcome::Finished(history) => {
            let final_val = history.val_losses.last().copied().unwrap_or(0.0);
            log(
                level,
                LogLevel::Normal,
                &format!("Training complete. Final validation loss: {final_val:.6}"),
            );
        }
    }

    Ok(())
}
