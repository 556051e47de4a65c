//! Human-in-the-loop annotation training
//!
//! The staggered loop trains a classifier while periodically asking a
//! person which image regions drove a prediction, then penalizes the
//! model's sensitivity to those regions:
//! - [`StaggeredTrainer`] runs the epoch loop, pausing for feedback
//! - [`SaliencyModel`] / [`SoftmaxClassifier`] is the trainable seam
//! - [`SaliencyMask`] accumulates annotations as per-pixel weights
//! - entropy sampling picks the queries, patch ranking picks the
//!   candidate rectangles, an [`Oracle`] supplies the selections
//! - checkpointing is file-per-array under a per-epoch directory

mod attribution;
mod checkpoint;
mod config;
mod mask;
mod metrics;
mod model;
mod oracle;
mod rects;
mod sampling;
mod trainer;

pub use attribution::input_gradient_map;
pub use checkpoint::{
    load_epoch_state, load_mask, read_tensors, save_epoch_state, save_mask, write_tensors,
    EpochState,
};
pub use config::{load_spec, DataSpec, HitlSpec, OutputSpec, SamplingSpec, TrainingSpec};
pub use mask::SaliencyMask;
pub use metrics::{weighted_scores, ConfusionMatrix, EpochScores};
pub use model::{NamedTensor, SaliencyModel, SoftmaxClassifier, StepLoss};
pub use oracle::{FileOracle, Oracle, OracleQuery, StaticOracle};
pub use rects::{
    match_selected_rects, point_inside_rect, read_rect_rows, read_rects_csv, write_rects_csv,
    PatchRanking, Rect,
};
pub use sampling::{
    argmax, prediction_entropy, select_queries, QueryCandidate, SamplingStrategy,
};
pub use trainer::{StaggeredTrainer, TrainHistory, TrainOutcome};
