//! YAML spec for the annotation training loop

use crate::cli::{parse_map_arg, HitlTrainArgs};
use crate::error::{Error, Result};
use crate::hitl::sampling::SamplingStrategy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Full training spec, loaded from YAML and overridden from the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HitlSpec {
    pub data: DataSpec,
    pub training: TrainingSpec,
    pub sampling: SamplingSpec,
    pub output: OutputSpec,
}

/// Where the images live and how to shape them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataSpec {
    pub images_dir: PathBuf,
    pub labels_csv: PathBuf,
    pub image_height: usize,
    pub image_width: usize,
    pub num_classes: usize,
    /// Fraction of each fold to keep (1.0 = all)
    #[serde(default = "default_fraction")]
    pub fraction: f64,
}

/// Optimization settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingSpec {
    pub epochs: usize,
    pub batch_size: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Weight of the saliency penalty term
    #[serde(default = "default_lambda")]
    pub penalty_lambda: f32,
    /// Per-class loss weights, keyed by class index
    #[serde(default)]
    pub class_weights: BTreeMap<String, f64>,
}

/// Active-learning settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SamplingSpec {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    pub entropy_threshold: f32,
    pub nr_queries: usize,
    /// First epoch with active sampling
    pub start_epoch: usize,
    /// First epoch past the active window
    #[serde(default = "default_stop_epoch")]
    pub stop_epoch: usize,
    /// Re-add one annotated sample to every batch
    #[serde(default)]
    pub oversample: bool,
    #[serde(default = "default_rect_size")]
    pub rect_size: usize,
    #[serde(default = "default_rect_size")]
    pub rect_stride: usize,
    #[serde(default = "default_nr_rects")]
    pub nr_rects: usize,
}

/// Output directories and checkpoint naming.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputSpec {
    pub history_dir: PathBuf,
    pub weights_dir: PathBuf,
    pub epochs_dir: PathBuf,
    pub model_name: String,
}

fn default_fraction() -> f64 {
    1.0
}

fn default_learning_rate() -> f32 {
    1e-5
}

fn default_seed() -> u64 {
    42
}

fn default_lambda() -> f32 {
    1e7
}

fn default_strategy() -> String {
    "high_entropy".to_string()
}

fn default_stop_epoch() -> usize {
    20
}

fn default_rect_size() -> usize {
    28
}

fn default_nr_rects() -> usize {
    10
}

/// Load and validate a spec from a YAML file.
pub fn load_spec(path: &Path) -> Result<HitlSpec> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
    let spec: HitlSpec = serde_yaml::from_str(&raw)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;
    spec.validate()?;
    Ok(spec)
}

impl HitlSpec {
    /// Reject specs the loop cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.training.epochs == 0 {
            return Err(Error::Config("epochs must be > 0".to_string()));
        }
        if self.training.batch_size == 0 {
            return Err(Error::Config("batch_size must be > 0".to_string()));
        }
        if self.data.num_classes < 2 {
            return Err(Error::Config("num_classes must be >= 2".to_string()));
        }
        if self.data.image_height == 0 || self.data.image_width == 0 {
            return Err(Error::Config("image shape must be positive".to_string()));
        }
        self.strategy()?;
        self.class_weight_vec()?;
        Ok(())
    }

    /// Parsed sampling strategy.
    pub fn strategy(&self) -> Result<SamplingStrategy> {
        SamplingStrategy::from_name(&self.sampling.strategy)
    }

    /// Class-weight vector indexed by class, 1.0 where unspecified.
    pub fn class_weight_vec(&self) -> Result<Option<Vec<f32>>> {
        if self.training.class_weights.is_empty() {
            return Ok(None);
        }

        let mut weights = vec![1.0f32; self.data.num_classes];
        for (key, &value) in &self.training.class_weights {
            let class: usize = key.parse().map_err(|_| {
                Error::Config(format!("class_weights key '{key}' is not a class index"))
            })?;
            if class >= self.data.num_classes {
                return Err(Error::Config(format!(
                    "class_weights key {class} out of range ({} classes)",
                    self.data.num_classes
                )));
            }
            weights[class] = value as f32;
        }
        Ok(Some(weights))
    }

    /// Apply CLI overrides on top of the file spec.
    pub fn apply_overrides(&mut self, args: &HitlTrainArgs) -> Result<()> {
        if let Some(epochs) = args.epochs {
            self.training.epochs = epochs;
        }
        if let Some(lr) = args.lr {
            self.training.learning_rate = lr;
        }
        if let Some(raw) = args.class_weight.as_deref() {
            let parsed = parse_map_arg(Some(raw), &BTreeMap::new())?;
            self.training.class_weights = parsed.into_iter().collect();
        }
        self.validate()
    }

    /// Percentage label used in history and weight file names.
    pub fn percentage(&self) -> u32 {
        (self.data.fraction * 100.0).round() as u32
    }
}
