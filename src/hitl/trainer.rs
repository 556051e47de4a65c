//! The staggered active-learning loop
//!
//! Each epoch runs a training pass whose loss is the classification
//! loss plus a saliency penalty built from prior annotations. Inside
//! the active window the epoch's predictions are screened for
//! informative samples; when any are found the loop writes everything
//! it knows into the epoch directory and pauses so a human can
//! annotate offline. A resumed run reloads that state, folds the saved
//! rectangle selections into the mask, and keeps going. Validation
//! runs every completed epoch and checkpoints the weights whenever the
//! validation loss improves.

use crate::datasets::ImageFolderDataset;
use crate::error::{Error, Result};
use crate::hitl::attribution::input_gradient_map;
use crate::hitl::checkpoint::{
    load_epoch_state, load_mask, read_tensors, save_epoch_state, save_mask, write_tensors,
    EpochState,
};
use crate::hitl::config::HitlSpec;
use crate::hitl::mask::SaliencyMask;
use crate::hitl::metrics::{weighted_scores, EpochScores};
use crate::hitl::model::SaliencyModel;
use crate::hitl::oracle::{Oracle, OracleQuery};
use crate::hitl::rects::{match_selected_rects, read_rect_rows, read_rects_csv, write_rects_csv, PatchRanking};
use crate::hitl::sampling::{argmax, select_queries, QueryCandidate, SamplingStrategy};
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Loss and metric histories from a finished run.
#[derive(Debug, Clone)]
pub struct TrainHistory {
    pub train_losses: Vec<f32>,
    pub val_losses: Vec<f32>,
    pub train_metrics: Vec<[f32; 4]>,
    pub val_metrics: Vec<[f32; 4]>,
}

/// How a call to [`StaggeredTrainer::train`] ended.
#[derive(Debug)]
pub enum TrainOutcome {
    /// Queries were emitted; state is on disk under the epoch directory
    /// and the run stopped so an annotator can respond.
    PausedForFeedback { epoch: usize },
    /// All epochs completed.
    Finished(TrainHistory),
}

/// Drives the annotation training loop over a [`SaliencyModel`].
pub struct StaggeredTrainer<M: SaliencyModel> {
    spec: HitlSpec,
    model: M,
    train: ImageFolderDataset,
    val: ImageFolderDataset,
    mask: SaliencyMask,
    oracle: Box<dyn Oracle>,
    resume_epoch: usize,
    should_resume: bool,
}

impl<M: SaliencyModel> StaggeredTrainer<M> {
    /// Build a trainer, checking that model and data shapes agree.
    pub fn new(
        spec: HitlSpec,
        model: M,
        train: ImageFolderDataset,
        val: ImageFolderDataset,
        oracle: Box<dyn Oracle>,
    ) -> Result<Self> {
        spec.validate()?;

        if train.is_empty() || val.is_empty() {
            return Err(Error::Data("train and validation folds must be non-empty".to_string()));
        }
        let pixels = spec.data.image_height * spec.data.image_width;
        if train.num_pixels() != pixels || val.num_pixels() != pixels {
            return Err(Error::Data(format!(
                "dataset has {} pixels per image, spec says {pixels}",
                train.num_pixels()
            )));
        }
        if model.num_inputs() != pixels {
            return Err(Error::Data(format!(
                "model expects {} inputs, images have {pixels} pixels",
                model.num_inputs()
            )));
        }
        if model.num_classes() != spec.data.num_classes {
            return Err(Error::Data(format!(
                "model has {} classes, spec says {}",
                model.num_classes(),
                spec.data.num_classes
            )));
        }

        let mask = SaliencyMask::new(
            train.len(),
            spec.data.image_height,
            spec.data.image_width,
        );

        Ok(Self {
            spec,
            model,
            train,
            val,
            mask,
            oracle,
            resume_epoch: 0,
            should_resume: false,
        })
    }

    /// Resume from the state a paused epoch left on disk.
    pub fn resume_from(mut self, epoch: usize) -> Self {
        self.resume_epoch = epoch;
        self.should_resume = true;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn mask(&self) -> &SaliencyMask {
        &self.mask
    }

    fn epoch_dir(&self, epoch: usize) -> PathBuf {
        self.spec.output.epochs_dir.join(epoch.to_string())
    }

    fn weights_path(&self) -> PathBuf {
        let name = format!(
            "{}_{}p_{}e_{}.safetensors",
            self.spec.output.model_name,
            self.spec.percentage(),
            self.spec.training.epochs,
            self.spec.sampling.strategy,
        );
        self.spec.output.weights_dir.join(name)
    }

    fn history_path(&self, which: &str) -> PathBuf {
        let name = format!(
            "{}_{}_{}_{}.json",
            self.spec.output.model_name,
            which,
            self.spec.percentage(),
            self.spec.sampling.strategy,
        );
        self.spec.output.history_dir.join(name)
    }

    /// Run the loop from the start (or resume) epoch to the end.
    pub fn train(&mut self) -> Result<TrainOutcome> {
        let epochs = self.spec.training.epochs;
        let strategy = self.spec.strategy()?;
        let class_weights = self.spec.class_weight_vec()?;
        let cw = class_weights.as_deref();
        let lr = self.spec.training.learning_rate;
        let lambda = self.spec.training.penalty_lambda;

        if self.should_resume && self.resume_epoch >= epochs {
            return Err(Error::Config(format!(
                "resume epoch {} is past the last epoch {}",
                self.resume_epoch,
                epochs - 1
            )));
        }

        let mut train_losses = vec![0.0f32; epochs];
        let mut val_losses = vec![0.0f32; epochs];
        let mut train_metrics = vec![[0.0f32; 4]; epochs];
        let mut val_metrics = vec![[0.0f32; 4]; epochs];
        let mut min_train_loss = f32::INFINITY;
        let mut min_val_loss = f32::INFINITY;

        for epoch in self.resume_epoch..epochs {
            let epoch_dir = self.epoch_dir(epoch);
            let resuming_here = self.should_resume && epoch == self.resume_epoch;

            let (epoch_loss, epoch_scores, queries) = if resuming_here {
                let state = load_epoch_state(&epoch_dir)?;
                restore(&mut train_losses, &state.train_losses);
                restore(&mut val_losses, &state.val_losses);
                restore(&mut train_metrics, &state.train_metrics);
                restore(&mut val_metrics, &state.val_metrics);
                min_train_loss = state.min_train_loss;
                min_val_loss = state.min_val_loss;

                self.mask = load_mask(&epoch_dir.join("mask.safetensors"))?;
                let tensors = read_tensors(&epoch_dir.join("model.safetensors"))?;
                self.model.import_tensors(&tensors)?;

                self.apply_saved_selections(&epoch_dir, &state.image_indexes)?;

                (state.epoch_train_loss, state.epoch_train_scores, Vec::new())
            } else {
                let (loss, scores, queries) =
                    self.train_epoch(epoch, strategy, cw, lr, lambda)?;
                (loss, scores.to_array(), queries)
            };

            if !epoch_loss.is_finite() {
                return Err(Error::Estimator(format!(
                    "non-finite training loss at epoch {epoch}"
                )));
            }

            if !queries.is_empty() && self.spec.sampling.nr_queries > 0 {
                std::fs::create_dir_all(&epoch_dir)?;
                self.emit_queries(epoch, &epoch_dir, &queries)?;

                let state = EpochState {
                    train_losses: train_losses.clone(),
                    val_losses: val_losses.clone(),
                    train_metrics: train_metrics.clone(),
                    val_metrics: val_metrics.clone(),
                    min_train_loss,
                    min_val_loss,
                    image_indexes: queries.iter().map(|q| q.dataset_index).collect(),
                    epoch_train_loss: epoch_loss,
                    epoch_train_scores: epoch_scores,
                };
                save_epoch_state(&epoch_dir, epoch, &state)?;
                save_mask(&epoch_dir.join("mask.safetensors"), &self.mask)?;

                let mut metadata = HashMap::new();
                metadata.insert("epoch".to_string(), epoch.to_string());
                write_tensors(
                    &epoch_dir.join("model.safetensors"),
                    &self.model.export_tensors(),
                    Some(metadata),
                )?;

                return Ok(TrainOutcome::PausedForFeedback { epoch });
            }

            train_losses[epoch] = epoch_loss;
            train_metrics[epoch] = epoch_scores;
            if epoch_loss < min_train_loss {
                min_train_loss = epoch_loss;
            }

            let (val_loss, val_scores) = self.validate(cw);
            if !val_loss.is_finite() {
                return Err(Error::Estimator(format!(
                    "non-finite validation loss at epoch {epoch}"
                )));
            }
            val_losses[epoch] = val_loss;
            val_metrics[epoch] = val_scores.to_array();

            self.write_history(&train_losses, &val_losses, &train_metrics, &val_metrics)?;

            if val_loss < min_val_loss {
                min_val_loss = val_loss;
                std::fs::create_dir_all(&self.spec.output.weights_dir)?;
                write_tensors(&self.weights_path(), &self.model.export_tensors(), None)?;
            }
        }

        std::fs::create_dir_all(&self.spec.output.weights_dir)?;
        write_tensors(&self.weights_path(), &self.model.export_tensors(), None)?;

        Ok(TrainOutcome::Finished(TrainHistory {
            train_losses,
            val_losses,
            train_metrics,
            val_metrics,
        }))
    }

    /// One training pass: shuffle, step per batch, collect predictions,
    /// and screen for query candidates inside the active window.
    fn train_epoch(
        &mut self,
        epoch: usize,
        strategy: SamplingStrategy,
        class_weights: Option<&[f32]>,
        lr: f32,
        lambda: f32,
    ) -> Result<(f32, EpochScores, Vec<QueryCandidate>)> {
        let n = self.train.len();
        let batch_size = self.spec.training.batch_size;
        let num_classes = self.spec.data.num_classes;
        let oversample = self.spec.sampling.oversample;
        let active = epoch >= self.spec.sampling.start_epoch
            && epoch < self.spec.sampling.stop_epoch;

        let seed = self.spec.training.seed.wrapping_add(epoch as u64);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rng);

        let mut y_true: Vec<usize> = Vec::with_capacity(n);
        let mut y_pred: Vec<usize> = Vec::with_capacity(n);
        let mut run_vanilla = 0.0f64;
        let mut run_total = 0.0f64;
        let mut samples = 0usize;

        let mut epoch_probs: Vec<f32> = Vec::new();
        let mut epoch_labels: Vec<usize> = Vec::new();
        let mut epoch_indices: Vec<usize> = Vec::new();

        for chunk in indices.chunks(batch_size) {
            let mut batch_idx = chunk.to_vec();

            // Re-expose one annotated sample per batch so feedback keeps
            // shaping the gradients even when the sampler moves on.
            if oversample {
                let annotated = self.mask.annotated_indices();
                if !annotated.is_empty() {
                    batch_idx.push(annotated[rng.gen_range(0..annotated.len())]);
                }
            }

            let inputs = self.train.images.select(Axis(0), &batch_idx);
            let labels: Vec<usize> =
                batch_idx.iter().map(|&i| self.train.labels[i]).collect();
            let mask_rows = self.mask.rows_for(&batch_idx);

            let step =
                self.model
                    .train_step(&inputs, &labels, &mask_rows, lambda, class_weights, lr);
            run_vanilla += f64::from(step.vanilla) * batch_idx.len() as f64;
            run_total += f64::from(step.total) * batch_idx.len() as f64;
            samples += batch_idx.len();

            let probs = self.model.forward(&inputs);
            for (row_i, &dataset_index) in batch_idx.iter().enumerate() {
                let row = probs.row(row_i);
                y_true.push(labels[row_i]);
                y_pred.push(argmax(row));

                if active {
                    epoch_probs.extend(row.iter());
                    epoch_labels.push(labels[row_i]);
                    epoch_indices.push(dataset_index);
                }
            }
        }

        let avg_vanilla = (run_vanilla / samples.max(1) as f64) as f32;
        let avg_total = (run_total / samples.max(1) as f64) as f32;
        if !avg_total.is_finite() {
            return Err(Error::Estimator(format!(
                "non-finite combined loss at epoch {epoch}"
            )));
        }

        let scores = weighted_scores(&y_pred, &y_true, num_classes);

        let queries = if active && !epoch_labels.is_empty() {
            let probs =
                Array2::from_shape_vec((epoch_labels.len(), num_classes), epoch_probs)
                    .map_err(|e| Error::Data(e.to_string()))?;
            select_queries(
                &probs,
                &epoch_labels,
                &epoch_indices,
                strategy,
                self.spec.sampling.entropy_threshold,
            )
        } else {
            Vec::new()
        };

        Ok((avg_vanilla, scores, queries))
    }

    /// Write candidate rectangles for the top queries and fold any
    /// immediately available oracle feedback into the mask.
    fn emit_queries(
        &mut self,
        epoch: usize,
        epoch_dir: &Path,
        queries: &[QueryCandidate],
    ) -> Result<()> {
        let ranking = PatchRanking {
            size: self.spec.sampling.rect_size,
            stride: self.spec.sampling.rect_stride,
            nr_rects: self.spec.sampling.nr_rects,
        };

        for (query_nr, candidate) in
            queries.iter().take(self.spec.sampling.nr_queries).enumerate()
        {
            let attribution = input_gradient_map(
                &self.model,
                self.spec.data.image_height,
                self.spec.data.image_width,
            )?;
            let rects = ranking.ranked_rects(&attribution)?;
            write_rects_csv(&epoch_dir.join(format!("query_{query_nr}_rects.csv")), &rects)?;

            let query = OracleQuery {
                epoch,
                query_nr,
                dataset_index: candidate.dataset_index,
                label: candidate.label,
                pred: candidate.pred,
                entropy: candidate.entropy,
                rects: rects.clone(),
                attribution,
            };

            if let Some(selected) = self.oracle.review(&query)? {
                for rect_index in selected {
                    if let Some(rect) = rects.get(rect_index) {
                        self.mask.apply_rect(candidate.dataset_index, rect)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Fold saved rectangle selections into the mask after a resume.
    /// Queries whose candidate or selection files are missing are
    /// skipped without comment; the annotator simply did not get there.
    fn apply_saved_selections(
        &mut self,
        epoch_dir: &Path,
        image_indexes: &[usize],
    ) -> Result<()> {
        for (query_nr, &image_index) in image_indexes
            .iter()
            .enumerate()
            .take(self.spec.sampling.nr_queries)
        {
            let candidates_path = epoch_dir.join(format!("query_{query_nr}_rects.csv"));
            let selected_path =
                epoch_dir.join(format!("query_{query_nr}_rects_selected.csv"));
            if !candidates_path.exists() || !selected_path.exists() {
                continue;
            }

            let candidates = read_rects_csv(&candidates_path)?;
            let selected_rows = read_rect_rows(&selected_path)?;
            for rect_index in match_selected_rects(&selected_rows, &candidates) {
                self.mask.apply_rect(image_index, &candidates[rect_index])?;
            }
        }

        Ok(())
    }

    /// Forward-only pass over the validation fold.
    fn validate(&self, class_weights: Option<&[f32]>) -> (f32, EpochScores) {
        let batch_size = self.spec.training.batch_size;
        let n = self.val.len();

        let mut y_true: Vec<usize> = Vec::with_capacity(n);
        let mut y_pred: Vec<usize> = Vec::with_capacity(n);
        let mut run_loss = 0.0f64;

        let indices: Vec<usize> = (0..n).collect();
        for chunk in indices.chunks(batch_size) {
            let inputs = self.val.images.select(Axis(0), chunk);
            let labels: Vec<usize> = chunk.iter().map(|&i| self.val.labels[i]).collect();

            let loss = self.model.validation_loss(&inputs, &labels, class_weights);
            run_loss += f64::from(loss) * chunk.len() as f64;

            let probs = self.model.forward(&inputs);
            for (row_i, &label) in labels.iter().enumerate() {
                y_true.push(label);
                y_pred.push(argmax(probs.row(row_i)));
            }
        }

        let avg_loss = (run_loss / n.max(1) as f64) as f32;
        let scores = weighted_scores(&y_pred, &y_true, self.spec.data.num_classes);
        (avg_loss, scores)
    }

    /// Rewrite the running history arrays after each completed epoch.
    fn write_history(
        &self,
        train_losses: &[f32],
        val_losses: &[f32],
        train_metrics: &[[f32; 4]],
        val_metrics: &[[f32; 4]],
    ) -> Result<()> {
        std::fs::create_dir_all(&self.spec.output.history_dir)?;

        let pairs: [(&str, serde_json::Value); 4] = [
            ("train_losses", serde_json::to_value(train_losses)?),
            ("val_losses", serde_json::to_value(val_losses)?),
            ("train_metrics", serde_json::to_value(train_metrics)?),
            ("val_metrics", serde_json::to_value(val_metrics)?),
        ];
        for (which, value) in pairs {
            std::fs::write(self.history_path(which), serde_json::to_string(&value)?)?;
        }
        Ok(())
    }
}

fn restore<T: Copy>(dst: &mut [T], src: &[T]) {
    for (slot, value) in dst.iter_mut().zip(src.iter()) {
        *slot = *value;
    }
}
