//! The trainable-model seam for the annotation loop
//!
//! The loop only needs four things from a model: class probabilities,
//! a combined training step (classification loss + saliency penalty),
//! per-pixel input gradients for attribution, and weight export/import
//! for checkpointing. `SaliencyModel` is that seam. `SoftmaxClassifier`
//! is the built-in implementation, a multinomial logistic model on
//! flattened pixels whose gradients (including the penalty term) are
//! closed-form, so no autodiff framework is involved. Deeper models can
//! implement the trait on top of whichever framework provides them.

use crate::error::{Error, Result};
use ndarray::{Array1, Array2, Axis};

/// Losses from one training step.
#[derive(Debug, Clone, Copy)]
pub struct StepLoss {
    /// Classification loss plus the saliency penalty
    pub total: f32,
    /// Classification loss alone
    pub vanilla: f32,
}

/// Named f32 tensor: (name, shape, row-major data).
pub type NamedTensor = (String, Vec<usize>, Vec<f32>);

/// A classifier the annotation loop can train and interrogate.
pub trait SaliencyModel {
    fn num_classes(&self) -> usize;

    fn num_inputs(&self) -> usize;

    /// Class-probability rows for a batch of flattened images.
    fn forward(&self, inputs: &Array2<f32>) -> Array2<f32>;

    /// One gradient step on the batch.
    ///
    /// `mask_rows` are the per-sample annotation masks (flattened,
    /// parallel to `inputs`); `penalty_weight` scales the saliency
    /// penalty; `class_weights` reweights the classification loss.
    fn train_step(
        &mut self,
        inputs: &Array2<f32>,
        labels: &[usize],
        mask_rows: &Array2<f32>,
        penalty_weight: f32,
        class_weights: Option<&[f32]>,
        lr: f32,
    ) -> StepLoss;

    /// Classification loss without a parameter update.
    fn validation_loss(
        &self,
        inputs: &Array2<f32>,
        labels: &[usize],
        class_weights: Option<&[f32]>,
    ) -> f32;

    /// Gradient of the summed logits with respect to each input pixel.
    fn input_saliency(&self) -> Array1<f32>;

    /// Weights for checkpointing.
    fn export_tensors(&self) -> Vec<NamedTensor>;

    /// Restore weights from a checkpoint.
    fn import_tensors(&mut self, tensors: &[NamedTensor]) -> Result<()>;
}

/// Multinomial softmax regression on flattened pixels.
#[derive(Debug, Clone)]
pub struct SoftmaxClassifier {
    /// One weight row per class, `num_classes × num_inputs`
    weights: Array2<f32>,
    /// Per-class bias
    bias: Array1<f32>,
}

impl SoftmaxClassifier {
    /// Zero-initialized classifier (the objective is convex).
    pub fn new(num_classes: usize, num_inputs: usize) -> Self {
        Self {
            weights: Array2::zeros((num_classes, num_inputs)),
            bias: Array1::zeros(num_classes),
        }
    }

    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    fn logits(&self, inputs: &Array2<f32>) -> Array2<f32> {
        inputs.dot(&self.weights.t()) + &self.bias
    }

    fn softmax(logits: &Array2<f32>) -> Array2<f32> {
        let mut probs = logits.clone();
        for mut row in probs.rows_mut() {
            let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            row.mapv_inplace(|v| (v - max).exp());
            let total = row.sum();
            if total > 0.0 {
                row.mapv_inplace(|v| v / total);
            }
        }
        probs
    }

    fn sample_weight(class_weights: Option<&[f32]>, label: usize) -> f32 {
        class_weights.and_then(|w| w.get(label).copied()).unwrap_or(1.0)
    }

    fn cross_entropy(
        probs: &Array2<f32>,
        labels: &[usize],
        class_weights: Option<&[f32]>,
    ) -> f32 {
        let n = labels.len().max(1) as f32;
        labels
            .iter()
            .enumerate()
            .map(|(s, &y)| {
                let p = probs[[s, y]].max(1e-12);
                -Self::sample_weight(class_weights, y) * p.ln()
            })
            .sum::<f32>()
            / n
    }
}

impl SaliencyModel for SoftmaxClassifier {
    fn num_classes(&self) -> usize {
        self.weights.nrows()
    }

    fn num_inputs(&self) -> usize {
        self.weights.ncols()
    }

    fn forward(&self, inputs: &Array2<f32>) -> Array2<f32> {
        Self::softmax(&self.logits(inputs))
    }

    fn train_step(
        &mut self,
        inputs: &Array2<f32>,
        labels: &[usize],
        mask_rows: &Array2<f32>,
        penalty_weight: f32,
        class_weights: Option<&[f32]>,
        lr: f32,
    ) -> StepLoss {
        let batch = labels.len().max(1) as f32;
        let probs = Self::softmax(&self.logits(inputs));
        let vanilla = Self::cross_entropy(&probs, labels, class_weights);

        // d(loss)/d(logits): (p - onehot) * class_weight / batch
        let mut grad_logits = probs;
        for (s, &y) in labels.iter().enumerate() {
            grad_logits[[s, y]] -= 1.0;
            let w = Self::sample_weight(class_weights, y);
            if (w - 1.0).abs() > f32::EPSILON {
                grad_logits.row_mut(s).mapv_inplace(|v| v * w);
            }
        }
        grad_logits.mapv_inplace(|v| v / batch);

        let grad_weights = grad_logits.t().dot(inputs);
        let grad_bias = grad_logits.sum_axis(Axis(0));

        // Saliency penalty: penalty_weight * mean_i(mask_i * g_i^2),
        // where g is the input gradient of the summed logits. For this
        // model g does not depend on the input, so the mask enters as
        // its batch mean.
        let pixels = self.num_inputs().max(1) as f32;
        let saliency = self.input_saliency();
        let mask_mean = mask_rows
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(self.num_inputs()));
        let penalty = penalty_weight
            * mask_mean
                .iter()
                .zip(saliency.iter())
                .map(|(&m, &g)| m * g * g)
                .sum::<f32>()
            / pixels;

        // d(penalty)/d(w[c, i]) is class-independent.
        let grad_penalty =
            (&mask_mean * &saliency).mapv(|v| penalty_weight * 2.0 * v / pixels);

        for mut row in self.weights.rows_mut() {
            row.zip_mut_with(&grad_penalty, |w, &g| *w -= lr * g);
        }
        self.weights.zip_mut_with(&grad_weights, |w, &g| *w -= lr * g);
        self.bias.zip_mut_with(&grad_bias, |b, &g| *b -= lr * g);

        StepLoss { total: vanilla + penalty, vanilla }
    }

    fn validation_loss(
        &self,
        inputs: &Array2<f32>,
        labels: &[usize],
        class_weights: Option<&[f32]>,
    ) -> f32 {
        let probs = Self::softmax(&self.logits(inputs));
        Self::cross_entropy(&probs, labels, class_weights)
    }

    fn input_saliency(&self) -> Array1<f32> {
        self.weights.sum_axis(Axis(0))
    }

    fn export_tensors(&self) -> Vec<NamedTensor> {
        vec![
            (
                "classifier.weight".to_string(),
                vec![self.weights.nrows(), self.weights.ncols()],
                self.weights.iter().copied().collect(),
            ),
            (
                "classifier.bias".to_string(),
                vec![self.bias.len()],
                self.bias.to_vec(),
            ),
        ]
    }

    fn import_tensors(&mut self, tensors: &[NamedTensor]) -> Result<()> {
        for (name, shape, data) in tensors {
            match name.as_str() {
                "classifier.weight" => {
                    if *shape != vec![self.weights.nrows(), self.weights.ncols()] {
                        return Err(Error::Data(format!(
                            "weight shape mismatch: expected {:?}, got {shape:?}",
                            self.weights.dim()
                        )));
                    }
                    self.weights =
                        Array2::from_shape_vec((shape[0], shape[1]), data.clone())
                            .map_err(|e| Error::Data(e.to_string()))?;
                }
                "classifier.bias" => {
                    if *shape != vec![self.bias.len()] {
                        return Err(Error::Data(format!(
                            "bias shape mismatch: expected [{}], got {shape:?}",
                            self.bias.len()
                        )));
                    }
                    self.bias = Array1::from(data.clone());
                }
                other => {
                    return Err(Error::Data(format!("unexpected tensor '{other}'")));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn toy_batch() -> (Array2<f32>, Vec<usize>) {
        // Two separable clusters in 2-pixel space.
        let inputs = array![
            [1.0f32, 0.0],
            [0.9, 0.1],
            [0.0, 1.0],
            [0.1, 0.9],
        ];
        (inputs, vec![0, 0, 1, 1])
    }

    #[test]
    fn test_forward_rows_sum_to_one() {
        let model = SoftmaxClassifier::new(3, 4);
        let inputs = Array2::from_shape_fn((5, 4), |(s, i)| (s * 4 + i) as f32 * 0.1);

        let probs = model.forward(&inputs);
        for row in probs.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_training_reduces_loss() {
        let (inputs, labels) = toy_batch();
        let mut model = SoftmaxClassifier::new(2, 2);
        let mask = Array2::zeros((4, 2));

        let first = model.train_step(&inputs, &labels, &mask, 0.0, None, 1.0);
        for _ in 0..200 {
            model.train_step(&inputs, &labels, &mask, 0.0, None, 1.0);
        }
        let last = model.validation_loss(&inputs, &labels, None);

        assert!(last < first.vanilla, "loss went {} -> {last}", first.vanilla);
        assert!(last < 0.1);
    }

    #[test]
    fn test_penalty_zero_without_annotations() {
        let (inputs, labels) = toy_batch();
        let mut model = SoftmaxClassifier::new(2, 2);
        let mask = Array2::zeros((4, 2));

        let step = model.train_step(&inputs, &labels, &mask, 1e7, None, 0.01);
        assert!((step.total - step.vanilla).abs() < 1e-9);
    }

    #[test]
    fn test_penalty_suppresses_masked_pixel() {
        let (inputs, labels) = toy_batch();

        // Train one model freely, one with pixel 0 masked on every sample.
        let mut free = SoftmaxClassifier::new(2, 2);
        let mut constrained = SoftmaxClassifier::new(2, 2);
        let no_mask = Array2::zeros((4, 2));
        let mut masked = Array2::zeros((4, 2));
        masked.column_mut(0).fill(1.0);

        for _ in 0..300 {
            free.train_step(&inputs, &labels, &no_mask, 0.0, None, 0.5);
            constrained.train_step(&inputs, &labels, &masked, 100.0, None, 0.5);
        }

        let free_g = free.input_saliency()[0].abs();
        let constrained_g = constrained.input_saliency()[0].abs();
        assert!(
            constrained_g < free_g * 0.5 + 1e-3,
            "masked saliency {constrained_g} vs free {free_g}"
        );
    }

    #[test]
    fn test_class_weights_scale_loss() {
        let (inputs, labels) = toy_batch();
        let model = SoftmaxClassifier::new(2, 2);

        let unweighted = model.validation_loss(&inputs, &labels, None);
        let weighted = model.validation_loss(&inputs, &labels, Some(&[2.0, 2.0]));

        assert!((weighted - 2.0 * unweighted).abs() < 1e-5);
    }

    #[test]
    fn test_export_import_roundtrip() {
        let (inputs, labels) = toy_batch();
        let mut model = SoftmaxClassifier::new(2, 2);
        let mask = Array2::zeros((4, 2));
        for _ in 0..50 {
            model.train_step(&inputs, &labels, &mask, 0.0, None, 0.5);
        }

        let tensors = model.export_tensors();
        let mut restored = SoftmaxClassifier::new(2, 2);
        restored.import_tensors(&tensors).unwrap();

        assert_eq!(model.forward(&inputs), restored.forward(&inputs));
    }

    #[test]
    fn test_import_rejects_wrong_shape() {
        let mut model = SoftmaxClassifier::new(2, 2);
        let bad = vec![("classifier.weight".to_string(), vec![3usize, 2], vec![0.0; 6])];
        assert!(model.import_tensors(&bad).is_err());
    }
}
