//! Entropy-based query sampling
//!
//! After each training pass the epoch's predictions are screened for
//! samples worth a human's attention: confidently-uncertain ones
//! (high entropy) or confidently-wrong ones (low entropy, mispredicted).

use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1};

/// Which predictions to surface for annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingStrategy {
    /// Entropy above the threshold, most uncertain first
    HighEntropy,
    /// Entropy below the threshold and mispredicted, most confident first
    LowEntropy,
}

impl SamplingStrategy {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "high_entropy" => Ok(SamplingStrategy::HighEntropy),
            "low_entropy" => Ok(SamplingStrategy::LowEntropy),
            other => Err(Error::Config(format!(
                "sampling must be 'high_entropy' or 'low_entropy', got '{other}'"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SamplingStrategy::HighEntropy => "high_entropy",
            SamplingStrategy::LowEntropy => "low_entropy",
        }
    }
}

/// Shannon entropy (natural log) of one probability row.
pub fn prediction_entropy(probs: ArrayView1<f32>) -> f32 {
    probs
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| -p * p.ln())
        .sum()
}

/// One prediction selected for human review.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryCandidate {
    /// Index of the sample in the training dataset
    pub dataset_index: usize,
    /// Ground-truth label
    pub label: usize,
    /// Model's predicted label
    pub pred: usize,
    /// Entropy of the probability row
    pub entropy: f32,
}

/// Screen an epoch's probability rows for annotation candidates.
///
/// Rows, labels, and dataset indices are parallel. The returned list is
/// sorted by the strategy's preference order and not truncated; the
/// trainer takes as many as it will query.
pub fn select_queries(
    probs: &Array2<f32>,
    labels: &[usize],
    dataset_indices: &[usize],
    strategy: SamplingStrategy,
    threshold: f32,
) -> Vec<QueryCandidate> {
    assert_eq!(probs.nrows(), labels.len());
    assert_eq!(probs.nrows(), dataset_indices.len());

    let mut candidates = Vec::new();
    for (row, (&label, &dataset_index)) in probs
        .rows()
        .into_iter()
        .zip(labels.iter().zip(dataset_indices.iter()))
    {
        let entropy = prediction_entropy(row);
        let pred = argmax(row);

        let keep = match strategy {
            SamplingStrategy::HighEntropy => entropy > threshold,
            SamplingStrategy::LowEntropy => entropy < threshold && pred != label,
        };
        if keep {
            candidates.push(QueryCandidate { dataset_index, label, pred, entropy });
        }
    }

    match strategy {
        SamplingStrategy::HighEntropy => candidates
            .sort_by(|a, b| b.entropy.partial_cmp(&a.entropy).unwrap_or(std::cmp::Ordering::Equal)),
        SamplingStrategy::LowEntropy => candidates
            .sort_by(|a, b| a.entropy.partial_cmp(&b.entropy).unwrap_or(std::cmp::Ordering::Equal)),
    }

    candidates
}

/// Index of the largest value in a probability row.
pub fn argmax(row: ArrayView1<f32>) -> usize {
    let mut best = 0;
    let mut best_val = f32::NEG_INFINITY;
    for (i, &v) in row.iter().enumerate() {
        if v > best_val {
            best = i;
            best_val = v;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use proptest::prelude::*;

    #[test]
    fn test_entropy_bounds() {
        let uniform = array![0.25f32, 0.25, 0.25, 0.25];
        let peaked = array![1.0f32, 0.0, 0.0, 0.0];

        let h_uniform = prediction_entropy(uniform.view());
        let h_peaked = prediction_entropy(peaked.view());

        assert!((h_uniform - 4.0f32.ln()).abs() < 1e-6);
        assert!(h_peaked.abs() < 1e-9);
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(SamplingStrategy::from_name("high_entropy").unwrap(), SamplingStrategy::HighEntropy);
        assert_eq!(SamplingStrategy::from_name("low_entropy").unwrap(), SamplingStrategy::LowEntropy);
        assert!(SamplingStrategy::from_name("margin").is_err());
    }

    #[test]
    fn test_high_entropy_sorted_descending() {
        // Rows with increasing certainty.
        let probs = array![
            [0.5f32, 0.5],
            [0.7, 0.3],
            [0.99, 0.01],
        ];
        let labels = [0, 0, 0];
        let indices = [10, 11, 12];

        let selected =
            select_queries(&probs, &labels, &indices, SamplingStrategy::HighEntropy, 0.1);

        assert_eq!(selected.len(), 2); // the 0.99 row is below threshold
        assert_eq!(selected[0].dataset_index, 10);
        assert_eq!(selected[1].dataset_index, 11);
        assert!(selected[0].entropy > selected[1].entropy);
    }

    #[test]
    fn test_low_entropy_requires_misprediction() {
        let probs = array![
            [0.99f32, 0.01], // confident, correct
            [0.98, 0.02],    // confident, wrong
            [0.5, 0.5],      // uncertain, wrong
        ];
        let labels = [0, 1, 1];
        let indices = [0, 1, 2];

        let selected =
            select_queries(&probs, &labels, &indices, SamplingStrategy::LowEntropy, 0.3);

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].dataset_index, 1);
        assert_eq!(selected[0].pred, 0);
    }

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(array![0.1f32, 0.7, 0.2].view()), 1);
        assert_eq!(argmax(array![0.9f32, 0.05, 0.05].view()), 0);
    }

    proptest! {
        #[test]
        fn prop_entropy_nonnegative_and_bounded(
            raw in proptest::collection::vec(0.01f32..10.0, 2..8)
        ) {
            let total: f32 = raw.iter().sum();
            let probs: Vec<f32> = raw.iter().map(|v| v / total).collect();
            let k = probs.len() as f32;
            let h = prediction_entropy(ndarray::Array1::from(probs).view());
            prop_assert!(h >= 0.0);
            prop_assert!(h <= k.ln() + 1e-5);
        }
    }
}
