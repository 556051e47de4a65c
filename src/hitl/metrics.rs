//! Classification metrics for the training loop
//!
//! Per-epoch scores are support-weighted averages over classes, matching
//! how the pipeline reports recall/precision/F1 on imbalanced data.

/// Confusion matrix; `matrix[true][pred]` counts samples.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    matrix: Vec<Vec<usize>>,
    n_classes: usize,
}

impl ConfusionMatrix {
    /// Build from parallel prediction/truth slices. Labels outside
    /// `0..n_classes` are ignored.
    pub fn from_predictions(y_pred: &[usize], y_true: &[usize], n_classes: usize) -> Self {
        assert_eq!(y_pred.len(), y_true.len(), "prediction/truth length mismatch");

        let mut matrix = vec![vec![0usize; n_classes]; n_classes];
        for (&p, &t) in y_pred.iter().zip(y_true.iter()) {
            if p < n_classes && t < n_classes {
                matrix[t][p] += 1;
            }
        }
        Self { matrix, n_classes }
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Samples with true label `class`.
    pub fn support(&self, class: usize) -> usize {
        self.matrix[class].iter().sum()
    }

    pub fn true_positives(&self, class: usize) -> usize {
        self.matrix[class][class]
    }

    pub fn false_positives(&self, class: usize) -> usize {
        (0..self.n_classes).filter(|&t| t != class).map(|t| self.matrix[t][class]).sum()
    }

    pub fn false_negatives(&self, class: usize) -> usize {
        (0..self.n_classes).filter(|&p| p != class).map(|p| self.matrix[class][p]).sum()
    }

    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    pub fn accuracy(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: usize = (0..self.n_classes).map(|c| self.matrix[c][c]).sum();
        correct as f32 / total as f32
    }
}

/// One epoch's classification scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochScores {
    pub accuracy: f32,
    pub recall: f32,
    pub precision: f32,
    pub f1: f32,
}

impl EpochScores {
    /// Pack in history-array order (accuracy, recall, precision, f1).
    pub fn to_array(self) -> [f32; 4] {
        [self.accuracy, self.recall, self.precision, self.f1]
    }
}

/// Accuracy plus support-weighted precision/recall/F1.
pub fn weighted_scores(y_pred: &[usize], y_true: &[usize], n_classes: usize) -> EpochScores {
    let cm = ConfusionMatrix::from_predictions(y_pred, y_true, n_classes);
    let total = cm.total();
    if total == 0 {
        return EpochScores { accuracy: 0.0, recall: 0.0, precision: 0.0, f1: 0.0 };
    }

    let mut recall = 0.0f32;
    let mut precision = 0.0f32;
    let mut f1 = 0.0f32;

    for class in 0..n_classes {
        let support = cm.support(class) as f32;
        if support == 0.0 {
            continue;
        }
        let tp = cm.true_positives(class) as f32;
        let fp = cm.false_positives(class) as f32;
        let fn_ = cm.false_negatives(class) as f32;

        let p = if tp + fp > 0.0 { tp / (tp + fp) } else { 0.0 };
        let r = if tp + fn_ > 0.0 { tp / (tp + fn_) } else { 0.0 };
        let f = if p + r > 0.0 { 2.0 * p * r / (p + r) } else { 0.0 };

        let weight = support / total as f32;
        precision += weight * p;
        recall += weight * r;
        f1 += weight * f;
    }

    EpochScores { accuracy: cm.accuracy(), recall, precision, f1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let y = [0, 1, 2, 1, 0];
        let scores = weighted_scores(&y, &y, 3);

        assert_eq!(scores.accuracy, 1.0);
        assert_eq!(scores.recall, 1.0);
        assert_eq!(scores.precision, 1.0);
        assert_eq!(scores.f1, 1.0);
    }

    #[test]
    fn test_confusion_counts() {
        let y_true = [0, 0, 1, 1];
        let y_pred = [0, 1, 1, 1];
        let cm = ConfusionMatrix::from_predictions(&y_pred, &y_true, 2);

        assert_eq!(cm.true_positives(1), 2);
        assert_eq!(cm.false_positives(1), 1);
        assert_eq!(cm.false_negatives(0), 1);
        assert_eq!(cm.support(0), 2);
        assert!((cm.accuracy() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_weighted_averaging_respects_support() {
        // Class 0 dominates: 8 of 10 samples, all predicted correctly.
        // Class 1 is always missed.
        let y_true = [0, 0, 0, 0, 0, 0, 0, 0, 1, 1];
        let y_pred = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let scores = weighted_scores(&y_pred, &y_true, 2);

        assert!((scores.accuracy - 0.8).abs() < 1e-6);
        // Weighted recall = 0.8 * 1.0 + 0.2 * 0.0
        assert!((scores.recall - 0.8).abs() < 1e-6);
        // Class 0 precision is 8/10, class 1 contributes zero.
        assert!((scores.precision - 0.8 * 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_empty_inputs() {
        let scores = weighted_scores(&[], &[], 3);
        assert_eq!(scores.accuracy, 0.0);
    }

    #[test]
    fn test_scores_pack_order() {
        let scores = EpochScores { accuracy: 0.1, recall: 0.2, precision: 0.3, f1: 0.4 };
        assert_eq!(scores.to_array(), [0.1, 0.2, 0.3, 0.4]);
    }
}
