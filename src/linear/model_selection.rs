//! Cross-validation splits and scoring for the *CV wrappers

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Deterministic k-fold split of `0..n` into (train, validation) index
/// pairs. Indices are shuffled with the seed before folding so folds are
/// stable across runs.
pub fn kfold_indices(n: usize, folds: usize, seed: u64) -> Vec<(Vec<usize>, Vec<usize>)> {
    let folds = folds.clamp(2, n.max(2));

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut splits = Vec::with_capacity(folds);
    for fold in 0..folds {
        let val: Vec<usize> = indices
            .iter()
            .copied()
            .skip(fold)
            .step_by(folds)
            .collect();
        if val.is_empty() {
            continue;
        }
        let train: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|i| !val.contains(i))
            .collect();
        splits.push((train, val));
    }

    splits
}

/// Mean squared error between two target vectors.
pub fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p) * (t - p))
        .sum::<f64>()
        / y_true.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::collections::HashSet;

    #[test]
    fn test_kfold_partitions_all_indices() {
        let splits = kfold_indices(10, 5, 42);
        assert_eq!(splits.len(), 5);

        let mut seen = HashSet::new();
        for (train, val) in &splits {
            assert_eq!(train.len() + val.len(), 10);
            for i in val {
                assert!(seen.insert(*i), "index {i} appeared in two folds");
            }
        }
        assert_eq!(seen.len(), 10);
    }

    #[test]
    fn test_kfold_train_val_disjoint() {
        for (train, val) in kfold_indices(23, 4, 7) {
            let train: HashSet<_> = train.into_iter().collect();
            assert!(val.iter().all(|i| !train.contains(i)));
        }
    }

    #[test]
    fn test_kfold_deterministic() {
        assert_eq!(kfold_indices(17, 3, 11), kfold_indices(17, 3, 11));
    }

    #[test]
    fn test_mse() {
        let t = array![1.0, 2.0, 3.0];
        let p = array![1.0, 2.0, 5.0];
        assert!((mean_squared_error(&t, &p) - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_mse_empty() {
        let e: Array1<f64> = array![];
        assert_eq!(mean_squared_error(&e, &e), 0.0);
    }
}
