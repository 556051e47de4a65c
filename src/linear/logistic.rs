//! Logistic regression (binary and multinomial)
//!
//! The only wrappers in the registry that return probability estimates.

use crate::error::{Error, Result};
use linfa::prelude::*;
use linfa::Dataset;
use linfa_logistic::{
    FittedLogisticRegression, LogisticRegression, MultiFittedLogisticRegression,
    MultiLogisticRegression,
};
use ndarray::{Array1, Array2};

/// Hyperparameters for the logistic wrappers
#[derive(Debug, Clone)]
pub struct LogisticParams {
    /// L2 regularization strength (default 0.01)
    pub alpha: f64,
    /// Fit an intercept term (default true)
    pub with_intercept: bool,
    /// Maximum solver iterations (default 100)
    pub max_iterations: u64,
    /// Gradient convergence tolerance (default 1e-4)
    pub gradient_tolerance: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            alpha: 0.01,
            with_intercept: true,
            max_iterations: 100,
            gradient_tolerance: 1e-4,
        }
    }
}

/// Fit a binary logistic regression and predict the test matrix.
///
/// Returns the fitted model, hard predictions, and the positive-class
/// probability for each test row.
pub fn logistic_regression(
    x_train: &Array2<f64>,
    y_train: &Array1<usize>,
    x_test: &Array2<f64>,
    params: &LogisticParams,
) -> Result<(FittedLogisticRegression<f64, usize>, Array1<usize>, Array1<f64>)> {
    let dataset = Dataset::new(x_train.clone(), y_train.clone());

    let model = LogisticRegression::default()
        .alpha(params.alpha)
        .with_intercept(params.with_intercept)
        .max_iterations(params.max_iterations)
        .gradient_tolerance(params.gradient_tolerance)
        .fit(&dataset)
        .map_err(|e| Error::Estimator(e.to_string()))?;

    let prediction = model.predict(x_test);
    let probabilities = model.predict_probabilities(x_test);

    Ok((model, prediction, probabilities))
}

/// Fit a multinomial logistic regression and predict the test matrix.
///
/// Returns the fitted model, hard predictions, and the per-class
/// probability matrix (one row per test sample).
pub fn multinomial_logistic_regression(
    x_train: &Array2<f64>,
    y_train: &Array1<usize>,
    x_test: &Array2<f64>,
    params: &LogisticParams,
) -> Result<(MultiFittedLogisticRegression<f64, usize>, Array1<usize>, Array2<f64>)> {
    let dataset = Dataset::new(x_train.clone(), y_train.clone());

    let model = MultiLogisticRegression::default()
        .alpha(params.alpha)
        .with_intercept(params.with_intercept)
        .max_iterations(params.max_iterations)
        .gradient_tolerance(params.gradient_tolerance)
        .fit(&dataset)
        .map_err(|e| Error::Estimator(e.to_string()))?;

    let prediction = model.predict(x_test);
    let probabilities = model.predict_probabilities(x_test);

    Ok((model, prediction, probabilities))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array};

    fn separable_binary() -> (Array2<f64>, Array1<usize>) {
        // Class 0 clusters near x=0, class 1 near x=4.
        let x = Array::from_shape_fn((20, 1), |(i, _)| {
            if i < 10 { i as f64 * 0.1 } else { 4.0 + (i - 10) as f64 * 0.1 }
        });
        let y = Array::from_shape_fn(20, |i| usize::from(i >= 10));
        (x, y)
    }

    #[test]
    fn test_binary_separates_clusters() {
        let (x, y) = separable_binary();
        let x_test: Array2<f64> = array![[0.2], [4.5]];

        let (_, pred, probs) =
            logistic_regression(&x, &y, &x_test, &LogisticParams::default()).unwrap();

        assert_eq!(pred[0], 0);
        assert_eq!(pred[1], 1);
        assert!(probs[0] < 0.5);
        assert!(probs[1] > 0.5);
    }

    #[test]
    fn test_multinomial_probability_rows_sum_to_one() {
        // Three clusters along one axis.
        let x = Array::from_shape_fn((30, 1), |(i, _)| (i / 10) as f64 * 3.0 + (i % 10) as f64 * 0.05);
        let y = Array::from_shape_fn(30, |i| i / 10);

        let (_, pred, probs) =
            multinomial_logistic_regression(&x, &y, &x, &LogisticParams::default()).unwrap();

        assert_eq!(probs.nrows(), 30);
        assert_eq!(probs.ncols(), 3);
        for row in probs.rows() {
            let total: f64 = row.sum();
            assert!((total - 1.0).abs() < 1e-6, "row sums to {total}");
        }
        assert_eq!(pred.len(), 30);
    }

    #[test]
    fn test_binary_rejects_three_classes() {
        let x: Array2<f64> = array![[0.0], [1.0], [2.0]];
        let y = array![0usize, 1, 2];
        assert!(logistic_regression(&x, &y, &x, &LogisticParams::default()).is_err());
    }
}
