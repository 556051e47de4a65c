//! Ordinary least squares

use crate::error::{Error, Result};
use linfa::prelude::*;
use linfa::Dataset;
use linfa_linear::{FittedLinearRegression, LinearRegression};
use ndarray::{Array1, Array2};

/// Hyperparameters for [`least_squares`]
#[derive(Debug, Clone)]
pub struct LeastSquaresParams {
    /// Fit an intercept term (default true)
    pub with_intercept: bool,
}

impl Default for LeastSquaresParams {
    fn default() -> Self {
        Self { with_intercept: true }
    }
}

/// Fit an ordinary least squares regression and predict the test matrix.
///
/// Returns the fitted model and its predictions.
pub fn least_squares(
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    params: &LeastSquaresParams,
) -> Result<(FittedLinearRegression<f64>, Array1<f64>)> {
    let dataset = Dataset::new(x_train.clone(), y_train.clone());

    let model = LinearRegression::default()
        .with_intercept(params.with_intercept)
        .fit(&dataset)
        .map_err(|e| Error::Estimator(e.to_string()))?;

    let prediction = model.predict(x_test);

    Ok((model, prediction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_recovers_line() {
        // y = 2x + 1
        let x: Array2<f64> = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![1.0, 3.0, 5.0, 7.0];
        let x_test: Array2<f64> = array![[4.0], [5.0]];

        let (model, pred) =
            least_squares(&x, &y, &x_test, &LeastSquaresParams::default()).unwrap();

        assert_abs_diff_eq!(model.intercept(), 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(pred[0], 9.0, epsilon = 1e-8);
        assert_abs_diff_eq!(pred[1], 11.0, epsilon = 1e-8);
    }

    #[test]
    fn test_no_intercept() {
        let x: Array2<f64> = array![[1.0], [2.0], [3.0]];
        let y = array![2.0, 4.0, 6.0];
        let params = LeastSquaresParams { with_intercept: false };

        let (model, pred) = least_squares(&x, &y, &x, &params).unwrap();

        assert_abs_diff_eq!(model.intercept(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pred[2], 6.0, epsilon = 1e-8);
    }

    #[test]
    fn test_prediction_length_matches_test_rows() {
        let x: Array2<f64> = array![[0.0, 1.0], [1.0, 0.0], [1.0, 1.0], [2.0, 2.0]];
        let y = array![1.0, 1.0, 2.0, 4.0];
        let x_test: Array2<f64> = array![[0.5, 0.5]];

        let (_, pred) = least_squares(&x, &y, &x_test, &LeastSquaresParams::default()).unwrap();
        assert_eq!(pred.len(), 1);
    }
}
