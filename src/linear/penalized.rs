//! Ridge, lasso, and elastic-net regression
//!
//! All three forward to `linfa-elasticnet`; ridge and lasso use the
//! library's preset mixing ratios. The `*_cv` variants pick the penalty
//! from a grid by k-fold cross-validation before refitting on the full
//! training set.

use crate::error::{Error, Result};
use crate::linear::model_selection::{kfold_indices, mean_squared_error};
use linfa::prelude::*;
use linfa::Dataset;
use linfa_elasticnet::{ElasticNet, ElasticNetParams};
use ndarray::{Array1, Array2, Axis};

/// Hyperparameters shared by the penalized regressions
#[derive(Debug, Clone)]
pub struct PenalizedParams {
    /// Regularization strength (default 1.0)
    pub alpha: f64,
    /// Elastic-net mixing parameter; only read by [`elastic_net`] (default 0.5)
    pub l1_ratio: f64,
    /// Fit an intercept term (default true)
    pub with_intercept: bool,
    /// Maximum coordinate-descent iterations (default 1000)
    pub max_iterations: u32,
    /// Convergence tolerance (default 1e-4)
    pub tolerance: f64,
}

impl Default for PenalizedParams {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            l1_ratio: 0.5,
            with_intercept: true,
            max_iterations: 1000,
            tolerance: 1e-4,
        }
    }
}

/// Cross-validation settings for the `*_cv` wrappers
#[derive(Debug, Clone)]
pub struct PenalizedCvParams {
    /// Penalty grid to search (default `[0.1, 1.0, 10.0]`)
    pub alphas: Vec<f64>,
    /// Number of folds (default 5)
    pub folds: usize,
    /// Shuffle seed for the fold split (default 42)
    pub seed: u64,
    /// Forwarded estimator settings; `alpha` is ignored in favor of the grid
    pub base: PenalizedParams,
}

impl Default for PenalizedCvParams {
    fn default() -> Self {
        Self {
            alphas: vec![0.1, 1.0, 10.0],
            folds: 5,
            seed: 42,
            base: PenalizedParams::default(),
        }
    }
}

fn configure(params: ElasticNetParams<f64>, base: &PenalizedParams, alpha: f64) -> ElasticNetParams<f64> {
    params
        .penalty(alpha)
        .with_intercept(base.with_intercept)
        .max_iterations(base.max_iterations)
        .tolerance(base.tolerance)
}

fn fit_one(
    params: ElasticNetParams<f64>,
    x: &Array2<f64>,
    y: &Array1<f64>,
) -> Result<ElasticNet<f64>> {
    let dataset = Dataset::new(x.clone(), y.clone());
    params
        .fit(&dataset)
        .map_err(|e| Error::Estimator(e.to_string()))
}

/// Fit a ridge regression (L2 penalty) and predict the test matrix.
pub fn ridge_regression(
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    params: &PenalizedParams,
) -> Result<(ElasticNet<f64>, Array1<f64>)> {
    let model = fit_one(configure(ElasticNet::ridge(), params, params.alpha), x_train, y_train)?;
    let prediction = model.predict(x_test);
    Ok((model, prediction))
}

/// Fit a lasso regression (L1 penalty) and predict the test matrix.
pub fn lasso(
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    params: &PenalizedParams,
) -> Result<(ElasticNet<f64>, Array1<f64>)> {
    let model = fit_one(configure(ElasticNet::lasso(), params, params.alpha), x_train, y_train)?;
    let prediction = model.predict(x_test);
    Ok((model, prediction))
}

/// Fit an elastic net (mixed L1/L2 penalty) and predict the test matrix.
pub fn elastic_net(
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    params: &PenalizedParams,
) -> Result<(ElasticNet<f64>, Array1<f64>)> {
    let configured =
        configure(ElasticNet::params().l1_ratio(params.l1_ratio), params, params.alpha);
    let model = fit_one(configured, x_train, y_train)?;
    let prediction = model.predict(x_test);
    Ok((model, prediction))
}

/// Pick the best penalty from the grid by k-fold cross-validation, refit
/// on the full training set, and predict the test matrix.
///
/// `make_params` supplies the family-specific base parameters (ridge,
/// lasso, or elastic net) for each candidate fit.
fn penalized_cv(
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    cv: &PenalizedCvParams,
    make_params: impl Fn() -> ElasticNetParams<f64>,
) -> Result<(ElasticNet<f64>, Array1<f64>, f64)> {
    if cv.alphas.is_empty() {
        return Err(Error::InvalidArgument("alpha grid must not be empty".to_string()));
    }

    let splits = kfold_indices(x_train.nrows(), cv.folds, cv.seed);

    let mut best: Option<(f64, f64)> = None; // (score, alpha)
    for &alpha in &cv.alphas {
        let mut score = 0.0;
        for (train_idx, val_idx) in &splits {
            let x_fold = x_train.select(Axis(0), train_idx);
            let y_fold = y_train.select(Axis(0), train_idx);
            let x_val = x_train.select(Axis(0), val_idx);
            let y_val = y_train.select(Axis(0), val_idx);

            let model = fit_one(configure(make_params(), &cv.base, alpha), &x_fold, &y_fold)?;
            score += mean_squared_error(&y_val, &model.predict(&x_val));
        }
        score /= splits.len() as f64;

        let better = best.map_or(true, |(s, _)| score < s);
        if better {
            best = Some((score, alpha));
        }
    }

    let (_, best_alpha) = best.ok_or_else(|| {
        Error::Estimator("cross-validation produced no candidate fits".to_string())
    })?;
    let model = fit_one(configure(make_params(), &cv.base, best_alpha), x_train, y_train)?;
    let prediction = model.predict(x_test);
    Ok((model, prediction, best_alpha))
}

/// Cross-validated ridge regression.
pub fn ridge_regression_cv(
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    cv: &PenalizedCvParams,
) -> Result<(ElasticNet<f64>, Array1<f64>, f64)> {
    penalized_cv(x_train, y_train, x_test, cv, ElasticNet::ridge)
}

/// Cross-validated lasso.
pub fn lasso_cv(
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    cv: &PenalizedCvParams,
) -> Result<(ElasticNet<f64>, Array1<f64>, f64)> {
    penalized_cv(x_train, y_train, x_test, cv, ElasticNet::lasso)
}

/// Cross-validated elastic net at the configured mixing ratio.
pub fn elastic_net_cv(
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    cv: &PenalizedCvParams,
) -> Result<(ElasticNet<f64>, Array1<f64>, f64)> {
    let l1_ratio = cv.base.l1_ratio;
    penalized_cv(x_train, y_train, x_test, cv, move || {
        ElasticNet::params().l1_ratio(l1_ratio)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    fn line_data(n: usize) -> (Array2<f64>, Array1<f64>) {
        // y = 3x - 1, one feature
        let x = Array::from_shape_fn((n, 1), |(i, _)| i as f64 / n as f64);
        let y = x.column(0).mapv(|v| 3.0 * v - 1.0);
        (x, y)
    }

    #[test]
    fn test_ridge_small_alpha_tracks_ols() {
        let (x, y) = line_data(40);
        let params = PenalizedParams { alpha: 1e-6, ..PenalizedParams::default() };

        let (_, pred) = ridge_regression(&x, &y, &x, &params).unwrap();
        let mse = mean_squared_error(&y, &pred);
        assert!(mse < 1e-6, "mse = {mse}");
    }

    #[test]
    fn test_lasso_large_alpha_shrinks_to_intercept() {
        let (x, y) = line_data(40);
        let params = PenalizedParams { alpha: 1e3, ..PenalizedParams::default() };

        let (model, _) = lasso(&x, &y, &x, &params).unwrap();
        assert!(model.hyperplane()[0].abs() < 1e-6);
    }

    #[test]
    fn test_elastic_net_prediction_shape() {
        let (x, y) = line_data(30);
        let x_test = Array::from_shape_fn((7, 1), |(i, _)| i as f64);

        let (_, pred) = elastic_net(&x, &y, &x_test, &PenalizedParams::default()).unwrap();
        assert_eq!(pred.len(), 7);
    }

    #[test]
    fn test_cv_picks_smallest_alpha_on_clean_line() {
        // Noise-free data: less regularization always scores better.
        let (x, y) = line_data(60);
        let cv = PenalizedCvParams {
            alphas: vec![1e-6, 1.0, 100.0],
            ..PenalizedCvParams::default()
        };

        let (_, _, chosen) = ridge_regression_cv(&x, &y, &x, &cv).unwrap();
        assert!((chosen - 1e-6).abs() < 1e-12, "chose {chosen}");
    }

    #[test]
    fn test_wrapper_forwards_hyperparameters_unchanged() {
        // The wrapper must behave exactly like the library builder
        // configured with the same values.
        let (x, y) = line_data(30);
        let params = PenalizedParams { alpha: 0.7, ..PenalizedParams::default() };

        let (_, wrapped) = ridge_regression(&x, &y, &x, &params).unwrap();

        let direct = ElasticNet::ridge()
            .penalty(0.7)
            .with_intercept(true)
            .max_iterations(1000)
            .tolerance(1e-4)
            .fit(&Dataset::new(x.clone(), y.clone()))
            .unwrap();

        assert_eq!(wrapped, direct.predict(&x));
    }

    #[test]
    fn test_cv_empty_grid_errors() {
        let (x, y) = line_data(10);
        let cv = PenalizedCvParams { alphas: vec![], ..PenalizedCvParams::default() };
        assert!(lasso_cv(&x, &y, &x, &cv).is_err());
    }
}
