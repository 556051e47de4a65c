//! Registry dispatch: map a model name to its wrapper
//!
//! Hyperparameters arrive as raw strings and are coerced here with each
//! wrapper's documented defaults, mirroring how the pipeline frontend
//! submits invocations.

use crate::cli::{parse_alphas_arg, parse_bool_arg, parse_float_arg, parse_int_arg, RawModelArgs};
use crate::error::{Error, Result};
use crate::linear::{
    elastic_net, elastic_net_cv, gamma_regressor, lasso, lasso_cv, least_squares,
    logistic_regression, multinomial_logistic_regression, poisson_regressor, ridge_regression,
    ridge_regression_cv, tweedie_regressor, LeastSquaresParams, LogisticParams, ModelKind,
    PenalizedCvParams, PenalizedParams, TweedieParams,
};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Serializable result of one model invocation.
///
/// Regressions fill `coefficients`/`intercepts` with a single row;
/// the multinomial classifier carries one row per class. Probabilities
/// are present exactly for the classifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitReport {
    /// Registry name of the fitted model
    pub model: String,
    /// Penalty chosen by cross-validation, for the *CV models
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen_alpha: Option<f64>,
    /// Learned coefficient rows
    pub coefficients: Vec<Vec<f64>>,
    /// Learned intercepts, one per coefficient row
    pub intercepts: Vec<f64>,
    /// Predictions for the test matrix (class indices for classifiers)
    pub prediction: Vec<f64>,
    /// Per-class probability rows, classifiers only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<Vec<f64>>>,
}

fn penalized_params(raw: &RawModelArgs) -> Result<PenalizedParams> {
    Ok(PenalizedParams {
        alpha: parse_float_arg(raw.alpha.as_deref(), 1.0)?,
        l1_ratio: parse_float_arg(raw.l1_ratio.as_deref(), 0.5)?,
        with_intercept: parse_bool_arg(raw.fit_intercept.as_deref(), true)?,
        max_iterations: parse_int_arg(raw.max_iter.as_deref(), 1000)? as u32,
        tolerance: parse_float_arg(raw.tol.as_deref(), 1e-4)?,
    })
}

fn penalized_cv_params(raw: &RawModelArgs) -> Result<PenalizedCvParams> {
    Ok(PenalizedCvParams {
        alphas: parse_alphas_arg(raw.alphas.as_deref(), &[0.1, 1.0, 10.0])?,
        folds: parse_int_arg(raw.folds.as_deref(), 5)? as usize,
        seed: parse_int_arg(raw.seed.as_deref(), 42)?,
        base: penalized_params(raw)?,
    })
}

fn tweedie_params(raw: &RawModelArgs) -> Result<TweedieParams> {
    Ok(TweedieParams {
        power: parse_float_arg(raw.power.as_deref(), 0.0)?,
        alpha: parse_float_arg(raw.alpha.as_deref(), 1.0)?,
        with_intercept: parse_bool_arg(raw.fit_intercept.as_deref(), true)?,
        link: TweedieParams::link_from_name(raw.link.as_deref().unwrap_or("auto"))?,
        max_iter: parse_int_arg(raw.max_iter.as_deref(), 100)? as usize,
        tol: parse_float_arg(raw.tol.as_deref(), 1e-4)?,
    })
}

fn logistic_params(raw: &RawModelArgs) -> Result<LogisticParams> {
    Ok(LogisticParams {
        alpha: parse_float_arg(raw.alpha.as_deref(), 0.01)?,
        with_intercept: parse_bool_arg(raw.fit_intercept.as_deref(), true)?,
        max_iterations: parse_int_arg(raw.max_iter.as_deref(), 100)?,
        gradient_tolerance: parse_float_arg(raw.tol.as_deref(), 1e-4)?,
    })
}

/// Classifier targets must be non-negative integers.
fn to_labels(y: &Array1<f64>) -> Result<Array1<usize>> {
    let mut labels = Vec::with_capacity(y.len());
    for &v in y.iter() {
        if v < 0.0 || (v - v.round()).abs() > 1e-9 {
            return Err(Error::Data(format!(
                "classification targets must be non-negative integers, got {v}"
            )));
        }
        labels.push(v.round() as usize);
    }
    Ok(Array1::from(labels))
}

/// Invoke the named model on the given data, coercing every raw
/// hyperparameter string, and package the outcome as a [`FitReport`].
pub fn run_model(
    kind: ModelKind,
    raw: &RawModelArgs,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
) -> Result<FitReport> {
    let mut report = FitReport {
        model: kind.name().to_string(),
        chosen_alpha: None,
        coefficients: Vec::new(),
        intercepts: Vec::new(),
        prediction: Vec::new(),
        probabilities: None,
    };

    match kind {
        ModelKind::LeastSquares => {
            let params = LeastSquaresParams {
                with_intercept: parse_bool_arg(raw.fit_intercept.as_deref(), true)?,
            };
            let (model, pred) = least_squares(x_train, y_train, x_test, &params)?;
            report.coefficients = vec![model.params().to_vec()];
            report.intercepts = vec![model.intercept()];
            report.prediction = pred.to_vec();
        }
        ModelKind::RidgeRegression | ModelKind::Lasso | ModelKind::ElasticNet => {
            let params = penalized_params(raw)?;
            let (model, pred) = match kind {
                ModelKind::RidgeRegression => ridge_regression(x_train, y_train, x_test, &params)?,
                ModelKind::Lasso => lasso(x_train, y_train, x_test, &params)?,
                _ => elastic_net(x_train, y_train, x_test, &params)?,
            };
            report.coefficients = vec![model.hyperplane().to_vec()];
            report.intercepts = vec![model.intercept()];
            report.prediction = pred.to_vec();
        }
        ModelKind::RidgeRegressionCv | ModelKind::LassoCv | ModelKind::ElasticNetCv => {
            let cv = penalized_cv_params(raw)?;
            let (model, pred, alpha) = match kind {
                ModelKind::RidgeRegressionCv => ridge_regression_cv(x_train, y_train, x_test, &cv)?,
                ModelKind::LassoCv => lasso_cv(x_train, y_train, x_test, &cv)?,
                _ => elastic_net_cv(x_train, y_train, x_test, &cv)?,
            };
            report.chosen_alpha = Some(alpha);
            report.coefficients = vec![model.hyperplane().to_vec()];
            report.intercepts = vec![model.intercept()];
            report.prediction = pred.to_vec();
        }
        ModelKind::Tweedie | ModelKind::Poisson | ModelKind::Gamma => {
            let params = tweedie_params(raw)?;
            let (model, pred) = match kind {
                ModelKind::Tweedie => tweedie_regressor(x_train, y_train, x_test, &params)?,
                ModelKind::Poisson => poisson_regressor(x_train, y_train, x_test, &params)?,
                _ => gamma_regressor(x_train, y_train, x_test, &params)?,
            };
            report.coefficients = vec![model.coef.to_vec()];
            report.intercepts = vec![model.intercept];
            report.prediction = pred.to_vec();
        }
        ModelKind::Logistic => {
            let params = logistic_params(raw)?;
            let labels = to_labels(y_train)?;
            let (model, pred, probs) = logistic_regression(x_train, &labels, x_test, &params)?;
            report.coefficients = vec![model.params().to_vec()];
            report.intercepts = vec![model.intercept()];
            report.prediction = pred.iter().map(|&c| c as f64).collect();
            report.probabilities =
                Some(probs.iter().map(|&p| vec![1.0 - p, p]).collect());
        }
        ModelKind::MultinomialLogistic => {
            let params = logistic_params(raw)?;
            let labels = to_labels(y_train)?;
            let (model, pred, probs) =
                multinomial_logistic_regression(x_train, &labels, x_test, &params)?;
            report.coefficients = model
                .params()
                .columns()
                .into_iter()
                .map(|col| col.to_vec())
                .collect();
            report.intercepts = model.intercept().to_vec();
            report.prediction = pred.iter().map(|&c| c as f64).collect();
            report.probabilities = Some(probs.rows().into_iter().map(|r| r.to_vec()).collect());
        }
    }

    Ok(report)
}
