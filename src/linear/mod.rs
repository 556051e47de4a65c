//! Linear-model registry and parameter-forwarding wrappers
//!
//! Each wrapper does exactly four things: construct the linfa estimator
//! with explicit hyperparameters, fit on the training pair, predict on
//! the test matrix, and return the fitted model with its predictions
//! (plus class probabilities for the classifiers). No validation, retry,
//! or error translation is layered on top of what the library reports.

mod dispatch;
mod glm;
mod least_squares;
mod logistic;
pub mod model_selection;
mod penalized;

pub use dispatch::{run_model, FitReport};
pub use glm::{gamma_regressor, poisson_regressor, tweedie_regressor, TweedieParams};
pub use least_squares::{least_squares, LeastSquaresParams};
pub use logistic::{
    logistic_regression, multinomial_logistic_regression, LogisticParams,
};
pub use penalized::{
    elastic_net, elastic_net_cv, lasso, lasso_cv, ridge_regression, ridge_regression_cv,
    PenalizedCvParams, PenalizedParams,
};

use crate::error::{Error, Result};

/// Registry of invocable model names.
///
/// Names mirror the pipeline frontend's camelCase identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    LeastSquares,
    RidgeRegression,
    RidgeRegressionCv,
    Lasso,
    LassoCv,
    ElasticNet,
    ElasticNetCv,
    Logistic,
    MultinomialLogistic,
    Tweedie,
    Poisson,
    Gamma,
}

impl ModelKind {
    /// Every registered model name, in registry order.
    pub const ALL: [ModelKind; 12] = [
        ModelKind::LeastSquares,
        ModelKind::RidgeRegression,
        ModelKind::RidgeRegressionCv,
        ModelKind::Lasso,
        ModelKind::LassoCv,
        ModelKind::ElasticNet,
        ModelKind::ElasticNetCv,
        ModelKind::Logistic,
        ModelKind::MultinomialLogistic,
        ModelKind::Tweedie,
        ModelKind::Poisson,
        ModelKind::Gamma,
    ];

    /// Registry name of this model.
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::LeastSquares => "leastSquares",
            ModelKind::RidgeRegression => "ridgeRegression",
            ModelKind::RidgeRegressionCv => "ridgeRegressionCV",
            ModelKind::Lasso => "lasso",
            ModelKind::LassoCv => "lassoCV",
            ModelKind::ElasticNet => "elasticNet",
            ModelKind::ElasticNetCv => "elasticNetCV",
            ModelKind::Logistic => "logistic",
            ModelKind::MultinomialLogistic => "multinomialLogistic",
            ModelKind::Tweedie => "tweedie",
            ModelKind::Poisson => "poisson",
            ModelKind::Gamma => "gamma",
        }
    }

    /// Look a model up by registry name.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|kind| kind.name() == name)
            .copied()
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|k| k.name()).collect();
                Error::InvalidArgument(format!(
                    "unknown model '{name}', expected one of: {}",
                    known.join(", ")
                ))
            })
    }

    /// Whether this model produces class probabilities.
    pub fn is_classifier(&self) -> bool {
        matches!(self, ModelKind::Logistic | ModelKind::MultinomialLogistic)
    }
}
