//! Generalized linear models (Tweedie family)
//!
//! `tweedie_regressor` exposes the full power parameterization;
//! `poisson_regressor` and `gamma_regressor` are the fixed-power entry
//! points the pipeline frontend offers alongside it.

use crate::error::{Error, Result};
use linfa::prelude::*;
use linfa::Dataset;
use linfa_linear::{Link, TweedieRegressor};
use ndarray::{Array1, Array2};

/// Hyperparameters for the Tweedie-family regressors
#[derive(Debug, Clone)]
pub struct TweedieParams {
    /// Tweedie power: 0 = normal, 1 = Poisson, 2 = gamma (default 0.0)
    pub power: f64,
    /// Regularization strength (default 1.0)
    pub alpha: f64,
    /// Fit an intercept term (default true)
    pub with_intercept: bool,
    /// Link function; `None` selects identity for power 0 and log otherwise
    pub link: Option<Link>,
    /// Maximum solver iterations (default 100)
    pub max_iter: usize,
    /// Convergence tolerance (default 1e-4)
    pub tol: f64,
}

impl Default for TweedieParams {
    fn default() -> Self {
        Self {
            power: 0.0,
            alpha: 1.0,
            with_intercept: true,
            link: None,
            max_iter: 100,
            tol: 1e-4,
        }
    }
}

impl TweedieParams {
    /// Resolve the `auto` link rule: identity for the normal distribution,
    /// log for every other power.
    pub fn resolved_link(&self) -> Link {
        match self.link.clone() {
            Some(link) => link,
            None if self.power <= 0.0 => Link::Identity,
            None => Link::Log,
        }
    }

    /// Parse a frontend link name.
    pub fn link_from_name(name: &str) -> Result<Option<Link>> {
        match name {
            "auto" | "" => Ok(None),
            "identity" => Ok(Some(Link::Identity)),
            "log" => Ok(Some(Link::Log)),
            "logit" => Ok(Some(Link::Logit)),
            other => Err(Error::InvalidArgument(format!(
                "unknown link '{other}', expected auto, identity, log, or logit"
            ))),
        }
    }
}

/// Fit a Tweedie GLM and predict the test matrix.
pub fn tweedie_regressor(
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    params: &TweedieParams,
) -> Result<(TweedieRegressor<f64>, Array1<f64>)> {
    let dataset = Dataset::new(x_train.clone(), y_train.clone());

    let model = TweedieRegressor::params()
        .power(params.power)
        .alpha(params.alpha)
        .fit_intercept(params.with_intercept)
        .link(params.resolved_link())
        .max_iter(params.max_iter)
        .tol(params.tol)
        .fit(&dataset)
        .map_err(|e| Error::Estimator(e.to_string()))?;

    let prediction = model.predict(x_test);

    Ok((model, prediction))
}

/// Poisson regression: Tweedie GLM fixed at power 1 with a log link.
pub fn poisson_regressor(
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    params: &TweedieParams,
) -> Result<(TweedieRegressor<f64>, Array1<f64>)> {
    let params = TweedieParams { power: 1.0, link: Some(Link::Log), ..params.clone() };
    tweedie_regressor(x_train, y_train, x_test, &params)
}

/// Gamma regression: Tweedie GLM fixed at power 2 with a log link.
pub fn gamma_regressor(
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    params: &TweedieParams,
) -> Result<(TweedieRegressor<f64>, Array1<f64>)> {
    let params = TweedieParams { power: 2.0, link: Some(Link::Log), ..params.clone() };
    tweedie_regressor(x_train, y_train, x_test, &params)
}
