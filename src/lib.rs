//! Anotar: linear-model invocation and human-in-the-loop annotation training
//!
//! This crate packages the ML glue of a training pipeline:
//! - Thin parameter-forwarding wrappers around linfa's linear estimators,
//!   selected by name from a CLI
//! - Dataset loaders (built-in linfa datasets, CSV pairs, image folders)
//!   with slice-and-save export
//! - A preset registry populated by walking a directory of YAML files
//! - A staggered active-learning trainer that pauses for human rectangle
//!   annotations and folds them back into the loss as a saliency penalty
//!
//! # Example
//!
//! ```no_run
//! use anotar::linear::{least_squares, LeastSquaresParams};
//! use ndarray::{array, Array2};
//!
//! let x_train: Array2<f64> = array![[0.0], [1.0], [2.0]];
//! let y_train = array![0.0, 1.0, 2.0];
//! let x_test: Array2<f64> = array![[3.0]];
//!
//! let (model, prediction) =
//!     least_squares(&x_train, &y_train, &x_test, &LeastSquaresParams::default())?;
//! println!("intercept={} pred={}", model.intercept(), prediction[0]);
//! # Ok::<(), anotar::Error>(())
//! ```

pub mod cli;
pub mod datasets;
pub mod error;
pub mod hitl;
pub mod linear;
pub mod registry;

pub use error::{Error, Result};
