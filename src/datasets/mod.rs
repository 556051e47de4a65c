//! Dataset loaders and exporters
//!
//! Built-in datasets come straight from `linfa-datasets`; CSV pairs and
//! image folders cover data the pipeline stages produce themselves.

mod builtin;
mod csv;
mod images;

pub use builtin::{diabetes, export_classification, export_regression, iris, winequality, RowLimits};
pub use csv::{read_matrix_csv, read_target_csv, slice_csv_pair, write_matrix_csv, write_target_csv};
pub use images::{resize_images, Fold, ImageFolderDataset};
