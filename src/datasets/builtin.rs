//! Built-in dataset loaders with slice-and-export to CSV

use crate::datasets::csv::{write_matrix_csv, write_target_csv};
use crate::error::Result;
use linfa::Dataset;
use ndarray::{Array1, Array2, Axis, Ix1};
use std::path::Path;

/// Load the diabetes regression dataset.
pub fn diabetes() -> Dataset<f64, f64, Ix1> {
    linfa_datasets::diabetes()
}

/// Load the wine-quality classification dataset.
pub fn winequality() -> Dataset<f64, usize, Ix1> {
    linfa_datasets::winequality()
}

/// Load the iris classification dataset.
pub fn iris() -> Dataset<f64, usize, Ix1> {
    linfa_datasets::iris()
}

/// Row ranges for dataset export. Absent bounds fall back to the full
/// range; out-of-range bounds are clamped.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowLimits {
    pub lower_data: Option<usize>,
    pub upper_data: Option<usize>,
    pub lower_target: Option<usize>,
    pub upper_target: Option<usize>,
}

impl RowLimits {
    fn resolve(lower: Option<usize>, upper: Option<usize>, len: usize) -> (usize, usize) {
        let lo = lower.unwrap_or(0).min(len);
        let hi = upper.unwrap_or(len).min(len);
        (lo, hi.max(lo))
    }

    /// Resolved (lower, upper) for the feature rows.
    pub fn data_range(&self, len: usize) -> (usize, usize) {
        Self::resolve(self.lower_data, self.upper_data, len)
    }

    /// Resolved (lower, upper) for the target rows.
    pub fn target_range(&self, len: usize) -> (usize, usize) {
        Self::resolve(self.lower_target, self.upper_target, len)
    }
}

/// Write a sliced copy of a regression dataset as feature/target CSVs.
/// The target file is skipped when no path is given.
pub fn export_regression(
    records: &Array2<f64>,
    targets: &Array1<f64>,
    data_path: &Path,
    target_path: Option<&Path>,
    limits: &RowLimits,
) -> Result<()> {
    let (lo, hi) = limits.data_range(records.nrows());
    let rows: Vec<usize> = (lo..hi).collect();
    write_matrix_csv(data_path, &records.select(Axis(0), &rows))?;

    if let Some(target_path) = target_path {
        let (lo, hi) = limits.target_range(targets.len());
        let rows: Vec<usize> = (lo..hi).collect();
        write_target_csv(target_path, &targets.select(Axis(0), &rows))?;
    }

    Ok(())
}

/// Classification counterpart of [`export_regression`]; labels are
/// written as integers.
pub fn export_classification(
    records: &Array2<f64>,
    targets: &Array1<usize>,
    data_path: &Path,
    target_path: Option<&Path>,
    limits: &RowLimits,
) -> Result<()> {
    let as_floats = targets.mapv(|v| v as f64);
    export_regression(records, &as_floats, data_path, target_path, limits)
}
