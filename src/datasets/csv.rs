//! Headerless CSV reading and writing for feature/target pairs

use crate::datasets::builtin::RowLimits;
use crate::error::{Error, Result};
use ndarray::{Array1, Array2, Axis};
use std::path::Path;

/// Read a headerless numeric CSV into a feature matrix.
pub fn read_matrix_csv(path: &Path) -> Result<Array2<f64>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(false)
        .from_path(path)?;

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = record
            .iter()
            .map(|cell| {
                cell.trim().parse::<f64>().map_err(|_| {
                    Error::Data(format!("non-numeric cell '{cell}' in {}", path.display()))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    let ncols = rows.first().map_or(0, Vec::len);
    let nrows = rows.len();
    let flat: Vec<f64> = rows.into_iter().flatten().collect();

    Array2::from_shape_vec((nrows, ncols), flat)
        .map_err(|_| Error::Data(format!("ragged rows in {}", path.display())))
}

/// Read a single-column headerless CSV into a target vector.
pub fn read_target_csv(path: &Path) -> Result<Array1<f64>> {
    let matrix = read_matrix_csv(path)?;
    if matrix.is_empty() {
        return Ok(Array1::zeros(0));
    }
    if matrix.ncols() != 1 {
        return Err(Error::Data(format!(
            "expected one target column in {}, found {}",
            path.display(),
            matrix.ncols()
        )));
    }
    Ok(matrix.column(0).to_owned())
}

/// Write a feature matrix as a headerless CSV.
pub fn write_matrix_csv(path: &Path, matrix: &Array2<f64>) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    for row in matrix.rows() {
        let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writer.write_record(&cells)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a target vector as a single-column headerless CSV.
pub fn write_target_csv(path: &Path, targets: &Array1<f64>) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    for value in targets.iter() {
        writer.write_record([value.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Slice an existing feature/target CSV pair into new files, applying
/// independent row ranges to each.
pub fn slice_csv_pair(
    orig_data: &Path,
    orig_target: &Path,
    data_out: &Path,
    target_out: &Path,
    limits: &RowLimits,
) -> Result<()> {
    let x = read_matrix_csv(orig_data)?;
    let y = read_target_csv(orig_target)?;

    let (lo, hi) = limits.data_range(x.nrows());
    let rows: Vec<usize> = (lo..hi).collect();
    write_matrix_csv(data_out, &x.select(Axis(0), &rows))?;

    let (lo, hi) = limits.target_range(y.len());
    let rows: Vec<usize> = (lo..hi).collect();
    write_target_csv(target_out, &y.select(Axis(0), &rows))?;

    Ok(())
}
