//! Fit command implementation

use crate::cli::logging::log;
use crate::cli::{FitArgs, LogLevel, RawModelArgs};
use crate::datasets::{read_matrix_csv, read_target_csv};
use crate::linear::{run_model, FitReport, ModelKind};
use std::path::Path;

pub fn run_fit(args: FitArgs, level: LogLevel) -> Result<(), String> {
    let kind = ModelKind::from_name(&args.model).map_err(|e| e.to_string())?;

    log(level, LogLevel::Normal, &format!("Fitting {} ...", kind.name()));

    let report = fit_from_files(
        kind,
        &args.params,
        &args.train_data,
        &args.train_target,
        &args.test_data,
    )
    .map_err(|e| e.to_string())?;

    log(
        level,
        LogLevel::Verbose,
        &format!("  {} test predictions", report.prediction.len()),
    );
    if let Some(alpha) = report.chosen_alpha {
        log(level, LogLevel::Verbose, &format!("  chosen alpha: {alpha}"));
    }

    let json = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json).map_err(|e| e.to_string())?;
            log(level, LogLevel::Normal, &format!("Report written to {}", path.display()));
        }
        None => println!("{json}"),
    }

    Ok(())
}

/// Load the CSV triple and invoke the model.
pub fn fit_from_files(
    kind: ModelKind,
    params: &RawModelArgs,
    train_data: &Path,
    train_target: &Path,
    test_data: &Path,
) -> crate::Result<FitReport> {
    let x_train = read_matrix_csv(train_data)?;
    let y_train = read_target_csv(train_target)?;
    let x_test = read_matrix_csv(test_data)?;
    run_model(kind, params, &x_train, &y_train, &x_test)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::{write_matrix_csv, write_target_csv};
    use ndarray::{array, Array};
    use tempfile::tempdir;

    #[test]
    fn test_fit_from_files() {
        let dir = tempdir().unwrap();
        let xa = dir.path().join("X.csv");
        let ya = dir.path().join("y.csv");
        let xt = dir.path().join("Xt.csv");

        let x = Array::from_shape_fn((20, 1), |(i, _)| i as f64);
        let y = x.column(0).mapv(|v| 3.0 * v);
        write_matrix_csv(&xa, &x).unwrap();
        write_target_csv(&ya, &y).unwrap();
        write_matrix_csv(&xt, &array![[30.0]]).unwrap();

        let report = fit_from_files(
            ModelKind::LeastSquares,
            &RawModelArgs::default(),
            &xa,
            &ya,
            &xt,
        )
        .unwrap();

        assert!((report.prediction[0] - 90.0).abs() < 1e-6);
    }
}
