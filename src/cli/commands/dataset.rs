//! Dataset command implementation

use crate::cli::logging::log;
use crate::cli::{DatasetArgs, LogLevel};
use crate::datasets::{
    diabetes, export_classification, export_regression, iris, slice_csv_pair, winequality,
    RowLimits,
};
use crate::error::Error;

pub fn run_dataset(args: DatasetArgs, level: LogLevel) -> Result<(), String> {
    let limits = RowLimits {
        lower_data: args.lower_limit_data,
        upper_data: args.upper_limit_data,
        lower_target: args.lower_limit_target,
        upper_target: args.upper_limit_target,
    };

    let result = match args.source.as_str() {
        "diabetes" => {
            let ds = diabetes();
            export_regression(
                &ds.records,
                &ds.targets,
                &args.data_path,
                args.target_path.as_deref(),
                &limits,
            )
        }
        "winequality" => {
            let ds = winequality();
            export_classification(
                &ds.records,
                &ds.targets,
                &args.data_path,
                args.target_path.as_deref(),
                &limits,
            )
        }
        "iris" => {
            let ds = iris();
            export_classification(
                &ds.records,
                &ds.targets,
                &args.data_path,
                args.target_path.as_deref(),
                &limits,
            )
        }
        "csv" => slice_csv(&args, &limits),
        other => Err(Error::InvalidArgument(format!(
            "unknown dataset '{other}', expected diabetes, winequality, iris, or csv"
        ))),
    };
    result.map_err(|e| e.to_string())?;

    log(
        level,
        LogLevel::Normal,
        &format!("Dataset '{}' written to {}", args.source, args.data_path.display()),
    );

    Ok(())
}

fn slice_csv(args: &DatasetArgs, limits: &RowLimits) -> crate::Result<()> {
    let orig_data = args
        .orig_data_path
        .as_deref()
        .ok_or_else(|| Error::InvalidArgument("csv source needs --orig-data-path".to_string()))?;
    let orig_target = args.orig_target_path.as_deref().ok_or_else(|| {
        Error::InvalidArgument("csv source needs --orig-target-path".to_string())
    })?;
    let target_out = args
        .target_path
        .as_deref()
        .ok_or_else(|| Error::InvalidArgument("csv source needs --target-path".to_string()))?;

    slice_csv_pair(orig_data, orig_target, &args.data_path, target_out, limits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::read_matrix_csv;
    use tempfile::tempdir;

    #[test]
    fn test_export_diabetes_slice() {
        let dir = tempdir().unwrap();
        let args = DatasetArgs {
            source: "diabetes".to_string(),
            data_path: dir.path().join("X.csv"),
            target_path: Some(dir.path().join("y.csv")),
            orig_data_path: None,
            orig_target_path: None,
            lower_limit_data: Some(0),
            upper_limit_data: Some(25),
            lower_limit_target: Some(0),
            upper_limit_target: Some(25),
        };

        run_dataset(args, LogLevel::Quiet).unwrap();

        let x = read_matrix_csv(&dir.path().join("X.csv")).unwrap();
        assert_eq!(x.nrows(), 25);
    }

    #[test]
    fn test_unknown_source() {
        let dir = tempdir().unwrap();
        let args = DatasetArgs {
            source: "digits".to_string(),
            data_path: dir.path().join("X.csv"),
            target_path: None,
            orig_data_path: None,
            orig_target_path: None,
            lower_limit_data: None,
            upper_limit_data: None,
            lower_limit_target: None,
            upper_limit_target: None,
        };

        let err = run_dataset(args, LogLevel::Quiet).unwrap_err();
        assert!(err.contains("unknown dataset"));
    }

    #[test]
    fn test_csv_source_requires_orig_paths() {
        let dir = tempdir().unwrap();
        let args = DatasetArgs {
            source: "csv".to_string(),
            data_path: dir.path().join("X.csv"),
            target_path: Some(dir.path().join("y.csv")),
            orig_data_path: None,
            orig_target_path: None,
            lower_limit_data: None,
            upper_limit_data: None,
            lower_limit_target: None,
            upper_limit_target: None,
        };

        assert!(run_dataset(args, LogLevel::Quiet).is_err());
    }
}
