//! String-to-typed-value coercion for model hyperparameters
//!
//! Every hyperparameter crosses the CLI (and the preset files) as an
//! optional raw string. Each helper takes the raw value plus the
//! wrapper's documented default, returns the default when the value is
//! absent or empty, and fails with `Error::InvalidArgument` on input
//! that does not parse.

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Coerce an optional string to a bool, falling back to `default`.
///
/// Accepts `true`/`false` and `1`/`0`.
pub fn parse_bool_arg(arg: Option<&str>, default: bool) -> Result<bool> {
    match arg {
        None | Some("") => Ok(default),
        Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(other) => Err(Error::InvalidArgument(format!(
            "expected a boolean (true/false/1/0), got '{other}'"
        ))),
    }
}

/// Coerce an optional string to an integer, falling back to `default`.
pub fn parse_int_arg(arg: Option<&str>, default: u64) -> Result<u64> {
    match arg {
        None | Some("") => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| Error::InvalidArgument(format!("expected an integer, got '{raw}'"))),
    }
}

/// Coerce an optional string to a float, falling back to `default`.
pub fn parse_float_arg(arg: Option<&str>, default: f64) -> Result<f64> {
    match arg {
        None | Some("") => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::InvalidArgument(format!("expected a float, got '{raw}'"))),
    }
}

/// Coerce a comma-separated list of floats (e.g. `"0.1, 1.0, 10.0"`),
/// falling back to `default` when absent.
pub fn parse_alphas_arg(arg: Option<&str>, default: &[f64]) -> Result<Vec<f64>> {
    let raw = match arg {
        None | Some("") => return Ok(default.to_vec()),
        Some(raw) => raw,
    };

    raw.replace(' ', "")
        .split(',')
        .map(|item| {
            item.parse::<f64>().map_err(|_| {
                Error::InvalidArgument(format!("expected a comma-separated float list, got '{raw}'"))
            })
        })
        .collect()
}

/// Coerce a `"key:value,key:value"` encoded map of floats (e.g. class
/// weights `"0:1.0,1:2.5"`), falling back to `default` when absent.
pub fn parse_map_arg(
    arg: Option<&str>,
    default: &BTreeMap<String, f64>,
) -> Result<BTreeMap<String, f64>> {
    let raw = match arg {
        None | Some("") => return Ok(default.clone()),
        Some(raw) => raw,
    };

    let mut map = BTreeMap::new();
    for entry in raw.replace(' ', "").split(',') {
        let (key, value) = entry.split_once(':').ok_or_else(|| {
            Error::InvalidArgument(format!("expected key:value entries, got '{raw}'"))
        })?;
        let value = value.parse::<f64>().map_err(|_| {
            Error::InvalidArgument(format!("expected a float value in '{entry}'"))
        })?;
        map.insert(key.replace('"', ""), value);
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bool_default_when_absent() {
        assert!(parse_bool_arg(None, true).unwrap());
        assert!(!parse_bool_arg(Some(""), false).unwrap());
    }

    #[test]
    fn test_bool_values() {
        assert!(parse_bool_arg(Some("true"), false).unwrap());
        assert!(parse_bool_arg(Some("1"), false).unwrap());
        assert!(!parse_bool_arg(Some("false"), true).unwrap());
        assert!(!parse_bool_arg(Some("0"), true).unwrap());
    }

    #[test]
    fn test_bool_rejects_garbage() {
        assert!(parse_bool_arg(Some("yes"), false).is_err());
    }

    #[test]
    fn test_int_default_and_parse() {
        assert_eq!(parse_int_arg(None, 1000).unwrap(), 1000);
        assert_eq!(parse_int_arg(Some("42"), 0).unwrap(), 42);
        assert!(parse_int_arg(Some("4.2"), 0).is_err());
    }

    #[test]
    fn test_float_default_and_parse() {
        assert!((parse_float_arg(None, 1e-4).unwrap() - 1e-4).abs() < 1e-12);
        assert!((parse_float_arg(Some("0.5"), 0.0).unwrap() - 0.5).abs() < 1e-12);
        assert!(parse_float_arg(Some("abc"), 0.0).is_err());
    }

    #[test]
    fn test_alphas_list() {
        let alphas = parse_alphas_arg(Some("0.1, 1.0, 10.0"), &[]).unwrap();
        assert_eq!(alphas, vec![0.1, 1.0, 10.0]);
    }

    #[test]
    fn test_alphas_default() {
        let alphas = parse_alphas_arg(None, &[0.1, 1.0]).unwrap();
        assert_eq!(alphas, vec![0.1, 1.0]);
    }

    #[test]
    fn test_alphas_rejects_garbage() {
        assert!(parse_alphas_arg(Some("0.1,x"), &[]).is_err());
    }

    #[test]
    fn test_map_entries() {
        let map = parse_map_arg(Some("0:1.0, 1:2.5"), &BTreeMap::new()).unwrap();
        assert_eq!(map.len(), 2);
        assert!((map["0"] - 1.0).abs() < 1e-12);
        assert!((map["1"] - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_map_strips_quotes() {
        let map = parse_map_arg(Some("\"benign\":1.0"), &BTreeMap::new()).unwrap();
        assert!((map["benign"] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_map_rejects_missing_colon() {
        assert!(parse_map_arg(Some("0=1.0"), &BTreeMap::new()).is_err());
    }

    proptest! {
        #[test]
        fn prop_float_roundtrip(v in -1e6f64..1e6f64) {
            let raw = format!("{v}");
            let parsed = parse_float_arg(Some(&raw), 0.0).unwrap();
            prop_assert!((parsed - v).abs() <= v.abs() * 1e-12 + 1e-12);
        }

        #[test]
        fn prop_int_roundtrip(v in 0u64..1_000_000u64) {
            let raw = format!("{v}");
            prop_assert_eq!(parse_int_arg(Some(&raw), 0).unwrap(), v);
        }

        #[test]
        fn prop_alphas_roundtrip(vs in proptest::collection::vec(0.001f64..1000.0, 1..8)) {
            let raw = vs.iter().map(|v| format!("{v}")).collect::<Vec<_>>().join(",");
            let parsed = parse_alphas_arg(Some(&raw), &[]).unwrap();
            prop_assert_eq!(parsed.len(), vs.len());
        }
    }
}
