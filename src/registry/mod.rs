//! Preset registry populated from a directory walk
//!
//! A preset directory is a tree of YAML files, each holding named model
//! invocations (model name plus raw string arguments). Loading walks
//! the tree and registers every file's entries under the file's stem,
//! so `ridge.yaml` containing `baseline:` becomes `ridge.baseline`.
//! With `flatten`, entries are merged under their bare names instead
//! and later files override earlier ones.

use crate::cli::RawModelArgs;
use crate::error::{Error, Result};
use crate::linear::ModelKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

/// One stored model invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preset {
    /// Registry name of the model to fit
    pub model: String,
    /// Raw hyperparameter strings, coerced at invocation time
    #[serde(default)]
    pub args: BTreeMap<String, String>,
}

impl Preset {
    /// Check the model name and translate the argument map into the
    /// dispatcher's raw argument struct. Unknown keys are rejected so a
    /// typo in a preset file fails loudly instead of silently falling
    /// back to a default.
    pub fn to_invocation(&self) -> Result<(ModelKind, RawModelArgs)> {
        let kind = ModelKind::from_name(&self.model)?;

        let mut raw = RawModelArgs::default();
        for (key, value) in &self.args {
            let slot = match key.as_str() {
                "alpha" => &mut raw.alpha,
                "alphas" => &mut raw.alphas,
                "l1_ratio" => &mut raw.l1_ratio,
                "fit_intercept" => &mut raw.fit_intercept,
                "max_iter" => &mut raw.max_iter,
                "tol" => &mut raw.tol,
                "power" => &mut raw.power,
                "link" => &mut raw.link,
                "folds" => &mut raw.folds,
                "seed" => &mut raw.seed,
                other => {
                    return Err(Error::InvalidArgument(format!(
                        "unknown preset argument '{other}'"
                    )))
                }
            };
            *slot = Some(value.clone());
        }

        Ok((kind, raw))
    }
}

/// Presets discovered from a directory walk.
#[derive(Debug, Default)]
pub struct PresetRegistry {
    entries: BTreeMap<String, Preset>,
}

impl PresetRegistry {
    /// Walk `dir` and register every `.yaml`/`.yml` file's presets.
    ///
    /// Files load in path order. Without `flatten`, entries are keyed
    /// `stem.name`; with it, bare names, later files winning. A
    /// duplicate key in namespaced mode is a configuration error.
    pub fn load_dir(dir: &Path, flatten: bool) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::Config(format!(
                "preset directory {} does not exist",
                dir.display()
            )));
        }

        let mut files: Vec<_> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.file_type().is_file()
                    && entry
                        .path()
                        .extension()
                        .and_then(|e| e.to_str())
                        .map(|e| matches!(e, "yaml" | "yml"))
                        .unwrap_or(false)
            })
            .map(|entry| entry.into_path())
            .collect();
        files.sort();

        let mut registry = Self::default();
        for path in files {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| Error::Config(format!("bad preset path {}", path.display())))?
                .to_string();

            let raw = std::fs::read_to_string(&path)?;
            let presets: BTreeMap<String, Preset> = serde_yaml::from_str(&raw)
                .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;

            for (name, preset) in presets {
                let key = if flatten { name } else { format!("{stem}.{name}") };
                let replaced = registry.entries.insert(key.clone(), preset).is_some();
                if replaced && !flatten {
                    return Err(Error::Config(format!("duplicate preset '{key}'")));
                }
            }
        }

        Ok(registry)
    }

    /// Look a preset up by its registered key.
    pub fn get(&self, name: &str) -> Result<&Preset> {
        self.entries.get(name).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "unknown preset '{name}', known: {}",
                self.names().join(", ")
            ))
        })
    }

    /// Every registered key, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
