//! File-per-array epoch persistence
//!
//! An epoch directory holds every piece of loop state under its own
//! file: JSON for histories and scalars, SafeTensors for the mask and
//! the model weights, candidate-rectangle CSVs per query, and a small
//! metadata file. Loaders mirror savers one to one. The layout is
//! deliberately flat and unversioned; the loop re-reads exactly what it
//! wrote.

use crate::error::{Error, Result};
use crate::hitl::mask::SaliencyMask;
use crate::hitl::model::NamedTensor;
use ndarray::Array3;
use safetensors::tensor::{Dtype, TensorView};
use safetensors::SafeTensors;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Loop state saved into (and restored from) an epoch directory.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochState {
    /// Vanilla train loss per epoch (filled up to the paused epoch)
    pub train_losses: Vec<f32>,
    /// Validation loss per epoch
    pub val_losses: Vec<f32>,
    /// Train (accuracy, recall, precision, f1) per epoch
    pub train_metrics: Vec<[f32; 4]>,
    /// Validation (accuracy, recall, precision, f1) per epoch
    pub val_metrics: Vec<[f32; 4]>,
    pub min_train_loss: f32,
    pub min_val_loss: f32,
    /// Dataset indices of the epoch's informative predictions
    pub image_indexes: Vec<usize>,
    /// The paused epoch's train loss (not yet folded into the arrays)
    pub epoch_train_loss: f32,
    /// The paused epoch's train scores
    pub epoch_train_scores: [f32; 4],
}

fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    std::fs::write(dir.join(name), json)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<T> {
    let raw = std::fs::read_to_string(dir.join(name))?;
    Ok(serde_json::from_str(&raw)?)
}

/// The running minima start at infinity, which JSON cannot carry, so
/// they persist as `null` until a finite value exists.
fn finite_or_none(value: f32) -> Option<f32> {
    value.is_finite().then_some(value)
}

/// Save the loop state, one file per array.
pub fn save_epoch_state(dir: &Path, epoch: usize, state: &EpochState) -> Result<()> {
    std::fs::create_dir_all(dir)?;

    write_json(dir, "train_losses.json", &state.train_losses)?;
    write_json(dir, "val_losses.json", &state.val_losses)?;
    write_json(dir, "train_metrics.json", &state.train_metrics)?;
    write_json(dir, "val_metrics.json", &state.val_metrics)?;
    write_json(dir, "min_train_loss.json", &finite_or_none(state.min_train_loss))?;
    write_json(dir, "min_val_loss.json", &finite_or_none(state.min_val_loss))?;
    write_json(dir, "image_indexes.json", &state.image_indexes)?;
    write_json(dir, "vanilla_train_loss.json", &state.epoch_train_loss)?;
    write_json(dir, "train_scores.json", &state.epoch_train_scores)?;

    let metadata = serde_json::json!({
        "epoch": epoch,
        "created": chrono::Utc::now().to_rfc3339(),
    });
    write_json(dir, "metadata.json", &metadata)?;

    Ok(())
}

/// Load the loop state saved by [`save_epoch_state`].
pub fn load_epoch_state(dir: &Path) -> Result<EpochState> {
    let min_train: Option<f32> = read_json(dir, "min_train_loss.json")?;
    let min_val: Option<f32> = read_json(dir, "min_val_loss.json")?;

    Ok(EpochState {
        train_losses: read_json(dir, "train_losses.json")?,
        val_losses: read_json(dir, "val_losses.json")?,
        train_metrics: read_json(dir, "train_metrics.json")?,
        val_metrics: read_json(dir, "val_metrics.json")?,
        min_train_loss: min_train.unwrap_or(f32::INFINITY),
        min_val_loss: min_val.unwrap_or(f32::INFINITY),
        image_indexes: read_json(dir, "image_indexes.json")?,
        epoch_train_loss: read_json(dir, "vanilla_train_loss.json")?,
        epoch_train_scores: read_json(dir, "train_scores.json")?,
    })
}

/// Write named f32 tensors as a SafeTensors file.
pub fn write_tensors(
    path: &Path,
    tensors: &[NamedTensor],
    metadata: Option<HashMap<String, String>>,
) -> Result<()> {
    let views: Vec<(&str, TensorView<'_>)> = tensors
        .iter()
        .map(|(name, shape, data)| {
            let view = TensorView::new(Dtype::F32, shape.clone(), bytemuck::cast_slice(data))
                .map_err(|e| Error::Serialization(format!("tensor '{name}': {e:?}")))?;
            Ok((name.as_str(), view))
        })
        .collect::<Result<Vec<_>>>()?;

    let bytes = safetensors::serialize(views, &metadata)
        .map_err(|e| Error::Serialization(e.to_string()))?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Read every f32 tensor from a SafeTensors file.
pub fn read_tensors(path: &Path) -> Result<Vec<NamedTensor>> {
    let bytes = std::fs::read(path)?;
    let st = SafeTensors::deserialize(&bytes)
        .map_err(|e| Error::Serialization(e.to_string()))?;

    let mut out = Vec::new();
    for (name, view) in st.tensors() {
        if view.dtype() != Dtype::F32 {
            return Err(Error::Serialization(format!(
                "tensor '{name}' in {} is not f32",
                path.display()
            )));
        }
        // Decode bytewise: the raw buffer carries no alignment
        // guarantee for f32 reinterpretation.
        let data: Vec<f32> = view
            .data()
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        out.push((name.to_string(), view.shape().to_vec(), data));
    }
    Ok(out)
}

/// Save the annotation mask as a single `mask` tensor.
pub fn save_mask(path: &Path, mask: &SaliencyMask) -> Result<()> {
    let shape = vec![mask.n_images(), mask.height(), mask.width()];
    let data: Vec<f32> = mask.data().iter().copied().collect();
    write_tensors(path, &[("mask".to_string(), shape, data)], None)
}

/// Load a mask saved by [`save_mask`].
pub fn load_mask(path: &Path) -> Result<SaliencyMask> {
    let tensors = read_tensors(path)?;
    let (_, shape, data) = tensors
        .into_iter()
        .find(|(name, _, _)| name == "mask")
        .ok_or_else(|| Error::Serialization(format!("no mask tensor in {}", path.display())))?;

    if shape.len() != 3 {
        return Err(Error::Serialization(format!(
            "mask tensor must be 3-dimensional, got {shape:?}"
        )));
    }
    let array = Array3::from_shape_vec((shape[0], shape[1], shape[2]), data)
        .map_err(|e| Error::Serialization(e.to_string()))?;
    Ok(SaliencyMask::from_array(array))
}
