//! Input-gradient attribution maps for query images

use crate::error::{Error, Result};
use crate::hitl::model::SaliencyModel;
use ndarray::Array2;

/// Build a normalized attribution map from the model's input gradients.
///
/// The flat gradient vector is reshaped to `height × width` and scaled
/// by its largest absolute value so the map lands in `[-1, 1]`.
pub fn input_gradient_map(
    model: &dyn SaliencyModel,
    height: usize,
    width: usize,
) -> Result<Array2<f32>> {
    let saliency = model.input_saliency();
    if saliency.len() != height * width {
        return Err(Error::Data(format!(
            "saliency length {} does not match {height}x{width}",
            saliency.len()
        )));
    }

    let mut map = Array2::from_shape_vec((height, width), saliency.to_vec())
        .map_err(|e| Error::Data(e.to_string()))?;

    let max_abs = map.iter().map(|v| v.abs()).fold(0.0f32, f32::max);
    if max_abs > 0.0 {
        map.mapv_inplace(|v| v / max_abs);
    }

    Ok(map)
}
