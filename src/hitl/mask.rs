//! Cumulative per-pixel annotation mask
//!
//! `SaliencyMask` is the `W` tensor carried across epochs: one `h × w`
//! plane per training image, 1.0 where a human marked a rectangle as
//! driving a prediction. It only ever grows; stamping the same
//! rectangle twice is a no-op.

use crate::error::{Error, Result};
use crate::hitl::rects::Rect;
use ndarray::{Array2, Array3, Axis};

/// Per-image, per-pixel annotation weights.
#[derive(Debug, Clone)]
pub struct SaliencyMask {
    data: Array3<f32>,
}

impl SaliencyMask {
    /// All-zero mask for `n_images` images of `height × width` pixels.
    pub fn new(n_images: usize, height: usize, width: usize) -> Self {
        Self { data: Array3::zeros((n_images, height, width)) }
    }

    /// Wrap an existing tensor (e.g. loaded from a checkpoint).
    pub fn from_array(data: Array3<f32>) -> Self {
        Self { data }
    }

    pub fn n_images(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn height(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn width(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    /// Stamp a selected rectangle into one image's plane.
    ///
    /// Coordinates are clamped to the image bounds.
    pub fn apply_rect(&mut self, image: usize, rect: &Rect) -> Result<()> {
        if image >= self.n_images() {
            return Err(Error::Data(format!(
                "image index {image} out of range ({} images)",
                self.n_images()
            )));
        }

        let y2 = rect.y2.min(self.height());
        let x2 = rect.x2.min(self.width());
        if rect.y1 >= y2 || rect.x1 >= x2 {
            return Ok(());
        }

        self.data
            .slice_mut(ndarray::s![image, rect.y1..y2, rect.x1..x2])
            .fill(1.0);
        Ok(())
    }

    /// Sum of all mask weights.
    pub fn total(&self) -> f32 {
        self.data.sum()
    }

    /// Whether any pixel of one image is annotated.
    pub fn is_annotated(&self, image: usize) -> bool {
        self.data.index_axis(Axis(0), image).sum() > 0.0
    }

    /// Indices of every annotated image.
    pub fn annotated_indices(&self) -> Vec<usize> {
        (0..self.n_images()).filter(|&i| self.is_annotated(i)).collect()
    }

    /// Flattened mask rows for a batch of image indices, parallel to the
    /// batch's input rows.
    pub fn rows_for(&self, indices: &[usize]) -> Array2<f32> {
        let pixels = self.height() * self.width();
        let mut rows = Array2::zeros((indices.len(), pixels));
        for (row, &i) in indices.iter().enumerate() {
            let plane = self.data.index_axis(Axis(0), i);
            let flat = plane.iter().copied().collect::<Vec<f32>>();
            rows.row_mut(row).assign(&ndarray::Array1::from(flat));
        }
        rows
    }
}
