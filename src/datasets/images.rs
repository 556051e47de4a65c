//! Image-folder dataset for the annotation training loop
//!
//! A dataset is a directory of PNG/JPEG files plus a headerless labels
//! CSV (`filename,label`). Images are decoded to grayscale f32 in
//! [0, 1], resized to a fixed shape, and flattened row-major. Fold
//! membership comes from a seeded shuffle so train and test stay
//! disjoint and stable across runs.

use crate::error::{Error, Result};
use image::imageops::FilterType;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::Path;

/// Which side of the 75/25 split to load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fold {
    Train,
    Test,
}

/// Fraction of the shuffled file list assigned to the training fold.
const TRAIN_FRACTION: f64 = 0.75;

/// An image classification dataset held in memory.
#[derive(Debug, Clone)]
pub struct ImageFolderDataset {
    /// Flattened grayscale pixels, one row per image
    pub images: Array2<f32>,
    /// Class label per image
    pub labels: Vec<usize>,
    /// Source file names, parallel to `images`
    pub files: Vec<String>,
    /// Image height in pixels
    pub height: usize,
    /// Image width in pixels
    pub width: usize,
}

impl ImageFolderDataset {
    /// Load one fold of an image folder.
    ///
    /// `fraction` keeps only a prefix of the fold (1.0 = everything),
    /// matching how partial-data runs are configured upstream.
    pub fn load(
        images_dir: &Path,
        labels_csv: &Path,
        fold: Fold,
        fraction: f64,
        height: usize,
        width: usize,
        seed: u64,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(Error::Config(format!(
                "fraction must be in [0, 1], got {fraction}"
            )));
        }

        let mut entries = read_labels(labels_csv)?;
        if entries.is_empty() {
            return Err(Error::Data(format!("no labels in {}", labels_csv.display())));
        }
        // Stable base order before the seeded shuffle
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut indices: Vec<usize> = (0..entries.len()).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let split = ((entries.len() as f64) * TRAIN_FRACTION).round() as usize;
        let fold_indices: Vec<usize> = match fold {
            Fold::Train => indices[..split].to_vec(),
            Fold::Test => indices[split..].to_vec(),
        };

        let keep = ((fold_indices.len() as f64) * fraction).round() as usize;
        let fold_indices = &fold_indices[..keep.min(fold_indices.len())];

        let mut pixels = Vec::with_capacity(fold_indices.len() * height * width);
        let mut labels = Vec::with_capacity(fold_indices.len());
        let mut files = Vec::with_capacity(fold_indices.len());

        for &i in fold_indices {
            let (file, label) = &entries[i];
            let img = image::open(images_dir.join(file))?;
            let gray = img
                .resize_exact(width as u32, height as u32, FilterType::Triangle)
                .to_luma32f();
            pixels.extend_from_slice(gray.as_raw());
            labels.push(*label);
            files.push(file.clone());
        }

        let images = Array2::from_shape_vec((labels.len(), height * width), pixels)
            .map_err(|e| Error::Data(e.to_string()))?;

        Ok(Self { images, labels, files, height, width })
    }

    /// Number of images in this fold.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the fold is empty.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Pixels per image.
    pub fn num_pixels(&self) -> usize {
        self.height * self.width
    }
}

fn read_labels(labels_csv: &Path) -> Result<Vec<(String, usize)>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(false).from_path(labels_csv)?;

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() != 2 {
            return Err(Error::Data(format!(
                "expected filename,label rows in {}",
                labels_csv.display()
            )));
        }
        let label = record[1].trim().parse::<usize>().map_err(|_| {
            Error::Data(format!("non-integer label '{}' for '{}'", &record[1], &record[0]))
        })?;
        entries.push((record[0].trim().to_string(), label));
    }

    Ok(entries)
}

/// Resize every PNG/JPEG in `src` to a new height, preserving aspect
/// ratio, and write the results under the same names in `dst`.
/// Returns the number of images written.
pub fn resize_images(src: &Path, dst: &Path, new_height: u32) -> Result<usize> {
    std::fs::create_dir_all(dst)?;

    let mut count = 0;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
            .unwrap_or(false);
        if !is_image {
            continue;
        }

        let img = image::open(&path)?;
        let ratio = f64::from(img.width()) / f64::from(img.height());
        let new_width = (f64::from(new_height) * ratio).ceil() as u32;
        let resized = img.resize_exact(new_width.max(1), new_height, FilterType::Lanczos3);

        let name = path
            .file_name()
            .ok_or_else(|| Error::Data(format!("bad image path {}", path.display())))?;
        resized.save(dst.join(name))?;
        count += 1;
    }

    Ok(count)
}
