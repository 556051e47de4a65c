//! Oracle feedback sources
//!
//! The trainer hands each query (image, prediction, candidate
//! rectangles, attribution map) to an [`Oracle`] and gets back the
//! indices of the rectangles the annotator marked. The interactive
//! widget lives outside this crate; here an oracle is either the
//! selection files an annotator wrote next to the checkpoint, or a
//! scripted stand-in for tests.

use crate::error::Result;
use crate::hitl::rects::{match_selected_rects, read_rect_rows, Rect};
use ndarray::Array2;
use std::collections::HashMap;
use std::path::PathBuf;

/// One prediction offered for annotation.
#[derive(Debug, Clone)]
pub struct OracleQuery {
    pub epoch: usize,
    pub query_nr: usize,
    /// Index of the image in the training dataset
    pub dataset_index: usize,
    pub label: usize,
    pub pred: usize,
    pub entropy: f32,
    /// Candidate rectangles, rank order
    pub rects: Vec<Rect>,
    /// Normalized attribution map shown to the annotator
    pub attribution: Array2<f32>,
}

/// A source of rectangle selections.
pub trait Oracle {
    /// Selected candidate-rectangle indices for a query, or `None` when
    /// no feedback is available yet.
    fn review(&mut self, query: &OracleQuery) -> Result<Option<Vec<usize>>>;
}

/// Reads selections an annotator saved as
/// `<epochs_dir>/<epoch>/query_{n}_rects_selected.csv`.
///
/// A missing selection file means the annotator skipped (or has not
/// reached) that query; it is silently treated as no feedback.
pub struct FileOracle {
    epochs_dir: PathBuf,
}

impl FileOracle {
    pub fn new(epochs_dir: impl Into<PathBuf>) -> Self {
        Self { epochs_dir: epochs_dir.into() }
    }
}

impl Oracle for FileOracle {
    fn review(&mut self, query: &OracleQuery) -> Result<Option<Vec<usize>>> {
        let path = self
            .epochs_dir
            .join(query.epoch.to_string())
            .join(format!("query_{}_rects_selected.csv", query.query_nr));
        if !path.exists() {
            return Ok(None);
        }

        let rows = read_rect_rows(&path)?;
        Ok(Some(match_selected_rects(&rows, &query.rects)))
    }
}

/// Scripted selections keyed by query number; used in tests.
#[derive(Default)]
pub struct StaticOracle {
    selections: HashMap<usize, Vec<usize>>,
}

impl StaticOracle {
    pub fn new(selections: HashMap<usize, Vec<usize>>) -> Self {
        Self { selections }
    }
}

impl Oracle for StaticOracle {
    fn review(&mut self, query: &OracleQuery) -> Result<Option<Vec<usize>>> {
        Ok(self.selections.get(&query.query_nr).cloned())
    }
}
