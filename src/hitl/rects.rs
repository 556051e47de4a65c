//! Rectangle geometry and saliency-patch ranking
//!
//! Rectangles are pixel-space regions `(x1, y1)..(x2, y2)` used to
//! carry human annotations back into the training mask.

use crate::error::{Error, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An axis-aligned pixel rectangle; `x2`/`y2` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x1: usize,
    pub y1: usize,
    pub x2: usize,
    pub y2: usize,
}

impl Rect {
    pub fn width(&self) -> usize {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> usize {
        self.y2.saturating_sub(self.y1)
    }
}

/// Whether a (continuous) point falls inside a rectangle.
pub fn point_inside_rect(pt: (f64, f64), rect: &Rect) -> bool {
    rect.x1 as f64 <= pt.0 && pt.0 <= rect.x2 as f64 && rect.y1 as f64 <= pt.1 && pt.1 <= rect.y2 as f64
}

/// Match raw coordinate rows (as read back from a selection file)
/// against the candidate rectangles, returning the candidates' indices.
/// Rows that match no candidate are ignored.
pub fn match_selected_rects(selected: &[[i64; 4]], candidates: &[Rect]) -> Vec<usize> {
    let mut indexes = Vec::new();
    for (i, rect) in candidates.iter().enumerate() {
        let coords = [rect.x1 as i64, rect.y1 as i64, rect.x2 as i64, rect.y2 as i64];
        if selected.iter().any(|row| *row == coords) {
            indexes.push(i);
        }
    }
    indexes
}

/// Ranks saliency-map patches for annotation.
///
/// The map is pooled into `size`-sized windows placed every `stride`
/// pixels; windows are ordered by mean absolute saliency, most
/// influential first, and the top `nr_rects` become candidate
/// rectangles.
#[derive(Debug, Clone, Copy)]
pub struct PatchRanking {
    pub size: usize,
    pub stride: usize,
    pub nr_rects: usize,
}

impl PatchRanking {
    pub fn ranked_rects(&self, map: &Array2<f32>) -> Result<Vec<Rect>> {
        let (h, w) = map.dim();
        if self.size == 0 || self.stride == 0 {
            return Err(Error::InvalidArgument(
                "patch size and stride must be positive".to_string(),
            ));
        }
        if self.size > h || self.size > w {
            return Err(Error::InvalidArgument(format!(
                "patch size {} exceeds map shape {h}x{w}",
                self.size
            )));
        }

        let mut scored: Vec<(f32, Rect)> = Vec::new();
        let mut y = 0;
        while y + self.size <= h {
            let mut x = 0;
            while x + self.size <= w {
                let window = map.slice(ndarray::s![y..y + self.size, x..x + self.size]);
                let score = window.iter().map(|v| v.abs()).sum::<f32>()
                    / (self.size * self.size) as f32;
                scored.push((
                    score,
                    Rect { x1: x, y1: y, x2: x + self.size, y2: y + self.size },
                ));
                x += self.stride;
            }
            y += self.stride;
        }

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored.into_iter().take(self.nr_rects).map(|(_, r)| r).collect())
    }
}

/// Write candidate rectangles as integer CSV rows (`x1,y1,x2,y2`).
pub fn write_rects_csv(path: &Path, rects: &[Rect]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    for rect in rects {
        writer.write_record([
            rect.x1.to_string(),
            rect.y1.to_string(),
            rect.x2.to_string(),
            rect.y2.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Read rectangles back from a CSV written by [`write_rects_csv`].
pub fn read_rects_csv(path: &Path) -> Result<Vec<Rect>> {
    read_rect_rows(path)?
        .into_iter()
        .map(|[x1, y1, x2, y2]| {
            if x1 < 0 || y1 < 0 || x2 < x1 || y2 < y1 {
                return Err(Error::Data(format!(
                    "bad rectangle ({x1},{y1},{x2},{y2}) in {}",
                    path.display()
                )));
            }
            Ok(Rect { x1: x1 as usize, y1: y1 as usize, x2: x2 as usize, y2: y2 as usize })
        })
        .collect()
}

/// Read integer rectangle rows back from a CSV.
pub fn read_rect_rows(path: &Path) -> Result<Vec<[i64; 4]>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(false).from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() != 4 {
            return Err(Error::Data(format!(
                "expected x1,y1,x2,y2 rows in {}",
                path.display()
            )));
        }
        let mut row = [0i64; 4];
        for (slot, cell) in row.iter_mut().zip(record.iter()) {
            *slot = cell.trim().parse::<i64>().map_err(|_| {
                Error::Data(format!("non-integer coordinate '{cell}' in {}", path.display()))
            })?;
        }
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use tempfile::tempdir;

    #[test]
    fn test_point_inside() {
        let rect = Rect { x1: 2, y1: 2, x2: 6, y2: 4 };
        assert!(point_inside_rect((2.0, 2.0), &rect));
        assert!(point_inside_rect((5.5, 3.9), &rect));
        assert!(!point_inside_rect((6.5, 3.0), &rect));
        assert!(!point_inside_rect((3.0, 4.5), &rect));
    }

    #[test]
    fn test_match_selected() {
        let candidates = vec![
            Rect { x1: 0, y1: 0, x2: 4, y2: 4 },
            Rect { x1: 4, y1: 0, x2: 8, y2: 4 },
            Rect { x1: 0, y1: 4, x2: 4, y2: 8 },
        ];
        let selected = vec![[4, 0, 8, 4], [0, 4, 4, 8], [9, 9, 10, 10]];

        assert_eq!(match_selected_rects(&selected, &candidates), vec![1, 2]);
    }

    #[test]
    fn test_ranking_picks_hot_patch_first() {
        let mut map = Array2::<f32>::zeros((8, 8));
        // One strongly negative patch: magnitude decides, not sign.
        map.slice_mut(ndarray::s![4..8, 4..8]).fill(-1.0);
        map.slice_mut(ndarray::s![0..4, 0..4]).fill(0.2);

        let ranking = PatchRanking { size: 4, stride: 4, nr_rects: 2 };
        let rects = ranking.ranked_rects(&map).unwrap();

        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0], Rect { x1: 4, y1: 4, x2: 8, y2: 8 });
        assert_eq!(rects[1], Rect { x1: 0, y1: 0, x2: 4, y2: 4 });
    }

    #[test]
    fn test_ranking_tiles_within_bounds() {
        let map = Array2::<f32>::ones((10, 10));
        let ranking = PatchRanking { size: 4, stride: 3, nr_rects: 100 };
        let rects = ranking.ranked_rects(&map).unwrap();

        assert!(!rects.is_empty());
        assert!(rects.iter().all(|r| r.x2 <= 10 && r.y2 <= 10));
    }

    #[test]
    fn test_ranking_rejects_oversized_patch() {
        let map = Array2::<f32>::zeros((8, 8));
        let ranking = PatchRanking { size: 16, stride: 16, nr_rects: 1 };
        assert!(ranking.ranked_rects(&map).is_err());
    }

    #[test]
    fn test_rect_csv_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rects.csv");
        let rects = vec![
            Rect { x1: 0, y1: 0, x2: 28, y2: 28 },
            Rect { x1: 28, y1: 56, x2: 56, y2: 84 },
        ];

        write_rects_csv(&path, &rects).unwrap();
        let rows = read_rect_rows(&path).unwrap();

        assert_eq!(rows, vec![[0, 0, 28, 28], [28, 56, 56, 84]]);
        assert_eq!(match_selected_rects(&rows, &rects), vec![0, 1]);
    }
}
