//! Line-based candidate generation: high-edge-density scan rows/columns are
//! fitted as segments and their pairwise intersections become corner
//! candidates.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::edges::EdgeMask;
use crate::error::StrategyError;
use docscan_core::Quad;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineScanParams {
    /// Scan every `stride`-th row/column.
    pub stride: usize,
    /// A scan line qualifies when at least this fraction of its pixels are
    /// edge pixels.
    pub min_density: f32,
    /// Intersections of line pairs with |det| below this are treated as
    /// parallel and discarded.
    pub parallel_eps: f32,
}

impl Default for LineScanParams {
    fn default() -> Self {
        Self {
            stride: 5,
            min_density: 0.25,
            parallel_eps: 1e-3,
        }
    }
}

/// A fitted line segment in image coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub a: Point2<f32>,
    pub b: Point2<f32>,
}

impl Segment {
    /// Intersection of the infinite lines through both segments, via the
    /// 2x2 determinant solution. `None` for near-parallel pairs.
    pub fn intersection(&self, other: &Segment, parallel_eps: f32) -> Option<Point2<f32>> {
        let (x1, y1, x2, y2) = (self.a.x, self.a.y, self.b.x, self.b.y);
        let (x3, y3, x4, y4) = (other.a.x, other.a.y, other.b.x, other.b.y);

        let det = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
        if det.abs() < parallel_eps {
            return None;
        }

        let t = ((x1 - x3) * (y3 - y4) - (y1 - y3) * (x3 - x4)) / det;
        Some(Point2::new(x1 + t * (x2 - x1), y1 + t * (y2 - y1)))
    }
}

/// Qualifying horizontal and vertical segments from the mask.
pub fn scan_segments(mask: &EdgeMask, params: &LineScanParams) -> (Vec<Segment>, Vec<Segment>) {
    let w = mask.width;
    let h = mask.height;
    let stride = params.stride.max(1);

    let mut rows = Vec::new();
    for y in (0..h).step_by(stride) {
        let mut count = 0usize;
        let mut first = None;
        let mut last = 0usize;
        for x in 0..w {
            if mask.get(x, y) {
                count += 1;
                first.get_or_insert(x);
                last = x;
            }
        }
        if let Some(first) = first {
            if count as f32 > w as f32 * params.min_density {
                rows.push(Segment {
                    a: Point2::new(first as f32, y as f32),
                    b: Point2::new(last as f32, y as f32),
                });
            }
        }
    }

    let mut cols = Vec::new();
    for x in (0..w).step_by(stride) {
        let mut count = 0usize;
        let mut first = None;
        let mut last = 0usize;
        for y in 0..h {
            if mask.get(x, y) {
                count += 1;
                first.get_or_insert(y);
                last = y;
            }
        }
        if let Some(first) = first {
            if count as f32 > h as f32 * params.min_density {
                cols.push(Segment {
                    a: Point2::new(x as f32, first as f32),
                    b: Point2::new(x as f32, last as f32),
                });
            }
        }
    }

    (rows, cols)
}

/// Full line strategy: qualifying rows x columns, pairwise intersections
/// inside the image, then the four extremal corners by min/max of x±y.
pub(crate) fn line_quad(mask: &EdgeMask, params: &LineScanParams) -> Result<Quad, StrategyError> {
    let (rows, cols) = scan_segments(mask, params);
    if rows.len() < 2 || cols.len() < 2 {
        return Err(StrategyError::TooFewLines {
            rows: rows.len(),
            cols: cols.len(),
        });
    }

    let w = mask.width as f32;
    let h = mask.height as f32;
    let mut intersections: Vec<Point2<f32>> = Vec::new();
    for row in &rows {
        for col in &cols {
            if let Some(p) = row.intersection(col, params.parallel_eps) {
                if p.x >= 0.0 && p.x <= w && p.y >= 0.0 && p.y <= h {
                    intersections.push(p);
                }
            }
        }
    }

    if intersections.len() < 4 {
        return Err(StrategyError::TooFewLines {
            rows: rows.len(),
            cols: cols.len(),
        });
    }

    let pick = |key: fn(&Point2<f32>) -> f32, max: bool| -> Point2<f32> {
        let mut best = intersections[0];
        for p in &intersections[1..] {
            let better = if max {
                key(p) > key(&best)
            } else {
                key(p) < key(&best)
            };
            if better {
                best = *p;
            }
        }
        best
    };

    Ok(Quad([
        pick(|p| p.x + p.y, false),
        pick(|p| p.y - p.x, false),
        pick(|p| p.x + p.y, true),
        pick(|p| p.y - p.x, true),
    ]))
}
