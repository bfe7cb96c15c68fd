//! Connected-component extraction of pixel chains from a binary edge mask.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::edges::EdgeMask;

/// Traced pixel chain in mask coordinates.
pub type Contour = Vec<Point2<f32>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Connectivity {
    Four,
    Eight,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContourParams {
    /// Chains shorter than this are treated as noise and dropped.
    pub min_points: usize,
    /// Hard cap per chain; bounds tracing cost on pathological masks.
    pub max_points: usize,
    pub connectivity: Connectivity,
}

impl Default for ContourParams {
    fn default() -> Self {
        Self {
            min_points: 24,
            // The Sobel halo of a full-frame outline at the 1200 px working
            // scale runs to ~10k pixels after resampling widens the edge
            // ramp; the cap must clear that while still bounding
            // pathological masks.
            max_points: 12000,
            connectivity: Connectivity::Eight,
        }
    }
}

/// Extract pixel chains from the mask.
///
/// Pixels are scanned in raster order; each unvisited foreground pixel seeds
/// an explicit-stack flood walk over its connected neighbors. Membership and
/// point order depend only on mask content and scan order, so results are
/// reproducible for a fixed mask. The returned chains are sorted by length,
/// longest first.
pub fn trace_contours(mask: &EdgeMask, params: &ContourParams) -> Vec<Contour> {
    let w = mask.width;
    let h = mask.height;
    let mut visited = vec![false; w * h];
    let mut contours = Vec::new();
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for sy in 0..h {
        for sx in 0..w {
            if visited[sy * w + sx] || !mask.get(sx, sy) {
                continue;
            }

            let mut contour: Contour = Vec::new();
            stack.clear();
            stack.push((sx, sy));

            while let Some((x, y)) = stack.pop() {
                if contour.len() >= params.max_points {
                    break;
                }
                let idx = y * w + x;
                if visited[idx] || !mask.get(x, y) {
                    continue;
                }
                visited[idx] = true;
                contour.push(Point2::new(x as f32, y as f32));

                push_neighbors(&mut stack, x, y, w, h, params.connectivity);
            }

            if contour.len() >= params.min_points {
                contours.push(contour);
            }
        }
    }

    contours.sort_by(|a, b| b.len().cmp(&a.len()));
    contours
}

fn push_neighbors(
    stack: &mut Vec<(usize, usize)>,
    x: usize,
    y: usize,
    w: usize,
    h: usize,
    connectivity: Connectivity,
) {
    let mut push = |nx: i64, ny: i64| {
        if nx >= 0 && ny >= 0 && (nx as usize) < w && (ny as usize) < h {
            stack.push((nx as usize, ny as usize));
        }
    };
    let x = x as i64;
    let y = y as i64;
    match connectivity {
        Connectivity::Four => {
            push(x + 1, y);
            push(x - 1, y);
            push(x, y + 1);
            push(x, y - 1);
        }
        Connectivity::Eight => {
            for dy in -1..=1i64 {
                for dx in -1..=1i64 {
                    if dx != 0 || dy != 0 {
                        push(x + dx, y + dy);
                    }
                }
            }
        }
    }
}

/// Perimeter of a closed chain (last point connects back to the first).
pub fn perimeter(contour: &Contour) -> f32 {
    if contour.len() < 2 {
        return 0.0;
    }
    let mut acc = 0.0f32;
    for i in 0..contour.len() {
        let j = (i + 1) % contour.len();
        acc += (contour[i] - contour[j]).norm();
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edges::{detect_edges, ThresholdPolicy};
    use docscan_core::GrayImage;

    fn rect_outline_mask(w: usize, h: usize, x0: usize, y0: usize, x1: usize, y1: usize) -> EdgeMask {
        // Draw the rectangle as a bright outline on black, then binarize via
        // a fixed Sobel threshold; keeps the test on the public surface.
        let mut img = GrayImage {
            width: w,
            height: h,
            data: vec![0u8; w * h],
        };
        for x in x0..=x1 {
            img.data[y0 * w + x] = 255;
            img.data[y1 * w + x] = 255;
        }
        for y in y0..=y1 {
            img.data[y * w + x0] = 255;
            img.data[y * w + x1] = 255;
        }
        detect_edges(&img.view(), &ThresholdPolicy::Fixed(100))
    }

    #[test]
    fn rectangle_outline_traces_as_one_contour() {
        let mask = rect_outline_mask(60, 60, 10, 10, 49, 49);
        let contours = trace_contours(&mask, &ContourParams::default());
        assert_eq!(contours.len(), 1);
        assert!(contours[0].len() >= 100);
    }

    #[test]
    fn short_chains_are_discarded() {
        let mask = rect_outline_mask(60, 60, 28, 28, 31, 31);
        let params = ContourParams {
            min_points: 80,
            ..ContourParams::default()
        };
        assert!(trace_contours(&mask, &params).is_empty());
    }

    #[test]
    fn chain_length_is_capped() {
        let mask = rect_outline_mask(120, 120, 5, 5, 114, 114);
        let params = ContourParams {
            max_points: 50,
            min_points: 10,
            ..ContourParams::default()
        };
        let contours = trace_contours(&mask, &params);
        assert!(contours.iter().all(|c| c.len() <= 50));
    }

    #[test]
    fn tracing_is_deterministic() {
        let mask = rect_outline_mask(80, 80, 12, 15, 70, 66);
        let a = trace_contours(&mask, &ContourParams::default());
        let b = trace_contours(&mask, &ContourParams::default());
        assert_eq!(a, b);
    }

    #[test]
    fn four_connectivity_splits_diagonal_touching_chains() {
        // Two single-pixel-wide diagonal strokes touching only at corners
        // stay separate under 4-connectivity but merge under 8-connectivity.
        let mut img = GrayImage {
            width: 40,
            height: 40,
            data: vec![0u8; 1600],
        };
        for i in 0..15 {
            img.data[(5 + i) * 40 + (5 + i)] = 255;
        }
        let mask = detect_edges(&img.view(), &ThresholdPolicy::Fixed(60));
        let eight = trace_contours(
            &mask,
            &ContourParams {
                min_points: 4,
                connectivity: Connectivity::Eight,
                ..ContourParams::default()
            },
        );
        let four = trace_contours(
            &mask,
            &ContourParams {
                min_points: 4,
                connectivity: Connectivity::Four,
                ..ContourParams::default()
            },
        );
        assert!(!eight.is_empty());
        // The diagonal's Sobel halo is connected either way, but 4-connected
        // tracing can only produce at least as many, never fewer, chains.
        assert!(four.len() >= eight.len());
    }
}
