//! Corner-response candidate generation: a Harris-like det/trace score over
//! local gradient moments, sampled on a coarse grid.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::StrategyError;
use docscan_core::{GrayImageView, Quad};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CornerScanParams {
    /// Sample the response every `stride` pixels in both directions.
    pub stride: usize,
    /// Minimum det(M)/trace(M) response to accept a sample as a corner.
    pub response_threshold: f32,
}

impl Default for CornerScanParams {
    fn default() -> Self {
        Self {
            stride: 3,
            response_threshold: 1000.0,
        }
    }
}

/// det(M)/trace(M) of the second-moment matrix accumulated from central
/// differences in the 3x3 window around `(x, y)`.
fn corner_response(src: &GrayImageView<'_>, x: usize, y: usize) -> f32 {
    let w = src.width;
    let px = |x: usize, y: usize| -> f32 { src.data[y * w + x] as f32 };

    let mut ixx = 0.0f32;
    let mut iyy = 0.0f32;
    let mut ixy = 0.0f32;

    for wy in y - 1..=y + 1 {
        for wx in x - 1..=x + 1 {
            let ix = px(wx + 1, wy) - px(wx - 1, wy);
            let iy = px(wx, wy + 1) - px(wx, wy - 1);
            ixx += ix * ix;
            iyy += iy * iy;
            ixy += ix * iy;
        }
    }

    let det = ixx * iyy - ixy * ixy;
    let trace = ixx + iyy;
    if trace > 0.0 {
        det / trace
    } else {
        0.0
    }
}

/// Sparse corner candidates above the response threshold.
pub fn detect_corners(src: &GrayImageView<'_>, params: &CornerScanParams) -> Vec<Point2<f32>> {
    let w = src.width;
    let h = src.height;
    if w < 5 || h < 5 {
        return Vec::new();
    }

    let stride = params.stride.max(1);
    let mut out = Vec::new();
    // The 3x3 window plus its central differences reach 2 pixels out.
    let mut y = 2;
    while y < h - 2 {
        let mut x = 2;
        while x < w - 2 {
            if corner_response(src, x, y) > params.response_threshold {
                out.push(Point2::new(x as f32, y as f32));
            }
            x += stride;
        }
        y += stride;
    }
    out
}

/// Reduce a candidate cloud to four corners with guaranteed angular spread:
/// sort by polar angle around the centroid and take the quartile positions.
pub fn quad_by_angular_spread(candidates: &[Point2<f32>]) -> Option<Quad> {
    if candidates.len() < 4 {
        return None;
    }

    let n = candidates.len() as f32;
    let cx = candidates.iter().map(|p| p.x).sum::<f32>() / n;
    let cy = candidates.iter().map(|p| p.y).sum::<f32>() / n;

    let mut sorted = candidates.to_vec();
    sorted.sort_by(|a, b| {
        let ka = (a.y - cy).atan2(a.x - cx);
        let kb = (b.y - cy).atan2(b.x - cx);
        ka.partial_cmp(&kb)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let step = sorted.len() / 4;
    Some(Quad([
        sorted[0],
        sorted[step],
        sorted[2 * step],
        sorted[3 * step],
    ]))
}

/// Full corner strategy: response sampling plus angular-spread selection.
pub(crate) fn corner_quad(
    src: &GrayImageView<'_>,
    params: &CornerScanParams,
) -> Result<Quad, StrategyError> {
    let candidates = detect_corners(src, params);
    quad_by_angular_spread(&candidates).ok_or(StrategyError::TooFewCorners {
        found: candidates.len(),
    })
}
