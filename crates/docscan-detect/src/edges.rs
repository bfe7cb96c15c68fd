//! Sobel gradient extraction with fixed or locally adaptive binarization.

use docscan_core::GrayImageView;
use serde::{Deserialize, Serialize};

/// Binary foreground mask produced by edge extraction.
#[derive(Clone, Debug)]
pub struct EdgeMask {
    pub width: usize,
    pub height: usize,
    data: Vec<bool>,
}

impl EdgeMask {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x]
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}

/// Per-pixel binarization cutoff for the Sobel magnitude.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ThresholdPolicy {
    /// Single global cutoff.
    Fixed(u16),
    /// `max(floor, localMean - offset)` over a `(2*radius+1)^2` window of
    /// gray values, boundary-clipped. The floor keeps near-uniform
    /// low-contrast regions from turning into all-edge masks.
    Adaptive { radius: usize, offset: i32, floor: u16 },
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        ThresholdPolicy::Adaptive {
            radius: 5,
            offset: 20,
            floor: 30,
        }
    }
}

/// Summed-area table over gray values; `mean` is exact for any
/// boundary-clipped window.
struct IntegralImage {
    width: usize,
    // (width+1) x (height+1), first row/column zero
    sums: Vec<u64>,
}

impl IntegralImage {
    fn new(src: &GrayImageView<'_>) -> Self {
        let w = src.width;
        let h = src.height;
        let stride = w + 1;
        let mut sums = vec![0u64; stride * (h + 1)];
        for y in 0..h {
            let mut row_acc = 0u64;
            for x in 0..w {
                row_acc += src.data[y * w + x] as u64;
                sums[(y + 1) * stride + (x + 1)] = sums[y * stride + (x + 1)] + row_acc;
            }
        }
        Self { width: w, sums }
    }

    fn mean(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> u32 {
        // Inclusive window [x0..=x1] x [y0..=y1].
        let stride = self.width + 1;
        let a = self.sums[y0 * stride + x0];
        let b = self.sums[y0 * stride + (x1 + 1)];
        let c = self.sums[(y1 + 1) * stride + x0];
        let d = self.sums[(y1 + 1) * stride + (x1 + 1)];
        let total = d + a - b - c;
        let count = ((x1 - x0 + 1) * (y1 - y0 + 1)) as u64;
        (total / count) as u32
    }
}

fn sobel_mask(src: &GrayImageView<'_>, mut threshold_at: impl FnMut(usize, usize) -> u32) -> EdgeMask {
    let w = src.width;
    let h = src.height;
    let mut data = vec![false; w * h];

    if w < 3 || h < 3 {
        return EdgeMask {
            width: w,
            height: h,
            data,
        };
    }

    let px = |x: usize, y: usize| -> i32 { src.data[y * w + x] as i32 };

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let gx = -px(x - 1, y - 1) + px(x + 1, y - 1) - 2 * px(x - 1, y) + 2 * px(x + 1, y)
                - px(x - 1, y + 1)
                + px(x + 1, y + 1);
            let gy = -px(x - 1, y - 1) - 2 * px(x, y - 1) - px(x + 1, y - 1)
                + px(x - 1, y + 1)
                + 2 * px(x, y + 1)
                + px(x + 1, y + 1);

            let magnitude = ((gx * gx + gy * gy) as f32).sqrt() as u32;
            data[y * w + x] = magnitude > threshold_at(x, y);
        }
    }

    EdgeMask {
        width: w,
        height: h,
        data,
    }
}

/// Sobel gradient magnitude thresholded into a binary mask.
///
/// Gradients are computed on interior pixels only; the 1-pixel border is
/// always background.
pub fn detect_edges(src: &GrayImageView<'_>, policy: &ThresholdPolicy) -> EdgeMask {
    match *policy {
        ThresholdPolicy::Fixed(t) => sobel_mask(src, |_, _| t as u32),
        ThresholdPolicy::Adaptive {
            radius,
            offset,
            floor,
        } => {
            let integral = IntegralImage::new(src);
            let w = src.width;
            let h = src.height;
            sobel_mask(src, |x, y| {
                let x0 = x.saturating_sub(radius);
                let y0 = y.saturating_sub(radius);
                let x1 = (x + radius).min(w - 1);
                let y1 = (y + radius).min(h - 1);
                let mean = integral.mean(x0, y0, x1, y1) as i32;
                (mean - offset).max(floor as i32) as u32
            })
        }
    }
}
