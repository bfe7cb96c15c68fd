//! Grayscale conversion and the per-variant cleanup filters applied before
//! edge extraction.
//!
//! All kernels touch interior pixels only; the 1-pixel border is copied from
//! the source buffer so filter output never contains uninitialized rows.

use docscan_core::{GrayImage, GrayImageView};
use serde::{Deserialize, Serialize};

/// Alternative cleanup filters. The orchestrator runs each configured variant
/// as an independent pass and lets the scorer arbitrate between the results.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PreprocessVariant {
    /// No filtering; detect on the raw grayscale image.
    Identity,
    /// Linear contrast stretch `v * factor - 30`, clamped to [0, 255].
    ContrastBoost { factor: f32 },
    /// 3x3 Gaussian smoothing, weights [1,2,1; 2,4,2; 1,2,1] / 16.
    Denoise,
    /// Unsharp kernel [0,-1,0; -1,5,-1; 0,-1,0].
    Sharpen,
}

const CONTRAST_OFFSET: f32 = 30.0;

/// Apply one preprocessing variant. Pure function: the input is never
/// mutated and the output is always a fresh buffer clamped to [0, 255].
pub fn preprocess(src: &GrayImageView<'_>, variant: PreprocessVariant) -> GrayImage {
    match variant {
        PreprocessVariant::Identity => GrayImage {
            width: src.width,
            height: src.height,
            data: src.data.to_vec(),
        },
        PreprocessVariant::ContrastBoost { factor } => contrast_boost(src, factor),
        PreprocessVariant::Denoise => convolve3x3(src, &[[1, 2, 1], [2, 4, 2], [1, 2, 1]], 16),
        PreprocessVariant::Sharpen => convolve3x3(src, &[[0, -1, 0], [-1, 5, -1], [0, -1, 0]], 1),
    }
}

fn contrast_boost(src: &GrayImageView<'_>, factor: f32) -> GrayImage {
    let data = src
        .data
        .iter()
        .map(|&v| (v as f32 * factor - CONTRAST_OFFSET).clamp(0.0, 255.0) as u8)
        .collect();
    GrayImage {
        width: src.width,
        height: src.height,
        data,
    }
}

fn convolve3x3(src: &GrayImageView<'_>, kernel: &[[i32; 3]; 3], divisor: i32) -> GrayImage {
    let w = src.width;
    let h = src.height;
    // Border rows/columns keep their source values.
    let mut out = src.data.to_vec();

    if w < 3 || h < 3 {
        return GrayImage {
            width: w,
            height: h,
            data: out,
        };
    }

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut acc = 0i32;
            for (ky, row) in kernel.iter().enumerate() {
                for (kx, &weight) in row.iter().enumerate() {
                    let px = src.data[(y + ky - 1) * w + (x + kx - 1)] as i32;
                    acc += px * weight;
                }
            }
            out[y * w + x] = (acc / divisor).clamp(0, 255) as u8;
        }
    }

    GrayImage {
        width: w,
        height: h,
        data: out,
    }
}
