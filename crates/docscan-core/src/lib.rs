//! Core types and utilities for document boundary detection.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any concrete detection strategy or platform image type.

mod homography;
mod image;
mod logger;
mod quad;
mod rectify;

pub use homography::{homography_from_4pt, Homography};
pub use image::{
    luma, resize_gray, sample_bilinear, sample_bilinear_rgb, sample_bilinear_u8, to_grayscale,
    GrayImage, GrayImageView, RgbImage, RgbImageView,
};
pub use quad::{distance, Quad};
pub use rectify::{rectify_gray, rectify_rgb, target_dimensions, RectifyError};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
