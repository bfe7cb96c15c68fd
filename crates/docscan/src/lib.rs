//! High-level facade crate for the `docscan-*` workspace.
//!
//! This crate provides:
//! - stable, convenient re-exports of the core and detection crates
//! - (feature-gated) end-to-end helpers that take `image` crate buffers,
//!   locate the document boundary, and return the rectified crop.
//!
//! ## Quickstart
//!
//! ```no_run
//! use docscan::detect;
//! use docscan::DetectorConfig;
//! use image::ImageReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = ImageReader::open("photo.jpg")?.decode()?.to_luma8();
//! let detection = detect::detect_document(&img, &DetectorConfig::document())?;
//! println!("corners: {:?} (confidence {:.2})", detection.quad, detection.confidence);
//!
//! let crop = detect::rectify_document(&img, &detection.quad)?;
//! crop.save("scan.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `docscan::core`: pixel buffers, quads, homographies, rectification.
//! - `docscan::pipeline`: preprocessing, edge/contour/line/corner strategies,
//!   scoring, the `DocumentDetector` orchestrator.
//! - `docscan::detect` (feature `image`): end-to-end helpers from
//!   `image::GrayImage` / `image::RgbImage`.

pub use docscan_core as core;
pub use docscan_detect as pipeline;

pub use docscan_core::{GrayImage, GrayImageView, Quad, RectifyError, RgbImage, RgbImageView};
pub use docscan_detect::{
    CancelFlag, Detection, DetectionOrigin, DetectorConfig, DocumentDetector, Strategy,
    ID1_ASPECT_RATIO,
};

#[cfg(feature = "image")]
pub mod detect;
