//! End-to-end helpers bridging `image` crate buffers to the core pipeline.

use docscan_core::{rectify_gray, rectify_rgb, GrayImageView, Quad, RectifyError, RgbImageView};
use docscan_detect::{DetectError, Detection, DetectorConfig, DocumentDetector};

/// Errors produced by the high-level facade helpers.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("invalid grayscale image buffer length (expected {expected} bytes, got {got})")]
    InvalidGrayBuffer { expected: usize, got: usize },

    #[error("invalid image dimensions (width={width}, height={height})")]
    InvalidDimensions { width: u32, height: u32 },

    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error(transparent)]
    Rectify(#[from] RectifyError),
}

/// Convert an `image::GrayImage` into the lightweight `docscan-core` view type.
pub fn gray_view(img: &::image::GrayImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Convert an `image::RgbImage` into the lightweight `docscan-core` view type.
pub fn rgb_view(img: &::image::RgbImage) -> RgbImageView<'_> {
    RgbImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Locate the document boundary in a grayscale photo.
pub fn detect_document(
    img: &::image::GrayImage,
    config: &DetectorConfig,
) -> Result<Detection, ScanError> {
    let detector = DocumentDetector::new(config.clone());
    Ok(detector.detect(&gray_view(img))?)
}

/// Locate the document boundary in an RGB photo.
pub fn detect_document_rgb(
    img: &::image::RgbImage,
    config: &DetectorConfig,
) -> Result<Detection, ScanError> {
    let detector = DocumentDetector::new(config.clone());
    Ok(detector.detect_rgb(&rgb_view(img))?)
}

/// Warp the quadrilateral region into an axis-aligned grayscale crop.
pub fn rectify_document(
    img: &::image::GrayImage,
    quad: &Quad,
) -> Result<::image::GrayImage, ScanError> {
    let out = rectify_gray(&gray_view(img), &quad.ordered())?;
    ::image::GrayImage::from_raw(out.width as u32, out.height as u32, out.data).ok_or(
        ScanError::InvalidDimensions {
            width: out.width as u32,
            height: out.height as u32,
        },
    )
}

/// Warp the quadrilateral region into an axis-aligned RGB crop.
pub fn rectify_document_rgb(
    img: &::image::RgbImage,
    quad: &Quad,
) -> Result<::image::RgbImage, ScanError> {
    let out = rectify_rgb(&rgb_view(img), &quad.ordered())?;
    ::image::RgbImage::from_raw(out.width as u32, out.height as u32, out.data).ok_or(
        ScanError::InvalidDimensions {
            width: out.width as u32,
            height: out.height as u32,
        },
    )
}

/// Full capture flow: detect, then rectify with the detected (or fallback)
/// quadrilateral.
pub fn detect_and_rectify(
    img: &::image::GrayImage,
    config: &DetectorConfig,
) -> Result<(Detection, ::image::GrayImage), ScanError> {
    let detection = detect_document(img, config)?;
    let crop = rectify_document(img, &detection.quad)?;
    Ok((detection, crop))
}

/// Build an `image::GrayImage` from a raw grayscale buffer.
pub fn gray_image_from_slice(
    width: u32,
    height: u32,
    pixels: &[u8],
) -> Result<::image::GrayImage, ScanError> {
    let w = usize::try_from(width).ok();
    let h = usize::try_from(height).ok();
    let Some((w, h)) = w.zip(h) else {
        return Err(ScanError::InvalidDimensions { width, height });
    };
    let Some(expected) = w.checked_mul(h) else {
        return Err(ScanError::InvalidDimensions { width, height });
    };
    if pixels.len() != expected {
        return Err(ScanError::InvalidGrayBuffer {
            expected,
            got: pixels.len(),
        });
    }
    ::image::GrayImage::from_raw(width, height, pixels.to_vec())
        .ok_or(ScanError::InvalidDimensions { width, height })
}

/// Detect straight from a raw grayscale buffer.
pub fn detect_from_gray_u8(
    width: u32,
    height: u32,
    pixels: &[u8],
    config: &DetectorConfig,
) -> Result<Detection, ScanError> {
    let img = gray_image_from_slice(width, height, pixels)?;
    detect_document(&img, config)
}
