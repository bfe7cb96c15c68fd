//! Perspective rectification: warp the photographed quadrilateral into an
//! axis-aligned rectangle.

use nalgebra::Point2;

use crate::homography::{homography_from_4pt, Homography};
use crate::image::{
    sample_bilinear_rgb, sample_bilinear_u8, GrayImage, GrayImageView, RgbImage, RgbImageView,
};
use crate::quad::{distance, Quad};

/// Errors produced when a quadrilateral cannot be rectified.
#[derive(thiserror::Error, Debug)]
pub enum RectifyError {
    #[error("degenerate quadrilateral (target {width}x{height})")]
    DegenerateQuadrilateral { width: usize, height: usize },
    #[error("quadrilateral corners do not define an invertible perspective transform")]
    SingularHomography,
}

/// Target rectangle dimensions for an ordered (TL/TR/BR/BL) quadrilateral:
/// width = max of top/bottom edges, height = max of left/right edges, both
/// rounded to the nearest integer and at least 1.
pub fn target_dimensions(quad: &Quad) -> (usize, usize) {
    let p = quad.points();
    let top = distance(p[0], p[1]);
    let bottom = distance(p[3], p[2]);
    let left = distance(p[0], p[3]);
    let right = distance(p[1], p[2]);

    let width = top.max(bottom).round().max(1.0) as usize;
    let height = left.max(right).round().max(1.0) as usize;
    (width, height)
}

/// Homography mapping rectified-rectangle coordinates into image coordinates
/// for the given ordered quad. Shared by both the gray and RGB warp paths.
fn img_from_rect(quad: &Quad, width: usize, height: usize) -> Result<Homography, RectifyError> {
    if width < 2 || height < 2 {
        return Err(RectifyError::DegenerateQuadrilateral { width, height });
    }
    if quad.has_collinear_corners(1e-3) {
        return Err(RectifyError::DegenerateQuadrilateral { width, height });
    }

    let rect = [
        Point2::new(0.0_f32, 0.0),
        Point2::new(width as f32, 0.0),
        Point2::new(width as f32, height as f32),
        Point2::new(0.0_f32, height as f32),
    ];

    homography_from_4pt(&rect, quad.points()).ok_or(RectifyError::SingularHomography)
}

/// Rectify a grayscale image. `quad` must be in canonical TL/TR/BR/BL order;
/// callers normally pass `raw.ordered()`.
pub fn rectify_gray(src: &GrayImageView<'_>, quad: &Quad) -> Result<GrayImage, RectifyError> {
    let (width, height) = target_dimensions(quad);
    let h = img_from_rect(quad, width, height)?;

    let mut out = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            // sample at pixel center
            let pr = Point2::new(x as f32 + 0.5, y as f32 + 0.5);
            let pi = h.apply(pr);
            out[y * width + x] = sample_bilinear_u8(src, pi.x, pi.y);
        }
    }

    Ok(GrayImage {
        width,
        height,
        data: out,
    })
}

/// Rectify an RGB image with the same geometry as [`rectify_gray`].
pub fn rectify_rgb(src: &RgbImageView<'_>, quad: &Quad) -> Result<RgbImage, RectifyError> {
    let (width, height) = target_dimensions(quad);
    let h = img_from_rect(quad, width, height)?;

    let mut out = vec![0u8; 3 * width * height];
    for y in 0..height {
        for x in 0..width {
            let pr = Point2::new(x as f32 + 0.5, y as f32 + 0.5);
            let pi = h.apply(pr);
            let px = sample_bilinear_rgb(src, pi.x, pi.y);
            let i = 3 * (y * width + x);
            out[i..i + 3].copy_from_slice(&px);
        }
    }

    Ok(RgbImage {
        width,
        height,
        data: out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(width: usize, height: usize) -> GrayImage {
        let mut data = vec![0u8; width * height];
        for y in 0..height {
            for x in 0..width {
                data[y * width + x] = ((x + y) % 256) as u8;
            }
        }
        GrayImage {
            width,
            height,
            data,
        }
    }

    #[test]
    fn axis_aligned_quad_round_trips_dimensions() {
        let img = gradient_image(200, 150);
        let quad = Quad([
            Point2::new(20.0, 10.0),
            Point2::new(180.0, 10.0),
            Point2::new(180.0, 130.0),
            Point2::new(20.0, 130.0),
        ]);
        let out = rectify_gray(&img.view(), &quad).expect("rectify");
        assert_eq!(out.width, 160);
        assert_eq!(out.height, 120);
    }

    #[test]
    fn rectified_aspect_matches_perspective_distorted_rectangle() {
        // A 2:1 rectangle under mild perspective: opposite edges differ but the
        // max-edge rule must recover the ratio within 2%.
        let quad = Quad([
            Point2::new(100.0, 100.0),
            Point2::new(500.0, 110.0),
            Point2::new(490.0, 310.0),
            Point2::new(110.0, 300.0),
        ]);
        let (w, h) = target_dimensions(&quad);
        let ratio = w as f32 / h as f32;
        assert!((ratio - 2.0).abs() / 2.0 < 0.02, "ratio {ratio}");
    }

    #[test]
    fn collinear_corners_are_rejected() {
        let img = gradient_image(100, 100);
        let quad = Quad([
            Point2::new(0.0, 0.0),
            Point2::new(50.0, 0.0),
            Point2::new(99.0, 0.0),
            Point2::new(0.0, 99.0),
        ]);
        let err = rectify_gray(&img.view(), &quad).unwrap_err();
        assert!(matches!(err, RectifyError::DegenerateQuadrilateral { .. }));
    }

    #[test]
    fn tiny_target_is_rejected() {
        let img = gradient_image(100, 100);
        let quad = Quad([
            Point2::new(10.0, 10.0),
            Point2::new(10.5, 10.0),
            Point2::new(10.5, 10.5),
            Point2::new(10.0, 10.5),
        ]);
        let err = rectify_gray(&img.view(), &quad).unwrap_err();
        assert!(matches!(err, RectifyError::DegenerateQuadrilateral { .. }));
    }

    #[test]
    fn rgb_warp_preserves_uniform_color() {
        let mut rgb = RgbImage::new(100, 100);
        for px in rgb.data.chunks_exact_mut(3) {
            px.copy_from_slice(&[10, 200, 30]);
        }
        let quad = Quad([
            Point2::new(10.0, 10.0),
            Point2::new(90.0, 12.0),
            Point2::new(88.0, 90.0),
            Point2::new(12.0, 88.0),
        ]);
        let out = rectify_rgb(&rgb.view(), &quad).expect("rectify");
        let center = 3 * ((out.height / 2) * out.width + out.width / 2);
        assert_eq!(&out.data[center..center + 3], &[10, 200, 30]);
    }
}
