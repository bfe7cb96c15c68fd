//! End-to-end detection scenarios on synthetic images.

use docscan_core::{GrayImage, Quad};
use docscan_detect::{DetectorConfig, DocumentDetector};

fn white_rectangle(w: usize, h: usize, x0: usize, y0: usize, x1: usize, y1: usize) -> GrayImage {
    let mut img = GrayImage {
        width: w,
        height: h,
        data: vec![0u8; w * h],
    };
    for y in y0..y1 {
        for x in x0..x1 {
            img.data[y * w + x] = 255;
        }
    }
    img
}

fn assert_corner_near(quad: &Quad, index: usize, x: f32, y: f32, tol: f32) {
    let p = quad.points()[index];
    assert!(
        (p.x - x).abs() <= tol && (p.y - y).abs() <= tol,
        "corner {index}: expected ({x}, {y}) +- {tol}, got ({}, {})",
        p.x,
        p.y
    );
}

#[test]
fn portrait_document_with_150px_margins_is_located_within_5px() {
    // 1000x1400 black canvas, white rectangle inset by 150px on every side.
    let img = white_rectangle(1000, 1400, 150, 150, 850, 1250);
    let detector = DocumentDetector::new(DetectorConfig::document());
    let detection = detector.detect(&img.view()).expect("detect");

    assert!(!detection.is_fallback());
    assert_corner_near(&detection.quad, 0, 150.0, 150.0, 5.0);
    assert_corner_near(&detection.quad, 1, 850.0, 150.0, 5.0);
    assert_corner_near(&detection.quad, 2, 850.0, 1250.0, 5.0);
    assert_corner_near(&detection.quad, 3, 150.0, 1250.0, 5.0);
}

#[test]
fn uniform_images_fall_back_instead_of_failing() {
    let detector = DocumentDetector::new(DetectorConfig::document());
    for value in [0u8, 255u8] {
        let img = GrayImage {
            width: 1000,
            height: 1400,
            data: vec![value; 1_400_000],
        };
        let detection = detector.detect(&img.view()).expect("detect");
        assert!(detection.is_fallback());
        // The fallback must still be a sane inset rectangle.
        let p = detection.quad.points();
        assert!(p[0].x > 0.0 && p[0].y > 0.0);
        assert!(p[2].x < 1000.0 && p[2].y < 1400.0);
    }
}

#[test]
fn repeated_runs_are_bit_identical() {
    let img = white_rectangle(1000, 1400, 150, 150, 850, 1250);
    for config in [DetectorConfig::document(), DetectorConfig::id_card()] {
        let detector = DocumentDetector::new(config);
        let a = detector.detect(&img.view()).expect("detect");
        let b = detector.detect(&img.view()).expect("detect");
        assert_eq!(a.quad, b.quad);
        assert_eq!(a.confidence, b.confidence);
    }
}

#[test]
fn id_card_mode_detects_a_card_shaped_rectangle() {
    // 793x500 card (ratio ~1.586) centered in a 1200x900 frame.
    let img = white_rectangle(1200, 900, 204, 200, 997, 700);
    let detector = DocumentDetector::new(DetectorConfig::id_card());
    let detection = detector.detect(&img.view()).expect("detect");

    assert!(!detection.is_fallback());
    let ratio = detection.quad.aspect_ratio();
    assert!((ratio - 1.586).abs() < 0.08, "ratio {ratio}");
    assert_corner_near(&detection.quad, 0, 204.0, 200.0, 12.0);
    assert_corner_near(&detection.quad, 2, 997.0, 700.0, 12.0);
}

#[test]
fn rotated_document_is_still_found() {
    // A 45-degree rotated square (diamond) with strong contrast.
    let mut img = GrayImage {
        width: 900,
        height: 900,
        data: vec![0u8; 810_000],
    };
    for y in 0..900usize {
        for x in 0..900usize {
            let dx = (x as i32 - 450).abs();
            let dy = (y as i32 - 450).abs();
            if dx + dy <= 320 {
                img.data[y * 900 + x] = 255;
            }
        }
    }
    let detector = DocumentDetector::new(DetectorConfig::document());
    let detection = detector.detect(&img.view()).expect("detect");
    assert!(!detection.is_fallback());

    // Every diamond vertex must be matched by some detected corner.
    for target in [(130.0, 450.0), (450.0, 130.0), (770.0, 450.0), (450.0, 770.0)] {
        assert!(
            detection
                .quad
                .points()
                .iter()
                .any(|p| (p.x - target.0).abs() < 20.0 && (p.y - target.1).abs() < 20.0),
            "no corner near {target:?} in {:?}",
            detection.quad
        );
    }
    let area = detection.quad.area();
    let expected = 2.0 * 320.0 * 320.0;
    assert!(
        (area - expected).abs() / expected < 0.15,
        "area {area} vs {expected}"
    );
}

#[test]
fn all_returned_points_lie_inside_the_image() {
    let img = white_rectangle(640, 640, 10, 10, 630, 630);
    for config in [DetectorConfig::document(), DetectorConfig::id_card()] {
        let detector = DocumentDetector::new(config);
        let detection = detector.detect(&img.view()).expect("detect");
        for p in detection.quad.points() {
            assert!(p.x >= 0.0 && p.x <= 640.0, "x {}", p.x);
            assert!(p.y >= 0.0 && p.y <= 640.0, "y {}", p.y);
        }
    }
}
