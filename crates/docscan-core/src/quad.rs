//! Quadrilateral type and the geometric measurements the scorer relies on.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Exactly four points in image pixel coordinates.
///
/// A `Quad` carries no ordering guarantee by itself; [`Quad::ordered`]
/// produces the canonical clockwise TL/TR/BR/BL arrangement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quad(pub [Point2<f32>; 4]);

impl Quad {
    pub fn new(points: [Point2<f32>; 4]) -> Self {
        Self(points)
    }

    #[inline]
    pub fn points(&self) -> &[Point2<f32>; 4] {
        &self.0
    }

    /// Canonical corner order: top-left minimizes x+y, top-right minimizes
    /// y−x, bottom-right maximizes x+y, bottom-left takes the remaining
    /// point. Roles are assigned without reuse so exact ties (a 45°-rotated
    /// square) still yield four distinct corners.
    ///
    /// Idempotent: ordering an already-canonical quad returns it unchanged.
    pub fn ordered(&self) -> Quad {
        let pts = &self.0;
        let mut taken = [false; 4];

        let mut claim = |key: fn(&Point2<f32>) -> f32, max: bool| -> usize {
            let mut best = usize::MAX;
            for (i, p) in pts.iter().enumerate() {
                if taken[i] {
                    continue;
                }
                let better = best == usize::MAX
                    || if max {
                        key(p) > key(&pts[best])
                    } else {
                        key(p) < key(&pts[best])
                    };
                if better {
                    best = i;
                }
            }
            taken[best] = true;
            best
        };

        let top_left = claim(|p| p.x + p.y, false);
        let bottom_right = claim(|p| p.x + p.y, true);
        let top_right = claim(|p| p.y - p.x, false);
        let bottom_left = claim(|p| p.y - p.x, true);

        Quad([
            pts[top_left],
            pts[top_right],
            pts[bottom_right],
            pts[bottom_left],
        ])
    }

    /// Shoelace area. Valid for any vertex order (absolute value).
    pub fn area(&self) -> f32 {
        let p = &self.0;
        let mut acc = 0.0f32;
        for i in 0..4 {
            let j = (i + 1) % 4;
            acc += p[i].x * p[j].y - p[j].x * p[i].y;
        }
        acc.abs() / 2.0
    }

    pub fn centroid(&self) -> Point2<f32> {
        let p = &self.0;
        Point2::new(
            (p[0].x + p[1].x + p[2].x + p[3].x) / 4.0,
            (p[0].y + p[1].y + p[2].y + p[3].y) / 4.0,
        )
    }

    /// Edge lengths in order TL→TR, TR→BR, BR→BL, BL→TL (assuming canonical
    /// ordering; for raw quads it is simply consecutive-vertex distances).
    pub fn edge_lengths(&self) -> [f32; 4] {
        let p = &self.0;
        [
            distance(p[0], p[1]),
            distance(p[1], p[2]),
            distance(p[2], p[3]),
            distance(p[3], p[0]),
        ]
    }

    /// Width/height ratio from averaged opposite edges. Returns 0 when the
    /// averaged height is zero.
    pub fn aspect_ratio(&self) -> f32 {
        let [top, right, bottom, left] = self.edge_lengths();
        let avg_w = (top + bottom) / 2.0;
        let avg_h = (right + left) / 2.0;
        if avg_h > 0.0 {
            avg_w / avg_h
        } else {
            0.0
        }
    }

    /// Interior angle at each vertex, in degrees. Vertices whose adjacent
    /// edges have zero length contribute an angle of 0.
    pub fn corner_angles(&self) -> [f32; 4] {
        let p = &self.0;
        let mut angles = [0.0f32; 4];
        for i in 0..4 {
            let prev = p[(i + 3) % 4];
            let curr = p[i];
            let next = p[(i + 1) % 4];

            let v1 = prev - curr;
            let v2 = next - curr;
            let m1 = v1.norm();
            let m2 = v2.norm();
            if m1 > 0.0 && m2 > 0.0 {
                let cos = (v1.dot(&v2) / (m1 * m2)).clamp(-1.0, 1.0);
                angles[i] = cos.acos().to_degrees();
            }
        }
        angles
    }

    /// Mean absolute cosine similarity of the two opposite edge pairs:
    /// 1.0 for a parallelogram, lower as the sides diverge.
    pub fn parallelism(&self) -> f32 {
        let p = &self.0;
        let top = p[1] - p[0];
        let bottom = p[2] - p[3];
        let right = p[2] - p[1];
        let left = p[3] - p[0];

        (vector_similarity(top, bottom) + vector_similarity(right, left)) / 2.0
    }

    /// Clamp every corner into `[0, width] × [0, height]`.
    pub fn clamped(&self, width: f32, height: f32) -> Quad {
        Quad(self.0.map(|p| {
            Point2::new(p.x.clamp(0.0, width), p.y.clamp(0.0, height))
        }))
    }

    /// Scale every corner by a uniform factor (used to map detections back
    /// from the scale-normalized image to original coordinates).
    pub fn scaled(&self, factor: f32) -> Quad {
        Quad(self.0.map(|p| Point2::new(p.x * factor, p.y * factor)))
    }

    /// True when any three corners are collinear within `tol` (twice the
    /// triangle area below `tol` times the squared span of the triple).
    pub fn has_collinear_corners(&self, tol: f32) -> bool {
        let p = &self.0;
        for i in 0..4 {
            let a = p[i];
            let b = p[(i + 1) % 4];
            let c = p[(i + 2) % 4];
            let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
            let span = distance(a, b).max(distance(b, c)).max(distance(a, c));
            if cross.abs() <= tol * span.max(1.0) {
                return true;
            }
        }
        false
    }
}

#[inline]
pub fn distance(a: Point2<f32>, b: Point2<f32>) -> f32 {
    (a - b).norm()
}

fn vector_similarity(a: nalgebra::Vector2<f32>, b: nalgebra::Vector2<f32>) -> f32 {
    let m1 = a.norm();
    let m2 = b.norm();
    if m1 > 0.0 && m2 > 0.0 {
        (a.dot(&b) / (m1 * m2)).abs()
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> Quad {
        Quad([
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ])
    }

    #[test]
    fn ordering_is_idempotent() {
        let shuffled = Quad([
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 0.0),
        ]);
        let once = shuffled.ordered();
        let twice = once.ordered();
        assert_eq!(once, twice);
        assert_eq!(once, unit_square());
    }

    #[test]
    fn ordering_handles_rotated_rectangle() {
        // Rectangle rotated ~15 degrees around (50, 50).
        let quad = Quad([
            Point2::new(75.2, 85.1),
            Point2::new(24.8, 14.9),
            Point2::new(85.1, 24.8),
            Point2::new(14.9, 75.2),
        ]);
        let ordered = quad.ordered();
        // Top-left must minimize x+y among the four inputs.
        let min_sum = quad
            .points()
            .iter()
            .map(|p| p.x + p.y)
            .fold(f32::INFINITY, f32::min);
        assert_relative_eq!(ordered.points()[0].x + ordered.points()[0].y, min_sum);
    }

    #[test]
    fn ordering_keeps_four_distinct_corners_on_exact_diamond() {
        // 45°-rotated square: x+y and y−x tie pairwise; every corner must
        // still be assigned exactly once.
        let diamond = Quad([
            Point2::new(0.0, 5.0),
            Point2::new(5.0, 0.0),
            Point2::new(10.0, 5.0),
            Point2::new(5.0, 10.0),
        ]);
        let ordered = diamond.ordered();
        for a in 0..4 {
            for b in a + 1..4 {
                assert_ne!(ordered.points()[a], ordered.points()[b]);
            }
        }
        assert_relative_eq!(ordered.area(), diamond.area());
        assert_eq!(ordered.ordered(), ordered);
    }

    #[test]
    fn area_of_unit_square() {
        assert_relative_eq!(unit_square().area(), 1.0);
    }

    #[test]
    fn aspect_ratio_of_wide_rectangle() {
        let quad = Quad([
            Point2::new(0.0, 0.0),
            Point2::new(200.0, 0.0),
            Point2::new(200.0, 100.0),
            Point2::new(0.0, 100.0),
        ]);
        assert_relative_eq!(quad.aspect_ratio(), 2.0);
    }

    #[test]
    fn square_angles_are_right() {
        for angle in unit_square().corner_angles() {
            assert_relative_eq!(angle, 90.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn rectangle_is_fully_parallel() {
        assert_relative_eq!(unit_square().parallelism(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn clamp_pulls_points_into_bounds() {
        let quad = Quad([
            Point2::new(-5.0, -5.0),
            Point2::new(150.0, 0.0),
            Point2::new(150.0, 150.0),
            Point2::new(0.0, 150.0),
        ]);
        let clamped = quad.clamped(100.0, 100.0);
        for p in clamped.points() {
            assert!(p.x >= 0.0 && p.x <= 100.0);
            assert!(p.y >= 0.0 && p.y <= 100.0);
        }
    }

    #[test]
    fn collinear_triple_is_flagged() {
        let degenerate = Quad([
            Point2::new(0.0, 0.0),
            Point2::new(50.0, 0.0),
            Point2::new(100.0, 0.0),
            Point2::new(0.0, 100.0),
        ]);
        assert!(degenerate.has_collinear_corners(1e-3));
        assert!(!unit_square().scaled(100.0).has_collinear_corners(1e-3));
    }
}
