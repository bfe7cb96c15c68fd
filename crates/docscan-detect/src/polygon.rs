//! Contour simplification: Douglas-Peucker reduction and the extremal-point
//! fallback for chains that refuse to simplify to four vertices.

use nalgebra::Point2;

use crate::contour::{perimeter, Contour};
use docscan_core::Quad;

/// Perpendicular distance from `p` to the infinite line through `a` and `b`.
fn point_line_distance(p: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> f32 {
    let la = b.y - a.y;
    let lb = a.x - b.x;
    let lc = b.x * a.y - a.x * b.y;
    let denom = (la * la + lb * lb).sqrt();
    if denom > 0.0 {
        (la * p.x + lb * p.y + lc).abs() / denom
    } else {
        (p - a).norm()
    }
}

/// Douglas-Peucker simplification of an open chain, with an explicit work
/// stack instead of recursion (flood-filled chains can be long enough to
/// make call depth a liability). Endpoints are always kept.
pub fn approximate(chain: &[Point2<f32>], epsilon: f32) -> Vec<Point2<f32>> {
    if chain.len() <= 2 {
        return chain.to_vec();
    }

    let n = chain.len();
    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    // Inclusive (start, end) index ranges still to examine.
    let mut work: Vec<(usize, usize)> = vec![(0, n - 1)];

    while let Some((start, end)) = work.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut max_dist = 0.0f32;
        let mut max_idx = start;
        for i in start + 1..end {
            let d = point_line_distance(chain[i], chain[start], chain[end]);
            if d > max_dist {
                max_dist = d;
                max_idx = i;
            }
        }

        if max_dist > epsilon {
            keep[max_idx] = true;
            work.push((start, max_idx));
            work.push((max_idx, end));
        }
    }

    chain
        .iter()
        .zip(keep.iter())
        .filter_map(|(p, &k)| k.then_some(*p))
        .collect()
}

/// Sort a traced pixel cloud into a ring by polar angle around its centroid.
///
/// Flood-fill order follows the walk, not the boundary; for the convex-ish
/// outlines a document produces, the angular ordering recovers a usable
/// closed ring. Deterministic: ties break on radius, then on raw coordinates.
pub fn order_by_angle(points: &[Point2<f32>]) -> Vec<Point2<f32>> {
    let n = points.len() as f32;
    let cx = points.iter().map(|p| p.x).sum::<f32>() / n;
    let cy = points.iter().map(|p| p.y).sum::<f32>() / n;

    let mut ring = points.to_vec();
    ring.sort_by(|a, b| {
        let ka = (a.y - cy).atan2(a.x - cx);
        let kb = (b.y - cy).atan2(b.x - cx);
        ka.partial_cmp(&kb)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                (a.x - cx)
                    .hypot(a.y - cy)
                    .partial_cmp(&(b.x - cx).hypot(b.y - cy))
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
            .then(a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal))
    });
    ring
}

/// Douglas-Peucker on a closed ring.
///
/// The ring is split at an approximate diameter (two-sweep farthest-point
/// pair) so both anchors sit on true extremes of the shape, then each arc is
/// simplified independently. For a rectangle the anchors land on opposite
/// corners and the arcs contribute the remaining two.
pub fn approximate_closed(ring: &[Point2<f32>], epsilon: f32) -> Vec<Point2<f32>> {
    if ring.len() <= 4 {
        return ring.to_vec();
    }

    let farthest_from = |origin: Point2<f32>| -> usize {
        let mut best = 0usize;
        let mut best_d = -1.0f32;
        for (i, p) in ring.iter().enumerate() {
            let d = (p - origin).norm_squared();
            if d > best_d {
                best_d = d;
                best = i;
            }
        }
        best
    };

    let k = farthest_from(ring[0]);
    let m = farthest_from(ring[k]);

    // Rotate so the ring starts at k; the second anchor then sits at a fixed
    // offset and the two arcs cover the whole ring.
    let n = ring.len();
    let rotated: Vec<Point2<f32>> = (0..n).map(|i| ring[(k + i) % n]).collect();
    let split = (m + n - k) % n;

    let arc1 = &rotated[0..=split];
    let mut arc2: Vec<Point2<f32>> = rotated[split..].to_vec();
    arc2.push(rotated[0]);

    let mut out = approximate(arc1, epsilon);
    let tail = approximate(&arc2, epsilon);
    // Both arcs share their endpoints; keep each anchor once.
    out.extend_from_slice(&tail[1..tail.len() - 1]);
    out
}

/// A contour is a quadrilateral candidate iff its angular ring simplifies to
/// exactly four vertices under `epsilon_ratio` x perimeter.
pub fn quad_from_contour(contour: &Contour, epsilon_ratio: f32) -> Option<Quad> {
    if contour.len() < 4 {
        return None;
    }
    let ring = order_by_angle(contour);
    let epsilon = epsilon_ratio * perimeter(&ring);
    let simplified = approximate_closed(&ring, epsilon);
    if simplified.len() == 4 {
        Some(Quad([
            simplified[0],
            simplified[1],
            simplified[2],
            simplified[3],
        ]))
    } else {
        None
    }
}

/// Salvage four corners from any chain: take the min-x, max-x, min-y and
/// max-y extremes, then fill remaining slots with the points farthest from
/// the centroid. Returns `None` when fewer than four distinct points exist.
pub fn extremal_quad(points: &[Point2<f32>]) -> Option<Quad> {
    if points.len() < 4 {
        return None;
    }

    let select = |better: fn(&Point2<f32>, &Point2<f32>) -> bool| -> Point2<f32> {
        let mut best = points[0];
        for p in &points[1..] {
            if better(p, &best) {
                best = *p;
            }
        }
        best
    };

    let mut corners: Vec<Point2<f32>> = Vec::with_capacity(4);
    for candidate in [
        select(|p, b| p.x < b.x),
        select(|p, b| p.x > b.x),
        select(|p, b| p.y < b.y),
        select(|p, b| p.y > b.y),
    ] {
        if !corners.iter().any(|c| *c == candidate) {
            corners.push(candidate);
        }
    }

    if corners.len() < 4 {
        let cx = points.iter().map(|p| p.x).sum::<f32>() / points.len() as f32;
        let cy = points.iter().map(|p| p.y).sum::<f32>() / points.len() as f32;
        let center = Point2::new(cx, cy);

        let mut remaining: Vec<Point2<f32>> = points
            .iter()
            .filter(|p| !corners.iter().any(|c| c == *p))
            .copied()
            .collect();
        remaining.sort_by(|a, b| {
            let da = (b - center).norm();
            let db = (a - center).norm();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });
        for p in remaining {
            if corners.len() == 4 {
                break;
            }
            corners.push(p);
        }
    }

    if corners.len() == 4 {
        Some(Quad([corners[0], corners[1], corners[2], corners[3]]))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Dense rectangle outline chain with per-point jitter below epsilon.
    fn noisy_rectangle() -> Contour {
        let mut pts = Vec::new();
        let jitter = |i: usize| ((i * 7 % 3) as f32 - 1.0) * 0.4;
        for i in 0..100 {
            pts.push(Point2::new(i as f32, 0.0 + jitter(i)));
        }
        for i in 0..60 {
            pts.push(Point2::new(100.0 + jitter(i), i as f32));
        }
        for i in 0..100 {
            pts.push(Point2::new(100.0 - i as f32, 60.0 + jitter(i)));
        }
        for i in 0..60 {
            pts.push(Point2::new(0.0 + jitter(i), 60.0 - i as f32));
        }
        pts
    }

    #[test]
    fn straight_chain_collapses_to_endpoints() {
        let chain: Vec<Point2<f32>> =
            (0..50).map(|i| Point2::new(i as f32, 2.0 * i as f32)).collect();
        let simplified = approximate(&chain, 1.0);
        assert_eq!(simplified.len(), 2);
        assert_relative_eq!(simplified[0].x, 0.0);
        assert_relative_eq!(simplified[1].x, 49.0);
    }

    #[test]
    fn bent_chain_keeps_the_elbow() {
        let mut chain: Vec<Point2<f32>> =
            (0..50).map(|i| Point2::new(i as f32, 0.0)).collect();
        chain.extend((1..50).map(|i| Point2::new(49.0, i as f32)));
        let simplified = approximate(&chain, 1.0);
        assert_eq!(simplified.len(), 3);
        assert_relative_eq!(simplified[1].x, 49.0);
        assert_relative_eq!(simplified[1].y, 0.0);
    }

    #[test]
    fn noisy_rectangle_reduces_to_four_vertices() {
        let quad = quad_from_contour(&noisy_rectangle(), 0.02).expect("quad");
        let ordered = quad.ordered();
        let p = ordered.points();
        assert!(p[0].x.abs() < 3.0 && p[0].y.abs() < 3.0, "TL {:?}", p[0]);
        assert!(
            (p[2].x - 100.0).abs() < 3.0 && (p[2].y - 60.0).abs() < 3.0,
            "BR {:?}",
            p[2]
        );
    }

    #[test]
    fn pentagon_is_rejected_as_quad_candidate() {
        let mut pts = Vec::new();
        let corners = [
            Point2::new(50.0, 0.0),
            Point2::new(100.0, 38.0),
            Point2::new(81.0, 95.0),
            Point2::new(19.0, 95.0),
            Point2::new(0.0, 38.0),
        ];
        for i in 0..5 {
            let a = corners[i];
            let b = corners[(i + 1) % 5];
            for t in 0..30 {
                let f = t as f32 / 30.0;
                pts.push(Point2::new(a.x + f * (b.x - a.x), a.y + f * (b.y - a.y)));
            }
        }
        assert!(quad_from_contour(&pts, 0.02).is_none());
    }

    #[test]
    fn extremal_selection_recovers_rotated_rectangle_corners() {
        // Diamond orientation: the axis extremes are exactly the corners.
        let corners = [
            Point2::new(50.0, 0.0),
            Point2::new(100.0, 30.0),
            Point2::new(50.0, 60.0),
            Point2::new(0.0, 30.0),
        ];
        let mut pts = Vec::new();
        for i in 0..4 {
            let a = corners[i];
            let b = corners[(i + 1) % 4];
            for t in 0..40 {
                let f = t as f32 / 40.0;
                pts.push(Point2::new(a.x + f * (b.x - a.x), a.y + f * (b.y - a.y)));
            }
        }
        let quad = extremal_quad(&pts).expect("quad").ordered();
        let got: Vec<(f32, f32)> = quad.points().iter().map(|p| (p.x, p.y)).collect();
        for c in &corners {
            assert!(
                got.iter().any(|&(x, y)| (x - c.x).abs() < 1e-3 && (y - c.y).abs() < 1e-3),
                "missing corner {c:?} in {got:?}"
            );
        }
    }

    #[test]
    fn extremal_selection_needs_four_distinct_points() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 1.0),
        ];
        assert!(extremal_quad(&pts).is_none());
    }
}
