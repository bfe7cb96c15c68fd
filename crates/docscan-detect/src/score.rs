//! Candidate scoring. The scorer is the common currency that lets the
//! orchestrator compare quads produced by heterogeneous strategies.

use serde::{Deserialize, Serialize};

use docscan_core::Quad;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub aspect: f32,
    pub area: f32,
    pub rectangularity: f32,
    pub parallelism: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreParams {
    /// Hard bounds: a quad covering less/more of the frame scores 0 outright.
    pub min_area_ratio: f32,
    pub max_area_ratio: f32,
    /// Band of area ratios considered ideal (full area sub-score).
    pub ideal_area: (f32, f32),
    /// Known physical width/height ratio, e.g. ISO/IEC 7810 ID-1 ≈ 1.586.
    pub aspect_hint: Option<f32>,
    /// Linear falloff band for the aspect sub-score.
    pub aspect_tolerance: f32,
    pub weights: ScoreWeights,
}

impl ScoreParams {
    /// General-document scoring: no fixed aspect, area and angle validity
    /// carry the weight instead.
    pub fn document() -> Self {
        Self {
            min_area_ratio: 0.1,
            max_area_ratio: 0.9,
            ideal_area: (0.2, 0.7),
            aspect_hint: None,
            aspect_tolerance: 0.4,
            weights: ScoreWeights {
                aspect: 0.0,
                area: 0.45,
                rectangularity: 0.35,
                parallelism: 0.2,
            },
        }
    }

    /// ID-card scoring: aspect conformance dominates.
    pub fn id_card(aspect: f32) -> Self {
        Self {
            min_area_ratio: 0.1,
            max_area_ratio: 0.9,
            ideal_area: (0.15, 0.7),
            aspect_hint: Some(aspect),
            aspect_tolerance: 0.3,
            weights: ScoreWeights {
                aspect: 0.4,
                area: 0.3,
                rectangularity: 0.2,
                parallelism: 0.1,
            },
        }
    }
}

/// Angles this far from degenerate count as plausible document corners.
const ANGLE_MIN_DEG: f32 = 45.0;
const ANGLE_MAX_DEG: f32 = 135.0;

/// Confidence in [0, 1] that `quad` is the true document boundary.
///
/// The quad is canonically ordered internally so edge-based measurements are
/// taken on matching opposite sides regardless of input vertex order.
pub fn score_quad(quad: &Quad, image_width: usize, image_height: usize, params: &ScoreParams) -> f32 {
    let ordered = quad.ordered();
    let image_area = (image_width * image_height) as f32;
    if image_area <= 0.0 {
        return 0.0;
    }

    let area_ratio = ordered.area() / image_area;
    if area_ratio < params.min_area_ratio || area_ratio > params.max_area_ratio {
        return 0.0;
    }

    let area_score = if area_ratio >= params.ideal_area.0 && area_ratio <= params.ideal_area.1 {
        1.0
    } else {
        0.6
    };

    let aspect_score = match params.aspect_hint {
        Some(hint) => {
            let deviation = (ordered.aspect_ratio() - hint).abs();
            if deviation < params.aspect_tolerance {
                1.0 - deviation / params.aspect_tolerance
            } else {
                0.0
            }
        }
        // Without a hint the term is neutral; presets also zero its weight.
        None => 1.0,
    };

    let valid_angles = ordered
        .corner_angles()
        .iter()
        .filter(|&&a| (ANGLE_MIN_DEG..=ANGLE_MAX_DEG).contains(&a))
        .count();
    let rectangularity_score = if valid_angles >= 3 { 1.0 } else { 0.0 };

    let parallelism_score = ordered.parallelism();

    let w = &params.weights;
    let confidence = w.aspect * aspect_score
        + w.area * area_score
        + w.rectangularity * rectangularity_score
        + w.parallelism * parallelism_score;

    confidence.clamp(0.0, 1.0)
}
