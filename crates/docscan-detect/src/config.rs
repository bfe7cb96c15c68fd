//! Detector configuration.
//!
//! Every tuning constant of the pipeline lives here as an explicit field of
//! a caller-supplied struct. The two presets replace what used to be
//! separate fast/balanced/precise/ID detector variants.

use serde::{Deserialize, Serialize};

use crate::contour::{Connectivity, ContourParams};
use crate::corners::CornerScanParams;
use crate::edges::ThresholdPolicy;
use crate::lines::LineScanParams;
use crate::preprocess::PreprocessVariant;
use crate::score::ScoreParams;

/// ISO/IEC 7810 ID-1 card: 85.60 mm x 53.98 mm.
pub const ID1_ASPECT_RATIO: f32 = 85.6 / 53.98;

/// Candidate-generation strategies the orchestrator can run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    Contour,
    Line,
    Corner,
}

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Contour => "contour",
            Strategy::Line => "line",
            Strategy::Corner => "corner",
        }
    }
}

/// Input scale normalization. Detection runs on each target size; results
/// are mapped back to original coordinates afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScalePolicy {
    /// Longest-side targets to downscale to, largest first. Targets larger
    /// than the input are skipped (the input is never upscaled past
    /// `upscale_to`).
    pub targets: Vec<u32>,
    /// Inputs whose longest side is below this are upscaled first so edge
    /// extraction has enough detail to work with.
    pub min_side: u32,
    pub upscale_to: u32,
}

impl Default for ScalePolicy {
    fn default() -> Self {
        Self {
            targets: vec![1200],
            min_side: 600,
            upscale_to: 800,
        }
    }
}

/// How the mandatory fallback rectangle is placed when no candidate clears
/// the confidence threshold.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum FallbackPolicy {
    /// Inset margin chosen from the brightness of the image border: a bright
    /// border suggests the document reaches close to the frame edge.
    BrightnessAdaptive,
    /// Fixed inset margin as a fraction of each dimension.
    Margin(f32),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub scale: ScalePolicy,
    /// Preprocessing variants, each run as an independent pass.
    pub variants: Vec<PreprocessVariant>,
    /// Strategies to run per (scale, variant) pair, in order.
    pub strategies: Vec<Strategy>,
    pub threshold: ThresholdPolicy,
    pub contour: ContourParams,
    /// Douglas-Peucker tolerance as a fraction of contour perimeter.
    pub epsilon_ratio: f32,
    pub lines: LineScanParams,
    pub corners: CornerScanParams,
    pub score: ScoreParams,
    /// Candidates below this confidence lose to the fallback rectangle.
    pub confidence_threshold: f32,
    pub fallback: FallbackPolicy,
    /// When set (and an aspect hint is configured), a winning quad whose
    /// aspect deviates from the hint by more than this is replaced by the
    /// centered rectangle of the hinted ratio at the measured width.
    pub aspect_snap_tolerance: Option<f32>,
    /// Run every strategy and keep the argmax (`true`), or stop at the first
    /// candidate that clears the threshold (`false`).
    pub exhaustive: bool,
}

impl DetectorConfig {
    /// General document capture: no aspect assumption, single scale,
    /// first-success short-circuit for latency.
    pub fn document() -> Self {
        Self {
            scale: ScalePolicy::default(),
            variants: vec![PreprocessVariant::Identity, PreprocessVariant::Denoise],
            strategies: vec![Strategy::Contour, Strategy::Line, Strategy::Corner],
            threshold: ThresholdPolicy::default(),
            contour: ContourParams::default(),
            epsilon_ratio: 0.02,
            lines: LineScanParams::default(),
            corners: CornerScanParams::default(),
            score: ScoreParams::document(),
            confidence_threshold: 0.4,
            fallback: FallbackPolicy::BrightnessAdaptive,
            aspect_snap_tolerance: None,
            exhaustive: false,
        }
    }

    /// ID-1 card capture: aspect-weighted scoring, exhaustive multi-scale
    /// sweep, aspect snapping of the winner.
    pub fn id_card() -> Self {
        Self {
            scale: ScalePolicy {
                targets: vec![1600, 1200],
                ..ScalePolicy::default()
            },
            variants: vec![
                PreprocessVariant::Identity,
                PreprocessVariant::ContrastBoost { factor: 1.8 },
                PreprocessVariant::Denoise,
                PreprocessVariant::Sharpen,
            ],
            strategies: vec![Strategy::Contour, Strategy::Line, Strategy::Corner],
            threshold: ThresholdPolicy::default(),
            contour: ContourParams {
                connectivity: Connectivity::Four,
                ..ContourParams::default()
            },
            epsilon_ratio: 0.02,
            lines: LineScanParams::default(),
            corners: CornerScanParams::default(),
            score: ScoreParams::id_card(ID1_ASPECT_RATIO),
            confidence_threshold: 0.6,
            fallback: FallbackPolicy::BrightnessAdaptive,
            aspect_snap_tolerance: Some(0.1),
            exhaustive: true,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::document()
    }
}
