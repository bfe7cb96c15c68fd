//! Detection orchestrator: runs the configured strategies over the scale and
//! preprocessing grid, scores every candidate, and always produces an
//! editable quadrilateral, detected or fallback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

use docscan_core::{resize_gray, to_grayscale, GrayImage, GrayImageView, Quad, RgbImageView};

use crate::config::{DetectorConfig, FallbackPolicy, ScalePolicy, Strategy};
use crate::contour::trace_contours;
use crate::corners::corner_quad;
use crate::edges::detect_edges;
use crate::error::{DetectError, StrategyError};
use crate::lines::line_quad;
use crate::polygon::{extremal_quad, quad_from_contour};
use crate::preprocess::preprocess;
use crate::score::score_quad;

/// Where the returned quadrilateral came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionOrigin {
    Detected(Strategy),
    Fallback,
}

/// Result of one detection run. The quad is canonically ordered and lies in
/// the *original* input's coordinate space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub quad: Quad,
    pub confidence: f32,
    pub origin: DetectionOrigin,
}

impl Detection {
    pub fn is_fallback(&self) -> bool {
        self.origin == DetectionOrigin::Fallback
    }
}

/// Cooperative cancellation handle, checked between strategy attempts.
/// Cancelling never fails a run: the best candidate so far (or the fallback
/// rectangle) is returned.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

struct Candidate {
    quad: Quad,
    confidence: f32,
    strategy: Strategy,
    /// Multiply detected coordinates by this to return to original space.
    map_factor: f32,
}

pub struct DocumentDetector {
    config: DetectorConfig,
}

impl DocumentDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect the document boundary in a grayscale image.
    pub fn detect(&self, src: &GrayImageView<'_>) -> Result<Detection, DetectError> {
        self.detect_with_cancel(src, &CancelFlag::new())
    }

    /// Convenience entry point for RGB input.
    pub fn detect_rgb(&self, src: &RgbImageView<'_>) -> Result<Detection, DetectError> {
        let gray = to_grayscale(src);
        self.detect(&gray.view())
    }

    /// Detect with a cooperative cancellation flag.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, src, cancel), fields(width = src.width, height = src.height))
    )]
    pub fn detect_with_cancel(
        &self,
        src: &GrayImageView<'_>,
        cancel: &CancelFlag,
    ) -> Result<Detection, DetectError> {
        validate(src)?;

        let orig_w = src.width;
        let orig_h = src.height;

        // Upscale undersized inputs once; every scale target then works from
        // this buffer.
        let base = normalize_minimum(src, &self.config.scale);
        let base_view = match &base {
            Some(img) => img.view(),
            None => *src,
        };

        let candidates = self.collect_candidates(&base_view, orig_w, cancel);

        let best = candidates.iter().max_by(|a, b| {
            a.confidence
                .partial_cmp(&b.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        if let Some(best) = best {
            if best.confidence >= self.config.confidence_threshold {
                info!(
                    "document detected by {} strategy (confidence {:.3})",
                    best.strategy.name(),
                    best.confidence
                );
                let mut quad = best
                    .quad
                    .scaled(best.map_factor)
                    .clamped(orig_w as f32, orig_h as f32)
                    .ordered();
                if let (Some(tol), Some(hint)) = (
                    self.config.aspect_snap_tolerance,
                    self.config.score.aspect_hint,
                ) {
                    quad = snap_to_aspect(&quad, hint, tol)
                        .clamped(orig_w as f32, orig_h as f32)
                        .ordered();
                }
                return Ok(Detection {
                    quad,
                    confidence: best.confidence,
                    origin: DetectionOrigin::Detected(best.strategy),
                });
            }
            debug!(
                "best candidate {:.3} below threshold {:.3}, falling back",
                best.confidence, self.config.confidence_threshold
            );
        } else {
            debug!("no strategy produced a candidate, falling back");
        }

        Ok(Detection {
            quad: self.fallback_quad(src),
            confidence: 0.0,
            origin: DetectionOrigin::Fallback,
        })
    }

    fn collect_candidates(
        &self,
        base: &GrayImageView<'_>,
        orig_w: usize,
        cancel: &CancelFlag,
    ) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut seen_sizes: Vec<usize> = Vec::new();

        'scales: for &target in &self.config.scale.targets {
            let scaled = scale_to_target(base, target as usize);
            let view = match &scaled {
                Some(img) => img.view(),
                None => *base,
            };
            if seen_sizes.contains(&view.width) {
                continue;
            }
            seen_sizes.push(view.width);
            let map_factor = orig_w as f32 / view.width as f32;

            for variant in &self.config.variants {
                let cleaned = preprocess(&view, *variant);
                let mask = detect_edges(&cleaned.view(), &self.config.threshold);

                for strategy in &self.config.strategies {
                    if cancel.is_cancelled() {
                        debug!("detection cancelled, keeping {} candidates", candidates.len());
                        break 'scales;
                    }

                    let quads = match strategy {
                        Strategy::Contour => self.contour_quads(&mask),
                        Strategy::Line => line_quad(&mask, &self.config.lines).map(|q| vec![q]),
                        Strategy::Corner => {
                            corner_quad(&cleaned.view(), &self.config.corners).map(|q| vec![q])
                        }
                    };

                    let quads = match quads {
                        Ok(quads) => quads,
                        Err(err) => {
                            warn!(
                                "{} strategy failed on {}px/{:?}: {}",
                                strategy.name(),
                                view.width.max(view.height),
                                variant,
                                err
                            );
                            continue;
                        }
                    };

                    for quad in quads {
                        let confidence =
                            score_quad(&quad, view.width, view.height, &self.config.score);
                        debug!(
                            "{} candidate at {}px/{:?}: confidence {:.3}",
                            strategy.name(),
                            view.width.max(view.height),
                            variant,
                            confidence
                        );
                        candidates.push(Candidate {
                            quad,
                            confidence,
                            strategy: *strategy,
                            map_factor,
                        });
                    }

                    if !self.config.exhaustive
                        && candidates
                            .iter()
                            .any(|c| c.confidence >= self.config.confidence_threshold)
                    {
                        break 'scales;
                    }
                }
            }
        }

        candidates
    }

    fn contour_quads(&self, mask: &crate::edges::EdgeMask) -> Result<Vec<Quad>, StrategyError> {
        if mask.count() == 0 {
            return Err(StrategyError::EmptyMask);
        }

        let contours = trace_contours(mask, &self.config.contour);
        let mut quads = Vec::new();
        for contour in &contours {
            if let Some(quad) = quad_from_contour(contour, self.config.epsilon_ratio) {
                quads.push(quad);
            }
        }

        // Chains that refuse to simplify to four vertices can still carry the
        // document outline; salvage corners from the largest ones.
        if quads.is_empty() {
            for contour in contours.iter().take(3) {
                if let Some(quad) = extremal_quad(contour) {
                    quads.push(quad);
                }
            }
        }

        if quads.is_empty() {
            Err(StrategyError::NoQuadContour)
        } else {
            Ok(quads)
        }
    }

    fn fallback_quad(&self, src: &GrayImageView<'_>) -> Quad {
        let w = src.width as f32;
        let h = src.height as f32;

        if let Some(hint) = self.config.score.aspect_hint {
            // Center the largest hinted-ratio rectangle that fits comfortably.
            let (card_w, card_h) = if w / h > hint {
                let ch = h * 0.7;
                (ch * hint, ch)
            } else {
                let cw = w * 0.8;
                (cw, cw / hint)
            };
            let cx = w / 2.0;
            let cy = h / 2.0;
            return Quad([
                Point2::new(cx - card_w / 2.0, cy - card_h / 2.0),
                Point2::new(cx + card_w / 2.0, cy - card_h / 2.0),
                Point2::new(cx + card_w / 2.0, cy + card_h / 2.0),
                Point2::new(cx - card_w / 2.0, cy + card_h / 2.0),
            ]);
        }

        let margin = match self.config.fallback {
            FallbackPolicy::Margin(m) => m,
            FallbackPolicy::BrightnessAdaptive => match border_brightness(src) {
                b if b > 200.0 => 0.02,
                b if b > 100.0 => 0.05,
                _ => 0.08,
            },
        };

        Quad([
            Point2::new(w * margin, h * margin),
            Point2::new(w * (1.0 - margin), h * margin),
            Point2::new(w * (1.0 - margin), h * (1.0 - margin)),
            Point2::new(w * margin, h * (1.0 - margin)),
        ])
    }
}

fn validate(src: &GrayImageView<'_>) -> Result<(), DetectError> {
    if src.width == 0 || src.height == 0 {
        return Err(DetectError::InvalidInput {
            width: src.width,
            height: src.height,
        });
    }
    let expected = src.width * src.height;
    if src.data.len() != expected {
        return Err(DetectError::InvalidBuffer {
            expected,
            got: src.data.len(),
        });
    }
    Ok(())
}

/// Upscale inputs below the minimum working size; `None` means the input is
/// used as-is.
fn normalize_minimum(src: &GrayImageView<'_>, policy: &ScalePolicy) -> Option<GrayImage> {
    let longest = src.width.max(src.height);
    if longest >= policy.min_side as usize || longest == 0 {
        return None;
    }
    let scale = policy.upscale_to as f32 / longest as f32;
    let new_w = ((src.width as f32 * scale).round() as usize).max(1);
    let new_h = ((src.height as f32 * scale).round() as usize).max(1);
    Some(resize_gray(src, new_w, new_h))
}

/// Downscale so the longest side matches `target`; `None` when the input is
/// already at or below the target.
fn scale_to_target(src: &GrayImageView<'_>, target: usize) -> Option<GrayImage> {
    let longest = src.width.max(src.height);
    if longest <= target {
        return None;
    }
    let scale = target as f32 / longest as f32;
    let new_w = ((src.width as f32 * scale).round() as usize).max(1);
    let new_h = ((src.height as f32 * scale).round() as usize).max(1);
    Some(resize_gray(src, new_w, new_h))
}

/// Mean gray value of the image's border band (1/20th of the short side).
fn border_brightness(src: &GrayImageView<'_>) -> f32 {
    let w = src.width;
    let h = src.height;
    let band = (w.min(h) / 20).max(1);

    let mut sum = 0u64;
    let mut count = 0u64;
    for y in 0..h {
        for x in 0..w {
            if x < band || x >= w - band || y < band || y >= h - band {
                sum += src.data[y * w + x] as u64;
                count += 1;
            }
        }
    }
    if count == 0 {
        return 0.0;
    }
    sum as f32 / count as f32
}

/// Replace a quad whose aspect strays from the hint with the centered
/// axis-aligned rectangle of the hinted ratio, preserving the measured
/// dominant dimension.
fn snap_to_aspect(quad: &Quad, hint: f32, tolerance: f32) -> Quad {
    let ratio = quad.aspect_ratio();
    if (ratio - hint).abs() <= tolerance {
        return *quad;
    }

    let [top, right, bottom, left] = quad.edge_lengths();
    let width = (top + bottom) / 2.0;
    let height = (right + left) / 2.0;
    let center = quad.centroid();

    let (new_w, new_h) = if ratio > hint {
        (width, width / hint)
    } else {
        (height * hint, height)
    };

    Quad([
        Point2::new(center.x - new_w / 2.0, center.y - new_h / 2.0),
        Point2::new(center.x + new_w / 2.0, center.y - new_h / 2.0),
        Point2::new(center.x + new_w / 2.0, center.y + new_h / 2.0),
        Point2::new(center.x - new_w / 2.0, center.y + new_h / 2.0),
    ])
}
