/// Errors surfaced by the detection pipeline.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("invalid input image (width={width}, height={height})")]
    InvalidInput { width: usize, height: usize },

    #[error("input buffer length mismatch (expected {expected} bytes, got {got})")]
    InvalidBuffer { expected: usize, got: usize },
}

/// Internal per-strategy failures. These never leave the orchestrator: they
/// are logged and the strategy simply contributes no candidate.
#[derive(thiserror::Error, Debug)]
pub(crate) enum StrategyError {
    #[error("edge mask contains no foreground pixels")]
    EmptyMask,

    #[error("no contour produced a quadrilateral")]
    NoQuadContour,

    #[error("not enough qualifying scan lines (rows={rows}, cols={cols})")]
    TooFewLines { rows: usize, cols: usize },

    #[error("not enough corner responses above threshold (found {found})")]
    TooFewCorners { found: usize },
}
