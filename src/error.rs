use thiserror::Error;

/// Errors surfaced by the analysis pipeline.
///
/// Judgment never fails: a press without a matching note is a `Miss`
/// outcome, not an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    #[error("no track loaded")]
    NotLoaded,

    /// Envelope too short (or too flat) to estimate a tempo from.
    #[error("insufficient data for tempo estimation: {frames} frames, need {needed}")]
    InsufficientData { frames: usize, needed: usize },

    #[error("tempo must be positive, got {0} BPM")]
    DegenerateTempo(f32),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
