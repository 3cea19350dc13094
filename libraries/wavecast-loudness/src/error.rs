/// Loudness analysis errors
use thiserror::Error;

/// Result type alias using `LoudnessError`
pub type Result<T> = std::result::Result<T, LoudnessError>;

/// Loudness analysis error types
#[derive(Error, Debug)]
pub enum LoudnessError {
    /// Analyzer construction failed
    #[error("analyzer setup failed: {0}")]
    Setup(String),

    /// Feeding or finalizing a measurement failed
    #[error("loudness measurement failed: {0}")]
    Measurement(String),

    /// Not enough audio for a gated loudness measurement
    #[error("not enough audio for a loudness measurement")]
    InsufficientAudio,
}
