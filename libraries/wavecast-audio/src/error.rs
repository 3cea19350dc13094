/// Audio-specific errors
use thiserror::Error;
use wavecast_core::CoreError;

/// Result type alias using `AudioError`
pub type Result<T> = std::result::Result<T, AudioError>;

/// Audio error types
#[derive(Error, Debug)]
pub enum AudioError {
    /// No backend recognized the input
    #[error("unknown format: {0}")]
    UnknownFormat(String),

    /// A required decoder backend cannot be used at runtime
    #[error("decoder backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend recognized the container but cannot handle the contents
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Unrecoverable mid-stream decode failure
    #[error("decode error: {0}")]
    Decode(String),

    /// Sample-rate conversion failure
    #[error("resample error: {0}")]
    Resample(String),

    /// Fade envelope with a non-increasing frame range
    #[error("invalid fade range: start {start_frame} is not before end {end_frame}")]
    InvalidFadeRange { start_frame: u64, end_frame: u64 },

    /// Core stream/buffer errors
    #[error(transparent)]
    Core(#[from] CoreError),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<AudioError> for CoreError {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::Core(core) => core,
            AudioError::Io(io) => CoreError::Io(io),
            other => CoreError::decode(other.to_string()),
        }
    }
}
