/// Core error types for Wavecast
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for Wavecast
///
/// Precondition violations (bad channel counts, out-of-range frame windows)
/// are typed errors rather than assertions so that release builds fail
/// loudly instead of corrupting sample data.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Sample storage could not be grown
    #[error("allocation of {samples} samples failed")]
    Allocation { samples: usize },

    /// Channel count outside the supported range
    #[error("invalid channel count: {0} (must be 1 or 2)")]
    InvalidChannelCount(usize),

    /// Frame window exceeds the stream's allocated capacity
    #[error("frame range {offset}+{frames} exceeds capacity {max_frames}")]
    FrameRange {
        offset: usize,
        frames: usize,
        max_frames: usize,
    },

    /// Operation requires two independent channel planes
    #[error("stream is not stereo ({channels} advertised, {planes} planes)")]
    NotStereo { channels: usize, planes: usize },

    /// Decoding failed mid-stream
    #[error("decode error: {0}")]
    Decode(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}
