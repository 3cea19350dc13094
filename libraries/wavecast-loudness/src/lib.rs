//! Wavecast Loudness
//!
//! EBU R128 loudness measurement and ReplayGain 2.0 gain calculation for the
//! analysis side of the pipeline. Feed the [`LoudnessAnalyzer`] interleaved
//! f32 frames as they come off the decode chain, then finalize into a
//! [`TrackGain`].

mod analyzer;
mod error;
mod replaygain;

pub use analyzer::LoudnessAnalyzer;
pub use error::{LoudnessError, Result};
pub use replaygain::{TrackGain, REPLAYGAIN_REFERENCE_LUFS};
