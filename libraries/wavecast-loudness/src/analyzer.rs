//! EBU R128 loudness analysis
//!
//! Wraps the `ebur128` crate for the streaming measurement the pipeline
//! needs: feed interleaved f32 frames chunk by chunk, then finalize into an
//! integrated loudness and a ReplayGain 2.0 track gain relative to the
//! -18 LUFS reference.

use ebur128::{EbuR128, Mode};
use tracing::debug;

use crate::error::{LoudnessError, Result};
use crate::replaygain::{TrackGain, REPLAYGAIN_REFERENCE_LUFS};

/// Streaming EBU R128 analyzer for one track.
pub struct LoudnessAnalyzer {
    state: EbuR128,
    channels: u32,
    frames_analyzed: u64,
}

impl LoudnessAnalyzer {
    /// Create an analyzer for `channels`-channel audio at `sample_rate` Hz.
    pub fn new(sample_rate: u32, channels: u32) -> Result<Self> {
        let state = EbuR128::new(channels, sample_rate, Mode::I | Mode::SAMPLE_PEAK)
            .map_err(|e| LoudnessError::Setup(e.to_string()))?;
        Ok(Self {
            state,
            channels,
            frames_analyzed: 0,
        })
    }

    /// Feed interleaved f32 samples; the slice length must be a multiple of
    /// the channel count.
    pub fn add_frames(&mut self, interleaved: &[f32]) -> Result<()> {
        if interleaved.is_empty() {
            return Ok(());
        }
        self.state
            .add_frames_f32(interleaved)
            .map_err(|e| LoudnessError::Measurement(e.to_string()))?;
        self.frames_analyzed += interleaved.len() as u64 / u64::from(self.channels);
        Ok(())
    }

    /// Total frames fed so far.
    pub fn frames_analyzed(&self) -> u64 {
        self.frames_analyzed
    }

    /// Gated integrated loudness of everything fed so far, in LUFS.
    pub fn integrated_lufs(&self) -> Result<f64> {
        let lufs = self
            .state
            .loudness_global()
            .map_err(|e| LoudnessError::Measurement(e.to_string()))?;
        if lufs.is_finite() {
            Ok(lufs)
        } else {
            // everything below the gate, e.g. digital silence
            Err(LoudnessError::InsufficientAudio)
        }
    }

    /// Highest sample peak across channels, in dBFS.
    pub fn sample_peak_dbfs(&self) -> Result<f64> {
        let mut peak = 0.0f64;
        for ch in 0..self.channels {
            let channel_peak = self
                .state
                .sample_peak(ch)
                .map_err(|e| LoudnessError::Measurement(e.to_string()))?;
            peak = peak.max(channel_peak);
        }
        Ok(20.0 * peak.max(f64::MIN_POSITIVE).log10())
    }

    /// Finalize into a ReplayGain 2.0 track gain.
    pub fn track_gain(&self) -> Result<TrackGain> {
        let integrated_lufs = self.integrated_lufs()?;
        let peak_dbfs = self.sample_peak_dbfs()?;
        let gain = TrackGain {
            gain_db: REPLAYGAIN_REFERENCE_LUFS - integrated_lufs,
            integrated_lufs,
            peak_dbfs,
        };
        debug!(
            gain_db = gain.gain_db,
            lufs = integrated_lufs,
            "track gain"
        );
        Ok(gain)
    }
}
