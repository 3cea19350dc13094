//! Streaming sample-rate conversion
//!
//! Wraps rubato's sinc resampler behind the stream pipeline contract: a
//! [`Resampler`] is bound at creation to one `(channels, rate_in, rate_out)`
//! tuple, consumes whatever a [`Stream`] holds and keeps any sub-chunk tail
//! in internal per-channel buffers for the next call. A rate or channel
//! change requires a new instance.

use rubato::{
    Resampler as RubatoResampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};
use wavecast_core::{CoreError, Stream};

use crate::error::{AudioError, Result};

/// Input frames per conversion chunk.
const CHUNK_FRAMES: usize = 1024;

/// Streaming sample-rate converter bound to one rate pair.
pub struct Resampler {
    /// `None` when input and output rates match (bit-exact passthrough).
    inner: Option<SincFixedIn<f32>>,
    channels: usize,
    rate_in: u32,
    rate_out: u32,
    /// Per-channel samples waiting for a complete chunk.
    pending: Vec<Vec<f32>>,
}

impl Resampler {
    /// Create a converter for `channels` channels from `rate_in` to
    /// `rate_out` Hz.
    pub fn new(channels: usize, rate_in: u32, rate_out: u32) -> Result<Self> {
        if channels == 0 || channels > wavecast_core::MAX_CHANNELS {
            return Err(CoreError::InvalidChannelCount(channels).into());
        }
        if rate_in == 0 || rate_out == 0 {
            return Err(AudioError::Resample(format!(
                "invalid rate pair {rate_in} -> {rate_out}"
            )));
        }

        let inner = if rate_in == rate_out {
            None
        } else {
            let params = SincInterpolationParameters {
                sinc_len: 128,
                f_cutoff: 0.95,
                interpolation: SincInterpolationType::Cubic,
                oversampling_factor: 256,
                window: WindowFunction::BlackmanHarris2,
            };
            let inner = SincFixedIn::new(
                f64::from(rate_out) / f64::from(rate_in),
                2.0,
                params,
                CHUNK_FRAMES,
                channels,
            )
            .map_err(|e| AudioError::Resample(format!("init failed: {e}")))?;
            Some(inner)
        };

        Ok(Self {
            inner,
            channels,
            rate_in,
            rate_out,
            pending: vec![Vec::new(); channels],
        })
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn rate_in(&self) -> u32 {
        self.rate_in
    }

    pub fn rate_out(&self) -> u32 {
        self.rate_out
    }

    /// Frames buffered internally, waiting for a complete chunk.
    pub fn pending_frames(&self) -> usize {
        self.pending.first().map(Vec::len).unwrap_or(0)
    }

    /// Consume `input` and append converted frames to `output`.
    ///
    /// Only complete chunks are converted; the remainder stays buffered for
    /// the next call. When `input` is flagged end-of-stream the tail is
    /// flushed and the flag propagated to `output`.
    pub fn process(&mut self, input: &Stream, output: &mut Stream) -> Result<()> {
        if input.channels() != self.channels {
            return Err(AudioError::Resample(format!(
                "stream has {} channels, converter bound to {}",
                input.channels(),
                self.channels
            )));
        }

        if self.inner.is_none() {
            output.append(input, input.frames())?;
            output.end_of_stream = input.end_of_stream;
            return Ok(());
        }

        for (ch, pending) in self.pending.iter_mut().enumerate() {
            pending.extend_from_slice(input.plane(ch));
        }
        self.drain(output)?;

        if input.end_of_stream {
            self.flush(output)?;
            output.end_of_stream = true;
        }
        Ok(())
    }

    /// Convert and drain the buffered tail, shorter than a chunk.
    pub fn flush(&mut self, output: &mut Stream) -> Result<()> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(());
        };
        if self.pending.iter().all(Vec::is_empty) {
            return Ok(());
        }
        let chunk: Vec<Vec<f32>> = self
            .pending
            .iter_mut()
            .map(|p| p.drain(..).collect())
            .collect();
        let converted = inner
            .process_partial(Some(&chunk), None)
            .map_err(|e| AudioError::Resample(format!("flush failed: {e}")))?;
        append_planes(output, &converted)?;
        Ok(())
    }

    fn drain(&mut self, output: &mut Stream) -> Result<()> {
        while let Some(inner) = self.inner.as_mut() {
            let needed = inner.input_frames_next();
            if self.pending.iter().any(|p| p.len() < needed) {
                break;
            }
            let chunk: Vec<Vec<f32>> = self
                .pending
                .iter_mut()
                .map(|p| p.drain(..needed).collect())
                .collect();
            let converted = inner
                .process(&chunk, None)
                .map_err(|e| AudioError::Resample(e.to_string()))?;
            append_planes(output, &converted)?;
        }
        Ok(())
    }
}

fn append_planes(output: &mut Stream, planes: &[Vec<f32>]) -> Result<()> {
    let refs: Vec<&[f32]> = planes.iter().map(Vec::as_slice).collect();
    output.append_planes(&refs)?;
    Ok(())
}
