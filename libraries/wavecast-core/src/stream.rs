//! Multi-channel sample stream
//!
//! `Stream` is the unit of data interchange between decoders, the resampler,
//! the effects and the capture/analysis consumers. Samples are stored planar
//! (one [`SampleBuffer`] per channel) as f32 in [-1.0, 1.0]. A stream grows
//! its capacity on demand and never shrinks it; only the logical frame count
//! changes on `clear`/`drop_front`/`zero`.
//!
//! A stream is exclusively owned by the pipeline stage currently processing
//! it and passed by reference between stages.

use crate::buffer::SampleBuffer;
use crate::convert;
use crate::error::{CoreError, Result};

/// Maximum number of channels a stream can carry.
pub const MAX_CHANNELS: usize = 2;

/// Planar multi-channel f32 sample stream.
#[derive(Debug)]
pub struct Stream {
    buffers: [SampleBuffer; MAX_CHANNELS],
    /// Advertised channel count, 1..=MAX_CHANNELS.
    channels: usize,
    /// Distinct planes holding data. A mono stream mapped to a stereo layout
    /// advertises 2 channels but keeps a single plane; reads of the second
    /// channel alias the first.
    planes: usize,
    frames: usize,
    max_frames: usize,
    /// Set by a decoder when no further frames are available.
    pub end_of_stream: bool,
}

impl Stream {
    /// Create an empty stream with the given channel count.
    pub fn new(channels: usize) -> Result<Self> {
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(CoreError::InvalidChannelCount(channels));
        }
        Ok(Self {
            buffers: [SampleBuffer::new(), SampleBuffer::new()],
            channels,
            planes: channels,
            frames: 0,
            max_frames: 0,
            end_of_stream: false,
        })
    }

    /// Advertised channel count.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of distinct sample planes holding data.
    pub fn plane_count(&self) -> usize {
        self.planes
    }

    /// Valid frames currently held.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Allocated capacity in frames.
    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    /// Reset the logical frame count to zero. Capacity and the
    /// `end_of_stream` flag are left untouched.
    pub fn clear(&mut self) {
        self.frames = 0;
    }

    /// Grow capacity to at least `frames` frames in every plane.
    ///
    /// No-op when already large enough; never shrinks, so steady-state
    /// streaming does not reallocate.
    pub fn resize(&mut self, frames: usize) -> Result<()> {
        let target = frames.max(self.max_frames);
        for buffer in self.buffers.iter_mut().take(self.planes) {
            buffer.grow(target)?;
        }
        self.max_frames = target;
        Ok(())
    }

    /// Samples of one channel, limited to the valid frames.
    ///
    /// Reading a channel beyond the last populated plane returns the last
    /// plane, so a mono stream feeds stereo consumers without duplicating
    /// storage.
    pub fn plane(&self, channel: usize) -> &[f32] {
        let ch = channel.min(self.planes - 1);
        &self.buffers[ch].as_slice()[..self.frames]
    }

    /// Mutable samples of one channel, limited to the valid frames.
    pub fn plane_mut(&mut self, channel: usize) -> &mut [f32] {
        let ch = channel.min(self.planes - 1);
        &mut self.buffers[ch].as_mut_slice()[..self.frames]
    }

    /// Both channel planes mutably. Requires two independent planes.
    pub fn stereo_planes_mut(&mut self) -> Result<(&mut [f32], &mut [f32])> {
        if self.channels != 2 || self.planes != 2 {
            return Err(CoreError::NotStereo {
                channels: self.channels,
                planes: self.planes,
            });
        }
        let frames = self.frames;
        let (left, right) = self.buffers.split_at_mut(1);
        Ok((
            &mut left[0].as_mut_slice()[..frames],
            &mut right[0].as_mut_slice()[..frames],
        ))
    }

    /// Reconcile the advertised channel count with a desired layout.
    ///
    /// Mapping mono to stereo aliases the single plane instead of copying;
    /// the duplication happens wherever the second channel is consumed.
    /// Mapping stereo to mono keeps the left plane.
    pub fn map_channels(&mut self, channels: usize) -> Result<()> {
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(CoreError::InvalidChannelCount(channels));
        }
        self.channels = channels;
        self.planes = self.planes.min(channels);
        Ok(())
    }

    /// Append up to `frames` frames from `source`, adopting its channel
    /// count. The requested count is clamped to what `source` holds; the
    /// number of frames copied is returned.
    ///
    /// Appending from a mono source mapped to stereo materializes the
    /// duplicated plane in `self`.
    pub fn append(&mut self, source: &Stream, frames: usize) -> Result<usize> {
        let frames = frames.min(source.frames);
        self.channels = source.channels;
        self.planes = source.channels;
        self.resize(self.frames + frames)?;
        for ch in 0..self.planes {
            let src = &source.plane(ch)[..frames];
            self.buffers[ch].as_mut_slice()[self.frames..self.frames + frames]
                .copy_from_slice(src);
        }
        self.frames += frames;
        Ok(frames)
    }

    /// Append planar sample data, adopting `planes.len()` as the channel
    /// count. All planes must be the same length.
    pub fn append_planes(&mut self, planes: &[&[f32]]) -> Result<usize> {
        if planes.is_empty() || planes.len() > MAX_CHANNELS {
            return Err(CoreError::InvalidChannelCount(planes.len()));
        }
        let frames = planes[0].len();
        if planes.iter().any(|p| p.len() != frames) {
            return Err(CoreError::FrameRange {
                offset: 0,
                frames,
                max_frames: planes.iter().map(|p| p.len()).min().unwrap_or(0),
            });
        }
        self.channels = planes.len();
        self.planes = planes.len();
        self.resize(self.frames + frames)?;
        for (ch, src) in planes.iter().enumerate() {
            self.buffers[ch].as_mut_slice()[self.frames..self.frames + frames]
                .copy_from_slice(src);
        }
        self.frames += frames;
        Ok(frames)
    }

    /// Convert interleaved 16-bit samples to float and append them.
    pub fn append_interleaved_i16(&mut self, data: &[i16], channels: usize) -> Result<()> {
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(CoreError::InvalidChannelCount(channels));
        }
        let frames = data.len() / channels;
        self.channels = channels;
        self.planes = channels;
        self.resize(self.frames + frames)?;
        let offset = self.frames;
        if channels == 1 {
            convert::i16_to_float_mono(
                &data[..frames],
                &mut self.buffers[0].as_mut_slice()[offset..offset + frames],
            );
        } else {
            let (left, right) = self.buffers.split_at_mut(1);
            convert::i16_to_float(
                &data[..frames * 2],
                &mut left[0].as_mut_slice()[offset..offset + frames],
                &mut right[0].as_mut_slice()[offset..offset + frames],
            );
        }
        self.frames += frames;
        Ok(())
    }

    /// Deinterleave float samples and append them.
    pub fn append_interleaved_f32(&mut self, data: &[f32], channels: usize) -> Result<()> {
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(CoreError::InvalidChannelCount(channels));
        }
        let frames = data.len() / channels;
        self.channels = channels;
        self.planes = channels;
        self.resize(self.frames + frames)?;
        let offset = self.frames;
        if channels == 1 {
            self.buffers[0].as_mut_slice()[offset..offset + frames]
                .copy_from_slice(&data[..frames]);
        } else {
            let (left, right) = self.buffers.split_at_mut(1);
            convert::deinterleave(
                &data[..frames * 2],
                &mut left[0].as_mut_slice()[offset..offset + frames],
                &mut right[0].as_mut_slice()[offset..offset + frames],
            );
        }
        self.frames += frames;
        Ok(())
    }

    /// Remove up to `frames` frames from the front of the stream, shifting
    /// the remainder down in every plane. The count is clamped to what the
    /// stream holds; the number of frames removed is returned.
    pub fn drop_front(&mut self, frames: usize) -> usize {
        let frames = frames.min(self.frames);
        let remaining = self.frames - frames;
        if remaining > 0 {
            for buffer in self.buffers.iter_mut().take(self.planes) {
                buffer
                    .as_mut_slice()
                    .copy_within(frames..frames + remaining, 0);
            }
        }
        self.frames = remaining;
        frames
    }

    /// Zero-fill `frames` frames starting at `offset` in every plane and set
    /// the logical frame count to `offset + frames`.
    ///
    /// The window must fit the allocated capacity; callers must not rely on
    /// clamping here.
    pub fn zero(&mut self, offset: usize, frames: usize) -> Result<()> {
        let end = offset
            .checked_add(frames)
            .filter(|end| *end <= self.max_frames)
            .ok_or(CoreError::FrameRange {
                offset,
                frames,
                max_frames: self.max_frames,
            })?;
        for buffer in self.buffers.iter_mut().take(self.planes) {
            buffer.as_mut_slice()[offset..end].fill(0.0);
        }
        self.frames = end;
        Ok(())
    }
}
