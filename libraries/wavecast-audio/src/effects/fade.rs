//! Linear fade envelope
//!
//! A [`Fade`] ramps the stream amplitude linearly between two frame
//! positions. The envelope is stateful: it advances one step per frame
//! processed and keeps its position across calls, so chunked streams fade
//! continuously no matter how the frames are sliced.

use wavecast_core::Stream;

use crate::error::{AudioError, Result};

/// Linear amplitude ramp over an absolute frame range.
#[derive(Debug, Clone, Copy)]
pub struct Fade {
    start_frame: u64,
    end_frame: u64,
    current_frame: u64,
    amp: f32,
    amp_inc: f32,
    end_amp: f32,
}

impl Fade {
    /// Envelope ramping from `begin_amp` at `start_frame` to `end_amp` at
    /// `end_frame`. The range must be non-empty.
    pub fn new(start_frame: u64, end_frame: u64, begin_amp: f32, end_amp: f32) -> Result<Self> {
        if end_frame <= start_frame {
            return Err(AudioError::InvalidFadeRange {
                start_frame,
                end_frame,
            });
        }
        let amp_inc = (end_amp - begin_amp) / (end_frame - start_frame) as f32;
        Ok(Self {
            start_frame,
            end_frame,
            current_frame: start_frame,
            amp: begin_amp,
            amp_inc,
            end_amp,
        })
    }

    /// Current amplitude factor.
    pub fn amp(&self) -> f32 {
        self.amp
    }

    /// Absolute frame position of the envelope.
    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }

    /// Whether the ramp has reached its end; the amplitude stays clamped at
    /// the end value from here on.
    pub fn finished(&self) -> bool {
        self.current_frame >= self.end_frame
    }

    /// Scale every sample of `stream` by the envelope, advancing one step
    /// per frame.
    pub fn apply(&mut self, stream: &mut Stream) {
        let mut advanced = *self;
        for ch in 0..stream.plane_count() {
            // each plane replays the same amplitude sequence
            let mut env = *self;
            for sample in stream.plane_mut(ch) {
                *sample *= env.amp;
                env.step();
            }
            advanced = env;
        }
        *self = advanced;
    }

    fn step(&mut self) {
        self.current_frame += 1;
        if self.current_frame >= self.end_frame {
            self.amp = self.end_amp;
        } else {
            self.amp += self.amp_inc;
        }
    }
}
