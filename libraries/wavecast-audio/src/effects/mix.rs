//! Stereo cross-mix
//!
//! A [`MixMatrix`] is a static linear combination of the left and right
//! channels: `left' = left*ll + right*lr`, `right' = right*rr + left*rl`.
//! It has no state; reapplying it is only idempotent for the identity
//! coefficients.

use wavecast_core::Stream;

use crate::error::Result;

/// Four-coefficient stereo cross-mix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixMatrix {
    pub ll: f32,
    pub lr: f32,
    pub rr: f32,
    pub rl: f32,
}

impl MixMatrix {
    /// Pass-through coefficients.
    pub const IDENTITY: Self = Self {
        ll: 1.0,
        lr: 0.0,
        rr: 1.0,
        rl: 0.0,
    };

    /// Exchange the left and right channels.
    pub const SWAP: Self = Self {
        ll: 0.0,
        lr: 1.0,
        rr: 0.0,
        rl: 1.0,
    };

    pub fn new(ll: f32, lr: f32, rr: f32, rl: f32) -> Self {
        Self { ll, lr, rr, rl }
    }

    /// Equal-power mono fold-down of both channels.
    pub fn mono() -> Self {
        Self::new(0.5, 0.5, 0.5, 0.5)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Apply the cross-mix to `stream` in place.
    ///
    /// # Errors
    /// The stream must carry two independent channel planes.
    pub fn apply(&self, stream: &mut Stream) -> Result<()> {
        let (left, right) = stream.stereo_planes_mut()?;
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let original_left = *l;
            *l = original_left * self.ll + *r * self.lr;
            *r = *r * self.rr + original_left * self.rl;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo(frames: usize) -> Stream {
        let mut s = Stream::new(2).unwrap();
        s.resize(frames).unwrap();
        s.zero(0, frames).unwrap();
        for (i, sample) in s.plane_mut(0).iter_mut().enumerate() {
            *sample = 0.25 + i as f32 * 0.01;
        }
        for (i, sample) in s.plane_mut(1).iter_mut().enumerate() {
            *sample = -0.5 - i as f32 * 0.01;
        }
        s
    }

    #[test]
    fn identity_leaves_samples_untouched() {
        let mut stream = stereo(32);
        let left: Vec<f32> = stream.plane(0).to_vec();
        let right: Vec<f32> = stream.plane(1).to_vec();
        MixMatrix::IDENTITY.apply(&mut stream).unwrap();
        assert_eq!(stream.plane(0), left.as_slice());
        assert_eq!(stream.plane(1), right.as_slice());
        assert!(MixMatrix::IDENTITY.is_identity());
    }

    #[test]
    fn swap_exchanges_channels_exactly() {
        let mut stream = stereo(32);
        let left: Vec<f32> = stream.plane(0).to_vec();
        let right: Vec<f32> = stream.plane(1).to_vec();
        MixMatrix::SWAP.apply(&mut stream).unwrap();
        assert_eq!(stream.plane(0), right.as_slice());
        assert_eq!(stream.plane(1), left.as_slice());
    }

    #[test]
    fn cross_terms_use_the_original_left_sample() {
        let mut stream = Stream::new(2).unwrap();
        stream.resize(1).unwrap();
        stream.zero(0, 1).unwrap();
        stream.plane_mut(0)[0] = 0.5;
        stream.plane_mut(1)[0] = 0.25;

        // right' must mix the pre-transform left value
        MixMatrix::new(2.0, 0.0, 1.0, 1.0).apply(&mut stream).unwrap();
        assert_eq!(stream.plane(0)[0], 1.0);
        assert_eq!(stream.plane(1)[0], 0.75);
    }

    #[test]
    fn mono_streams_are_rejected() {
        let mut stream = Stream::new(1).unwrap();
        stream.resize(8).unwrap();
        stream.zero(0, 8).unwrap();
        assert!(MixMatrix::IDENTITY.apply(&mut stream).is_err());
    }
}
