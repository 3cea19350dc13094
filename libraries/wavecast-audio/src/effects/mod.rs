//! Stream effects
//!
//! Small transforms applied in place to a [`Stream`](wavecast_core::Stream):
//! a stateful linear fade envelope and a stateless stereo cross-mix.

mod fade;
mod mix;

pub use fade::Fade;
pub use mix::MixMatrix;
