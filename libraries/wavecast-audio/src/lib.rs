//! Wavecast Audio
//!
//! Decoder backends, sample-rate conversion and DSP effects over the
//! [`wavecast_core::Stream`] container.
//!
//! This crate provides:
//! - Pluggable decoder backends behind the [`wavecast_core::Decoder`]
//!   contract, probed in priority order by [`decoder::DecoderRegistry`]
//!   (native library shim first, symphonia second)
//! - Streaming sample-rate conversion via [`resampling::Resampler`]
//! - In-place stream effects: linear [`effects::Fade`] envelope and the
//!   four-coefficient [`effects::MixMatrix`] stereo cross-mix
//!
//! # Example: decoding to a fixed rate
//!
//! ```rust,no_run
//! use std::path::Path;
//! use wavecast_audio::decoder::DecoderRegistry;
//! use wavecast_audio::resampling::Resampler;
//! use wavecast_core::{Decoder as _, Stream};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! const TARGET_RATE: u32 = 44_100;
//!
//! let registry = DecoderRegistry::with_defaults();
//! let mut decoder = registry.open(Path::new("/music/track.mp3"), TARGET_RATE)?;
//! let info = decoder.info();
//!
//! let mut decoded = Stream::new(info.channels)?;
//! let mut converted = Stream::new(info.channels)?;
//! let mut resampler = Resampler::new(info.channels, info.sample_rate, TARGET_RATE)?;
//!
//! while !converted.end_of_stream {
//!     decoded.clear();
//!     converted.clear();
//!     decoder.decode(&mut decoded, TARGET_RATE)?;
//!     resampler.process(&decoded, &mut converted)?;
//!     // feed `converted` to the consumer
//! }
//! # Ok(())
//! # }
//! ```

pub mod decoder;
pub mod effects;
mod error;
pub mod resampling;

pub use error::{AudioError, Result};
