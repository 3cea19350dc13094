//! Wavecast Core
//!
//! Core types and contracts shared across the Wavecast pipeline:
//!
//! - [`Stream`] / [`SampleBuffer`]: the aligned, planar f32 sample container
//!   every pipeline stage exchanges
//! - [`convert`]: pure sample-format conversion primitives
//! - [`Decoder`]: the capability contract decoder backends implement
//! - [`keyval`]: the `key = value` configuration text parser
//! - [`control`]: the synchronous control-socket client

mod buffer;
pub mod control;
pub mod convert;
mod error;
pub mod keyval;
mod stream;
mod traits;
mod types;

pub use buffer::{SampleBuffer, SAMPLE_ALIGN};
pub use control::ControlClient;
pub use error::{CoreError, Result};
pub use stream::{Stream, MAX_CHANNELS};
pub use traits::Decoder;
pub use types::{TrackFlags, TrackInfo};
