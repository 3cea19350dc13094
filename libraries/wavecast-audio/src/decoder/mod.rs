//! Decoder backends and backend selection
//!
//! Every backend implements [`DecoderBackend`]; the [`DecoderRegistry`] holds
//! them in priority order and opens an input by probing each backend in turn,
//! falling through on any failure. Selection is deterministic: the same
//! registry always picks the same backend for the same input.

#[cfg(feature = "bass")]
pub mod bass;
mod symphonia;

pub use self::symphonia::{SymphoniaBackend, SymphoniaDecoder};
#[cfg(feature = "bass")]
pub use bass::{BassBackend, BassContext};

use std::path::Path;

use tracing::debug;
use wavecast_core::Decoder;

use crate::error::{AudioError, Result};

/// A concrete decoder implementation that can be probed for an input.
pub trait DecoderBackend {
    /// Short backend name used for selection logging.
    fn name(&self) -> &'static str;

    /// Try to load `path` with this backend.
    ///
    /// `target_rate` is the pipeline sample rate; backends that synthesize
    /// audio (module formats) mix at this rate, sampled formats ignore it.
    ///
    /// # Errors
    /// Any error means "this backend cannot handle the input" and makes the
    /// registry fall through to the next backend.
    fn open(&self, path: &Path, target_rate: u32) -> Result<Box<dyn Decoder>>;
}

/// Priority-ordered decoder backend list.
pub struct DecoderRegistry {
    backends: Vec<Box<dyn DecoderBackend>>,
}

impl DecoderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    /// Registry with the built-in backends in priority order: the native
    /// library shim first (when compiled in and locatable at runtime), then
    /// the symphonia backend.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        #[cfg(feature = "bass")]
        match bass::BassContext::locate() {
            Ok(context) => registry.push(Box::new(BassBackend::new(context))),
            Err(err) => debug!(error = %err, "native decoder unavailable"),
        }
        registry.push(Box::new(SymphoniaBackend::new()));
        registry
    }

    /// Append a backend with the lowest priority so far.
    pub fn push(&mut self, backend: Box<dyn DecoderBackend>) {
        self.backends.push(backend);
    }

    /// Backend names in probe order.
    pub fn names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Open `path` with the first backend that accepts it.
    ///
    /// # Errors
    /// [`AudioError::UnknownFormat`] when every backend declines.
    pub fn open(&self, path: &Path, target_rate: u32) -> Result<Box<dyn Decoder>> {
        for backend in &self.backends {
            match backend.open(path, target_rate) {
                Ok(decoder) => {
                    debug!(backend = backend.name(), path = %path.display(), "backend selected");
                    return Ok(decoder);
                }
                Err(err) => {
                    debug!(backend = backend.name(), error = %err, "backend declined input");
                }
            }
        }
        Err(AudioError::UnknownFormat(path.display().to_string()))
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
