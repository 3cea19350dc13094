/// Core traits for Wavecast
use crate::error::Result;
use crate::stream::Stream;
use crate::types::TrackInfo;

/// Capability contract every decoder backend implements.
///
/// A decoder is created by exactly one backend's load routine and driven by
/// a single thread: callers repeatedly [`decode`](Decoder::decode) into a
/// [`Stream`] until its `end_of_stream` flag is set. Callers are polymorphic
/// over this trait, never over a concrete backend type.
pub trait Decoder {
    /// Metadata about the loaded track.
    fn info(&self) -> TrackInfo;

    /// Decode the next chunk of audio, appending it to `output`.
    ///
    /// `target_rate` is the pipeline's desired sample rate; backends either
    /// mix to it internally (module formats) or decode at the track's native
    /// rate and leave the conversion to the caller. Sets
    /// `output.end_of_stream` when the track is exhausted.
    ///
    /// # Errors
    /// Returns an error on unrecoverable decode failure; the decode session
    /// is over at that point.
    fn decode(&mut self, output: &mut Stream, target_rate: u32) -> Result<()>;

    /// Look up a metadata tag, e.g. `artist` or `title`, by case-insensitive
    /// key. `None` when the tag is not present.
    fn metadata(&self, key: &str) -> Option<String>;
}
