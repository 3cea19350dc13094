//! Symphonia decoder backend
//!
//! General multimedia backend handling the sampled formats (MP3, FLAC, OGG,
//! WAV, AAC). Decodes at the track's native rate; sample-rate conversion is
//! left to the caller. Lengths reported by container probing are treated as
//! estimates.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer as SymSampleBuffer;
use symphonia::core::codecs::{Decoder as SymDecoder, DecoderOptions};
use symphonia::core::errors::Error as SymError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, MetadataRevision, StandardTagKey};
use symphonia::core::probe::Hint;
use tracing::warn;

use wavecast_core::{CoreError, Decoder, Stream, TrackFlags, TrackInfo};

use crate::decoder::DecoderBackend;
use crate::error::{AudioError, Result};

/// Frames appended per decode call before control returns to the caller.
const CHUNK_FRAMES: usize = 4096;

/// Backend wrapper creating [`SymphoniaDecoder`] instances.
pub struct SymphoniaBackend;

impl SymphoniaBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SymphoniaBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoderBackend for SymphoniaBackend {
    fn name(&self) -> &'static str {
        "symphonia"
    }

    fn open(&self, path: &Path, _target_rate: u32) -> Result<Box<dyn Decoder>> {
        Ok(Box::new(SymphoniaDecoder::open(path)?))
    }
}

/// Streaming decoder over a probed symphonia format reader.
pub struct SymphoniaDecoder {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn SymDecoder>,
    track_id: u32,
    info: TrackInfo,
    tags: Vec<(String, String)>,
    sample_buf: Option<SymSampleBuffer<f32>>,
}

impl SymphoniaDecoder {
    /// Probe `path` and set up a decoder for its default track.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let mut probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| AudioError::UnsupportedFormat(format!("probe failed: {e}")))?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| AudioError::UnsupportedFormat("no audio tracks".into()))?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        let channels = params.channels.map(|c| c.count()).unwrap_or(0);
        if channels == 0 || channels > wavecast_core::MAX_CHANNELS {
            return Err(AudioError::UnsupportedFormat(format!(
                "{channels} channels"
            )));
        }
        let sample_rate = params.sample_rate.unwrap_or(0);
        if sample_rate == 0 {
            return Err(AudioError::UnsupportedFormat("missing sample rate".into()));
        }

        let codec = symphonia::default::get_codecs()
            .get_codec(params.codec)
            .map(|descriptor| descriptor.short_name.to_owned())
            .unwrap_or_else(|| "unknown".to_owned());

        let decoder = symphonia::default::get_codecs()
            .make(&params, &DecoderOptions::default())
            .map_err(|e| AudioError::UnsupportedFormat(format!("no codec: {e}")))?;

        // container lengths are best-effort; a full decode is the only exact
        // measure, so the frame count is flagged as an estimate
        let info = TrackInfo {
            sample_rate,
            channels,
            frames: params.n_frames.unwrap_or(0),
            bitrate: 0,
            codec,
            flags: TrackFlags::SYMPHONIA | TrackFlags::LENGTH_ESTIMATED,
        };

        let mut tags = Vec::new();
        if let Some(metadata) = probed.metadata.get() {
            if let Some(revision) = metadata.current() {
                collect_tags(revision, &mut tags);
            }
        }
        if let Some(revision) = format.metadata().current() {
            collect_tags(revision, &mut tags);
        }

        Ok(Self {
            format,
            decoder,
            track_id,
            info,
            tags,
            sample_buf: None,
        })
    }

    fn append_decoded(&mut self, output: &mut Stream) -> wavecast_core::Result<usize> {
        let Some(buf) = self.sample_buf.as_ref() else {
            return Ok(0);
        };
        let samples = buf.samples();
        let frames = samples.len() / self.info.channels;
        output.append_interleaved_f32(samples, self.info.channels)?;
        Ok(frames)
    }
}

impl Decoder for SymphoniaDecoder {
    fn info(&self) -> TrackInfo {
        self.info.clone()
    }

    fn decode(&mut self, output: &mut Stream, _target_rate: u32) -> wavecast_core::Result<()> {
        let mut appended = 0;
        while appended < CHUNK_FRAMES {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    output.end_of_stream = true;
                    break;
                }
                Err(SymError::ResetRequired) => {
                    self.decoder.reset();
                    continue;
                }
                Err(e) => return Err(CoreError::decode(format!("packet read failed: {e}"))),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymError::DecodeError(e)) => {
                    // bad frame, the stream continues at the next packet
                    warn!(error = e, "recoverable decode error");
                    continue;
                }
                Err(e) => return Err(CoreError::decode(e.to_string())),
            };

            if decoded.frames() == 0 {
                continue;
            }

            let needed = decoded.capacity() * self.info.channels;
            let stale = self
                .sample_buf
                .as_ref()
                .map(|buf| buf.capacity() < needed)
                .unwrap_or(true);
            if stale {
                self.sample_buf = Some(SymSampleBuffer::new(
                    decoded.capacity() as u64,
                    *decoded.spec(),
                ));
            }
            if let Some(buf) = self.sample_buf.as_mut() {
                buf.copy_interleaved_ref(decoded);
            }
            appended += self.append_decoded(output)?;
        }
        Ok(())
    }

    fn metadata(&self, key: &str) -> Option<String> {
        self.tags
            .iter()
            .find(|(tag, _)| tag.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.clone())
    }
}

fn collect_tags(revision: &MetadataRevision, tags: &mut Vec<(String, String)>) {
    for tag in revision.tags() {
        let key = match tag.std_key {
            Some(StandardTagKey::Artist) => "artist".to_owned(),
            Some(StandardTagKey::TrackTitle) => "title".to_owned(),
            Some(StandardTagKey::Album) => "album".to_owned(),
            Some(StandardTagKey::Genre) => "genre".to_owned(),
            Some(StandardTagKey::Date) => "date".to_owned(),
            _ => tag.key.to_ascii_lowercase(),
        };
        let value = tag.value.to_string();
        if !tags.iter().any(|(existing, _)| *existing == key) {
            tags.push((key, value));
        }
    }
}
