//! Decoded-audio capture
//!
//! Writes the normalized stream either to a WAV file or as raw interleaved
//! f32 frames to stdout. The WAV sink emits the canonical 44-byte RIFF/WAVE
//! header (IEEE-float PCM, stereo, 4-byte samples) with the RIFF and data
//! sizes backpatched when the writer is finalized; downstream consumers
//! depend on exactly this layout, which rules out writers that switch to
//! WAVEFORMATEXTENSIBLE for 32-bit samples.

use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use anyhow::{ensure, Context, Result};
use wavecast_core::{convert, Stream};

/// Sink name selecting the raw stdout mode.
pub const STDOUT: &str = "stdout";

const HEADER_LEN: u32 = 44;
const CHANNELS: u32 = 2;
const SAMPLE_BYTES: u32 = 4;

/// Capture sink for the decoded stream.
pub enum CaptureWriter {
    Wav(WavFileWriter),
    Raw(io::Stdout),
}

impl CaptureWriter {
    /// Open a capture sink: `stdout` for raw frames, anything else as a WAV
    /// file path.
    pub fn create(target: &str, sample_rate: u32) -> Result<Self> {
        if target == STDOUT {
            return Ok(Self::Raw(io::stdout()));
        }
        let writer = WavFileWriter::create(Path::new(target), sample_rate)
            .with_context(|| format!("cannot create {target}"))?;
        Ok(Self::Wav(writer))
    }

    /// Append a stream as interleaved stereo frames; a mono stream is
    /// duplicated into both channels at this point.
    pub fn write_stream(&mut self, stream: &Stream, scratch: &mut Vec<f32>) -> Result<()> {
        convert::interleave(stream.plane(0), stream.plane(1), scratch);
        match self {
            Self::Wav(writer) => writer.write_samples(scratch)?,
            Self::Raw(stdout) => {
                let mut handle = stdout.lock();
                for sample in scratch.iter() {
                    handle.write_all(&sample.to_le_bytes())?;
                }
            }
        }
        Ok(())
    }

    /// Close the sink, backpatching the WAV header sizes.
    pub fn finalize(self) -> Result<()> {
        match self {
            Self::Wav(writer) => writer.finalize(),
            Self::Raw(stdout) => {
                stdout.lock().flush()?;
                Ok(())
            }
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

/// IEEE-float stereo WAV file writer with a fixed 44-byte header.
pub struct WavFileWriter {
    writer: BufWriter<File>,
    data_bytes: u32,
}

impl WavFileWriter {
    fn create(path: &Path, sample_rate: u32) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(b"RIFF")?;
        writer.write_all(&0u32.to_le_bytes())?; // filled on finalize
        writer.write_all(b"WAVE")?;
        writer.write_all(b"fmt ")?;
        writer.write_all(&16u32.to_le_bytes())?;
        writer.write_all(&3u16.to_le_bytes())?; // IEEE float
        writer.write_all(&(CHANNELS as u16).to_le_bytes())?;
        writer.write_all(&sample_rate.to_le_bytes())?;
        writer.write_all(&(sample_rate * CHANNELS * SAMPLE_BYTES).to_le_bytes())?;
        writer.write_all(&((CHANNELS * SAMPLE_BYTES) as u16).to_le_bytes())?;
        writer.write_all(&((SAMPLE_BYTES * 8) as u16).to_le_bytes())?;
        writer.write_all(b"data")?;
        writer.write_all(&0u32.to_le_bytes())?; // filled on finalize

        ensure!(
            writer.stream_position()? == u64::from(HEADER_LEN),
            "wav header has the wrong length"
        );
        Ok(Self {
            writer,
            data_bytes: 0,
        })
    }

    fn write_samples(&mut self, samples: &[f32]) -> Result<()> {
        for sample in samples {
            self.writer.write_all(&sample.to_le_bytes())?;
        }
        self.data_bytes += samples.len() as u32 * SAMPLE_BYTES;
        Ok(())
    }

    fn finalize(mut self) -> Result<()> {
        let riff_size = HEADER_LEN - 8 + self.data_bytes;
        self.writer.seek(SeekFrom::Start(4))?;
        self.writer.write_all(&riff_size.to_le_bytes())?;
        self.writer.seek(SeekFrom::Start(40))?;
        self.writer.write_all(&self.data_bytes.to_le_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(channels: usize, frames: usize) -> Stream {
        let mut s = Stream::new(channels).unwrap();
        s.resize(frames).unwrap();
        s.zero(0, frames).unwrap();
        for ch in 0..channels {
            for (i, sample) in s.plane_mut(ch).iter_mut().enumerate() {
                *sample = (i as f32 / frames as f32) - 0.5;
            }
        }
        s
    }

    #[test]
    fn wav_capture_produces_a_canonical_float_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.wav");
        let mut writer = CaptureWriter::create(path.to_str().unwrap(), 44_100).unwrap();
        let mut scratch = Vec::new();
        writer.write_stream(&tone(2, 128), &mut scratch).unwrap();
        writer.finalize().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 44 + 128 * 2 * 4);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        // fmt chunk: 16 bytes, IEEE float (3), 2 channels, 44100 Hz
        assert_eq!(u32::from_le_bytes(bytes[16..20].try_into().unwrap()), 16);
        assert_eq!(u16::from_le_bytes(bytes[20..22].try_into().unwrap()), 3);
        assert_eq!(u16::from_le_bytes(bytes[22..24].try_into().unwrap()), 2);
        assert_eq!(
            u32::from_le_bytes(bytes[24..28].try_into().unwrap()),
            44_100
        );
        assert_eq!(&bytes[36..40], b"data");
        // backpatched sizes
        assert_eq!(
            u32::from_le_bytes(bytes[40..44].try_into().unwrap()),
            128 * 2 * 4
        );
        assert_eq!(
            u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize,
            bytes.len() - 8
        );
    }

    #[test]
    fn captured_samples_read_back_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.wav");
        let source = tone(2, 64);
        let mut writer = CaptureWriter::create(path.to_str().unwrap(), 44_100).unwrap();
        let mut scratch = Vec::new();
        writer.write_stream(&source, &mut scratch).unwrap();
        writer.finalize().unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 44_100);
        assert_eq!(reader.spec().sample_format, hound::SampleFormat::Float);
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 128);
        for (i, frame) in samples.chunks_exact(2).enumerate() {
            assert_eq!(frame[0], source.plane(0)[i]);
            assert_eq!(frame[1], source.plane(1)[i]);
        }
    }

    #[test]
    fn mono_streams_are_duplicated_into_both_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        let mut writer = CaptureWriter::create(path.to_str().unwrap(), 44_100).unwrap();
        let mut scratch = Vec::new();
        writer.write_stream(&tone(1, 16), &mut scratch).unwrap();
        writer.finalize().unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 32);
        for frame in samples.chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
        }
    }
}
