//! Wavecast scan tool
//!
//! Decodes one track through the backend registry, normalizes it to the
//! pipeline sample rate, optionally captures the audio to WAV or stdout,
//! runs replay-gain analysis and prints `key:value` metadata lines for the
//! scheduler to ingest.

mod capture;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use capture::CaptureWriter;
use wavecast_audio::decoder::DecoderRegistry;
use wavecast_audio::resampling::Resampler;
use wavecast_core::{convert, Decoder as _, Stream, TrackFlags};
use wavecast_loudness::LoudnessAnalyzer;

/// Pipeline sample rate everything is normalized to.
const SAMPLE_RATE: u32 = 44_100;

/// Abort the scan when a track decodes longer than this, in seconds.
const MAX_LENGTH_SECONDS: u64 = 3600;

#[derive(Parser)]
#[command(name = "wavecast-scan")]
#[command(about = "Decode a track, analyze loudness and print its metadata", long_about = None)]
struct Cli {
    /// Input audio file
    file: PathBuf,

    /// Skip replay-gain analysis
    #[arg(short = 'r', long)]
    no_replaygain: bool,

    /// Write decoded audio to a WAV file, or raw float frames with "stdout"
    #[arg(short, long, value_name = "FILE|stdout")]
    output: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    run(Cli::parse())
}

fn run(cli: Cli) -> Result<()> {
    let registry = DecoderRegistry::with_defaults();
    let mut decoder = registry
        .open(&cli.file, SAMPLE_RATE)
        .with_context(|| format!("cannot open {}", cli.file.display()))?;
    let info = decoder.info();
    debug!(%info, "track opened");

    if info.sample_rate == 0 {
        bail!("improper sample rate");
    }
    if info.channels == 0 || info.channels > wavecast_core::MAX_CHANNELS {
        bail!("improper channel count");
    }

    let mut output = cli
        .output
        .as_deref()
        .map(|target| CaptureWriter::create(target, SAMPLE_RATE))
        .transpose()?;
    // raw capture streams to stdout, which the metadata lines would corrupt
    let raw_capture = output.as_ref().map(CaptureWriter::is_raw).unwrap_or(false);

    let analyze = !cli.no_replaygain && !raw_capture;
    let mut analyzer = analyze
        .then(|| LoudnessAnalyzer::new(SAMPLE_RATE, info.channels as u32))
        .transpose()
        .context("replay-gain analyzer")?;

    let mut resampler = (info.sample_rate != SAMPLE_RATE)
        .then(|| Resampler::new(info.channels, info.sample_rate, SAMPLE_RATE))
        .transpose()
        .context("sample-rate converter")?;

    // lengths from the general multimedia backend are estimates; decoding
    // the whole track is the only exact measure
    let decode_all = analyzer.is_some()
        || output.is_some()
        || info.flags.contains(TrackFlags::LENGTH_ESTIMATED);

    let mut decoded = Stream::new(info.channels)?;
    let mut converted = Stream::new(info.channels)?;
    let mut scratch = Vec::new();
    let mut total_frames = 0u64;

    if decode_all {
        loop {
            decoded.clear();
            decoder
                .decode(&mut decoded, SAMPLE_RATE)
                .context("decode failed")?;
            let stream = match resampler.as_mut() {
                Some(resampler) => {
                    converted.clear();
                    resampler.process(&decoded, &mut converted)?;
                    &converted
                }
                None => &decoded,
            };

            if let Some(analyzer) = analyzer.as_mut() {
                // the gating blocks work on whole sample pairs; feed an even
                // frame count
                let frames = stream.frames() & !1;
                if info.channels == 1 {
                    analyzer
                        .add_frames(&stream.plane(0)[..frames])
                        .context("replay-gain analysis")?;
                } else {
                    convert::interleave(
                        &stream.plane(0)[..frames],
                        &stream.plane(1)[..frames],
                        &mut scratch,
                    );
                    analyzer.add_frames(&scratch).context("replay-gain analysis")?;
                }
            }
            if let Some(writer) = output.as_mut() {
                writer.write_stream(stream, &mut scratch)?;
            }

            total_frames += stream.frames() as u64;
            if total_frames > MAX_LENGTH_SECONDS * u64::from(SAMPLE_RATE) {
                bail!("exceeded maximum length");
            }
            if stream.end_of_stream {
                break;
            }
        }
    }

    if let Some(writer) = output.take() {
        writer.finalize()?;
    }
    if raw_capture {
        return Ok(());
    }

    if let Some(artist) = decoder.metadata("artist") {
        println!("artist:{artist}");
    }
    if let Some(title) = decoder.metadata("title") {
        println!("title:{title}");
    }
    println!("type:{}", info.codec);

    let duration = if info.flags.contains(TrackFlags::LENGTH_ESTIMATED) {
        total_frames as f64 / f64::from(SAMPLE_RATE)
    } else {
        info.duration_secs()
    };
    println!("length:{duration:.6}");

    if let Some(analyzer) = analyzer.as_ref() {
        match analyzer.track_gain() {
            Ok(gain) => println!("replaygain:{:.6}", gain.gain_db),
            Err(err) => debug!(error = %err, "no replay-gain result"),
        }
    }

    if info.bitrate != 0 {
        println!("bitrate:{}", info.bitrate);
    } else if info.flags.contains(TrackFlags::SYMPHONIA) && duration > 0.0 {
        println!("bitrate:{}", estimated_bitrate(&cli.file, duration));
    }

    if !info.flags.contains(TrackFlags::MODULE) {
        println!("samplerate:{}", info.sample_rate);
    }

    Ok(())
}

/// Bitrate guess from the file size for backends that do not report one.
/// Off for containers with large non-audio payloads, but better than
/// nothing.
fn estimated_bitrate(path: &std::path::Path, duration: f64) -> u32 {
    let bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    ((bytes as f64 * 8.0) / (duration * 1000.0)).round() as u32
}
