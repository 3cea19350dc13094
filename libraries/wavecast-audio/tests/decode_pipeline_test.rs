//! End-to-end decode pipeline tests
//!
//! Generates WAV fixtures on the fly, decodes them through the registry and
//! runs the decoded stream through the resampler and effects the way the
//! scan tool does.

use std::f32::consts::TAU;
use std::path::Path;

use wavecast_audio::decoder::DecoderRegistry;
use wavecast_audio::effects::{Fade, MixMatrix};
use wavecast_audio::resampling::Resampler;
use wavecast_core::{Decoder as _, Stream, TrackFlags};

const RATE: u32 = 44_100;

fn write_wav(path: &Path, channels: u16, frames: usize) {
    let spec = hound::WavSpec {
        channels,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..frames {
        let sample = ((i as f32 * 440.0 * TAU / RATE as f32).sin() * 0.5 * 32767.0) as i16;
        for _ in 0..channels {
            writer.write_sample(sample).unwrap();
        }
    }
    writer.finalize().unwrap();
}

fn decode_all(path: &Path) -> (Stream, wavecast_core::TrackInfo) {
    let registry = DecoderRegistry::with_defaults();
    let mut decoder = registry.open(path, RATE).unwrap();
    let info = decoder.info();

    let mut chunk = Stream::new(info.channels).unwrap();
    let mut all = Stream::new(info.channels).unwrap();
    while !chunk.end_of_stream {
        chunk.clear();
        decoder.decode(&mut chunk, RATE).unwrap();
        all.append(&chunk, chunk.frames()).unwrap();
    }
    (all, info)
}

#[test]
fn stereo_wav_decodes_through_the_registry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    write_wav(&path, 2, 22_050);

    let (stream, info) = decode_all(&path);
    assert_eq!(info.sample_rate, RATE);
    assert_eq!(info.channels, 2);
    assert!(info.flags.contains(TrackFlags::SYMPHONIA));
    assert_eq!(stream.frames(), 22_050);

    // the decoded tone matches the synthesized one
    let expected = (100.0 * 440.0 * TAU / RATE as f32).sin() * 0.5;
    assert!((stream.plane(0)[100] - expected).abs() < 1e-3);
    assert_eq!(stream.plane(0), stream.plane(1));
}

#[test]
fn mono_wav_feeds_a_stereo_consumer_without_copying() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mono.wav");
    write_wav(&path, 1, 4_096);

    let (mut stream, info) = decode_all(&path);
    assert_eq!(info.channels, 1);
    assert_eq!(stream.plane_count(), 1);

    stream.map_channels(2).unwrap();
    assert_eq!(stream.channels(), 2);
    assert_eq!(stream.plane_count(), 1);
    assert_eq!(stream.plane(0), stream.plane(1));
}

#[test]
fn decoded_audio_survives_a_resample_and_effect_chain() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chain.wav");
    write_wav(&path, 2, RATE as usize);

    let registry = DecoderRegistry::with_defaults();
    let mut decoder = registry.open(&path, RATE).unwrap();
    let info = decoder.info();

    let mut resampler = Resampler::new(info.channels, info.sample_rate, 48_000).unwrap();
    let mut fade = Fade::new(0, 48_000, 0.0, 1.0).unwrap();
    let mix = MixMatrix::SWAP;

    let mut decoded = Stream::new(info.channels).unwrap();
    let mut converted = Stream::new(info.channels).unwrap();
    let mut produced = 0usize;
    while !converted.end_of_stream {
        decoded.clear();
        converted.clear();
        decoder.decode(&mut decoded, RATE).unwrap();
        resampler.process(&decoded, &mut converted).unwrap();
        fade.apply(&mut converted);
        if converted.frames() > 0 {
            mix.apply(&mut converted).unwrap();
        }
        produced += converted.frames();
        assert!(converted.frames() <= converted.max_frames());
    }

    let drift = produced as i64 - 48_000;
    assert!(drift.abs() < 1_500, "produced {produced}");
    // the envelope advanced exactly once per produced frame
    assert_eq!(fade.current_frame(), produced as u64);
}

#[test]
fn unknown_file_is_rejected_by_every_backend() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("not-audio.bin");
    std::fs::write(&path, b"definitely not a supported container").unwrap();

    let registry = DecoderRegistry::with_defaults();
    assert!(registry.open(&path, RATE).is_err());
}
