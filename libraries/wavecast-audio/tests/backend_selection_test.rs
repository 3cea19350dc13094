//! Backend selection protocol tests
//!
//! The registry must probe backends in priority order, fall through on any
//! failure, pick the same backend for the same input every time, and report
//! the originating backend through the track flags.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use wavecast_audio::decoder::{DecoderBackend, DecoderRegistry};
use wavecast_audio::AudioError;
use wavecast_core::{Decoder, Stream, TrackFlags, TrackInfo};

type ProbeLog = Rc<RefCell<Vec<&'static str>>>;

struct StubBackend {
    name: &'static str,
    accepts: bool,
    flags: TrackFlags,
    log: ProbeLog,
}

impl DecoderBackend for StubBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn open(
        &self,
        _path: &Path,
        _target_rate: u32,
    ) -> wavecast_audio::Result<Box<dyn Decoder>> {
        self.log.borrow_mut().push(self.name);
        if self.accepts {
            Ok(Box::new(StubDecoder { flags: self.flags }))
        } else {
            Err(AudioError::UnsupportedFormat("not mine".into()))
        }
    }
}

struct StubDecoder {
    flags: TrackFlags,
}

impl Decoder for StubDecoder {
    fn info(&self) -> TrackInfo {
        TrackInfo {
            sample_rate: 44_100,
            channels: 2,
            frames: 0,
            bitrate: 0,
            codec: "stub".into(),
            flags: self.flags,
        }
    }

    fn decode(&mut self, output: &mut Stream, _target_rate: u32) -> wavecast_core::Result<()> {
        output.end_of_stream = true;
        Ok(())
    }

    fn metadata(&self, _key: &str) -> Option<String> {
        None
    }
}

fn two_backend_registry(log: &ProbeLog, first_accepts: bool) -> DecoderRegistry {
    let mut registry = DecoderRegistry::new();
    registry.push(Box::new(StubBackend {
        name: "first",
        accepts: first_accepts,
        flags: TrackFlags::NATIVE,
        log: Rc::clone(log),
    }));
    registry.push(Box::new(StubBackend {
        name: "second",
        accepts: true,
        flags: TrackFlags::SYMPHONIA,
        log: Rc::clone(log),
    }));
    registry
}

#[test]
fn falls_through_to_the_second_backend() {
    let log: ProbeLog = Rc::default();
    let registry = two_backend_registry(&log, false);

    let decoder = registry.open(Path::new("track.xyz"), 44_100).unwrap();
    assert_eq!(*log.borrow(), ["first", "second"]);
    assert!(decoder.info().flags.contains(TrackFlags::SYMPHONIA));
    assert!(!decoder.info().flags.contains(TrackFlags::NATIVE));
}

#[test]
fn first_backend_wins_when_it_accepts() {
    let log: ProbeLog = Rc::default();
    let registry = two_backend_registry(&log, true);

    let decoder = registry.open(Path::new("track.xyz"), 44_100).unwrap();
    assert_eq!(*log.borrow(), ["first"]);
    assert!(decoder.info().flags.contains(TrackFlags::NATIVE));
}

#[test]
fn selection_is_idempotent() {
    let log: ProbeLog = Rc::default();
    let registry = two_backend_registry(&log, false);

    let first = registry.open(Path::new("track.xyz"), 44_100).unwrap();
    let second = registry.open(Path::new("track.xyz"), 44_100).unwrap();
    assert_eq!(first.info().flags, second.info().flags);
    assert_eq!(*log.borrow(), ["first", "second", "first", "second"]);
}

#[test]
fn exhausted_registry_reports_unknown_format() {
    let mut registry = DecoderRegistry::new();
    let log: ProbeLog = Rc::default();
    registry.push(Box::new(StubBackend {
        name: "only",
        accepts: false,
        flags: TrackFlags::empty(),
        log,
    }));

    let err = registry.open(Path::new("track.xyz"), 44_100).unwrap_err();
    assert!(matches!(err, AudioError::UnknownFormat(_)));
}

#[test]
fn default_registry_ends_with_symphonia() {
    let registry = DecoderRegistry::with_defaults();
    let names = registry.names();
    assert_eq!(names.last(), Some(&"symphonia"));
}
