//! Native decoder backend
//!
//! Binds the proprietary BASS decoder library (`libbass.so`) at runtime with
//! `libloading`. The library covers the module/chiptune formats (MOD, XM, IT,
//! S3M, ...) the multimedia backend cannot handle, plus the usual sampled
//! formats. When the shared library cannot be located or is missing symbols,
//! the backend reports itself unavailable and the registry falls through.
//!
//! All library state lives in an explicit [`BassContext`]; there is no
//! process-global handle.

#![allow(unsafe_code)]

use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use tracing::debug;

use wavecast_core::{CoreError, Decoder, Stream, TrackFlags, TrackInfo};

use crate::decoder::DecoderBackend;
use crate::error::{AudioError, Result};

/// Environment variable overriding the library search path.
pub const LIBRARY_DIR_VAR: &str = "WAVECAST_BASS_DIR";

const SAMPLE_FLOAT: u32 = 0x100;
const STREAM_DECODE: u32 = 0x20_0000;
const MUSIC_DECODE: u32 = 0x20_0000;
const MUSIC_PRESCAN: u32 = 0x2_0000;
const MUSIC_RAMPS: u32 = 0x400;
const POS_BYTE: u32 = 0;
const FILEPOS_END: u32 = 2;
const ERROR_ENDED: c_int = 45;

const TAG_OGG: u32 = 2;
const TAG_APE: u32 = 6;
const TAG_MUSIC_NAME: u32 = 0x1_0000;
const TAG_MUSIC_AUTH: u32 = 0x1_0001;

const CTYPE_STREAM_OGG: u32 = 0x1_0002;
const CTYPE_STREAM_MP1: u32 = 0x1_0003;
const CTYPE_STREAM_MP2: u32 = 0x1_0004;
const CTYPE_STREAM_MP3: u32 = 0x1_0005;
const CTYPE_STREAM_AIFF: u32 = 0x1_0006;
const CTYPE_STREAM_WAV: u32 = 0x4_0000;
const CTYPE_MUSIC_MOD: u32 = 0x2_0000;
const CTYPE_MUSIC_MTM: u32 = 0x2_0001;
const CTYPE_MUSIC_S3M: u32 = 0x2_0002;
const CTYPE_MUSIC_XM: u32 = 0x2_0003;
const CTYPE_MUSIC_IT: u32 = 0x2_0004;

/// Frames fetched per decode call.
const CHUNK_FRAMES: usize = 4096;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct ChannelInfo {
    freq: u32,
    chans: u32,
    flags: u32,
    ctype: u32,
    origres: u32,
    plugin: u32,
    sample: u32,
    filename: *const c_char,
}

impl Default for ChannelInfo {
    fn default() -> Self {
        Self {
            freq: 0,
            chans: 0,
            flags: 0,
            ctype: 0,
            origres: 0,
            plugin: 0,
            sample: 0,
            filename: std::ptr::null(),
        }
    }
}

type InitFn = unsafe extern "C" fn(c_int, u32, u32, *mut c_void, *const c_void) -> c_int;
type ErrorGetCodeFn = unsafe extern "C" fn() -> c_int;
type StreamCreateFileFn = unsafe extern "C" fn(c_int, *const c_void, u64, u64, u32) -> u32;
type StreamFreeFn = unsafe extern "C" fn(u32) -> c_int;
type StreamGetFilePositionFn = unsafe extern "C" fn(u32, u32) -> u64;
type MusicLoadFn = unsafe extern "C" fn(c_int, *const c_void, u64, u32, u32, u32) -> u32;
type MusicFreeFn = unsafe extern "C" fn(u32) -> c_int;
type ChannelGetInfoFn = unsafe extern "C" fn(u32, *mut ChannelInfo) -> c_int;
type ChannelGetDataFn = unsafe extern "C" fn(u32, *mut c_void, u32) -> u32;
type ChannelGetLengthFn = unsafe extern "C" fn(u32, u32) -> u64;
type ChannelGetTagsFn = unsafe extern "C" fn(u32, u32) -> *const c_char;

/// Resolved symbol table of the loaded library.
struct BassLibrary {
    _lib: Library,
    init: InitFn,
    error_get_code: ErrorGetCodeFn,
    stream_create_file: StreamCreateFileFn,
    stream_free: StreamFreeFn,
    stream_get_file_position: StreamGetFilePositionFn,
    music_load: MusicLoadFn,
    music_free: MusicFreeFn,
    channel_get_info: ChannelGetInfoFn,
    channel_get_data: ChannelGetDataFn,
    channel_get_length: ChannelGetLengthFn,
    channel_get_tags: ChannelGetTagsFn,
}

impl BassLibrary {
    unsafe fn load(path: &Path) -> Result<Self> {
        let lib = Library::new(path)
            .map_err(|e| AudioError::BackendUnavailable(format!("load failed: {e}")))?;
        macro_rules! sym {
            ($ty:ty, $name:literal) => {
                *lib.get::<$ty>($name)
                    .map_err(|e| AudioError::BackendUnavailable(format!("missing symbol: {e}")))?
            };
        }
        Ok(Self {
            init: sym!(InitFn, b"BASS_Init\0"),
            error_get_code: sym!(ErrorGetCodeFn, b"BASS_ErrorGetCode\0"),
            stream_create_file: sym!(StreamCreateFileFn, b"BASS_StreamCreateFile\0"),
            stream_free: sym!(StreamFreeFn, b"BASS_StreamFree\0"),
            stream_get_file_position: sym!(StreamGetFilePositionFn, b"BASS_StreamGetFilePosition\0"),
            music_load: sym!(MusicLoadFn, b"BASS_MusicLoad\0"),
            music_free: sym!(MusicFreeFn, b"BASS_MusicFree\0"),
            channel_get_info: sym!(ChannelGetInfoFn, b"BASS_ChannelGetInfo\0"),
            channel_get_data: sym!(ChannelGetDataFn, b"BASS_ChannelGetData\0"),
            channel_get_length: sym!(ChannelGetLengthFn, b"BASS_ChannelGetLength\0"),
            channel_get_tags: sym!(ChannelGetTagsFn, b"BASS_ChannelGetTags\0"),
            _lib: lib,
        })
    }

    fn error_code(&self) -> c_int {
        unsafe { (self.error_get_code)() }
    }
}

fn library_names() -> &'static [&'static str] {
    if cfg!(target_os = "windows") {
        &["bass.dll"]
    } else if cfg!(target_os = "macos") {
        &["libbass.dylib"]
    } else {
        &["libbass.so"]
    }
}

fn library_candidates() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(dir) = std::env::var(LIBRARY_DIR_VAR) {
        dirs.push(PathBuf::from(dir));
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            dirs.push(dir.to_path_buf());
            dirs.push(dir.join("bass"));
        }
    }
    dirs.push(PathBuf::from("/usr/local/lib"));
    dirs.push(PathBuf::from("/usr/lib"));

    let mut candidates = Vec::new();
    for dir in dirs {
        for name in library_names() {
            candidates.push(dir.join(name));
        }
    }
    candidates
}

/// Loaded native library, constructed once and shared by the backend and the
/// decoders it creates.
#[derive(Clone)]
pub struct BassContext {
    lib: Arc<BassLibrary>,
}

impl BassContext {
    /// Locate the shared library, resolve its symbols and initialize the
    /// "no sound" device used for decoding.
    ///
    /// # Errors
    /// [`AudioError::BackendUnavailable`] when no candidate loads.
    pub fn locate() -> Result<Self> {
        for candidate in library_candidates() {
            match unsafe { BassLibrary::load(&candidate) } {
                Ok(lib) => {
                    debug!(path = %candidate.display(), "native decoder library loaded");
                    return Self::initialize(lib);
                }
                Err(err) => debug!(path = %candidate.display(), error = %err, "candidate rejected"),
            }
        }
        Err(AudioError::BackendUnavailable(
            "no usable native decoder library found".into(),
        ))
    }

    fn initialize(lib: BassLibrary) -> Result<Self> {
        // device 0 is the "no sound" device, all output goes through
        // ChannelGetData
        let ok = unsafe { (lib.init)(0, 44_100, 0, std::ptr::null_mut(), std::ptr::null()) };
        // code 14: device already initialized, which is fine for a decoder
        if ok == 0 && lib.error_code() != 14 {
            return Err(AudioError::BackendUnavailable(format!(
                "device init failed (code {})",
                lib.error_code()
            )));
        }
        Ok(Self { lib: Arc::new(lib) })
    }
}

/// Backend creating [`BassDecoder`] instances from a [`BassContext`].
pub struct BassBackend {
    context: BassContext,
}

impl BassBackend {
    pub fn new(context: BassContext) -> Self {
        Self { context }
    }
}

impl DecoderBackend for BassBackend {
    fn name(&self) -> &'static str {
        "bass"
    }

    fn open(&self, path: &Path, target_rate: u32) -> Result<Box<dyn Decoder>> {
        Ok(Box::new(BassDecoder::open(
            self.context.clone(),
            path,
            target_rate,
        )?))
    }
}

/// Decoder over one channel handle of the native library.
pub struct BassDecoder {
    lib: Arc<BassLibrary>,
    handle: u32,
    is_music: bool,
    info: TrackInfo,
    finished: bool,
}

impl BassDecoder {
    fn open(context: BassContext, path: &Path, target_rate: u32) -> Result<Self> {
        let lib = context.lib;
        let cpath = CString::new(path.as_os_str().as_encoded_bytes())
            .map_err(|_| AudioError::UnsupportedFormat("path contains NUL".into()))?;

        // sampled formats first; on failure fall back to the module loader,
        // which mixes at the pipeline rate
        let mut is_music = false;
        let mut handle = unsafe {
            (lib.stream_create_file)(
                0,
                cpath.as_ptr().cast::<c_void>(),
                0,
                0,
                STREAM_DECODE | SAMPLE_FLOAT,
            )
        };
        if handle == 0 {
            handle = unsafe {
                (lib.music_load)(
                    0,
                    cpath.as_ptr().cast::<c_void>(),
                    0,
                    0,
                    MUSIC_DECODE | MUSIC_PRESCAN | MUSIC_RAMPS | SAMPLE_FLOAT,
                    target_rate,
                )
            };
            is_music = true;
        }
        if handle == 0 {
            return Err(AudioError::UnsupportedFormat(format!(
                "not recognized (code {})",
                lib.error_code()
            )));
        }

        let mut raw = ChannelInfo::default();
        let ok = unsafe { (lib.channel_get_info)(handle, &mut raw) };
        if ok == 0 || raw.chans == 0 || raw.chans as usize > wavecast_core::MAX_CHANNELS {
            release(&lib, handle, is_music);
            return Err(AudioError::UnsupportedFormat(format!(
                "{} channels at {} Hz",
                raw.chans, raw.freq
            )));
        }

        let channels = raw.chans as usize;
        let byte_length = unsafe { (lib.channel_get_length)(handle, POS_BYTE) };
        let frames = if byte_length == u64::MAX {
            0
        } else {
            byte_length / (channels as u64 * 4)
        };

        let mut flags = TrackFlags::NATIVE;
        if is_music {
            // module playback length depends on the mix, the prescan only
            // estimates it
            flags |= TrackFlags::MODULE | TrackFlags::LENGTH_ESTIMATED;
        }

        let duration = if raw.freq > 0 {
            frames as f64 / f64::from(raw.freq)
        } else {
            0.0
        };
        let bitrate = if is_music || duration <= 0.0 {
            0
        } else {
            let file_bytes = unsafe { (lib.stream_get_file_position)(handle, FILEPOS_END) };
            if file_bytes == u64::MAX {
                0
            } else {
                ((file_bytes as f64 * 8.0) / (duration * 1000.0)).round() as u32
            }
        };

        let info = TrackInfo {
            sample_rate: raw.freq,
            channels,
            frames,
            bitrate,
            codec: codec_name(raw.ctype).to_owned(),
            flags,
        };

        Ok(Self {
            lib,
            handle,
            is_music,
            info,
            finished: false,
        })
    }

    fn tag_block(&self, kind: u32) -> Option<Vec<(String, String)>> {
        let raw = unsafe { (self.lib.channel_get_tags)(self.handle, kind) };
        if raw.is_null() {
            return None;
        }
        // the tag block is a run of NUL-terminated "KEY=value" strings with
        // an empty string as terminator
        let mut tags = Vec::new();
        let mut cursor = raw;
        loop {
            let entry = unsafe { CStr::from_ptr(cursor) };
            let bytes = entry.to_bytes();
            if bytes.is_empty() {
                break;
            }
            let text = String::from_utf8_lossy(bytes);
            if let Some((key, value)) = text.split_once('=') {
                tags.push((key.to_ascii_lowercase(), value.to_owned()));
            }
            cursor = unsafe { cursor.add(bytes.len() + 1) };
        }
        Some(tags)
    }

    fn tag_string(&self, kind: u32) -> Option<String> {
        let raw = unsafe { (self.lib.channel_get_tags)(self.handle, kind) };
        if raw.is_null() {
            return None;
        }
        let text = unsafe { CStr::from_ptr(raw) }.to_string_lossy();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_owned())
    }
}

impl Decoder for BassDecoder {
    fn info(&self) -> TrackInfo {
        self.info.clone()
    }

    fn decode(&mut self, output: &mut Stream, _target_rate: u32) -> wavecast_core::Result<()> {
        if self.finished {
            output.end_of_stream = true;
            return Ok(());
        }
        let channels = self.info.channels;
        let mut scratch = vec![0.0f32; CHUNK_FRAMES * channels];
        let bytes = (scratch.len() * 4) as u32;
        let got = unsafe {
            (self.lib.channel_get_data)(self.handle, scratch.as_mut_ptr().cast::<c_void>(), bytes)
        };
        if got == u32::MAX {
            self.finished = true;
            output.end_of_stream = true;
            let code = self.lib.error_code();
            if code != ERROR_ENDED {
                return Err(CoreError::decode(format!(
                    "native decode failed (code {code})"
                )));
            }
            return Ok(());
        }
        let samples = got as usize / 4;
        output.append_interleaved_f32(&scratch[..samples], channels)?;
        Ok(())
    }

    fn metadata(&self, key: &str) -> Option<String> {
        if self.is_music {
            return match key.to_ascii_lowercase().as_str() {
                "title" => self.tag_string(TAG_MUSIC_NAME),
                "artist" => self.tag_string(TAG_MUSIC_AUTH),
                _ => None,
            };
        }
        for kind in [TAG_OGG, TAG_APE] {
            if let Some(tags) = self.tag_block(kind) {
                if let Some((_, value)) =
                    tags.iter().find(|(tag, _)| tag.eq_ignore_ascii_case(key))
                {
                    return Some(value.clone());
                }
            }
        }
        None
    }
}

impl Drop for BassDecoder {
    fn drop(&mut self) {
        release(&self.lib, self.handle, self.is_music);
    }
}

fn release(lib: &BassLibrary, handle: u32, is_music: bool) {
    unsafe {
        if is_music {
            (lib.music_free)(handle);
        } else {
            (lib.stream_free)(handle);
        }
    }
}

fn codec_name(ctype: u32) -> &'static str {
    match ctype {
        CTYPE_STREAM_OGG => "ogg",
        CTYPE_STREAM_MP1 => "mp1",
        CTYPE_STREAM_MP2 => "mp2",
        CTYPE_STREAM_MP3 => "mp3",
        CTYPE_STREAM_AIFF => "aiff",
        CTYPE_STREAM_WAV => "wav",
        CTYPE_MUSIC_MOD => "mod",
        CTYPE_MUSIC_MTM => "mtm",
        CTYPE_MUSIC_S3M => "s3m",
        CTYPE_MUSIC_XM => "xm",
        CTYPE_MUSIC_IT => "it",
        _ => "stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_list_covers_system_directories() {
        let candidates = library_candidates();
        assert!(!candidates.is_empty());
        assert!(candidates.iter().any(|p| p.starts_with("/usr/lib")));
        assert!(candidates.iter().any(|p| p.starts_with("/usr/local/lib")));
    }

    #[test]
    fn codec_names_cover_module_types() {
        assert_eq!(codec_name(CTYPE_MUSIC_XM), "xm");
        assert_eq!(codec_name(CTYPE_STREAM_MP3), "mp3");
        assert_eq!(codec_name(0xdead), "stream");
    }
}
