//! Track-level types reported by decoder backends

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Property bitmask attached to [`TrackInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackFlags(u32);

impl TrackFlags {
    /// Decoded by the dynamically loaded native library.
    pub const NATIVE: Self = Self(1);
    /// Decoded by the symphonia backend.
    pub const SYMPHONIA: Self = Self(1 << 1);
    /// Module/chiptune source mixed by the decoder rather than sampled audio.
    pub const MODULE: Self = Self(1 << 2);
    /// Total frame count is an estimate, not an exact length.
    pub const LENGTH_ESTIMATED: Self = Self(1 << 3);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for TrackFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TrackFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Metadata a decoder reports about the loaded track.
///
/// Immutable once produced by a backend's load routine.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    /// Native sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count, 1 or 2.
    pub channels: usize,
    /// Total frame estimate; exactness is signalled via
    /// [`TrackFlags::LENGTH_ESTIMATED`].
    pub frames: u64,
    /// Average bitrate in kbit/s, 0 when the backend cannot tell.
    pub bitrate: u32,
    /// Short codec name, e.g. `mp3` or `xm`.
    pub codec: String,
    /// Originating backend and special properties.
    pub flags: TrackFlags,
}

impl TrackInfo {
    /// Track duration in seconds, derived from the frame estimate.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames as f64 / f64::from(self.sample_rate)
    }
}

impl fmt::Display for TrackInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} Hz, {} ch, {:.1} s",
            self.codec,
            self.sample_rate,
            self.channels,
            self.duration_secs()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_combine_and_test() {
        let flags = TrackFlags::NATIVE | TrackFlags::MODULE;
        assert!(flags.contains(TrackFlags::NATIVE));
        assert!(flags.contains(TrackFlags::MODULE));
        assert!(!flags.contains(TrackFlags::SYMPHONIA));
        assert!(TrackFlags::empty().contains(TrackFlags::empty()));
    }

    #[test]
    fn duration_from_frames() {
        let info = TrackInfo {
            sample_rate: 44_100,
            channels: 2,
            frames: 88_200,
            bitrate: 0,
            codec: "flac".into(),
            flags: TrackFlags::empty(),
        };
        assert!((info.duration_secs() - 2.0).abs() < 1e-9);
    }
}
