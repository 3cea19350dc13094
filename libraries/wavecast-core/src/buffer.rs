//! Aligned per-channel sample storage
//!
//! `SampleBuffer` owns the raw f32 storage backing one channel of a
//! [`Stream`](crate::Stream). Storage is kept 16-byte aligned by construction:
//! samples live in a `Vec` of `#[repr(align(16))]` four-sample blocks, so any
//! reallocation during growth lands on an aligned address and only the live
//! prefix is moved. Capacity never shrinks.

use crate::error::{CoreError, Result};

/// Alignment guarantee of sample storage, in bytes.
pub const SAMPLE_ALIGN: usize = 16;

const BLOCK_SAMPLES: usize = SAMPLE_ALIGN / std::mem::size_of::<f32>();

#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, Default)]
struct Block([f32; BLOCK_SAMPLES]);

/// Contiguous, 16-byte aligned storage for one channel's samples.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    blocks: Vec<Block>,
}

impl SampleBuffer {
    /// Create an empty buffer with no storage.
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Current capacity in samples.
    pub fn capacity(&self) -> usize {
        self.blocks.len() * BLOCK_SAMPLES
    }

    /// Grow capacity to hold at least `samples` samples.
    ///
    /// No-op when the buffer is already large enough; never shrinks.
    /// Allocation exhaustion is reported as [`CoreError::Allocation`]
    /// instead of aborting the process.
    pub fn grow(&mut self, samples: usize) -> Result<()> {
        let needed = samples.div_ceil(BLOCK_SAMPLES);
        if needed <= self.blocks.len() {
            return Ok(());
        }
        self.blocks
            .try_reserve_exact(needed - self.blocks.len())
            .map_err(|_| CoreError::Allocation { samples })?;
        self.blocks.resize(needed, Block::default());
        Ok(())
    }

    /// View the full capacity as a flat sample slice.
    #[allow(unsafe_code)]
    pub fn as_slice(&self) -> &[f32] {
        // Block is repr(C, align(16)) over [f32; 4]: the block array is a
        // contiguous, aligned run of f32 with no padding.
        unsafe {
            std::slice::from_raw_parts(
                self.blocks.as_ptr().cast::<f32>(),
                self.blocks.len() * BLOCK_SAMPLES,
            )
        }
    }

    /// Mutable view of the full capacity.
    #[allow(unsafe_code)]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        unsafe {
            std::slice::from_raw_parts_mut(
                self.blocks.as_mut_ptr().cast::<f32>(),
                self.blocks.len() * BLOCK_SAMPLES,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_empty() {
        let buf = SampleBuffer::new();
        assert_eq!(buf.capacity(), 0);
        assert!(buf.as_slice().is_empty());
    }

    #[test]
    fn grow_is_aligned() {
        let mut buf = SampleBuffer::new();
        buf.grow(1).unwrap();
        assert_eq!(buf.as_slice().as_ptr() as usize % SAMPLE_ALIGN, 0);
        assert!(buf.capacity() >= 1);
    }

    #[test]
    fn grow_is_monotonic() {
        let mut buf = SampleBuffer::new();
        buf.grow(1000).unwrap();
        let cap = buf.capacity();
        buf.grow(10).unwrap();
        assert_eq!(buf.capacity(), cap);
        buf.grow(2000).unwrap();
        assert!(buf.capacity() >= 2000);
    }

    #[test]
    fn grow_preserves_contents_and_alignment() {
        let mut buf = SampleBuffer::new();
        buf.grow(8).unwrap();
        for (i, s) in buf.as_mut_slice()[..8].iter_mut().enumerate() {
            *s = i as f32;
        }
        buf.grow(100_000).unwrap();
        assert_eq!(buf.as_slice().as_ptr() as usize % SAMPLE_ALIGN, 0);
        for (i, s) in buf.as_slice()[..8].iter().enumerate() {
            assert_eq!(*s, i as f32);
        }
    }
}
