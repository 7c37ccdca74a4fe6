//! Sample FIFO used by the block adapter.

use crate::block::Block;
use crate::FRAMES_PER_BLOCK;

/// A power-of-two ring buffer of samples with single-producer,
/// single-consumer semantics. The indices advance monotonically and are
/// masked on access, so the full capacity is usable.
///
/// Cross-thread block transport uses the channels in [`crate::publish`];
/// this ring is the in-order sample queue between an audio callback and
/// the fixed-size DSP loop.
pub struct RingBuffer {
    buffer: Vec<f32>,
    mask: usize,
    read_index: usize,
    write_index: usize,
}

impl RingBuffer {
    /// Create a ring holding at least `min_capacity` samples.
    pub fn with_capacity(min_capacity: usize) -> Self {
        let size = min_capacity.next_power_of_two().max(FRAMES_PER_BLOCK);
        Self {
            buffer: vec![0.0; size],
            mask: size - 1,
            read_index: 0,
            write_index: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Samples available for reading.
    pub fn read_available(&self) -> usize {
        self.write_index.wrapping_sub(self.read_index)
    }

    /// Space available for writing.
    pub fn write_available(&self) -> usize {
        self.capacity() - self.read_available()
    }

    /// Write as much of `src` as fits; returns the number written.
    pub fn write(&mut self, src: &[f32]) -> usize {
        let n = src.len().min(self.write_available());
        for &x in src[..n].iter() {
            self.buffer[self.write_index & self.mask] = x;
            self.write_index = self.write_index.wrapping_add(1);
        }
        n
    }

    /// Write one block; returns false if it did not fit.
    pub fn write_block(&mut self, block: &Block) -> bool {
        self.write(block.frames()) == FRAMES_PER_BLOCK
    }

    /// Read up to `dst.len()` samples; returns the number read. The
    /// remainder of `dst` is left untouched.
    pub fn read(&mut self, dst: &mut [f32]) -> usize {
        let n = dst.len().min(self.read_available());
        for x in dst[..n].iter_mut() {
            *x = self.buffer[self.read_index & self.mask];
            self.read_index = self.read_index.wrapping_add(1);
        }
        n
    }

    /// Read one block, zero-filling past any underrun.
    pub fn read_block(&mut self) -> Block {
        let mut block = Block::default();
        let n = self.read(block.frames_mut());
        for x in block.frames_mut()[n..].iter_mut() {
            *x = 0.0;
        }
        block
    }

    pub fn clear(&mut self) {
        self.read_index = 0;
        self.write_index = 0;
        self.buffer.fill(0.0);
    }
}
