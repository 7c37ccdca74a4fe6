//! Power-of-two resampling built on polyphase half-band filters.
//!
//! The half-band structure is due to fred harris, A. G. Constantinides
//! and Valenzuela: two chains of first-order allpasses form the
//! polyphase branches of a filter symmetric around fs/4. One stage
//! resamples by 2; cascades of stages resample by 2^octaves.

use crate::block::Block;
use crate::filter::{Allpass1, Kernel};
use crate::FRAMES_PER_BLOCK;

const HALF: usize = FRAMES_PER_BLOCK / 2;

/// Polyphase half-band filter: order 4, about 70 dB rejection, 0.1
/// transition band.
pub struct HalfBandFilter {
    apa0: Allpass1<f32>,
    apa1: Allpass1<f32>,
    apb0: Allpass1<f32>,
    apb1: Allpass1<f32>,
    b1: f32,
}

impl Default for HalfBandFilter {
    fn default() -> Self {
        Self {
            apa0: Allpass1::with_coefficient(0.079_866_426),
            apa1: Allpass1::with_coefficient(0.545_353_65),
            apb0: Allpass1::with_coefficient(0.283_829_34),
            apb1: Allpass1::with_coefficient(0.834_411_9),
            b1: 0.0,
        }
    }
}

impl HalfBandFilter {
    pub fn clear(&mut self) {
        self.apa0.clear();
        self.apa1.clear();
        self.apb0.clear();
        self.apb1.clear();
        self.b1 = 0.0;
    }

    /// Upsample the first half of `x` into a full block at 2x rate.
    pub fn upsample_first_half(&mut self, x: &Block) -> Block {
        self.upsample_range(x, 0)
    }

    /// Upsample the second half of `x` into a full block at 2x rate.
    pub fn upsample_second_half(&mut self, x: &Block) -> Block {
        self.upsample_range(x, HALF)
    }

    fn upsample_range(&mut self, x: &Block, start: usize) -> Block {
        let mut y = Block::default();
        let mut i2 = 0;
        for i in start..start + HALF {
            let v = x.frames()[i];
            y.frames_mut()[i2] = self.apa1.next_sample(self.apa0.next_sample(v));
            y.frames_mut()[i2 + 1] = self.apb1.next_sample(self.apb0.next_sample(v));
            i2 += 2;
        }
        y
    }

    /// Downsample two consecutive blocks into one block at 1/2 rate.
    pub fn downsample(&mut self, x1: &Block, x2: &Block) -> Block {
        let mut y = Block::default();
        self.downsample_half(x1, &mut y, 0);
        self.downsample_half(x2, &mut y, HALF);
        y
    }

    fn downsample_half(&mut self, x: &Block, y: &mut Block, start: usize) {
        let mut i2 = 0;
        for i in start..start + HALF {
            let a0 = self.apa1.next_sample(self.apa0.next_sample(x.frames()[i2]));
            let b0 = self.apb1.next_sample(self.apb0.next_sample(x.frames()[i2 + 1]));
            y.frames_mut()[i] = (a0 + self.b1) * 0.5;
            self.b1 = b0;
            i2 += 2;
        }
    }
}

/// One block in, two blocks out at twice the rate.
#[derive(Default)]
pub struct Upsampler2x {
    filter: HalfBandFilter,
}

impl Upsampler2x {
    pub fn process(&mut self, x: &Block) -> (Block, Block) {
        (
            self.filter.upsample_first_half(x),
            self.filter.upsample_second_half(x),
        )
    }

    pub fn clear(&mut self) {
        self.filter.clear();
    }
}

/// Two blocks in, one block out at half the rate.
#[derive(Default)]
pub struct Downsampler2x {
    filter: HalfBandFilter,
}

impl Downsampler2x {
    pub fn process(&mut self, x1: &Block, x2: &Block) -> Block {
        self.filter.downsample(x1, x2)
    }

    pub fn clear(&mut self) {
        self.filter.clear();
    }
}

/// A cascade of half-band filters downsampling by 2^octaves.
///
/// Writes land in a pair of input buffers; a counter schedules each
/// octave's filter to run when its counter bit and all lower bits are
/// one. `write` returns true when a fresh output block is ready, every
/// `2^octaves` writes.
pub struct Downsampler {
    filters: Vec<Downsampler2x>,
    buffers: Vec<Block>,
    octaves: usize,
    counter: u32,
}

impl Downsampler {
    pub fn new(octaves_down: usize) -> Self {
        let (filters, buffers) = if octaves_down > 0 {
            (
                (0..octaves_down).map(|_| Downsampler2x::default()).collect(),
                // one pair of buffers per octave plus one output buffer
                vec![Block::default(); 2 * octaves_down + 1],
            )
        } else {
            (Vec::new(), vec![Block::default(); 1])
        };
        log::debug!("downsampler: {octaves_down} octaves");
        Self {
            filters,
            buffers,
            octaves: octaves_down,
            counter: 0,
        }
    }

    /// Write one block at the input rate. Returns true when a block of
    /// output is ready to read.
    pub fn write(&mut self, v: &Block) -> bool {
        if self.octaves == 0 {
            self.buffers[0] = *v;
            return true;
        }

        self.buffers[(self.counter & 1) as usize] = *v;

        let mut mask = 1u32;
        for h in 0..self.octaves {
            if self.counter & mask == 0 {
                break;
            }
            mask <<= 1;
            let b1 = (self.counter & mask != 0) as usize;

            let src1 = self.buffers[h * 2];
            let src2 = self.buffers[h * 2 + 1];
            self.buffers[h * 2 + 2 + b1] = self.filters[h].process(&src1, &src2);
        }

        let counter_mask = (1u32 << self.octaves) - 1;
        self.counter = (self.counter + 1) & counter_mask;
        self.counter == 0
    }

    /// The most recent output block.
    pub fn read(&self) -> Block {
        self.buffers[self.buffers.len() - 1]
    }

    pub fn clear(&mut self) {
        for f in self.filters.iter_mut() {
            f.clear();
        }
        for b in self.buffers.iter_mut() {
            *b = Block::default();
        }
        self.counter = 0;
    }
}

/// A cascade of half-band filters upsampling by 2^octaves.
///
/// Each write produces `2^octaves` output blocks, read back in order
/// with `read`.
pub struct Upsampler {
    filters: Vec<Upsampler2x>,
    buffers: Vec<Block>,
    octaves: usize,
    read_idx: usize,
}

impl Upsampler {
    pub fn new(octaves_up: usize) -> Self {
        log::debug!("upsampler: {octaves_up} octaves");
        Self {
            filters: (0..octaves_up).map(|_| Upsampler2x::default()).collect(),
            buffers: vec![Block::default(); 1 << octaves_up],
            octaves: octaves_up,
            read_idx: 0,
        }
    }

    /// Write one block at the input rate, filling `2^octaves` output
    /// blocks.
    pub fn write(&mut self, x: &Block) {
        let num_bufs = 1 << self.octaves;
        self.buffers[num_bufs - 1] = *x;

        for j in 0..self.octaves {
            let source_bufs = 1 << j;
            let dest_bufs = source_bufs << 1;
            let src_start = num_bufs - source_bufs;
            let dest_start = num_bufs - dest_bufs;

            for i in 0..source_bufs {
                let src = self.buffers[src_start + i];
                let (first, second) = self.filters[j].process(&src);
                self.buffers[dest_start + i * 2] = first;
                self.buffers[dest_start + i * 2 + 1] = second;
            }
        }
        self.read_idx = 0;
    }

    /// Read the next output block; valid `2^octaves` times per write.
    pub fn read(&mut self) -> Block {
        let b = self.buffers[self.read_idx];
        self.read_idx += 1;
        b
    }

    pub fn clear(&mut self) {
        for f in self.filters.iter_mut() {
            f.clear();
        }
        for b in self.buffers.iter_mut() {
            *b = Block::default();
        }
        self.read_idx = 0;
    }
}

/// Runs a process function at twice the external rate: the input is
/// upsampled, processed twice, and the results downsampled. The
/// resampling filters add a group delay of about 3 samples.
pub struct Upsample2xFunction<const IN_ROWS: usize> {
    uppers: [Upsampler2x; IN_ROWS],
    downer: Downsampler2x,
}

impl<const IN_ROWS: usize> Default for Upsample2xFunction<IN_ROWS> {
    fn default() -> Self {
        Self {
            uppers: core::array::from_fn(|_| Upsampler2x::default()),
            downer: Downsampler2x::default(),
        }
    }
}

impl<const IN_ROWS: usize> Upsample2xFunction<IN_ROWS> {
    pub fn process(
        &mut self,
        mut f: impl FnMut(&crate::block::BlockArray<IN_ROWS>) -> Block,
        x: &crate::block::BlockArray<IN_ROWS>,
    ) -> Block {
        let mut up1 = crate::block::BlockArray::<IN_ROWS>::default();
        let mut up2 = crate::block::BlockArray::<IN_ROWS>::default();
        for j in 0..IN_ROWS {
            let (first, second) = self.uppers[j].process(x.row(j));
            up1.set_row(j, &first);
            up2.set_row(j, &second);
        }

        let out1 = f(&up1);
        let out2 = f(&up2);
        self.downer.process(&out1, &out2)
    }

    pub fn clear(&mut self) {
        for u in self.uppers.iter_mut() {
            u.clear();
        }
        self.downer.clear();
    }
}

/// Runs a process function at half the external rate: two external
/// blocks combine into one internal block, so there is one block of
/// latency on top of the allpass group delay of about 6 samples.
pub struct Downsample2xFunction<const IN_ROWS: usize> {
    downers: [Downsampler2x; IN_ROWS],
    upper: Upsampler2x,
    input_buffer: crate::block::BlockArray<IN_ROWS>,
    output_buffer: Block,
    phase: bool,
}

impl<const IN_ROWS: usize> Default for Downsample2xFunction<IN_ROWS> {
    fn default() -> Self {
        Self {
            downers: core::array::from_fn(|_| Downsampler2x::default()),
            upper: Upsampler2x::default(),
            input_buffer: crate::block::BlockArray::default(),
            output_buffer: Block::default(),
            phase: false,
        }
    }
}

impl<const IN_ROWS: usize> Downsample2xFunction<IN_ROWS> {
    pub fn process(
        &mut self,
        mut f: impl FnMut(&crate::block::BlockArray<IN_ROWS>) -> Block,
        x: &crate::block::BlockArray<IN_ROWS>,
    ) -> Block {
        let out;
        if self.phase {
            let mut down = crate::block::BlockArray::<IN_ROWS>::default();
            for j in 0..IN_ROWS {
                down.set_row(j, &self.downers[j].process(self.input_buffer.row(j), x.row(j)));
            }

            let processed = f(&down);

            let (first, second) = self.upper.process(&processed);
            out = first;
            self.output_buffer = second;
        } else {
            self.input_buffer = *x;
            out = self.output_buffer;
        }
        self.phase = !self.phase;
        out
    }

    pub fn clear(&mut self) {
        for d in self.downers.iter_mut() {
            d.clear();
        }
        self.upper.clear();
        self.phase = false;
    }
}
