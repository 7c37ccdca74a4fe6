//! Delay lines and structures built from them.
//!
//! All delay buffers are power-of-two rings. For efficiency there is no
//! bounds checking at process time: the length mask constrains every
//! read, so a too-large delay wraps inside the buffer (and may make bad
//! sounds) but never reads outside it. Buffer sizing happens off the
//! audio thread in `set_max_delay_in_samples`.

use crate::block::{self, Block, BlockArray, IntBlock};
use crate::filter::{Allpass1, Kernel, KernelSignal, OnePole};
use crate::FRAMES_PER_BLOCK;

/// Allocation and reset, common to all delay kinds.
pub trait Delay {
    fn set_max_delay_in_samples(&mut self, d: f32);
    fn clear(&mut self);
}

/// A delay whose time is set between blocks.
pub trait ConstantDelay: Delay {
    fn set_delay_in_samples(&mut self, d: f32);
    fn process(&mut self, x: &Block) -> Block;
}

/// A delay whose time is a signal.
pub trait VaryingDelay: Delay {
    fn process_varying(&mut self, x: &Block, delay: &Block) -> Block;
}

// ----------------------------------------------------------------
// IntegerDelay

/// Delays a signal by a whole number of samples.
pub struct IntegerDelay {
    buffer: Vec<f32>,
    delay_in_samples: usize,
    write_index: usize,
    length_mask: usize,
}

impl Default for IntegerDelay {
    fn default() -> Self {
        let mut delay = Self {
            buffer: Vec::new(),
            delay_in_samples: 0,
            write_index: 0,
            length_mask: 0,
        };
        delay.set_max_delay_in_samples(0.0);
        delay
    }
}

impl IntegerDelay {
    /// Create a delay with time and capacity of `d` samples.
    pub fn new(d: usize) -> Self {
        let mut delay = Self::default();
        delay.set_max_delay_in_samples(d as f32);
        delay.set_delay(d);
        delay
    }

    /// Set the delay time in samples. Values beyond the allocated
    /// maximum wrap in the ring rather than read out of bounds.
    #[inline]
    pub fn set_delay(&mut self, d: usize) {
        self.delay_in_samples = d;
    }

    /// Process one sample.
    #[inline]
    pub fn process_sample(&mut self, x: f32) -> f32 {
        self.buffer[self.write_index] = x;
        let read_index = self.write_index.wrapping_sub(self.delay_in_samples) & self.length_mask;
        let y = self.buffer[read_index];
        self.write_index = (self.write_index + 1) & self.length_mask;
        y
    }

    /// Process one block with a per-sample delay time signal.
    pub fn process_varying_delay(&mut self, x: &Block, delay: &Block) -> Block {
        let mut y = Block::default();
        for n in 0..FRAMES_PER_BLOCK {
            self.delay_in_samples = delay.frames()[n] as usize;
            y.frames_mut()[n] = self.process_sample(x.frames()[n]);
        }
        y
    }
}

impl Delay for IntegerDelay {
    fn set_max_delay_in_samples(&mut self, d: f32) {
        let d_max = d.max(0.0) as usize;
        let new_size = (d_max + FRAMES_PER_BLOCK).next_power_of_two();
        log::debug!("integer delay buffer: {new_size} samples");
        self.buffer.clear();
        self.buffer.resize(new_size, 0.0);
        self.length_mask = new_size - 1;
        self.write_index = 0;
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
    }
}

impl ConstantDelay for IntegerDelay {
    fn set_delay_in_samples(&mut self, d: f32) {
        self.set_delay(d.max(0.0) as usize);
    }

    fn process(&mut self, x: &Block) -> Block {
        let len = self.length_mask + 1;

        // write, splitting at the end of the ring
        let write_end = self.write_index + FRAMES_PER_BLOCK;
        let src = x.frames();
        if write_end <= len {
            self.buffer[self.write_index..write_end].copy_from_slice(src);
        } else {
            let excess = write_end - len;
            let splice = FRAMES_PER_BLOCK - excess;
            self.buffer[self.write_index..len].copy_from_slice(&src[..splice]);
            self.buffer[..excess].copy_from_slice(&src[splice..]);
        }

        // read, splitting at the end of the ring
        let mut y = Block::default();
        let read_start = self.write_index.wrapping_sub(self.delay_in_samples) & self.length_mask;
        let read_end = read_start + FRAMES_PER_BLOCK;
        let dst = y.frames_mut();
        if read_end <= len {
            dst.copy_from_slice(&self.buffer[read_start..read_end]);
        } else {
            let excess = read_end - len;
            let splice = FRAMES_PER_BLOCK - excess;
            dst[..splice].copy_from_slice(&self.buffer[read_start..len]);
            dst[splice..].copy_from_slice(&self.buffer[..excess]);
        }

        self.write_index = (self.write_index + FRAMES_PER_BLOCK) & self.length_mask;
        y
    }
}

impl VaryingDelay for IntegerDelay {
    fn process_varying(&mut self, x: &Block, delay: &Block) -> Block {
        self.process_varying_delay(x, delay)
    }
}

// ----------------------------------------------------------------
// FractionalDelay

/// An integer delay with an allpass interpolation stage, giving a
/// fractional delay time. Modulating the time changes the allpass
/// coefficient and will click; see [`PitchbendableDelay`] for clickless
/// modulation.
#[derive(Default)]
pub struct FractionalDelay {
    integer_delay: IntegerDelay,
    allpass: Allpass1<f32>,
    delay_in_samples: f32,
}

impl FractionalDelay {
    pub fn new(d: f32) -> Self {
        let mut delay = Self::default();
        delay.set_max_delay_in_samples(d);
        delay.set_delay_in_samples(d);
        delay
    }

    /// Process a block, changing the delay time only at samples where
    /// `change_ticks` is nonzero.
    pub fn process_ticked(&mut self, x: &Block, delay: &Block, change_ticks: &IntBlock) -> Block {
        let mut y = Block::default();
        for n in 0..FRAMES_PER_BLOCK {
            if change_ticks[n] != 0 {
                self.set_delay_in_samples(delay.frames()[n]);
            }
            y.frames_mut()[n] = self
                .allpass
                .next_sample(self.integer_delay.process_sample(x.frames()[n]));
        }
        y
    }

    /// The current delay time in samples.
    pub fn delay_in_samples(&self) -> f32 {
        self.delay_in_samples
    }
}

impl Delay for FractionalDelay {
    fn set_max_delay_in_samples(&mut self, d: f32) {
        self.integer_delay.set_max_delay_in_samples(d.floor());
    }

    fn clear(&mut self) {
        self.integer_delay.clear();
        self.allpass.clear();
    }
}

impl ConstantDelay for FractionalDelay {
    fn set_delay_in_samples(&mut self, d: f32) {
        self.delay_in_samples = d;
        let mut delay_int = d.floor() as i32;
        let mut delay_frac = d - d.floor();

        // keep the fraction in [0.618, 1.618] when possible
        if delay_frac < 0.618 && delay_int > 0 {
            delay_frac += 1.0;
            delay_int -= 1;
        }
        self.integer_delay.set_delay(delay_int.max(0) as usize);
        self.allpass
            .set_coeffs(Allpass1::<f32>::make_coeffs([delay_frac]));
    }

    fn process(&mut self, x: &Block) -> Block {
        let delayed = self.integer_delay.process(x);
        self.allpass.process_block(&delayed)
    }
}

impl VaryingDelay for FractionalDelay {
    fn process_varying(&mut self, x: &Block, delay: &Block) -> Block {
        let mut y = Block::default();
        for n in 0..FRAMES_PER_BLOCK {
            self.set_delay_in_samples(delay.frames()[n]);
            y.frames_mut()[n] = self
                .allpass
                .next_sample(self.integer_delay.process_sample(x.frames()[n]));
        }
        y
    }
}

// ----------------------------------------------------------------
// PitchbendableDelay

/// Period in samples of the allpass fade cycle. Must be a power of two
/// no larger than the block size. 32 sounds good.
const FADE_PERIOD: usize = 32;

const fn fade_ramp(n: usize) -> usize {
    n % FADE_PERIOD
}

const fn fade_table() -> [f32; FRAMES_PER_BLOCK] {
    let mut a = [0.0f32; FRAMES_PER_BLOCK];
    let mut n = 0;
    while n < FRAMES_PER_BLOCK {
        // triangle from 0 to 1 to 0
        let r = fade_ramp(n);
        a[n] = if r > FADE_PERIOD / 2 {
            2.0 * (1.0 - r as f32 / FADE_PERIOD as f32)
        } else {
            2.0 * (r as f32 / FADE_PERIOD as f32)
        };
        n += 1;
    }
    a
}

const fn ticks_table(at: usize) -> [i32; FRAMES_PER_BLOCK] {
    let mut a = [0i32; FRAMES_PER_BLOCK];
    let mut n = 0;
    while n < FRAMES_PER_BLOCK {
        a[n] = (fade_ramp(n) == at) as i32;
        n += 1;
    }
    a
}

const KV_FADE: Block = Block::from_array([fade_table()]);
const KV_DELAY1_CHANGES: IntBlock = IntBlock::from_array([ticks_table(FADE_PERIOD / 2)]);
const KV_DELAY2_CHANGES: IntBlock = IntBlock::from_array([ticks_table(0)]);

/// Two crossfaded fractional delays, allowing the delay time to be
/// modulated without clicks. Each delay's time is only updated while its
/// fade weight is zero. See "A Lossless, Click-free, Pitchbend-able
/// Delay Line Loop Interpolation Scheme", Van Duyne et al., ICMC 1997.
///
/// The first delay's time is zero until the first half fade period, so
/// there is a warmup of half a fade period during which input is
/// attenuated.
#[derive(Default)]
pub struct PitchbendableDelay {
    delay1: FractionalDelay,
    delay2: FractionalDelay,
}

impl Delay for PitchbendableDelay {
    fn set_max_delay_in_samples(&mut self, d: f32) {
        self.delay1.set_max_delay_in_samples(d);
        self.delay2.set_max_delay_in_samples(d);
    }

    fn clear(&mut self) {
        self.delay1.clear();
        self.delay2.clear();
    }
}

impl VaryingDelay for PitchbendableDelay {
    fn process_varying(&mut self, x: &Block, delay: &Block) -> Block {
        let y1 = self.delay1.process_ticked(x, delay, &KV_DELAY1_CHANGES);
        let y2 = self.delay2.process_ticked(x, delay, &KV_DELAY2_CHANGES);
        block::lerp(&y1, &y2, &KV_FADE)
    }
}

// ----------------------------------------------------------------
// Allpass

/// General purpose allpass filter wrapping any delay kind in a
/// one-multiply scattering junction. For efficiency, the minimum delay
/// time is one block.
pub struct Allpass<D> {
    delay: D,
    y1: Block,
    pub gain: f32,
}

impl<D: Default> Default for Allpass<D> {
    fn default() -> Self {
        Self {
            delay: D::default(),
            y1: Block::default(),
            gain: 0.0,
        }
    }
}

impl<D: Delay> Allpass<D> {
    pub fn set_max_delay_in_samples(&mut self, d: f32) {
        self.delay
            .set_max_delay_in_samples((d - FRAMES_PER_BLOCK as f32).max(0.0));
    }

    pub fn clear(&mut self) {
        self.delay.clear();
        self.y1 = Block::default();
    }

    #[inline]
    fn scatter(&mut self, input: &Block) -> (Block, Block) {
        let gain = Block::splat(-self.gain);
        let delay_input = *input - self.y1 * gain;
        let y = delay_input * gain + self.y1;
        (delay_input, y)
    }
}

impl<D: ConstantDelay> Allpass<D> {
    /// Set a constant delay time of `d` samples, at least one block.
    pub fn set_delay_in_samples(&mut self, d: f32) {
        self.delay
            .set_delay_in_samples((d - FRAMES_PER_BLOCK as f32).max(0.0));
    }

    pub fn process(&mut self, input: &Block) -> Block {
        let (delay_input, y) = self.scatter(input);
        self.y1 = self.delay.process(&delay_input);
        y
    }
}

impl<D: VaryingDelay> Allpass<D> {
    /// Process with a varying delay time signal of at least one block.
    pub fn process_varying(&mut self, input: &Block, delay_in_samples: &Block) -> Block {
        let (delay_input, y) = self.scatter(input);
        self.y1 = self
            .delay
            .process_varying(&delay_input, &(*delay_in_samples - FRAMES_PER_BLOCK as f32));
        y
    }
}

// ----------------------------------------------------------------
// FDN

/// A feedback delay network: N integer delay lines behind a Householder
/// feedback matrix `I - (2/N)·11ᵀ`, with a lossy one-pole per line.
/// Because the matrix is a rank-one update of the identity, the feedback
/// is a row sum and a subtraction rather than a full matrix multiply.
pub struct Fdn<const N: usize> {
    delays: [IntegerDelay; N],
    filters: [OnePole<f32>; N],
    delay_inputs: [Block; N],
    pub feedback_gains: [f32; N],
}

impl<const N: usize> Default for Fdn<N> {
    fn default() -> Self {
        const DEFAULT_MAX_DELAY: f32 = 128.0;
        let mut fdn = Self {
            delays: core::array::from_fn(|_| IntegerDelay::default()),
            filters: core::array::from_fn(|_| OnePole::default()),
            delay_inputs: [Block::default(); N],
            feedback_gains: [0.0; N],
        };
        fdn.set_max_delay_in_samples(DEFAULT_MAX_DELAY);
        fdn
    }
}

impl<const N: usize> Fdn<N> {
    pub fn set_max_delay_in_samples(&mut self, d: f32) {
        for delay in self.delays.iter_mut() {
            delay.set_max_delay_in_samples(d);
        }
    }

    /// Set the delay line lengths. One block of feedback latency is
    /// compensated here, so times below `FRAMES_PER_BLOCK + 1` clamp.
    pub fn set_delays_in_samples(&mut self, times: [f32; N]) {
        for (delay, time) in self.delays.iter_mut().zip(times) {
            let len = (time as i32 - FRAMES_PER_BLOCK as i32).max(1);
            delay.set_delay(len as usize);
        }
    }

    /// Set the lowpass cutoff (omega) of each line's damping filter.
    pub fn set_filter_cutoffs(&mut self, omegas: [f32; N]) {
        for (filter, omega) in self.filters.iter_mut().zip(omegas) {
            filter.set_coeffs(OnePole::<f32>::make_coeffs([omega]));
        }
    }

    pub fn clear(&mut self) {
        for delay in self.delays.iter_mut() {
            delay.clear();
        }
        for filter in self.filters.iter_mut() {
            filter.clear();
        }
        self.delay_inputs = [Block::default(); N];
    }

    /// Run one block, returning (left, right) rows summed from the
    /// odd- and even-indexed delay lines.
    pub fn process(&mut self, x: &Block) -> BlockArray<2> {
        for n in 0..N {
            self.delay_inputs[n] = self.delays[n].process(&self.delay_inputs[n]);
        }

        let mut sum_l = Block::default();
        let mut sum_r = Block::default();
        for n in 0..(N & !1) {
            if n & 1 == 1 {
                sum_l += self.delay_inputs[n];
            } else {
                sum_r += self.delay_inputs[n];
            }
        }

        let mut sum_of_delays = Block::default();
        for n in 0..N {
            sum_of_delays += self.delay_inputs[n];
        }
        sum_of_delays *= Block::splat(2.0 / N as f32);

        for n in 0..N {
            self.delay_inputs[n] -= sum_of_delays;
            self.delay_inputs[n] =
                self.filters[n].process_block(&self.delay_inputs[n]) * self.feedback_gains[n];
            self.delay_inputs[n] += *x;
        }

        BlockArray::from_rows([sum_l, sum_r])
    }
}

// ----------------------------------------------------------------
// FeedbackDelayFunction

/// Wraps a process function in a pitchbendable delay with feedback.
/// The function's output is fed back, delayed, into its input, so it
/// must keep the same shape in and out.
pub struct FeedbackDelayFunction {
    delay: PitchbendableDelay,
    y1: Block,
    pub feedback_gain: f32,
}

impl Default for FeedbackDelayFunction {
    fn default() -> Self {
        Self {
            delay: PitchbendableDelay::default(),
            y1: Block::default(),
            feedback_gain: 1.0,
        }
    }
}

impl FeedbackDelayFunction {
    pub fn set_max_delay_in_samples(&mut self, d: f32) {
        self.delay
            .set_max_delay_in_samples((d - FRAMES_PER_BLOCK as f32).max(0.0));
    }

    pub fn clear(&mut self) {
        self.delay.clear();
        self.y1 = Block::default();
    }

    pub fn process(
        &mut self,
        x: &Block,
        mut f: impl FnMut(&Block) -> Block,
        delay_time: &Block,
    ) -> Block {
        let fed = *x + self.y1 * Block::splat(self.feedback_gain);
        let output = f(&fed);
        self.y1 = self
            .delay
            .process_varying(&output, &(*delay_time - FRAMES_PER_BLOCK as f32));
        output
    }
}
