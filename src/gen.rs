//! Signal generators.
//!
//! Generators hold state (a phase, a seed, a counter) and produce one
//! sample or one block per call. The oscillators accumulate a 32-bit
//! integer phase so frequency resolution is constant across the audible
//! range, and post-process the resulting phasor with closed-form
//! antialiasing transforms.

use crate::block::{self, Block};
use crate::math::{self, UNITY_RAMP};
use crate::sample::Sample;
use crate::FRAMES_PER_BLOCK;

/// Phase steps per cycle of the 32-bit phase accumulator.
pub const STEPS_PER_CYCLE: f32 = 4_294_967_296.0;
/// Cycles per single accumulator step.
pub const CYCLES_PER_STEP: f32 = 1.0 / STEPS_PER_CYCLE;

const UNITY_RAMP_VEC: Block = Block::from_array([UNITY_RAMP]);

/// A per-sample generator driven by a frequency in cycles per sample.
pub trait GenKernel<T: Sample>: Default {
    fn next(&mut self, cycles_per_sample: T) -> T;
    fn clear(&mut self);
}

/// Block-level operator for scalar generators.
pub trait GenSignal: GenKernel<f32> {
    fn process_block(&mut self, cycles_per_sample: &Block) -> Block {
        let mut out = Block::default();
        for t in 0..FRAMES_PER_BLOCK {
            out.frames_mut()[t] = self.next(cycles_per_sample.frames()[t]);
        }
        out
    }
}

impl<G: GenKernel<f32>> GenSignal for G {}

// ----------------------------------------------------------------
// noise

/// Linear congruential white noise in [-1, 1]. Note that white noise
/// has more energy at higher sample rates.
#[derive(Clone, Default)]
pub struct NoiseGen {
    seed: u32,
}

impl NoiseGen {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn set_seed(&mut self, seed: u32) {
        self.seed = seed;
    }

    #[inline]
    fn step(&mut self) {
        self.seed = self.seed.wrapping_mul(0x0019_660D).wrapping_add(0x3C6E_F35F);
    }

    /// The raw generator state after one step.
    #[inline]
    pub fn next_int(&mut self) -> u32 {
        self.step();
        self.seed
    }

    /// One sample of white noise.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        self.step();
        // reinterpret 23 seed bits as a mantissa in [1, 2), map to [-1, 1]
        let bits = ((self.seed >> 9) & 0x007F_FFFF) | 0x3F80_0000;
        f32::from_bits(bits) * 2.0 - 3.0
    }

    pub fn process_block(&mut self) -> Block {
        let mut y = Block::default();
        for t in 0..FRAMES_PER_BLOCK {
            y.frames_mut()[t] = self.next_sample();
        }
        y
    }

    pub fn reset(&mut self) {
        self.seed = 0;
    }
}

// ----------------------------------------------------------------
// ticks and phasors

/// Emits a single-sample 1.0 at each phase wrap, a clock for rhythmic
/// structures inside the graph.
#[derive(Clone, Default)]
pub struct TickGen<T: Sample> {
    omega: T,
}

impl<T: Sample> GenKernel<T> for TickGen<T> {
    #[inline]
    fn next(&mut self, cycles_per_sample: T) -> T {
        let one = T::splat(1.0);
        self.omega = self.omega + cycles_per_sample;
        let y = T::select_gt(self.omega, one, one, T::default());
        self.omega = T::select_gt(self.omega, one, self.omega - one, self.omega);
        y
    }

    fn clear(&mut self) {
        self.omega = T::default();
    }
}

/// A naive (not antialiased) 0..1 sawtooth from a 32-bit phase
/// accumulator. Useful on its own for wavetable positions; the
/// antialiased oscillators below post-process it.
#[derive(Clone, Default)]
pub struct PhasorGen<T: Sample> {
    phase: T::Int,
}

impl<T: Sample> PhasorGen<T> {
    /// Restart from the given 32-bit phase.
    pub fn set_phase(&mut self, phase: i32) {
        self.phase = T::int_splat(phase);
    }
}

impl<T: Sample> GenKernel<T> for PhasorGen<T> {
    #[inline]
    fn next(&mut self, cycles_per_sample: T) -> T {
        let steps = (cycles_per_sample * T::splat(STEPS_PER_CYCLE)).round_int();
        self.phase = T::int_wrapping_add(self.phase, steps);
        T::uint_to_float(self.phase) * T::splat(CYCLES_PER_STEP)
    }

    fn clear(&mut self) {
        self.phase = Default::default();
    }
}

// ----------------------------------------------------------------
// antialiasing transforms

/// Bandlimited step correction around phasor discontinuities.
#[inline]
pub fn poly_blep<T: Sample>(phase: T, freq: T) -> T {
    let zero = T::default();
    let one = T::splat(1.0);

    let t1 = phase / freq;
    let up = t1 + t1 - t1 * t1 - one;

    let t2 = (phase - one) / freq;
    let down = t2 * t2 + t2 + t2 + one;

    T::select_lt(phase, freq, up, T::select_gt(phase, one - freq, down, zero))
}

/// Map a 0..1 phasor to a sine approximation using a three-term Taylor
/// series on a triangle wave. Distortion is in odd harmonics only, with
/// the 3rd harmonic at about -40 dB.
#[inline]
pub fn phasor_to_sine<T: Sample>(phasor: T) -> T {
    let sqrt2 = core::f32::consts::SQRT_2;
    let domain_scale = T::splat(sqrt2 * 4.0);
    let domain_offset = T::splat(-sqrt2);
    let range = sqrt2 - sqrt2 * sqrt2 * sqrt2 / 6.0;
    let scale = T::splat(1.0 / range);
    let flip_offset = T::splat(sqrt2 * 2.0);
    let one_sixth = T::splat(1.0 / 6.0);
    let one = T::splat(1.0);

    // scale the phasor to the approximation domain, reflect the upper
    // half to get a triangle, then shape
    let omega = phasor * domain_scale + domain_offset;
    let triangle = T::select_gt(omega, T::splat(sqrt2), flip_offset - omega, omega);
    scale * triangle * (one - triangle * triangle * one_sixth)
}

/// Map a 0..1 phasor to an antialiased pulse with the given width.
#[inline]
pub fn phasor_to_pulse<T: Sample>(phase: T, freq: T, width: T) -> T {
    let mut pulse = T::select_ge(phase, width, T::splat(-1.0), T::splat(1.0));
    pulse = pulse + poly_blep(phase, freq);
    let down_phase = (phase - width + T::splat(1.0)).fract();
    pulse - poly_blep(down_phase, freq)
}

/// Map a 0..1 phasor to an antialiased saw on (-1, 1).
#[inline]
pub fn phasor_to_saw<T: Sample>(phase: T, freq: T) -> T {
    let saw = phase * T::splat(2.0) - T::splat(1.0);
    saw - poly_blep(phase, freq)
}

// ----------------------------------------------------------------
// antialiased oscillators

/// Phase at which the sine transform crosses zero going positive.
const ZERO_PHASE: i32 = -(2 << 29);

/// Antialiased sine oscillator.
#[derive(Clone, Default)]
pub struct SineGen<T: Sample> {
    phasor: PhasorGen<T>,
}

impl<T: Sample> GenKernel<T> for SineGen<T> {
    #[inline]
    fn next(&mut self, cycles_per_sample: T) -> T {
        phasor_to_sine(self.phasor.next(cycles_per_sample))
    }

    fn clear(&mut self) {
        self.phasor.set_phase(ZERO_PHASE);
    }
}

/// Antialiased pulse oscillator with signal-rate width.
#[derive(Clone, Default)]
pub struct PulseGen<T: Sample> {
    phasor: PhasorGen<T>,
}

impl<T: Sample> PulseGen<T> {
    #[inline]
    pub fn next(&mut self, cycles_per_sample: T, width: T) -> T {
        phasor_to_pulse(
            self.phasor.next(cycles_per_sample),
            cycles_per_sample,
            width,
        )
    }

    pub fn clear(&mut self) {
        self.phasor.set_phase(0);
    }
}

impl PulseGen<f32> {
    pub fn process_block(&mut self, freq: &Block, width: &Block) -> Block {
        let mut out = Block::default();
        for t in 0..FRAMES_PER_BLOCK {
            out.frames_mut()[t] = self.next(freq.frames()[t], width.frames()[t]);
        }
        out
    }
}

/// Antialiased sawtooth oscillator.
#[derive(Clone, Default)]
pub struct SawGen<T: Sample> {
    phasor: PhasorGen<T>,
}

impl<T: Sample> GenKernel<T> for SawGen<T> {
    #[inline]
    fn next(&mut self, cycles_per_sample: T) -> T {
        phasor_to_saw(self.phasor.next(cycles_per_sample), cycles_per_sample)
    }

    fn clear(&mut self) {
        self.phasor.set_phase(0);
    }
}

// ----------------------------------------------------------------
// one-shot ramp

/// A gated phasor: on `trigger`, ramps once from 0 to 1, then stays at 0
/// until retriggered. The wrap is tested every sample for a clean end.
#[derive(Clone, Default)]
pub struct OneShotGen {
    omega: u32,
    omega_prev: u32,
    gate: u32,
}

impl OneShotGen {
    pub fn trigger(&mut self) {
        self.omega = 0;
        self.omega_prev = 0;
        self.gate = 1;
    }
}

impl GenKernel<f32> for OneShotGen {
    #[inline]
    fn next(&mut self, cycles_per_sample: f32) -> f32 {
        let steps = (cycles_per_sample * STEPS_PER_CYCLE).round() as u32;
        self.omega = self.omega.wrapping_add(steps.wrapping_mul(self.gate));
        if self.omega < self.omega_prev {
            self.gate = 0;
            self.omega = 0;
        }
        self.omega_prev = self.omega;
        self.omega as f32 * CYCLES_PER_STEP
    }

    fn clear(&mut self) {
        self.omega = 0;
        self.omega_prev = 0;
        self.gate = 0;
    }
}

// ----------------------------------------------------------------
// impulse

/// Antialiased impulse train from a windowed sinc table. The table is
/// positioned to the nearest sample, and the frequency cannot exceed
/// sr / table size.
#[derive(Clone)]
pub struct ImpulseGen {
    table: Block,
    output_counter: usize,
    omega: f32,
}

impl ImpulseGen {
    const TABLE_SIZE: usize = 17;

    pub fn new() -> Self {
        // blackman-windowed sinc, normalized to unit sum
        let mut table = Block::default();
        let half = (Self::TABLE_SIZE as i32 - 1) / 2;
        let omega = 0.25f32;
        for n in 0..Self::TABLE_SIZE {
            let i = n as i32 - half;
            let win = 0.42
                - 0.5 * (math::TAU * n as f32 / (Self::TABLE_SIZE - 1) as f32).cos()
                + 0.08 * (2.0 * math::TAU * n as f32 / (Self::TABLE_SIZE - 1) as f32).cos();
            let pi_x = math::TAU * omega * i as f32;
            let sinc = if i == 0 { 1.0 } else { pi_x.sin() / pi_x };
            table.frames_mut()[n] = sinc * win;
        }
        let table = block::normalize(&table);
        Self {
            table,
            output_counter: 0,
            omega: 0.0,
        }
    }
}

impl Default for ImpulseGen {
    fn default() -> Self {
        Self::new()
    }
}

impl GenKernel<f32> for ImpulseGen {
    #[inline]
    fn next(&mut self, cycles_per_sample: f32) -> f32 {
        self.omega += cycles_per_sample;
        if self.omega > 1.0 {
            self.omega -= 1.0;
            self.output_counter = 0;
        }
        if self.output_counter < Self::TABLE_SIZE {
            let y = self.table.frames()[self.output_counter];
            self.output_counter += 1;
            y
        } else {
            0.0
        }
    }

    fn clear(&mut self) {
        self.omega = 0.0;
        self.output_counter = 0;
    }
}

// ----------------------------------------------------------------
// interpolators and glides

/// Linear interpolation from the previous value to each new value over
/// one block.
#[derive(Clone, Default)]
pub struct Interpolator1 {
    current_value: f32,
}

impl Interpolator1 {
    pub fn process(&mut self, f: f32) -> Block {
        let dydt = f - self.current_value;
        let out = Block::splat(self.current_value) + UNITY_RAMP_VEC * dydt;
        self.current_value = f;
        out
    }
}

/// Convert a scalar input into a block signal with linear slew. Glide
/// time is quantized to whole blocks so the inner loop stays vectorized.
/// When the glide ends the output locks to the exact target, so step
/// accumulation error cannot build up.
#[derive(Clone)]
pub struct LinearGlide {
    curr: Block,
    step: Block,
    target_value: f32,
    dy_per_vector: f32,
    vectors_per_glide: i32,
    vectors_remaining: i32,
}

impl Default for LinearGlide {
    fn default() -> Self {
        Self {
            curr: Block::default(),
            step: Block::default(),
            target_value: 0.0,
            dy_per_vector: 1.0 / 32.0,
            vectors_per_glide: 32,
            vectors_remaining: -1,
        }
    }
}

impl LinearGlide {
    pub fn set_glide_time_in_samples(&mut self, t: f32) {
        self.vectors_per_glide = ((t / FRAMES_PER_BLOCK as f32) as i32).max(1);
        self.dy_per_vector = 1.0 / self.vectors_per_glide as f32;
    }

    /// Jump to the value immediately, without gliding.
    pub fn set_value(&mut self, f: f32) {
        self.target_value = f;
        self.vectors_remaining = 0;
    }

    pub fn process(&mut self, f: f32) -> Block {
        if f != self.target_value {
            self.target_value = f;
            self.vectors_remaining = self.vectors_per_glide;
        }

        if self.vectors_remaining < 0 {
            // holding
        } else if self.vectors_remaining == 0 {
            // end glide: land exactly on the target
            self.curr = Block::splat(self.target_value);
            self.step = Block::default();
            self.vectors_remaining -= 1;
        } else if self.vectors_remaining == self.vectors_per_glide {
            // start glide
            let current_value = self.curr[FRAMES_PER_BLOCK - 1];
            let dydv = (self.target_value - current_value) * self.dy_per_vector;
            self.step = Block::splat(dydv);
            self.curr = Block::splat(current_value) + UNITY_RAMP_VEC * self.step;
            self.vectors_remaining -= 1;
        } else {
            // continue glide; the final block writes the exact target
            self.curr += self.step;
            self.vectors_remaining -= 1;
        }

        self.curr
    }

    pub fn clear(&mut self) {
        self.curr = Block::default();
        self.step = Block::default();
        self.target_value = 0.0;
        self.vectors_remaining = -1;
    }
}

/// Scalar variant of [`LinearGlide`] with per-sample resolution.
#[derive(Clone)]
pub struct SampleAccurateLinearGlide {
    curr_value: f32,
    step_value: f32,
    target_value: f32,
    samples_per_glide: i32,
    dy_per_sample: f32,
    samples_remaining: i32,
}

impl Default for SampleAccurateLinearGlide {
    fn default() -> Self {
        Self {
            curr_value: 0.0,
            step_value: 0.0,
            target_value: 0.0,
            samples_per_glide: 32,
            dy_per_sample: 1.0 / 32.0,
            samples_remaining: -1,
        }
    }
}

impl SampleAccurateLinearGlide {
    pub fn set_glide_time_in_samples(&mut self, t: f32) {
        self.samples_per_glide = (t as i32).max(1);
        self.dy_per_sample = 1.0 / self.samples_per_glide as f32;
    }

    pub fn set_value(&mut self, f: f32) {
        self.target_value = f;
        self.samples_remaining = 0;
    }

    pub fn next_sample(&mut self, f: f32) -> f32 {
        if f != self.target_value {
            self.target_value = f;
            self.samples_remaining = self.samples_per_glide;
        }

        if self.samples_remaining < 0 {
            // holding
        } else if self.samples_remaining == 0 {
            self.curr_value = self.target_value;
            self.step_value = 0.0;
            self.samples_remaining -= 1;
        } else if self.samples_remaining == self.samples_per_glide {
            self.step_value = (self.target_value - self.curr_value) * self.dy_per_sample;
            self.samples_remaining -= 1;
        } else {
            self.curr_value += self.step_value;
            self.samples_remaining -= 1;
        }
        self.curr_value
    }

    pub fn clear(&mut self) {
        self.curr_value = 0.0;
        self.step_value = 0.0;
        self.target_value = 0.0;
        self.samples_remaining = -1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phasor_slope() {
        let mut p = PhasorGen::<f32>::default();
        p.clear();
        let freq = 1.0 / FRAMES_PER_BLOCK as f32;
        let v = GenSignal::process_block(&mut p, &Block::splat(freq));
        // accumulates by freq each sample, wrapping once per block
        let d = v.frames()[10] - v.frames()[9];
        assert!((d - freq).abs() < 1e-6);
    }

    #[test]
    fn sine_cycle_ends_near_zero() {
        let mut s = SineGen::<f32>::default();
        s.clear();
        let v = GenSignal::process_block(&mut s, &Block::splat(1.0 / FRAMES_PER_BLOCK as f32));
        assert!(v.frames()[FRAMES_PER_BLOCK - 1].abs() < 1e-6);
    }

    #[test]
    fn tick_counts_match_frequency() {
        let mut t = TickGen::<f32>::default();
        t.clear();
        let v = GenSignal::process_block(&mut t, &Block::splat(1.0 / 8.0));
        let ticks = v.frames().iter().filter(|x| **x > 0.5).count();
        assert_eq!(ticks, 8);
    }

    #[test]
    fn one_shot_runs_once() {
        let mut g = OneShotGen::default();
        let quiet = GenSignal::process_block(&mut g, &Block::splat(1.0 / 32.0));
        assert_eq!(quiet, Block::default());

        g.trigger();
        let ramp = GenSignal::process_block(&mut g, &Block::splat(1.0 / 32.0));
        assert!(ramp.frames()[16] > 0.4);
        let after = GenSignal::process_block(&mut g, &Block::splat(1.0 / 32.0));
        assert_eq!(after, Block::default());
    }

    #[test]
    fn noise_stays_in_range() {
        let mut n = NoiseGen::default();
        for _ in 0..10_000 {
            let x = n.next_sample();
            assert!((-1.0..=1.0).contains(&x));
        }
    }

    #[test]
    fn glide_lands_exactly_on_target() {
        let mut g = LinearGlide::default();
        g.set_glide_time_in_samples(4.0 * FRAMES_PER_BLOCK as f32);
        let mut out = Block::default();
        for _ in 0..6 {
            out = g.process(0.75);
        }
        assert_eq!(out.frames()[FRAMES_PER_BLOCK - 1], 0.75);
    }

    #[test]
    fn sample_accurate_glide_reaches_target() {
        let mut g = SampleAccurateLinearGlide::default();
        g.set_glide_time_in_samples(10.0);
        let mut y = 0.0;
        for _ in 0..12 {
            y = g.next_sample(1.0);
        }
        assert_eq!(y, 1.0);
    }

    #[test]
    fn impulse_table_integrates_to_one() {
        let g = ImpulseGen::new();
        let total: f32 = g.table.frames().iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
    }

    #[test]
    fn saw_stays_in_range() {
        let mut s = SawGen::<f32>::default();
        s.clear();
        for _ in 0..20 {
            let v = GenSignal::process_block(&mut s, &Block::splat(0.01));
            for t in 0..FRAMES_PER_BLOCK {
                assert!(v.frames()[t].abs() <= 1.2);
            }
        }
    }

    #[test]
    fn pulse_is_bipolar() {
        let mut p = PulseGen::<f32>::default();
        p.clear();
        let out = p.process_block(&Block::splat(0.01), &Block::splat(0.5));
        assert!(block::max_elem(&out) > 0.5);
        let mut seen_low = false;
        for _ in 0..4 {
            let out = p.process_block(&Block::splat(0.01), &Block::splat(0.5));
            seen_low |= block::min_elem(&out) < -0.5;
        }
        assert!(seen_low);
    }
}
