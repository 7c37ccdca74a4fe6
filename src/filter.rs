//! Filters with a uniform block-processing contract.
//!
//! Every filter is a [`Kernel`]: a value type holding derived
//! coefficients and per-instance state, with a pure `make_coeffs` from
//! human-tuned parameters and a per-sample `next_frame`. The block-level
//! operators are written once, generically:
//!
//! * [`KernelBlock::process`] applies the stored coefficients.
//! * [`KernelBlock::process_interp`] interpolates each coefficient
//!   linearly across the block toward `make_coeffs(next_params)`, then
//!   installs the new coefficients.
//! * [`KernelSignal::process_signal`] derives coefficients from
//!   signal-rate parameters at every sample.
//!
//! The state-variable designs follow Andrew Simper's linear
//! trapezoidal SVF (cytomic.com/technical-papers). Parameters are
//! normalized: omega is cutoff / sample rate, k is damping = 1/Q, and
//! shelf/bell gain A is an amplitude ratio (see [`crate::math::db_gain`]).

use crate::block::{Block, BlockArray};
use crate::math::{self, UNITY_RAMP};
use crate::sample::Sample;
use crate::solver;
use crate::FRAMES_PER_BLOCK;

/// Derived multiply-add constants of a filter, interpolable across a
/// block. Implemented by coefficient arrays of any length.
pub trait Coefficients<T: Sample>: Copy {
    fn lerp(self, other: Self, t: f32) -> Self;
}

impl<T: Sample, const N: usize> Coefficients<T> for [T; N] {
    #[inline]
    fn lerp(self, other: Self, t: f32) -> Self {
        let tv = T::splat(t);
        core::array::from_fn(|i| self[i] + tv * (other[i] - self[i]))
    }
}

/// A per-sample filter kernel holding coefficients and state.
pub trait Kernel<T: Sample>: Default {
    /// Human-tuned quantities, one value per lane.
    type Params: Copy;
    /// Derived constants used by the per-sample update.
    type Coeffs: Coefficients<T>;

    fn make_coeffs(p: Self::Params) -> Self::Coeffs;
    fn next_frame(&mut self, x: T, c: &Self::Coeffs) -> T;
    fn coeffs(&self) -> Self::Coeffs;
    fn set_coeffs(&mut self, c: Self::Coeffs);
    /// Reset state and install default coefficients.
    fn clear(&mut self);
}

/// Block-level operators shared by every kernel.
pub trait KernelBlock<T: Sample>: Kernel<T> {
    /// Apply the stored coefficients to a block.
    fn process(&mut self, input: &[T; FRAMES_PER_BLOCK]) -> [T; FRAMES_PER_BLOCK] {
        let c = self.coeffs();
        let mut out = [T::default(); FRAMES_PER_BLOCK];
        for t in 0..FRAMES_PER_BLOCK {
            out[t] = self.next_frame(input[t], &c);
        }
        out
    }

    /// Interpolate the stored coefficients toward `make_coeffs(next)`
    /// across the block, then install the new coefficients.
    fn process_interp(
        &mut self,
        input: &[T; FRAMES_PER_BLOCK],
        next: Self::Params,
    ) -> [T; FRAMES_PER_BLOCK] {
        let c0 = self.coeffs();
        let c1 = Self::make_coeffs(next);
        let mut out = [T::default(); FRAMES_PER_BLOCK];
        for t in 0..FRAMES_PER_BLOCK {
            let c = c0.lerp(c1, UNITY_RAMP[t]);
            out[t] = self.next_frame(input[t], &c);
        }
        self.set_coeffs(c1);
        out
    }
}

impl<T: Sample, K: Kernel<T>> KernelBlock<T> for K {}

/// Block operators for scalar kernels, including signal-rate parameters
/// read from the rows of a parameter block.
pub trait KernelSignal: Kernel<f32> {
    /// A `BlockArray` with one row per parameter.
    type ParamBlock;

    /// Read the parameter values at sample `t`.
    fn params_at(pb: &Self::ParamBlock, t: usize) -> Self::Params;

    /// Apply the stored coefficients to a block.
    fn process_block(&mut self, input: &Block) -> Block {
        Block::from(KernelBlock::process(self, input.frames()))
    }

    /// Per-block interpolated parameter update.
    fn process_interp_block(&mut self, input: &Block, next: Self::Params) -> Block {
        Block::from(KernelBlock::process_interp(self, input.frames(), next))
    }

    /// Derive coefficients from that sample's parameters at every sample.
    fn process_signal(&mut self, input: &Block, pb: &Self::ParamBlock) -> Block {
        let mut out = Block::default();
        for t in 0..FRAMES_PER_BLOCK {
            let c = Self::make_coeffs(Self::params_at(pb, t));
            self.set_coeffs(c);
            out.frames_mut()[t] = self.next_frame(input.frames()[t], &c);
        }
        out
    }
}

// ----------------------------------------------------------------
// state-variable filters

macro_rules! svf_g_coeffs {
    ($p:ident) => {{
        let piomega = T::splat(math::PI) * $p[0];
        let s1 = piomega.sin();
        let s2 = (T::splat(2.0) * piomega).sin();
        let nrm = T::splat(1.0) / (T::splat(2.0) + $p[1] * s2);
        let g0 = s2 * nrm;
        let g1 = (T::splat(-2.0) * s1 * s1 - $p[1] * s2) * nrm;
        let g2 = T::splat(2.0) * s1 * s1 * nrm;
        (g0, g1, g2)
    }};
}

/// State-variable lowpass. Params: omega, k.
#[derive(Clone, Default)]
pub struct Lopass<T: Sample> {
    coeffs: [T; 3],
    state: [T; 2],
}

impl<T: Sample> Kernel<T> for Lopass<T> {
    type Params = [T; 2];
    type Coeffs = [T; 3];

    fn make_coeffs(p: Self::Params) -> Self::Coeffs {
        let (g0, g1, g2) = svf_g_coeffs!(p);
        [g0, g1, g2]
    }

    #[inline]
    fn next_frame(&mut self, x: T, c: &Self::Coeffs) -> T {
        let t0 = x - self.state[1];
        let t1 = c[0] * t0 + c[1] * self.state[0];
        let t2 = c[2] * t0 + c[0] * self.state[0];
        let v2 = t2 + self.state[1];
        self.state[0] = self.state[0] + T::splat(2.0) * t1;
        self.state[1] = self.state[1] + T::splat(2.0) * t2;
        v2
    }

    fn coeffs(&self) -> Self::Coeffs {
        self.coeffs
    }
    fn set_coeffs(&mut self, c: Self::Coeffs) {
        self.coeffs = c;
    }
    fn clear(&mut self) {
        self.coeffs = Self::make_coeffs([T::splat(0.0), T::splat(0.5)]);
        self.state = Default::default();
    }
}

impl KernelSignal for Lopass<f32> {
    type ParamBlock = BlockArray<2>;
    #[inline]
    fn params_at(pb: &Self::ParamBlock, t: usize) -> Self::Params {
        [pb.row(0)[t], pb.row(1)[t]]
    }
}

/// State-variable highpass. Params: omega, k.
#[derive(Clone, Default)]
pub struct Hipass<T: Sample> {
    coeffs: [T; 4],
    state: [T; 2],
}

impl<T: Sample> Kernel<T> for Hipass<T> {
    type Params = [T; 2];
    type Coeffs = [T; 4];

    fn make_coeffs(p: Self::Params) -> Self::Coeffs {
        let (g0, g1, g2) = svf_g_coeffs!(p);
        [g0, g1, g2, p[1]]
    }

    #[inline]
    fn next_frame(&mut self, x: T, c: &Self::Coeffs) -> T {
        let t0 = x - self.state[1];
        let t1 = c[0] * t0 + c[1] * self.state[0];
        let t2 = c[2] * t0 + c[0] * self.state[0];
        let v1 = t1 + self.state[0];
        let v2 = t2 + self.state[1];
        self.state[0] = self.state[0] + T::splat(2.0) * t1;
        self.state[1] = self.state[1] + T::splat(2.0) * t2;
        x - c[3] * v1 - v2
    }

    fn coeffs(&self) -> Self::Coeffs {
        self.coeffs
    }
    fn set_coeffs(&mut self, c: Self::Coeffs) {
        self.coeffs = c;
    }
    fn clear(&mut self) {
        self.coeffs = Self::make_coeffs([T::splat(0.0), T::splat(0.5)]);
        self.state = Default::default();
    }
}

impl KernelSignal for Hipass<f32> {
    type ParamBlock = BlockArray<2>;
    #[inline]
    fn params_at(pb: &Self::ParamBlock, t: usize) -> Self::Params {
        [pb.row(0)[t], pb.row(1)[t]]
    }
}

/// State-variable bandpass. Params: omega, k.
#[derive(Clone, Default)]
pub struct Bandpass<T: Sample> {
    coeffs: [T; 3],
    state: [T; 2],
}

impl<T: Sample> Kernel<T> for Bandpass<T> {
    type Params = [T; 2];
    type Coeffs = [T; 3];

    fn make_coeffs(p: Self::Params) -> Self::Coeffs {
        let (g0, g1, g2) = svf_g_coeffs!(p);
        [g0, g1, g2]
    }

    #[inline]
    fn next_frame(&mut self, x: T, c: &Self::Coeffs) -> T {
        let t0 = x - self.state[1];
        let t1 = c[0] * t0 + c[1] * self.state[0];
        let t2 = c[2] * t0 + c[0] * self.state[0];
        let v1 = t1 + self.state[0];
        self.state[0] = self.state[0] + T::splat(2.0) * t1;
        self.state[1] = self.state[1] + T::splat(2.0) * t2;
        v1
    }

    fn coeffs(&self) -> Self::Coeffs {
        self.coeffs
    }
    fn set_coeffs(&mut self, c: Self::Coeffs) {
        self.coeffs = c;
    }
    fn clear(&mut self) {
        self.coeffs = Self::make_coeffs([T::splat(0.0), T::splat(0.5)]);
        self.state = Default::default();
    }
}

impl KernelSignal for Bandpass<f32> {
    type ParamBlock = BlockArray<2>;
    #[inline]
    fn params_at(pb: &Self::ParamBlock, t: usize) -> Self::Params {
        [pb.row(0)[t], pb.row(1)[t]]
    }
}

/// Low shelf. Params: omega, k, gain ratio A.
#[derive(Clone, Default)]
pub struct LoShelf<T: Sample> {
    coeffs: [T; 5],
    state: [T; 2],
}

impl<T: Sample> Kernel<T> for LoShelf<T> {
    type Params = [T; 3];
    type Coeffs = [T; 5];

    fn make_coeffs(p: Self::Params) -> Self::Coeffs {
        let piomega = T::splat(math::PI) * p[0];
        let g = piomega.tan() / p[2].sqrt();
        let a1 = T::splat(1.0) / (T::splat(1.0) + g * (g + p[1]));
        let a2 = g * a1;
        let a3 = g * a2;
        let m1 = p[1] * (p[2] - T::splat(1.0));
        let m2 = p[2] * p[2] - T::splat(1.0);
        [a1, a2, a3, m1, m2]
    }

    #[inline]
    fn next_frame(&mut self, x: T, c: &Self::Coeffs) -> T {
        let v3 = x - self.state[1];
        let v1 = c[0] * self.state[0] + c[1] * v3;
        let v2 = self.state[1] + c[1] * self.state[0] + c[2] * v3;
        self.state[0] = T::splat(2.0) * v1 - self.state[0];
        self.state[1] = T::splat(2.0) * v2 - self.state[1];
        x + c[3] * v1 + c[4] * v2
    }

    fn coeffs(&self) -> Self::Coeffs {
        self.coeffs
    }
    fn set_coeffs(&mut self, c: Self::Coeffs) {
        self.coeffs = c;
    }
    fn clear(&mut self) {
        self.coeffs = Self::make_coeffs([T::splat(0.0), T::splat(0.5), T::splat(1.0)]);
        self.state = Default::default();
    }
}

impl KernelSignal for LoShelf<f32> {
    type ParamBlock = BlockArray<3>;
    #[inline]
    fn params_at(pb: &Self::ParamBlock, t: usize) -> Self::Params {
        [pb.row(0)[t], pb.row(1)[t], pb.row(2)[t]]
    }
}

/// High shelf. Params: omega, k, gain ratio A.
#[derive(Clone, Default)]
pub struct HiShelf<T: Sample> {
    coeffs: [T; 6],
    state: [T; 2],
}

impl<T: Sample> Kernel<T> for HiShelf<T> {
    type Params = [T; 3];
    type Coeffs = [T; 6];

    fn make_coeffs(p: Self::Params) -> Self::Coeffs {
        let piomega = T::splat(math::PI) * p[0];
        let g = piomega.tan() * p[2].sqrt();
        let a1 = T::splat(1.0) / (T::splat(1.0) + g * (g + p[1]));
        let a2 = g * a1;
        let a3 = g * a2;
        let m0 = p[2] * p[2];
        let m1 = p[1] * (T::splat(1.0) - p[2]) * p[2];
        let m2 = T::splat(1.0) - p[2] * p[2];
        [a1, a2, a3, m0, m1, m2]
    }

    #[inline]
    fn next_frame(&mut self, x: T, c: &Self::Coeffs) -> T {
        let v3 = x - self.state[1];
        let v1 = c[0] * self.state[0] + c[1] * v3;
        let v2 = self.state[1] + c[1] * self.state[0] + c[2] * v3;
        self.state[0] = T::splat(2.0) * v1 - self.state[0];
        self.state[1] = T::splat(2.0) * v2 - self.state[1];
        c[3] * x + c[4] * v1 + c[5] * v2
    }

    fn coeffs(&self) -> Self::Coeffs {
        self.coeffs
    }
    fn set_coeffs(&mut self, c: Self::Coeffs) {
        self.coeffs = c;
    }
    fn clear(&mut self) {
        self.coeffs = Self::make_coeffs([T::splat(0.0), T::splat(0.5), T::splat(1.0)]);
        self.state = Default::default();
    }
}

impl KernelSignal for HiShelf<f32> {
    type ParamBlock = BlockArray<3>;
    #[inline]
    fn params_at(pb: &Self::ParamBlock, t: usize) -> Self::Params {
        [pb.row(0)[t], pb.row(1)[t], pb.row(2)[t]]
    }
}

/// Bell (peaking) filter. Params: omega, k, gain ratio A.
#[derive(Clone, Default)]
pub struct Bell<T: Sample> {
    coeffs: [T; 4],
    state: [T; 2],
}

impl<T: Sample> Kernel<T> for Bell<T> {
    type Params = [T; 3];
    type Coeffs = [T; 4];

    fn make_coeffs(p: Self::Params) -> Self::Coeffs {
        let kc = p[1] / p[2];
        let piomega = T::splat(math::PI) * p[0];
        let g = piomega.tan();
        let a1 = T::splat(1.0) / (T::splat(1.0) + g * (g + kc));
        let a2 = g * a1;
        let a3 = g * a2;
        let m1 = kc * (p[2] * p[2] - T::splat(1.0));
        [a1, a2, a3, m1]
    }

    #[inline]
    fn next_frame(&mut self, x: T, c: &Self::Coeffs) -> T {
        let v3 = x - self.state[1];
        let v1 = c[0] * self.state[0] + c[1] * v3;
        let v2 = self.state[1] + c[1] * self.state[0] + c[2] * v3;
        self.state[0] = T::splat(2.0) * v1 - self.state[0];
        self.state[1] = T::splat(2.0) * v2 - self.state[1];
        x + c[3] * v1
    }

    fn coeffs(&self) -> Self::Coeffs {
        self.coeffs
    }
    fn set_coeffs(&mut self, c: Self::Coeffs) {
        self.coeffs = c;
    }
    fn clear(&mut self) {
        self.coeffs = Self::make_coeffs([T::splat(0.0), T::splat(0.5), T::splat(1.0)]);
        self.state = Default::default();
    }
}

impl KernelSignal for Bell<f32> {
    type ParamBlock = BlockArray<3>;
    #[inline]
    fn params_at(pb: &Self::ParamBlock, t: usize) -> Self::Params {
        [pb.row(0)[t], pb.row(1)[t], pb.row(2)[t]]
    }
}

// ----------------------------------------------------------------
// one pole and friends

/// One-pole lowpass. Params: omega.
/// See <https://ccrma.stanford.edu/~jos/fp/One_Pole.html>.
#[derive(Clone, Default)]
pub struct OnePole<T: Sample> {
    coeffs: [T; 2],
    state: [T; 1],
}

impl<T: Sample> OnePole<T> {
    /// Coefficients that pass the input through unchanged.
    pub fn passthru() -> [T; 2] {
        [T::splat(1.0), T::splat(0.0)]
    }
}

impl<T: Sample> Kernel<T> for OnePole<T> {
    type Params = [T; 1];
    type Coeffs = [T; 2];

    fn make_coeffs(p: Self::Params) -> Self::Coeffs {
        let x = (T::splat(-math::TAU) * p[0]).exp();
        [T::splat(1.0) - x, x]
    }

    #[inline]
    fn next_frame(&mut self, x: T, c: &Self::Coeffs) -> T {
        self.state[0] = c[0] * x + c[1] * self.state[0];
        self.state[0]
    }

    fn coeffs(&self) -> Self::Coeffs {
        self.coeffs
    }
    fn set_coeffs(&mut self, c: Self::Coeffs) {
        self.coeffs = c;
    }
    fn clear(&mut self) {
        self.coeffs = Self::make_coeffs([T::splat(0.0)]);
        self.state = Default::default();
    }
}

impl KernelSignal for OnePole<f32> {
    type ParamBlock = Block;
    #[inline]
    fn params_at(pb: &Self::ParamBlock, t: usize) -> Self::Params {
        [pb.frames()[t]]
    }
}

/// One-pole, one-zero filter to attenuate DC. Params: omega.
/// See <https://ccrma.stanford.edu/~jos/fp/DC_Blocker.html>.
#[derive(Clone, Default)]
pub struct DcBlocker<T: Sample> {
    coeffs: [T; 1],
    state: [T; 2],
}

impl<T: Sample> Kernel<T> for DcBlocker<T> {
    type Params = [T; 1];
    type Coeffs = [T; 1];

    fn make_coeffs(p: Self::Params) -> Self::Coeffs {
        [p[0].cos()]
    }

    #[inline]
    fn next_frame(&mut self, x: T, c: &Self::Coeffs) -> T {
        let y0 = x - self.state[0] + c[0] * self.state[1];
        self.state[1] = y0;
        self.state[0] = x;
        y0
    }

    fn coeffs(&self) -> Self::Coeffs {
        self.coeffs
    }
    fn set_coeffs(&mut self, c: Self::Coeffs) {
        self.coeffs = c;
    }
    fn clear(&mut self) {
        self.coeffs = Self::make_coeffs([T::splat(0.045)]);
        self.state = Default::default();
    }
}

impl KernelSignal for DcBlocker<f32> {
    type ParamBlock = Block;
    #[inline]
    fn params_at(pb: &Self::ParamBlock, t: usize) -> Self::Params {
        [pb.frames()[t]]
    }
}

/// First order allpass section with a single sample of delay, in
/// one-multiply form. Params: delay fraction d. To minimize modulation
/// noise, d should stay in [0.618, 1.618].
/// See <https://ccrma.stanford.edu/~jos/pasp/One_Multiply_Scattering_Junctions.html>.
#[derive(Clone, Default)]
pub struct Allpass1<T: Sample> {
    coeffs: [T; 1],
    state: [T; 2],
}

impl<T: Sample> Allpass1<T> {
    /// Construct with a fixed coefficient value.
    pub fn with_coefficient(a: f32) -> Self {
        Self {
            coeffs: [T::splat(a)],
            state: Default::default(),
        }
    }

    /// Per-sample update using the stored coefficient.
    #[inline]
    pub fn next_sample(&mut self, x: T) -> T {
        let c = self.coeffs;
        self.next_frame(x, &c)
    }
}

impl<T: Sample> Kernel<T> for Allpass1<T> {
    type Params = [T; 1];
    type Coeffs = [T; 1];

    fn make_coeffs(p: Self::Params) -> Self::Coeffs {
        // 2nd order approximation around 1 to (1 - d) / (1 + d)
        let xm1 = p[0] - T::splat(1.0);
        [T::splat(-0.53) * xm1 + T::splat(0.24) * xm1 * xm1]
    }

    #[inline]
    fn next_frame(&mut self, x: T, c: &Self::Coeffs) -> T {
        let y = self.state[0] + (x - self.state[1]) * c[0];
        self.state[0] = x;
        self.state[1] = y;
        y
    }

    fn coeffs(&self) -> Self::Coeffs {
        self.coeffs
    }
    fn set_coeffs(&mut self, c: Self::Coeffs) {
        self.coeffs = c;
    }
    fn clear(&mut self) {
        self.state = Default::default();
    }
}

impl KernelSignal for Allpass1<f32> {
    type ParamBlock = Block;
    #[inline]
    fn params_at(pb: &Self::ParamBlock, t: usize) -> Self::Params {
        [pb.frames()[t]]
    }
}

// ----------------------------------------------------------------
// pink noise filter

/// Parallel one-pole bank approximating a -3 dB/octave slope. Call
/// [`PinkFilter::init`] with the sample rate before use; the six gains
/// are fitted analytically so the response tracks 1/f at any rate.
/// Apply to unit white noise to produce pink noise.
#[derive(Clone, Default)]
pub struct PinkFilter {
    a: [f32; Self::POLES],
    g: [f32; Self::POLES],
    state: [f32; Self::POLES],
}

impl PinkFilter {
    const POLES: usize = 6;
    const TARGETS: usize = 32;
    const POLE_FREQS: [f32; Self::POLES] = [1.5, 42.0, 220.0, 950.0, 3300.0, 9500.0];

    pub fn clear(&mut self) {
        self.state = [0.0; Self::POLES];
    }

    /// Fit the pole gains for the given sample rate.
    pub fn init(&mut self, sr: f32) {
        let mut af = [0.0f32; Self::POLES];
        for i in 0..Self::POLES {
            af[i] = (-math::TAU * Self::POLE_FREQS[i] / sr).exp();
        }

        // log-spaced target frequencies
        let mut f_targets = [0.0f32; Self::TARGETS];
        let log_min = 5.0f32.ln();
        let log_max = (sr * 0.45).ln();
        for k in 0..Self::TARGETS {
            f_targets[k] = (log_min + (log_max - log_min) * k as f32 / (Self::TARGETS - 1) as f32)
                .exp();
        }

        // target 1/sqrt(f), normalized at the midpoint
        let mut target_mag = [0.0f32; Self::TARGETS];
        let mid_mag = 1.0 / f_targets[Self::TARGETS / 2].sqrt();
        for k in 0..Self::TARGETS {
            target_mag[k] = (1.0 / f_targets[k].sqrt()) / mid_mag;
        }

        // complex basis: B[k][i] = 1 / (1 - a_i e^{-jw_k})
        let mut br = [[0.0f32; Self::POLES]; Self::TARGETS];
        let mut bi = [[0.0f32; Self::POLES]; Self::TARGETS];
        for k in 0..Self::TARGETS {
            let w = math::TAU * f_targets[k] / sr;
            let (cw, sw) = (w.cos(), w.sin());
            for i in 0..Self::POLES {
                let dr = 1.0 - af[i] * cw;
                let di = af[i] * sw;
                let denom = dr * dr + di * di;
                br[k][i] = dr / denom;
                bi[k][i] = -di / denom;
            }
        }

        // initial guess, normalized to unit |g| sum
        let mut gf = [0.0f32; Self::POLES];
        let mut g_sum = 0.0;
        for i in 0..Self::POLES {
            gf[i] = (1.0 - af[i]) / Self::POLE_FREQS[i].sqrt();
            g_sum += gf[i].abs();
        }
        for g in gf.iter_mut() {
            *g /= g_sum;
        }

        solver::fit_magnitude_response(&br, &bi, &target_mag, &mut gf, 10);

        self.a = af;
        self.g = gf;
    }

    #[inline]
    pub fn next_frame(&mut self, white: f32) -> f32 {
        let mut sum = 0.0;
        for i in 0..Self::POLES {
            self.state[i] = self.a[i] * self.state[i] + self.g[i] * white;
            sum += self.state[i];
        }
        sum
    }

    pub fn process_block(&mut self, input: &Block) -> Block {
        let mut out = Block::default();
        for t in 0..FRAMES_PER_BLOCK {
            out.frames_mut()[t] = self.next_frame(input.frames()[t]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block;

    #[test]
    fn interp_equals_signal_rate_for_constant_params() {
        let params = [0.1f32, 0.7];
        let coeffs = Lopass::<f32>::make_coeffs(params);

        let mut f1 = Lopass::<f32>::default();
        f1.clear();
        f1.set_coeffs(coeffs);
        let mut f2 = f1.clone();

        let input = block::range_closed(-1.0, 1.0);
        let by_interp = f1.process_interp_block(&input, params);

        let mut pb = BlockArray::<2>::default();
        pb.set_row(0, &Block::splat(params[0]));
        pb.set_row(1, &Block::splat(params[1]));
        let by_signal = f2.process_signal(&input, &pb);

        assert_eq!(by_interp, by_signal);
    }

    #[test]
    fn lowpass_passes_dc() {
        let mut f = Lopass::<f32>::default();
        f.clear();
        f.set_coeffs(Lopass::<f32>::make_coeffs([0.05, 0.5]));
        let input = Block::splat(1.0);
        let mut out = Block::default();
        for _ in 0..30 {
            out = f.process_block(&input);
        }
        for t in 0..FRAMES_PER_BLOCK {
            assert!((out.frames()[t] - 1.0).abs() < 0.01);
        }
    }

    #[test]
    fn dc_blocker_removes_dc() {
        let mut f = DcBlocker::<f32>::default();
        f.clear();
        let input = Block::splat(1.0);
        let mut out = Block::default();
        for _ in 0..200 {
            out = f.process_block(&input);
        }
        assert!(out.frames()[FRAMES_PER_BLOCK - 1].abs() < 0.01);
    }

    #[test]
    fn one_pole_passthru_is_identity() {
        let mut f = OnePole::<f32>::default();
        f.clear();
        f.set_coeffs(OnePole::<f32>::passthru());
        let input = block::range_closed(-1.0, 1.0);
        assert_eq!(f.process_block(&input), input);
    }

    #[test]
    fn bell_at_unity_gain_is_transparent() {
        let mut f = Bell::<f32>::default();
        f.clear();
        f.set_coeffs(Bell::<f32>::make_coeffs([0.1, 0.5, 1.0]));
        let input = block::range_closed(-1.0, 1.0);
        let out = f.process_block(&input);
        for t in 0..FRAMES_PER_BLOCK {
            assert!((out.frames()[t] - input.frames()[t]).abs() < 1e-6);
        }
    }

    #[test]
    fn allpass1_is_allpass_at_dc() {
        let mut f = Allpass1::<f32>::default();
        f.set_coeffs(Allpass1::<f32>::make_coeffs([1.0]));
        let input = Block::splat(1.0);
        let mut out = Block::default();
        for _ in 0..10 {
            out = f.process_block(&input);
        }
        assert!((out.frames()[FRAMES_PER_BLOCK - 1] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn pink_filter_fit_is_finite_and_pink_ish() {
        let mut pink = PinkFilter::default();
        pink.init(48000.0);
        for g in pink.g.iter() {
            assert!(g.is_finite());
        }
        // drive with alternating +-1 "white" input; output must be finite
        let mut x = 1.0;
        for _ in 0..1000 {
            let y = pink.next_frame(x);
            assert!(y.is_finite());
            x = -x;
        }
    }

    #[test]
    fn lane_kernel_matches_scalar_kernel() {
        let params_s = [0.07f32, 0.8];
        let params_v = [crate::simd::F32x::splat(0.07), crate::simd::F32x::splat(0.8)];

        let mut fs = Lopass::<f32>::default();
        fs.set_coeffs(Lopass::<f32>::make_coeffs(params_s));
        let mut fv = Lopass::<crate::simd::F32x>::default();
        fv.set_coeffs(Lopass::<crate::simd::F32x>::make_coeffs(params_v));

        let mut xs = 0.3f32;
        for _ in 0..64 {
            let cs = fs.coeffs();
            let cv = fv.coeffs();
            let ys = fs.next_frame(xs, &cs);
            let yv = fv.next_frame(crate::simd::F32x::splat(xs), &cv);
            assert!((ys - yv.to_array()[0]).abs() < 1e-4);
            xs = -xs;
        }
    }
}
