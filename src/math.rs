//! Math functions and utilities.
//!
//! Two tiers of transcendental functions are provided. The precise tier
//! (`vec_sin`, `vec_cos`, `vec_log`, `vec_exp` and friends) is a port of
//! the cephes-derived SIMD library by Julien Pommier; maximum error over
//! the reference range is about 2e-6. The approximate tier (`sin_approx`
//! and friends) uses short polynomials, is generic over [`Sample`], and
//! stays within about 2e-4.

use crate::sample::Sample;
use crate::simd::{
    and_bits, bits_float, float_bits, float_to_int_truncate, int_to_float, or_bits, shl_elements,
    shr_elements, xor_bits, F32x, I32x,
};
use crate::FRAMES_PER_BLOCK;
use wide::{CmpEq, CmpGt, CmpLe, CmpLt};

/// pi
pub const PI: f32 = core::f32::consts::PI;
/// tau = 2 * pi
pub const TAU: f32 = core::f32::consts::TAU;

/// Clamps `x` between `lo` and `hi`.
#[inline]
pub fn clamp<T: Sample>(x: T, lo: T, hi: T) -> T {
    x.max(lo).min(hi)
}

/// Linear interpolation from `a` to `b` by `t`.
#[inline]
pub fn lerp<T: Sample>(a: T, b: T, t: T) -> T {
    a + t * (b - a)
}

/// Recovers `t` from interpolated `x`.
#[inline]
pub fn inverse_lerp<T: Sample>(a: T, b: T, x: T) -> T {
    (x - a) / (b - a)
}

/// Square function.
#[inline]
pub fn squared<T: Sample>(x: T) -> T {
    x * x
}

/// Convert decibels to gain. 0 dB = 1.0.
#[inline]
pub fn db_amp(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert amplitude `gain` (`gain` > 0) to decibels. Unity gain = 0 dB.
#[inline]
pub fn amp_db(gain: f32) -> f32 {
    gain.log10() * 20.0
}

/// Convert decibels to the gain parameter `A` of bell and shelf filters.
/// Use this, not `db_amp`, when setting filter gain.
#[inline]
pub fn db_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 40.0)
}

/// Convert MIDI note number to frequency in Hz. Returns 440 Hz for A_4
/// (note number 69).
#[inline]
pub fn midi_hz(x: f32) -> f32 {
    440.0 * ((x - 69.0) / 12.0).exp2()
}

/// Ramp of `(i + 1) / N` steps covering one block, used wherever a value
/// is interpolated linearly across a block.
pub const UNITY_RAMP: [f32; FRAMES_PER_BLOCK] = unity_ramp();

const fn unity_ramp() -> [f32; FRAMES_PER_BLOCK] {
    let mut a = [0.0f32; FRAMES_PER_BLOCK];
    let mut i = 0;
    while i < FRAMES_PER_BLOCK {
        a[i] = (i + 1) as f32 / FRAMES_PER_BLOCK as f32;
        i += 1;
    }
    a
}

// ----------------------------------------------------------------
// Precise tier: cephes-derived vector functions.
// Adapted from code by Julien Pommier, (C) 2007, zlib license.

const LOG_P0: f32 = 7.037_683_6E-2;
const LOG_P1: f32 = -1.151_461E-1;
const LOG_P2: f32 = 1.167_699_9E-1;
const LOG_P3: f32 = -1.242_014_1E-1;
const LOG_P4: f32 = 1.424_932_3E-1;
const LOG_P5: f32 = -1.666_805_7E-1;
const LOG_P6: f32 = 2.000_071_5E-1;
const LOG_P7: f32 = -2.499_999_4E-1;
const LOG_P8: f32 = 3.333_333_2E-1;
const LOG_Q1: f32 = -2.121_944_4e-4;
const LOG_Q2: f32 = 0.693_359_375;
const SQRTHF: f32 = 0.707_106_77;

const EXP_HI: f32 = 88.376_26;
const EXP_LO: f32 = -88.376_26;
const LOG2EF: f32 = 1.442_695;
const EXP_C1: f32 = 0.693_359_375;
const EXP_C2: f32 = -2.121_944_4e-4;
const EXP_P0: f32 = 1.987_569_1E-4;
const EXP_P1: f32 = 1.398_199_9E-3;
const EXP_P2: f32 = 8.333_452E-3;
const EXP_P3: f32 = 4.166_579_6E-2;
const EXP_P4: f32 = 1.666_666_5E-1;
const EXP_P5: f32 = 5.000_000_1E-1;

const DP1: f32 = -0.78515625;
const DP2: f32 = -2.418_756_5e-4;
const DP3: f32 = -3.774_895E-8;
const SIN_P0: f32 = -1.951_529_6E-4;
const SIN_P1: f32 = 8.332_161E-3;
const SIN_P2: f32 = -1.666_665_5E-1;
const COS_P0: f32 = 2.443_315_7E-5;
const COS_P1: f32 = -1.388_731_6E-3;
const COS_P2: f32 = 4.166_664_6E-2;
const FOPI: f32 = 1.273_239_5; // 4 / pi

const MIN_NORM_POS: i32 = 0x0080_0000;
const MANT_MASK: i32 = 0x7f80_0000;
const SIGN_MASK: i32 = i32::MIN;

/// Natural logarithm of each lane. Lanes <= 0 return NaN.
pub fn vec_log(x: F32x) -> F32x {
    let one = F32x::splat(1.0);
    let invalid_mask = x.cmp_le(F32x::ZERO);

    let x = x.max(bits_float(I32x::splat(MIN_NORM_POS)));
    let mut emm0 = shr_elements::<23>(float_bits(x));

    let x = and_bits(x, bits_float(I32x::splat(!MANT_MASK)));
    let mut x = or_bits(x, F32x::splat(0.5));

    emm0 = emm0 - I32x::splat(0x7f);
    let mut e = int_to_float(emm0) + one;

    let mask = x.cmp_lt(F32x::splat(SQRTHF));
    let tmp = and_bits(x, mask);
    x = x - one;
    e = e - and_bits(one, mask);
    x = x + tmp;

    let z = x * x;

    let mut y = F32x::splat(LOG_P0);
    y = y.mul_add(x, F32x::splat(LOG_P1));
    y = y.mul_add(x, F32x::splat(LOG_P2));
    y = y.mul_add(x, F32x::splat(LOG_P3));
    y = y.mul_add(x, F32x::splat(LOG_P4));
    y = y.mul_add(x, F32x::splat(LOG_P5));
    y = y.mul_add(x, F32x::splat(LOG_P6));
    y = y.mul_add(x, F32x::splat(LOG_P7));
    y = y.mul_add(x, F32x::splat(LOG_P8));
    y = y * x;

    y = y * z;
    y = y + e * F32x::splat(LOG_Q1);
    y = y - z * F32x::splat(0.5);

    let x = x + y + e * F32x::splat(LOG_Q2);
    or_bits(x, invalid_mask)
}

/// Exponential of each lane.
pub fn vec_exp(x: F32x) -> F32x {
    let one = F32x::splat(1.0);

    let x = x.min(F32x::splat(EXP_HI)).max(F32x::splat(EXP_LO));

    let fx = x.mul_add(F32x::splat(LOG2EF), F32x::splat(0.5));
    let emm0 = float_to_int_truncate(fx);
    let tmp = int_to_float(emm0);

    // round toward -inf
    let mask = and_bits(tmp.cmp_gt(fx), one);
    let fx = tmp - mask;

    let x = x - fx * F32x::splat(EXP_C1) - fx * F32x::splat(EXP_C2);
    let z = x * x;

    let mut y = F32x::splat(EXP_P0);
    y = y.mul_add(x, F32x::splat(EXP_P1));
    y = y.mul_add(x, F32x::splat(EXP_P2));
    y = y.mul_add(x, F32x::splat(EXP_P3));
    y = y.mul_add(x, F32x::splat(EXP_P4));
    y = y.mul_add(x, F32x::splat(EXP_P5));
    y = y.mul_add(z, x);
    y = y + one;

    let emm0 = float_to_int_truncate(fx) + I32x::splat(0x7f);
    let pow2n = bits_float(shl_elements::<23>(emm0));
    y * pow2n
}

/// Sine of each lane.
pub fn vec_sin(x: F32x) -> F32x {
    let (s, _) = vec_sincos(x);
    s
}

/// Cosine of each lane.
pub fn vec_cos(x: F32x) -> F32x {
    let (_, c) = vec_sincos(x);
    c
}

/// Simultaneous sine and cosine of each lane.
pub fn vec_sincos(x: F32x) -> (F32x, F32x) {
    let mut sign_bit_sin = float_bits(x);
    let x = and_bits(x, bits_float(I32x::splat(!SIGN_MASK)));
    sign_bit_sin = sign_bit_sin & I32x::splat(SIGN_MASK);

    let y = x * F32x::splat(FOPI);

    let mut emm2 = float_to_int_truncate(y);
    emm2 = emm2 + I32x::splat(1);
    emm2 = emm2 & I32x::splat(!1);
    let y = int_to_float(emm2);

    let emm4 = emm2;

    let emm0 = shl_elements::<29>(emm2 & I32x::splat(4));
    let swap_sign_bit_sin = emm0;

    let emm2 = (emm2 & I32x::splat(2)).cmp_eq(I32x::splat(0));
    let poly_mask = bits_float(emm2);

    let x = x + y * F32x::splat(DP1) + y * F32x::splat(DP2) + y * F32x::splat(DP3);

    let emm4 = emm4 - I32x::splat(2);
    let emm4 = shl_elements::<29>((emm4 ^ I32x::splat(-1)) & I32x::splat(4));
    let sign_bit_cos = emm4;

    let sign_bit_sin = sign_bit_sin ^ swap_sign_bit_sin;

    let z = x * x;
    let mut y = F32x::splat(COS_P0);
    y = y.mul_add(z, F32x::splat(COS_P1));
    y = y.mul_add(z, F32x::splat(COS_P2));
    y = y * z * z;
    y = y - z * F32x::splat(0.5);
    y = y + F32x::splat(1.0);

    let mut y2 = F32x::splat(SIN_P0);
    y2 = y2.mul_add(z, F32x::splat(SIN_P1));
    y2 = y2.mul_add(z, F32x::splat(SIN_P2));
    y2 = y2 * z * x;
    y2 = y2 + x;

    let ysin2 = and_bits(poly_mask, y2);
    let ysin1 = and_bits(bits_float(float_bits(poly_mask) ^ I32x::splat(-1)), y);
    let y2 = y2 - ysin2;
    let y = y - ysin1;

    let s = xor_bits(ysin1 + ysin2, bits_float(sign_bit_sin));
    let c = xor_bits(y + y2, bits_float(sign_bit_cos));
    (s, c)
}

const LOG_TWO: f32 = core::f32::consts::LN_2;
const LOG_TWO_R: f32 = core::f32::consts::LOG2_E;

/// Base-2 logarithm derived from `vec_log`.
#[inline]
pub fn vec_log2(x: F32x) -> F32x {
    vec_log(x) * F32x::splat(LOG_TWO_R)
}

/// Base-2 exponential derived from `vec_exp`.
#[inline]
pub fn vec_exp2(x: F32x) -> F32x {
    vec_exp(F32x::splat(LOG_TWO) * x)
}

// ----------------------------------------------------------------
// Fast tier: short polynomial approximations, generic over Sample.

const SIN_C1: f32 = 0.999_979_4;
const SIN_C2: f32 = -0.166_624_37;
const SIN_C3: f32 = 8.308_978_8e-3;
const SIN_C4: f32 = -1.926_491_8e-4;
const SIN_C5: f32 = 2.147_840_2e-6;

const COS_C1: f32 = 0.999_959_77;
const COS_C2: f32 = -0.499_793_1;
const COS_C3: f32 = 4.149_600_1e-2;
const COS_C4: f32 = -1.339_263e-3;
const COS_C5: f32 = 1.879_170_9e-5;

const TANH_N: f32 = 27.0;
const TANH_D: f32 = 9.0;

const EXP_A1: f32 = 2_139_095_040.0;
const EXP_A2: f32 = 12_102_203.0;
const EXP_A3: f32 = 1_065_353_216.0;
const EXP_A4: f32 = 0.510_397_35;
const EXP_A5: f32 = 0.310_670_9;
const EXP_A6: f32 = 0.168_143_43;
const EXP_A7: f32 = -2.880_935_9e-3;
const EXP_A8: f32 = 1.367_102_3e-2;

const LOG_A1: f32 = -89.970_76;
const LOG_A2: f32 = 3.529_305;
const LOG_A3: f32 = -2.461_222_1;
const LOG_A4: f32 = 1.130_626_2;
const LOG_A5: f32 = -0.288_739_95;
const LOG_A6: f32 = 3.110_401_6e-2;
const LOG_A7: f32 = 0.693_147_2;

/// Fast sine approximation, valid on about [-pi, pi].
#[inline]
pub fn sin_approx<T: Sample>(x: T) -> T {
    let x2 = x * x;
    let mut y = T::splat(SIN_C5);
    y = y.mul_add(x2, T::splat(SIN_C4));
    y = y.mul_add(x2, T::splat(SIN_C3));
    y = y.mul_add(x2, T::splat(SIN_C2));
    y = y.mul_add(x2, T::splat(SIN_C1));
    x * y
}

/// Fast cosine approximation, valid on about [-pi, pi].
#[inline]
pub fn cos_approx<T: Sample>(x: T) -> T {
    let x2 = x * x;
    let mut y = T::splat(COS_C5);
    y = y.mul_add(x2, T::splat(COS_C4));
    y = y.mul_add(x2, T::splat(COS_C3));
    y = y.mul_add(x2, T::splat(COS_C2));
    y.mul_add(x2, T::splat(COS_C1))
}

/// Rational tanh approximation. Clamps softly outside about [-3, 3].
#[inline]
pub fn tanh_approx<T: Sample>(x: T) -> T {
    let x2 = x * x;
    x * (T::splat(TANH_N) + x2) / (T::splat(TANH_N) + T::splat(TANH_D) * x2)
}

/// Fast exponential approximation using float bit manipulation.
#[inline]
pub fn exp_approx<T: Sample>(x: T) -> T {
    let val2 = x.mul_add(T::splat(EXP_A2), T::splat(EXP_A3));
    let val3 = val2.min(T::splat(EXP_A1));
    let val4 = val3.max(T::default());
    let val4i = val4.trunc_int();

    let xu = T::from_bits(T::int_and(val4i, T::int_splat(0x7F80_0000)));
    let b = T::from_bits(T::int_or(
        T::int_and(val4i, T::int_splat(0x007F_FFFF)),
        T::int_splat(0x3F80_0000),
    ));

    let mut y = T::splat(EXP_A8);
    y = y.mul_add(b, T::splat(EXP_A7));
    y = y.mul_add(b, T::splat(EXP_A6));
    y = y.mul_add(b, T::splat(EXP_A5));
    y = y.mul_add(b, T::splat(EXP_A4));
    xu * y
}

/// Fast natural logarithm approximation using float bit manipulation.
#[inline]
pub fn log_approx<T: Sample>(x: T) -> T {
    let vi = x.to_bits();
    let expi = T::int_shr_logical::<23>(vi);

    let xm = T::from_bits(T::int_or(
        T::int_and(vi, T::int_splat(0x007F_FFFF)),
        T::int_splat(0x3F80_0000),
    ));

    let mut poly = T::splat(LOG_A6);
    poly = poly.mul_add(xm, T::splat(LOG_A5));
    poly = poly.mul_add(xm, T::splat(LOG_A4));
    poly = poly.mul_add(xm, T::splat(LOG_A3));
    poly = poly.mul_add(xm, T::splat(LOG_A2));
    poly = poly * xm;

    let addcst = T::select_gt(
        x,
        T::default(),
        T::splat(LOG_A1),
        T::splat(f32::MIN_POSITIVE),
    );
    poly + addcst + T::splat(LOG_A7) * T::int_to_float(expi)
}

// ----------------------------------------------------------------
// Projections: scalar maps of the unit interval onto parameter ranges.

pub mod projections {
    /// Squared map that keeps sign: `x * |x|`.
    #[inline]
    pub fn bisquared(x: f32) -> f32 {
        x * x.abs()
    }

    /// Inverse of [`bisquared`].
    #[inline]
    pub fn inv_bisquared(x: f32) -> f32 {
        x.signum() * x.abs().sqrt()
    }

    /// Map [0, 1] exponentially onto [lo, hi]. `lo`, `hi` > 0.
    pub fn unity_to_log_param(lo: f32, hi: f32) -> impl Fn(f32) -> f32 {
        let log_lo = lo.ln();
        let log_hi = hi.ln();
        move |x| (log_lo + (log_hi - log_lo) * x).exp()
    }

    /// Piecewise linear map of [0, 1] through evenly spaced breakpoints.
    pub fn piecewise_linear(points: Vec<f32>) -> impl Fn(f32) -> f32 {
        move |x| {
            let segments = points.len() - 1;
            let pos = (x.clamp(0.0, 1.0)) * segments as f32;
            let i = (pos as usize).min(segments - 1);
            let frac = pos - i as f32;
            points[i] + (points[i + 1] - points[i]) * frac
        }
    }
}
