//! Four-lane SIMD primitives.
//!
//! The vector types come from the `wide` crate, which lowers to SSE on
//! x86 and NEON on AArch64 behind one operator set. This module adds the
//! operations `wide` does not expose directly: bitwise float ops, masked
//! selects, compile-time shuffles, pairwise element shifts and horizontal
//! reductions. Pure integer operations produce identical bits on every
//! back-end; float comparisons return all-ones / all-zeros lane masks.

pub use wide::{f32x4, i32x4};
#[cfg(test)]
use wide::{CmpEq, CmpGt};

/// Four f32 lanes.
pub type F32x = f32x4;

/// Four i32 lanes.
pub type I32x = i32x4;

/// Reinterpret float lanes as integer bits.
#[inline]
pub fn float_bits(x: F32x) -> I32x {
    bytemuck::cast(x)
}

/// Reinterpret integer lanes as float bits.
#[inline]
pub fn bits_float(x: I32x) -> F32x {
    bytemuck::cast(x)
}

/// Bitwise and of float lanes.
#[inline]
pub fn and_bits(a: F32x, b: F32x) -> F32x {
    bits_float(float_bits(a) & float_bits(b))
}

/// Bitwise and-not of float lanes: `!a & b`.
#[inline]
pub fn and_not_bits(a: F32x, b: F32x) -> F32x {
    bits_float((float_bits(a) ^ I32x::splat(-1)) & float_bits(b))
}

/// Bitwise or of float lanes.
#[inline]
pub fn or_bits(a: F32x, b: F32x) -> F32x {
    bits_float(float_bits(a) | float_bits(b))
}

/// Bitwise xor of float lanes.
#[inline]
pub fn xor_bits(a: F32x, b: F32x) -> F32x {
    bits_float(float_bits(a) ^ float_bits(b))
}

/// Bitwise and-not of integer lanes: `!a & b`.
#[inline]
pub fn and_not_int(a: I32x, b: I32x) -> I32x {
    (a ^ I32x::splat(-1)) & b
}

/// Shift each integer lane left by `COUNT` bits.
#[inline]
pub fn shl_elements<const COUNT: u32>(v: I32x) -> I32x {
    I32x::from(v.to_array().map(|x| x << COUNT))
}

/// Logical right shift of each integer lane by `COUNT` bits.
#[inline]
pub fn shr_elements<const COUNT: u32>(v: I32x) -> I32x {
    I32x::from(v.to_array().map(|x| ((x as u32) >> COUNT) as i32))
}

/// Return `a` where mask bits are set, `b` elsewhere.
#[inline]
pub fn select(a: F32x, b: F32x, mask: I32x) -> F32x {
    bits_float((float_bits(a) & mask) | and_not_int(mask, float_bits(b)))
}

/// Return `a` where mask bits are set, `b` elsewhere.
#[inline]
pub fn select_int(a: I32x, b: I32x, mask: I32x) -> I32x {
    (a & mask) | and_not_int(mask, b)
}

/// Convert lanes interpreted as u32 to float.
#[inline]
pub fn unsigned_int_to_float(v: I32x) -> F32x {
    F32x::from(v.to_array().map(|x| x as u32 as f32))
}

/// Truncate float lanes toward zero to integer.
#[inline]
pub fn float_to_int_truncate(v: F32x) -> I32x {
    v.fast_trunc_int()
}

/// Round float lanes to nearest integer.
#[inline]
pub fn float_to_int_round(v: F32x) -> I32x {
    v.round_int()
}

/// Convert integer lanes to float.
#[inline]
pub fn int_to_float(v: I32x) -> F32x {
    v.round_float()
}

/// Horizontal sum of the four lanes.
#[inline]
pub fn sum_h(v: F32x) -> f32 {
    v.reduce_add()
}

/// Horizontal maximum of the four lanes.
#[inline]
pub fn max_h(v: F32x) -> f32 {
    let a = v.to_array();
    a[0].max(a[1]).max(a[2].max(a[3]))
}

/// Horizontal minimum of the four lanes.
#[inline]
pub fn min_h(v: F32x) -> f32 {
    let a = v.to_array();
    a[0].min(a[1]).min(a[2].min(a[3]))
}

/// Shuffle two vectors with compile-time lane indices, SSE style: the
/// low two output lanes come from `a`, the high two from `b`.
#[inline]
pub fn shuffle2<const I0: usize, const I1: usize, const I2: usize, const I3: usize>(
    a: F32x,
    b: F32x,
) -> F32x {
    let a = a.to_array();
    let b = b.to_array();
    F32x::from([a[I0], a[I1], b[I2], b[I3]])
}

/// Interleave the low lanes of two vectors: `[a0, b0, a1, b1]`.
#[inline]
pub fn unpack_lo(a: F32x, b: F32x) -> F32x {
    let a = a.to_array();
    let b = b.to_array();
    F32x::from([a[0], b[0], a[1], b[1]])
}

/// Interleave the high lanes of two vectors: `[a2, b2, a3, b3]`.
#[inline]
pub fn unpack_hi(a: F32x, b: F32x) -> F32x {
    let a = a.to_array();
    let b = b.to_array();
    F32x::from([a[2], b[2], a[3], b[3]])
}

/// Move the low half of `b` above the low half of `a`: `[a0, a1, b0, b1]`.
#[inline]
pub fn move_lh(a: F32x, b: F32x) -> F32x {
    let a = a.to_array();
    let b = b.to_array();
    F32x::from([a[0], a[1], b[0], b[1]])
}

/// Move the high half of `b` below the high half of `a`: `[b2, b3, a2, a3]`.
#[inline]
pub fn move_hl(a: F32x, b: F32x) -> F32x {
    let a = a.to_array();
    let b = b.to_array();
    F32x::from([b[2], b[3], a[2], a[3]])
}

/// Shift a pair of vectors left by one element: `[a1, a2, a3, b0]`.
#[inline]
pub fn shuffle_left(a: F32x, b: F32x) -> F32x {
    let a = a.to_array();
    let b = b.to_array();
    F32x::from([a[1], a[2], a[3], b[0]])
}

/// Shift a pair of vectors right by one element: `[a3, b0, b1, b2]`.
#[inline]
pub fn shuffle_right(a: F32x, b: F32x) -> F32x {
    let a = a.to_array();
    let b = b.to_array();
    F32x::from([a[3], b[0], b[1], b[2]])
}

/// Transpose a 4x4 matrix of lanes.
#[inline]
pub fn transpose4(rows: [F32x; 4]) -> [F32x; 4] {
    let t0 = unpack_lo(rows[0], rows[1]);
    let t1 = unpack_lo(rows[2], rows[3]);
    let t2 = unpack_hi(rows[0], rows[1]);
    let t3 = unpack_hi(rows[2], rows[3]);
    [
        move_lh(t0, t1),
        move_hl(t1, t0),
        move_lh(t2, t3),
        move_hl(t3, t2),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitcasts_round_trip() {
        let x = F32x::from([1.0, -2.5, 0.0, 1e-20]);
        assert_eq!(bits_float(float_bits(x)), x);
    }

    #[test]
    fn select_uses_mask_lanes() {
        let a = F32x::from([1.0, 2.0, 3.0, 4.0]);
        let b = F32x::from([9.0, 8.0, 7.0, 6.0]);
        let mask = float_bits(a.cmp_gt(F32x::splat(2.5)));
        assert_eq!(select(a, b, mask).to_array(), [9.0, 8.0, 3.0, 4.0]);
    }

    #[test]
    fn shuffles() {
        let a = F32x::from([0.0, 1.0, 2.0, 3.0]);
        let b = F32x::from([4.0, 5.0, 6.0, 7.0]);
        assert_eq!(shuffle2::<3, 2, 1, 0>(a, b).to_array(), [3.0, 2.0, 5.0, 4.0]);
        assert_eq!(unpack_lo(a, b).to_array(), [0.0, 4.0, 1.0, 5.0]);
        assert_eq!(unpack_hi(a, b).to_array(), [2.0, 6.0, 3.0, 7.0]);
        assert_eq!(move_lh(a, b).to_array(), [0.0, 1.0, 4.0, 5.0]);
        assert_eq!(move_hl(a, b).to_array(), [6.0, 7.0, 2.0, 3.0]);
        assert_eq!(shuffle_left(a, b).to_array(), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(shuffle_right(a, b).to_array(), [3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn transpose_is_involutive() {
        let m = [
            F32x::from([0.0, 1.0, 2.0, 3.0]),
            F32x::from([4.0, 5.0, 6.0, 7.0]),
            F32x::from([8.0, 9.0, 10.0, 11.0]),
            F32x::from([12.0, 13.0, 14.0, 15.0]),
        ];
        let t = transpose4(m);
        assert_eq!(t[0].to_array(), [0.0, 4.0, 8.0, 12.0]);
        let tt = transpose4(t);
        for i in 0..4 {
            assert_eq!(tt[i], m[i]);
        }
    }

    #[test]
    fn integer_shifts() {
        let v = I32x::from([1, 2, -4, 0x4000_0000]);
        assert_eq!(shl_elements::<1>(v).to_array(), [2, 4, -8, i32::MIN]);
        assert_eq!(
            shr_elements::<1>(I32x::from([4, -4, 2, 1])).to_array(),
            [2, 0x7fff_fffe, 1, 0]
        );
    }

    #[test]
    fn bit_selects_and_masks() {
        let a = F32x::from([1.0, -2.0, 3.0, -4.0]);
        // absolute value by masking off the sign bit
        let absa = and_not_bits(F32x::splat(-0.0), a);
        assert_eq!(absa.to_array(), [1.0, 2.0, 3.0, 4.0]);

        let x = I32x::from([1, 2, 3, 4]);
        let y = I32x::from([9, 9, 9, 9]);
        let mask = x.cmp_eq(I32x::from([1, 0, 3, 0]));
        assert_eq!(select_int(x, y, mask).to_array(), [1, 9, 3, 9]);
    }

    #[test]
    fn unsigned_conversion() {
        let v = I32x::from([0, 1, -1, i32::MIN]);
        let f = unsigned_int_to_float(v).to_array();
        assert_eq!(f[0], 0.0);
        assert_eq!(f[1], 1.0);
        assert_eq!(f[2], u32::MAX as f32);
        assert_eq!(f[3], 2147483648.0);
    }

    #[test]
    fn horizontal_ops() {
        let v = F32x::from([1.0, -2.0, 3.0, 4.0]);
        assert_eq!(sum_h(v), 6.0);
        assert_eq!(max_h(v), 4.0);
        assert_eq!(min_h(v), -2.0);
    }
}
