//! Banks of kernels processing four voices per SIMD lane.
//!
//! A [`BankBlock`] holds `GROUPS * 4` voices: lane layout is vertical,
//! with one [`F32x`] of four voices per frame. Each group of four voices
//! runs through a single kernel instantiated at `T = F32x`, so a bank of
//! eight filters costs two filter updates per sample.

use crate::block::Block;
use crate::filter::{Kernel, KernelBlock};
use crate::gen::GenKernel;
use crate::simd::{transpose4, F32x};
use crate::{FRAMES_PER_BLOCK, SIMD_LANES};
use core::ops::{Index, IndexMut};

/// Samples for `GROUPS * 4` voices over one block.
#[derive(Clone, Copy, Debug)]
pub struct BankBlock<const GROUPS: usize> {
    rows: [[F32x; FRAMES_PER_BLOCK]; GROUPS],
}

impl<const GROUPS: usize> Default for BankBlock<GROUPS> {
    fn default() -> Self {
        Self {
            rows: [[F32x::ZERO; FRAMES_PER_BLOCK]; GROUPS],
        }
    }
}

impl<const GROUPS: usize> BankBlock<GROUPS> {
    /// Number of voices held.
    pub const VOICES: usize = GROUPS * SIMD_LANES;

    /// Every voice filled with the same value.
    pub fn splat(x: f32) -> Self {
        Self {
            rows: [[F32x::splat(x); FRAMES_PER_BLOCK]; GROUPS],
        }
    }

    /// Fill from a function of (voice, frame).
    pub fn from_fn(mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut out = Self::default();
        for v in 0..Self::VOICES {
            for t in 0..FRAMES_PER_BLOCK {
                out.set_sample(v, t, f(v, t));
            }
        }
        out
    }

    /// One group of four voices, one vector per frame.
    #[inline]
    pub fn group(&self, g: usize) -> &[F32x; FRAMES_PER_BLOCK] {
        &self.rows[g]
    }

    /// Mutable access to one group of four voices.
    #[inline]
    pub fn group_mut(&mut self, g: usize) -> &mut [F32x; FRAMES_PER_BLOCK] {
        &mut self.rows[g]
    }

    /// Set one voice's sample at one frame.
    pub fn set_sample(&mut self, voice: usize, frame: usize, value: f32) {
        let g = voice / SIMD_LANES;
        let lane = voice % SIMD_LANES;
        let mut arr = self.rows[g][frame].to_array();
        arr[lane] = value;
        self.rows[g][frame] = F32x::from(arr);
    }

    /// Copy a block into one voice.
    pub fn set_voice(&mut self, voice: usize, block: &Block) {
        for t in 0..FRAMES_PER_BLOCK {
            self.set_sample(voice, t, block.frames()[t]);
        }
    }

    /// Transpose one group from lane-vertical layout into four
    /// per-voice blocks.
    pub fn group_voices(&self, g: usize) -> [Block; SIMD_LANES] {
        let mut out = [Block::default(); SIMD_LANES];
        let src = &self.rows[g];
        for t4 in 0..FRAMES_PER_BLOCK / SIMD_LANES {
            let t = t4 * SIMD_LANES;
            let cols = transpose4([src[t], src[t + 1], src[t + 2], src[t + 3]]);
            for lane in 0..SIMD_LANES {
                out[lane].simd_mut()[t4] = cols[lane];
            }
        }
        out
    }

    /// Extract one voice as a block.
    pub fn voice(&self, v: usize) -> Block {
        self.group_voices(v / SIMD_LANES)[v % SIMD_LANES]
    }
}

/// A bank of filter kernels, four voices per kernel.
pub struct FilterBank<K, const GROUPS: usize> {
    procs: [K; GROUPS],
}

impl<K: Kernel<F32x>, const GROUPS: usize> FilterBank<K, GROUPS> {
    pub fn new() -> Self {
        Self {
            procs: core::array::from_fn(|_| K::default()),
        }
    }

    pub fn clear(&mut self) {
        for p in self.procs.iter_mut() {
            p.clear();
        }
    }

    /// Apply each kernel's stored coefficients to its group.
    pub fn process(&mut self, input: &BankBlock<GROUPS>) -> BankBlock<GROUPS> {
        let mut out = BankBlock::default();
        for g in 0..GROUPS {
            *out.group_mut(g) = KernelBlock::process(&mut self.procs[g], input.group(g));
        }
        out
    }

    /// Per-block interpolated parameter update, one `Params` per group.
    pub fn process_interp(
        &mut self,
        input: &BankBlock<GROUPS>,
        params: &[K::Params; GROUPS],
    ) -> BankBlock<GROUPS> {
        let mut out = BankBlock::default();
        for g in 0..GROUPS {
            *out.group_mut(g) = self.procs[g].process_interp(input.group(g), params[g]);
        }
        out
    }
}

impl<K: Kernel<F32x>, const GROUPS: usize> Default for FilterBank<K, GROUPS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, const GROUPS: usize> Index<usize> for FilterBank<K, GROUPS> {
    type Output = K;
    fn index(&self, i: usize) -> &K {
        &self.procs[i]
    }
}

impl<K, const GROUPS: usize> IndexMut<usize> for FilterBank<K, GROUPS> {
    fn index_mut(&mut self, i: usize) -> &mut K {
        &mut self.procs[i]
    }
}

/// A bank of generators, four voices per generator.
pub struct GenBank<G, const GROUPS: usize> {
    gens: [G; GROUPS],
}

impl<G: GenKernel<F32x>, const GROUPS: usize> GenBank<G, GROUPS> {
    pub fn new() -> Self {
        Self {
            gens: core::array::from_fn(|_| G::default()),
        }
    }

    pub fn clear(&mut self) {
        for g in self.gens.iter_mut() {
            g.clear();
        }
    }

    /// Generate one block for every voice from per-voice frequencies
    /// in cycles per sample.
    pub fn process(&mut self, freqs: &BankBlock<GROUPS>) -> BankBlock<GROUPS> {
        let mut out = BankBlock::default();
        for g in 0..GROUPS {
            let freq = freqs.group(g);
            let dst = out.group_mut(g);
            for t in 0..FRAMES_PER_BLOCK {
                dst[t] = self.gens[g].next(freq[t]);
            }
        }
        out
    }
}

impl<G: GenKernel<F32x>, const GROUPS: usize> Default for GenBank<G, GROUPS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G, const GROUPS: usize> Index<usize> for GenBank<G, GROUPS> {
    type Output = G;
    fn index(&self, i: usize) -> &G {
        &self.gens[i]
    }
}

impl<G, const GROUPS: usize> IndexMut<usize> for GenBank<G, GROUPS> {
    fn index_mut(&mut self, i: usize) -> &mut G {
        &mut self.gens[i]
    }
}
