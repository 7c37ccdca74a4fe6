//! Signal measurement: differentiation, integration, peak and RMS.

use crate::block::{self, Block};
use crate::math;
use crate::FRAMES_PER_BLOCK;

/// First difference of the input signal across block boundaries.
#[derive(Clone, Default)]
pub struct Differentiator {
    x1: f32,
}

impl Differentiator {
    pub fn process_block(&mut self, x: &Block) -> Block {
        let mut y = Block::default();
        y.frames_mut()[0] = x.frames()[0] - self.x1;
        for n in 1..FRAMES_PER_BLOCK {
            y.frames_mut()[n] = x.frames()[n] - x.frames()[n - 1];
        }
        self.x1 = x.frames()[FRAMES_PER_BLOCK - 1];
        y
    }
}

/// Running sum of the input signal. Set `leak` to a small value such as
/// 0.001 to keep subsonic buildup bounded.
#[derive(Clone, Default)]
pub struct Integrator {
    y1: f32,
    pub leak: f32,
}

impl Integrator {
    pub fn process_block(&mut self, x: &Block) -> Block {
        let mut y = Block::default();
        for n in 0..FRAMES_PER_BLOCK {
            self.y1 -= self.y1 * self.leak;
            self.y1 += x.frames()[n];
            y.frames_mut()[n] = self.y1;
        }
        y
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EnvCoeffs {
    pub a0: f32,
    pub b1: f32,
}

impl EnvCoeffs {
    /// One-pole smoothing at the normalized frequency omega.
    pub fn make(omega: f32) -> Self {
        let x = (-omega * math::TAU).exp();
        Self { a0: 1.0 - x, b1: x }
    }

    /// Coefficients that pass the input through unsmoothed.
    pub fn passthru() -> Self {
        Self { a0: 1.0, b1: 0.0 }
    }
}

/// Values squared below this count as silence; the envelope followers
/// output zero there instead of a denormal-range square root.
const SILENCE_FLOOR: f32 = 1e-20;

fn floored_root(power: &Block) -> Block {
    block::select(
        &block::sqrt_approx(power),
        &Block::default(),
        &block::greater_than(power, &Block::splat(SILENCE_FLOOR)),
    )
}

/// Peak follower: instant rise, a hold period, then exponential decay.
#[derive(Clone)]
pub struct Peak {
    y1: f32,
    peak_hold_counter: i32,
    pub coeffs: EnvCoeffs,
    pub peak_hold_samples: i32,
}

impl Default for Peak {
    fn default() -> Self {
        Self {
            y1: 0.0,
            peak_hold_counter: 0,
            coeffs: EnvCoeffs::default(),
            peak_hold_samples: 44100,
        }
    }
}

impl Peak {
    pub fn process_block(&mut self, x: &Block) -> Block {
        let mut y = Block::default();
        let x_squared = *x * *x;
        for n in 0..FRAMES_PER_BLOCK {
            let xs = x_squared.frames()[n];
            if xs > self.y1 {
                self.y1 = xs;
                self.peak_hold_counter = self.peak_hold_samples;
            } else if self.peak_hold_counter <= 0 {
                self.y1 = self.coeffs.a0 * xs + self.coeffs.b1 * self.y1;
            }
            y.frames_mut()[n] = self.y1;
        }

        if self.peak_hold_counter > 0 {
            self.peak_hold_counter -= FRAMES_PER_BLOCK as i32;
        }

        floored_root(&y)
    }
}

/// Smoothed RMS level of the input.
#[derive(Clone, Default)]
pub struct Rms {
    y1: f32,
    pub coeffs: EnvCoeffs,
}

impl Rms {
    pub fn process_block(&mut self, x: &Block) -> Block {
        let mut y = Block::default();
        let x_squared = *x * *x;
        for n in 0..FRAMES_PER_BLOCK {
            self.y1 = self.coeffs.a0 * x_squared.frames()[n] + self.coeffs.b1 * self.y1;
            y.frames_mut()[n] = self.y1;
        }
        floored_root(&y)
    }
}
