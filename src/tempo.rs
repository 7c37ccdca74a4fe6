//! Phase-locked clock generation.

use crate::block::Block;
use crate::FRAMES_PER_BLOCK;

/// From an input clock phasor and an output/input frequency ratio,
/// produce an output phasor at that ratio, phase-synced to the input.
///
/// When the ratio or its reciprocal is close to an integer, a per-block
/// correction term steers the output phase onto the input's: the slope
/// is tweaked so the phase error decays over about a quarter second,
/// slowing exponentially as the target nears. The correction never
/// reverses the output or pushes it past double speed.
#[derive(Clone, Debug)]
pub struct TempoLock {
    /// Current output phase on [0, 1), or -1 when stopped.
    omega: f32,
    /// Input phase one block ago.
    x1v: f32,
}

impl Default for TempoLock {
    fn default() -> Self {
        Self {
            omega: -1.0,
            x1v: 0.0,
        }
    }
}

impl TempoLock {
    const LOCK_DIST: f32 = 0.001;

    /// Stop; the next running input restarts from its phase.
    pub fn clear(&mut self) {
        self.omega = -1.0;
    }

    /// Generate one block of output phasor.
    ///
    /// `x` is the input phasor, with a leading value of exactly -1
    /// meaning the input is stopped. `ratio` is output cycles per input
    /// cycle, and `isr` is the inverse sample rate.
    pub fn process_block(&mut self, x: &Block, ratio: f32, isr: f32) -> Block {
        let mut y = Block::default();
        let x0 = x.frames()[0];

        // a running input phasor may dip slightly below zero, so only
        // exactly -1 means stopped
        if x0 == -1.0 {
            self.clear();
            return y;
        }

        let dxdt;
        let mut dydt;
        if self.omega > -1.0 {
            // running: average input slope over the last block
            let mut dx = x0 - self.x1v;
            if dx < 0.0 {
                dx += 1.0;
            }
            dxdt = dx / FRAMES_PER_BLOCK as f32;
            dydt = dxdt * ratio;
            self.x1v = x0;
        } else {
            // startup: phase is unknown, jump to the input's phase
            dxdt = x.frames()[1] - x0;
            dydt = dxdt * ratio;
            self.x1v = x0 - dxdt * FRAMES_PER_BLOCK as f32;
            self.omega = (x0 * ratio).rem_euclid(1.0);
        }

        // lock when the ratio or its reciprocal is near an integer
        let mut lock = (ratio - ratio.round()).abs() < Self::LOCK_DIST;
        let recip = 1.0 / ratio;
        lock |= (recip - recip.round()).abs() < Self::LOCK_DIST;

        if lock {
            // phase error between output and scaled input, measured in
            // whichever domain is faster
            let error = if ratio >= 1.0 {
                let reference = x0 * ratio;
                self.omega - (reference - reference.floor())
            } else {
                let reference = self.omega / ratio;
                (reference - reference.floor()) - x0
            };
            let error_diff = error.round() - error;

            // steer the slope for this block only; no feedback filter
            let correction = error_diff * isr * 4.0;
            let correction = correction.clamp(-dydt * 0.5, dydt);
            dydt += correction;
        }

        for i in 0..FRAMES_PER_BLOCK {
            y.frames_mut()[i] = self.omega;
            self.omega += dydt;
            if self.omega > 1.0 {
                self.omega -= 1.0;
            }
        }
        y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_phasor(phase: &mut f32, dxdt: f32) -> Block {
        let mut b = Block::default();
        for i in 0..FRAMES_PER_BLOCK {
            b.frames_mut()[i] = *phase;
            *phase += dxdt;
            if *phase > 1.0 {
                *phase -= 1.0;
            }
        }
        b
    }

    #[test]
    fn stopped_input_outputs_zeros() {
        let mut lock = TempoLock::default();
        let x = Block::splat(-1.0);
        assert_eq!(lock.process_block(&x, 2.0, 1.0 / 48000.0), Block::default());
    }

    #[test]
    fn unity_ratio_tracks_input_slope() {
        let mut lock = TempoLock::default();
        let mut phase = 0.0;
        let dxdt = 1.0 / 1024.0;
        let mut y = Block::default();
        for _ in 0..64 {
            let x = input_phasor(&mut phase, dxdt);
            y = lock.process_block(&x, 1.0, 1.0 / 48000.0);
        }
        let slope = y.frames()[10] - y.frames()[9];
        assert!((slope - dxdt).abs() < 1e-4);
    }

    #[test]
    fn double_ratio_doubles_slope() {
        let mut lock = TempoLock::default();
        let mut phase = 0.0;
        let dxdt = 1.0 / 1024.0;
        let mut y = Block::default();
        for _ in 0..256 {
            let x = input_phasor(&mut phase, dxdt);
            y = lock.process_block(&x, 2.0, 1.0 / 48000.0);
        }
        let slope = y.frames()[20] - y.frames()[19];
        assert!((slope - 2.0 * dxdt).abs() < 2e-4);
    }
}
