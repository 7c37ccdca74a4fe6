//! ADSR envelope triggered and scaled by a single gate + amplitude
//! signal.
//!
//! Each segment is a first-order approach to a target biased a little
//! past the segment's end value, so the filter crosses the end threshold
//! in finite time instead of approaching it forever. A rising input
//! triggers attack (and sets the envelope amplitude from the input
//! value); input falling to zero triggers release; crossing a segment's
//! threshold advances to the next segment.

use crate::block::Block;
use crate::math;
use crate::FRAMES_PER_BLOCK;

/// Per-segment filter coefficients derived from segment times.
#[derive(Clone, Copy, Debug, Default)]
pub struct AdsrCoeffs {
    pub ka: f32,
    pub kd: f32,
    pub s: f32,
    pub kr: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Segment {
    Attack,
    Decay,
    Sustain,
    Release,
    Off,
}

impl Segment {
    fn advance(self) -> Segment {
        match self {
            Segment::Attack => Segment::Decay,
            Segment::Decay => Segment::Sustain,
            Segment::Sustain => Segment::Release,
            Segment::Release => Segment::Off,
            Segment::Off => Segment::Off,
        }
    }
}

/// ADSR envelope. Drive with a gate signal whose nonzero level sets the
/// output amplitude.
#[derive(Clone, Debug)]
pub struct Adsr {
    pub coeffs: AdsrCoeffs,
    y: f32,
    y1: f32,
    x1: f32,
    threshold: f32,
    target: f32,
    k: f32,
    amp: f32,
    segment: Segment,
}

impl Default for Adsr {
    fn default() -> Self {
        Self {
            coeffs: AdsrCoeffs::default(),
            y: 0.0,
            y1: 0.0,
            x1: 0.0,
            threshold: 0.0,
            target: 0.0,
            k: 0.0,
            amp: 0.0,
            segment: Segment::Off,
        }
    }
}

impl Adsr {
    /// Target bias past each segment's end value.
    const BIAS: f32 = 0.1;
    const MIN_SEGMENT_TIME: f32 = 0.0002;

    /// Derive coefficients from attack, decay, release times in seconds,
    /// sustain level in 0..1, and the sample rate.
    pub fn calc_coeffs(a: f32, d: f32, s: f32, r: f32, sr: f32) -> AdsrCoeffs {
        let inv_sr = 1.0 / sr;
        AdsrCoeffs {
            ka: math::TAU * inv_sr / a.max(Self::MIN_SEGMENT_TIME),
            kd: math::TAU * inv_sr / d.max(Self::MIN_SEGMENT_TIME),
            s,
            kr: math::TAU * inv_sr / r.max(Self::MIN_SEGMENT_TIME),
        }
    }

    pub fn clear(&mut self) {
        self.segment = Segment::Off;
    }

    /// True once the envelope has finished its release.
    pub fn is_off(&self) -> bool {
        self.segment == Segment::Off
    }

    pub fn next_sample(&mut self, x: f32) -> f32 {
        if self.segment == Segment::Off && x == 0.0 {
            return 0.0;
        }

        let crossed = (self.y1 > self.threshold) != (self.y > self.threshold);
        let mut recalc = false;

        // crossing the threshold advances to the next segment
        if crossed && self.segment != Segment::Off {
            self.segment = self.segment.advance();
            recalc = true;
        }

        let trig_on = self.x1 == 0.0 && x > 0.0;
        let trig_off = self.x1 > 0.0 && x == 0.0;

        if trig_on {
            self.segment = Segment::Attack;
            self.amp = x;
            recalc = true;
        } else if trig_off {
            self.segment = Segment::Release;
            recalc = true;
        }

        if recalc {
            let (start_env, end_env) = match self.segment {
                Segment::Attack => {
                    self.k = self.coeffs.ka;
                    (0.0, 1.0)
                }
                Segment::Decay => {
                    self.k = self.coeffs.kd;
                    (1.0, self.coeffs.s)
                }
                Segment::Sustain => {
                    self.k = 0.0;
                    self.y1 = self.coeffs.s;
                    self.y = self.coeffs.s;
                    (self.coeffs.s, self.coeffs.s)
                }
                Segment::Release => {
                    self.k = self.coeffs.kr;
                    (self.coeffs.s, 0.0)
                }
                Segment::Off => {
                    self.k = 0.0;
                    self.y1 = 0.0;
                    self.y = 0.0;
                    (0.0, 0.0)
                }
            };
            self.threshold = end_env;
            self.target = end_env + (end_env - start_env) * Self::BIAS;
        }

        self.x1 = x;
        self.y1 = self.y;
        self.y += self.k * (self.target - self.y);

        self.y * self.amp
    }

    pub fn process_block(&mut self, gate: &Block) -> Block {
        let mut out = Block::default();
        for t in 0..FRAMES_PER_BLOCK {
            out.frames_mut()[t] = self.next_sample(gate.frames()[t]);
        }
        out
    }
}
