//! Block-oriented DSP kernel for realtime audio synthesis.
//!
//! All processing is done in fixed-size blocks of [`FRAMES_PER_BLOCK`]
//! samples so that inner loops can be unrolled and vectorized at compile
//! time. A host wires the filters, delays, generators and resamplers in
//! this crate into a per-block process function, and [`adapter::BlockAdapter`]
//! bridges that function to audio callbacks of arbitrary buffer size.
//!
//! Filter cutoffs are set by a parameter omega, equal to frequency /
//! sample rate. This lets filter objects be unaware of the sample rate,
//! resulting in less code overall. For all filters, k is a damping
//! parameter equal to 1/Q where Q is the analog filter "quality."
//! For bell and shelf filters, gain is specified as an output / input
//! ratio A.

#![allow(clippy::needless_range_loop)]

pub mod adapter;
pub mod analysis;
pub mod bank;
pub mod block;
pub mod context;
pub mod delay;
pub mod envelope;
pub mod event;
pub mod filter;
pub mod gen;
pub mod math;
pub mod publish;
pub mod resample;
pub mod ring;
pub mod sample;
pub mod simd;
pub mod solver;
pub mod tempo;

/// Number of frames in a processing block. All block containers are sized
/// by this constant.
pub const FRAMES_PER_BLOCK: usize = 64;

/// Number of lanes in a SIMD vector.
pub const SIMD_LANES: usize = 4;

/// Number of SIMD vectors in one block.
pub const VECTORS_PER_BLOCK: usize = FRAMES_PER_BLOCK / SIMD_LANES;

/// Alignment of block data in bytes.
pub const SIMD_ALIGN: usize = 16;

const _: () = assert!(FRAMES_PER_BLOCK % SIMD_LANES == 0);
const _: () = assert!(FRAMES_PER_BLOCK.is_power_of_two());

/// Commonly used types and functions.
pub mod prelude {
    pub use super::adapter::BlockAdapter;
    pub use super::analysis::{Differentiator, EnvCoeffs, Integrator, Peak, Rms};
    pub use super::bank::{BankBlock, FilterBank, GenBank};
    pub use super::block::{Block, BlockArray, BlockVec, IntBlock, IntBlockArray};
    pub use super::context::AudioContext;
    pub use super::delay::{
        Allpass, ConstantDelay, Delay, FeedbackDelayFunction, Fdn, FractionalDelay, IntegerDelay,
        PitchbendableDelay, VaryingDelay,
    };
    pub use super::envelope::{Adsr, AdsrCoeffs};
    pub use super::event::{Event, EventKind, Voice, GATE_ROW, PITCH_ROW, VEL_ROW};
    pub use super::filter::{
        Allpass1, Bandpass, Bell, DcBlocker, Hipass, Kernel, KernelBlock, KernelSignal, LoShelf,
        Lopass, OnePole, PinkFilter,
    };
    pub use super::gen::{
        GenKernel, GenSignal, ImpulseGen, Interpolator1, LinearGlide, NoiseGen, OneShotGen,
        PhasorGen, PulseGen, SampleAccurateLinearGlide, SawGen, SineGen, TickGen,
    };
    pub use super::math::*;
    pub use super::publish::{publish_signal, SignalReader, SignalWriter};
    pub use super::resample::{
        Downsample2xFunction, Downsampler, Downsampler2x, HalfBandFilter, Upsample2xFunction,
        Upsampler, Upsampler2x,
    };
    pub use super::ring::RingBuffer;
    pub use super::sample::Sample;
    pub use super::simd::{F32x, I32x};
    pub use super::tempo::TempoLock;
    pub use super::{FRAMES_PER_BLOCK, SIMD_ALIGN, SIMD_LANES, VECTORS_PER_BLOCK};
}
