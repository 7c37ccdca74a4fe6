//! Voice bank tests: eight voices in two four-lane groups.

use blockdsp::bank::{BankBlock, FilterBank, GenBank};
use blockdsp::filter::{Kernel, Lopass};
use blockdsp::gen::{SineGen, TickGen};
use blockdsp::simd::F32x;
use blockdsp::FRAMES_PER_BLOCK;

type LopassBank = FilterBank<Lopass<F32x>, 2>;

#[test]
fn lopass_bank_passes_dc_with_stored_coeffs() {
    let mut bank = LopassBank::new();
    bank.clear();

    let coeffs = Lopass::<F32x>::make_coeffs([F32x::splat(0.05), F32x::splat(0.5)]);
    for p in 0..2 {
        bank[p].set_coeffs(coeffs);
    }

    let dc_input = BankBlock::<2>::splat(1.0);
    let mut output = BankBlock::<2>::default();
    for _ in 0..30 {
        output = bank.process(&dc_input);
    }

    for v in 0..8 {
        let row = output.voice(v);
        for t in 0..FRAMES_PER_BLOCK {
            assert!((row[t] - 1.0).abs() < 0.01, "voice {v} sample {t}");
        }
    }
}

#[test]
fn lopass_bank_attenuates_near_nyquist_sines() {
    let mut bank = LopassBank::new();
    bank.clear();
    let mut sines = GenBank::<SineGen<F32x>, 2>::new();
    sines.clear();

    let lo_params = [[F32x::splat(0.05), F32x::splat(0.5)]; 2];
    let sine_freqs = BankBlock::<2>::splat(0.49);

    let mut output = BankBlock::<2>::default();
    for _ in 0..10 {
        output = bank.process_interp(&sines.process(&sine_freqs), &lo_params);
    }

    for v in 0..8 {
        let row = output.voice(v);
        for t in 0..FRAMES_PER_BLOCK {
            assert!(row[t].abs() < 0.05, "voice {v} sample {t}: {}", row[t]);
        }
    }
}

#[test]
fn tick_bank_counts_divide_the_block() {
    let mut bank = GenBank::<TickGen<F32x>, 2>::new();
    bank.clear();

    // voices 0-3 tick every 8, 16, 32, 64 samples; voices 4-7 repeat
    // the same pattern
    let freqs = [1.0 / 8.0, 1.0 / 16.0, 1.0 / 32.0, 1.0 / 64.0];
    let freq_input = BankBlock::<2>::from_fn(|v, _| freqs[v % 4]);

    // run two blocks to get past any startup transient
    bank.process(&freq_input);
    let output = bank.process(&freq_input);

    let count_ticks = |voice: usize| {
        let row = output.voice(voice);
        (0..FRAMES_PER_BLOCK)
            .filter(|t| row[*t] > 0.5)
            .count()
    };

    assert_eq!(count_ticks(0), 8);
    assert_eq!(count_ticks(4), 8);
    assert_eq!(count_ticks(1), 4);
    assert_eq!(count_ticks(5), 4);
    assert_eq!(count_ticks(2), 2);
    assert_eq!(count_ticks(6), 2);
    assert_eq!(count_ticks(3), 1);
    assert_eq!(count_ticks(7), 1);

    // same frequency, same tick pattern in both groups
    for v in 0..4 {
        assert_eq!(output.voice(v), output.voice(v + 4));
    }
}
