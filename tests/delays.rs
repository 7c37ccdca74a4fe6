//! Delay line and network tests.

use blockdsp::block::{self, Block};
use blockdsp::delay::{
    Allpass, ConstantDelay, Delay, Fdn, FractionalDelay, IntegerDelay, PitchbendableDelay,
    VaryingDelay,
};
use blockdsp::FRAMES_PER_BLOCK;

fn impulse() -> Block {
    let mut b = Block::default();
    b.frames_mut()[0] = 1.0;
    b
}

#[test]
fn integer_delay_matches_input_shifted() {
    for d in [FRAMES_PER_BLOCK, 100, 257, 1000] {
        let mut delay = IntegerDelay::new(d);
        let mut fed = Vec::new();
        let mut got = Vec::new();
        for k in 0..32 {
            let input = Block::from_fn(|i| ((k * FRAMES_PER_BLOCK + i) % 37) as f32 * 0.1 - 1.0);
            fed.extend_from_slice(input.frames());
            got.extend_from_slice(delay.process(&input).frames());
        }
        for t in d..fed.len() {
            assert_eq!(got[t], fed[t - d], "delay {d} sample {t}");
        }
    }
}

#[test]
fn integer_delay_per_sample_path_matches_block_path() {
    let mut block_delay = IntegerDelay::new(200);
    let mut sample_delay = IntegerDelay::new(200);
    for k in 0..8 {
        let input = Block::from_fn(|i| (k * 64 + i) as f32);
        let by_block = block_delay.process(&input);
        let mut by_sample = Block::default();
        for t in 0..FRAMES_PER_BLOCK {
            by_sample.frames_mut()[t] = sample_delay.process_sample(input.frames()[t]);
        }
        assert_eq!(by_block, by_sample);
    }
}

#[test]
fn fractional_delay_peak_lands_at_delay_time() {
    let mut delay = FractionalDelay::new(200.0);
    delay.set_delay_in_samples(100.5);
    let mut out = Vec::new();
    out.extend_from_slice(delay.process(&impulse()).frames());
    for _ in 0..3 {
        out.extend_from_slice(delay.process(&Block::default()).frames());
    }
    let peak_at = (0..out.len())
        .max_by(|a, b| out[*a].abs().partial_cmp(&out[*b].abs()).unwrap())
        .unwrap();
    // allpass interpolation spreads the peak by about a sample
    assert!((peak_at as f32 - 100.5).abs() <= 1.0, "peak at {peak_at}");
}

#[test]
fn pitchbendable_delay_tracks_modulated_time_without_jumps() {
    let mut pb = PitchbendableDelay::default();
    pb.set_max_delay_in_samples(512.0);

    // warm up with a constant 1.0 input and slowly rising delay time;
    // output of a constant signal must stay near 1 with no clicks
    let mut time = 100.0f32;
    for _ in 0..4 {
        let times = Block::from_fn(|i| time + i as f32 * 0.01);
        pb.process_varying(&Block::splat(1.0), &times);
        time += 0.64;
    }
    for _ in 0..16 {
        let times = Block::from_fn(|i| time + i as f32 * 0.01);
        let out = pb.process_varying(&Block::splat(1.0), &times);
        time += 0.64;
        for t in 0..FRAMES_PER_BLOCK {
            assert!((out.frames()[t] - 1.0).abs() < 0.02, "sample {t}: {}", out.frames()[t]);
        }
    }
}

#[test]
fn allpass_preserves_dc_magnitude() {
    let mut ap = Allpass::<IntegerDelay>::default();
    ap.set_max_delay_in_samples(300.0);
    ap.set_delay_in_samples(150.0);
    ap.gain = 0.7;
    let mut out = Block::default();
    for _ in 0..200 {
        out = ap.process(&Block::splat(0.5));
    }
    // an allpass has unit magnitude response; DC settles to the input
    assert!((out.frames()[FRAMES_PER_BLOCK - 1] - 0.5).abs() < 0.01);
}

#[test]
fn fdn_impulse_response_rings_and_decays() {
    let mut fdn = Fdn::<4>::default();
    fdn.set_max_delay_in_samples(256.0);
    fdn.set_delays_in_samples([67.0, 73.0, 91.0, 103.0]);
    fdn.set_filter_cutoffs([0.1, 0.2, 0.3, 0.4]);
    fdn.feedback_gains = [0.5, 0.5, 0.5, 0.5];

    let mut response = Vec::new();
    let n_blocks = 8192 / FRAMES_PER_BLOCK;
    for k in 0..n_blocks {
        let input = if k == 0 { impulse() } else { Block::default() };
        let out = fdn.process(&input);
        let both = *out.row(0) + *out.row(1);
        response.extend_from_slice(both.frames());
    }

    // energy exists shortly after the shortest delay path
    let early: f32 = response[67..256].iter().map(|x| x * x).sum();
    assert!(early > 0.0);

    // energy decays monotonically over coarse windows after the
    // first 1024 samples
    let window = 1024;
    let mut last = f32::MAX;
    for w in (1024..response.len() - window).step_by(window) {
        let e: f32 = response[w..w + window].iter().map(|x| x * x).sum();
        assert!(e < last, "window at {w} grew: {e} >= {last}");
        last = e;
    }
}

#[test]
fn diffuser_chain_spreads_an_impulse() {
    // a small allpass diffuser in the shape of a reverb early stage:
    // two modulatable allpasses in series with smoothed delay times
    use blockdsp::gen::LinearGlide;

    let mut ap1 = Allpass::<PitchbendableDelay>::default();
    let mut ap2 = Allpass::<PitchbendableDelay>::default();
    ap1.gain = 0.75;
    ap2.gain = 0.70;
    ap1.set_max_delay_in_samples(500.0);
    ap2.set_max_delay_in_samples(500.0);

    let mut smooth_t1 = LinearGlide::default();
    let mut smooth_t2 = LinearGlide::default();
    smooth_t1.set_glide_time_in_samples(256.0);
    smooth_t2.set_glide_time_in_samples(256.0);

    let mut nonzero_samples = 0;
    let mut total_energy = 0.0f32;
    for k in 0..64 {
        let input = if k == 0 { impulse() } else { Block::default() };
        let t1 = smooth_t1.process(230.0);
        let t2 = smooth_t2.process(190.0);
        let min_time = Block::splat(FRAMES_PER_BLOCK as f32);
        let y = ap2.process_varying(
            &ap1.process_varying(&input, &block::max(&t1, &min_time)),
            &block::max(&t2, &min_time),
        );
        nonzero_samples += y.frames().iter().filter(|x| x.abs() > 1e-4).count();
        total_energy += block::sum(&(y * y));
    }

    // the impulse is smeared into many echoes but total energy stays
    // near unity (allpass chains preserve energy)
    assert!(nonzero_samples > 40, "only {nonzero_samples} nonzero samples");
    assert!(
        total_energy > 0.5 && total_energy < 2.0,
        "energy {total_energy}"
    );
}

#[test]
fn fdn_outputs_are_stereo_decorrelated() {
    let mut fdn = Fdn::<4>::default();
    fdn.set_max_delay_in_samples(256.0);
    fdn.set_delays_in_samples([67.0, 73.0, 91.0, 103.0]);
    fdn.set_filter_cutoffs([0.2, 0.2, 0.2, 0.2]);
    fdn.feedback_gains = [0.6, 0.6, 0.6, 0.6];

    fdn.process(&impulse());
    let mut differ = false;
    for _ in 0..16 {
        let out = fdn.process(&Block::default());
        if out.row(0) != out.row(1) {
            differ = true;
        }
    }
    assert!(differ);
}
