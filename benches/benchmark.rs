use blockdsp::bank::{BankBlock, FilterBank};
use blockdsp::block::Block;
use blockdsp::delay::Fdn;
use blockdsp::filter::{Kernel, KernelSignal, Lopass};
use blockdsp::gen::{GenKernel, GenSignal, NoiseGen, SineGen};
use blockdsp::resample::Upsample2xFunction;
use blockdsp::simd::F32x;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const BLOCKS_PER_SECOND: usize = 48000 / 64;

fn filter_bench(_dummy: usize) -> Block {
    let mut gen = SineGen::<f32>::default();
    gen.clear();
    let mut filter = Lopass::<f32>::default();
    filter.clear();
    filter.set_coeffs(Lopass::<f32>::make_coeffs([0.1, 0.5]));
    let mut out = Block::default();
    for _ in 0..BLOCKS_PER_SECOND {
        out = filter.process_block(&GenSignal::process_block(&mut gen, &Block::splat(0.01)));
    }
    out
}

fn filter_bank_bench(_dummy: usize) -> BankBlock<2> {
    let mut bank = FilterBank::<Lopass<F32x>, 2>::new();
    bank.clear();
    let params = [[F32x::splat(0.1), F32x::splat(0.5)]; 2];
    let input = BankBlock::<2>::splat(0.5);
    let mut out = BankBlock::<2>::default();
    for _ in 0..BLOCKS_PER_SECOND {
        out = bank.process_interp(&input, &params);
    }
    out
}

fn fdn_bench(_dummy: usize) -> Block {
    let mut fdn = Fdn::<8>::default();
    fdn.set_max_delay_in_samples(4096.0);
    fdn.set_delays_in_samples([211.0, 293.0, 413.0, 541.0, 677.0, 811.0, 967.0, 1129.0]);
    fdn.set_filter_cutoffs([0.1; 8]);
    fdn.feedback_gains = [0.85; 8];
    let mut noise = NoiseGen::default();
    let mut out = Block::default();
    for _ in 0..BLOCKS_PER_SECOND {
        out = *fdn.process(&noise.process_block()).row(0);
    }
    out
}

fn oversample_bench(_dummy: usize) -> Block {
    let mut chain = Upsample2xFunction::<1>::default();
    let mut filter = Lopass::<f32>::default();
    filter.clear();
    filter.set_coeffs(Lopass::<f32>::make_coeffs([0.05, 0.3]));
    let mut noise = NoiseGen::default();
    let mut out = Block::default();
    for _ in 0..BLOCKS_PER_SECOND {
        let input = noise.process_block();
        out = chain.process(|v| filter.process_block(v.row(0)), &input);
    }
    out
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("filter", |b| b.iter(|| filter_bench(black_box(0))));
    c.bench_function("filter_bank", |b| b.iter(|| filter_bank_bench(black_box(0))));
    c.bench_function("fdn", |b| b.iter(|| fdn_bench(black_box(0))));
    c.bench_function("oversample", |b| b.iter(|| oversample_bench(black_box(0))));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
