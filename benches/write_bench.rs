use criterion::{black_box, criterion_group, criterion_main, Criterion};
use seistream::filter::{apply, Butterworth, FilterPhase};
use seistream::{LengthMode, StreamRegistry, TraceRecord};
use std::io::Cursor;

fn bench_write_traces(c: &mut Criterion) {
    let trace = TraceRecord::new((0..1000).map(|i| (i as f32).sin()).collect());

    c.bench_function("write_100_float_traces", |b| {
        b.iter(|| {
            let mut registry = StreamRegistry::new();
            let dest = registry.open(Box::new(Cursor::new(Vec::<u8>::new()))).unwrap();
            for _ in 0..100 {
                registry
                    .write_trace(dest, black_box(&trace), LengthMode::Fixed)
                    .unwrap();
            }
            registry.release(dest).unwrap();
        })
    });
}

fn bench_zero_phase_filter(c: &mut Criterion) {
    let filter = Butterworth::lowpass(4, 0.15).unwrap();
    let base: Vec<f32> = (0..4096).map(|i| (i as f32 * 0.01).sin()).collect();

    c.bench_function("causal_filter_4096", |b| {
        b.iter(|| {
            let mut samples = base.clone();
            apply(&filter, black_box(&mut samples), FilterPhase::Causal);
        })
    });

    c.bench_function("zero_phase_filter_4096", |b| {
        b.iter(|| {
            let mut samples = base.clone();
            apply(&filter, black_box(&mut samples), FilterPhase::ZeroPhase);
        })
    });
}

criterion_group!(benches, bench_write_traces, bench_zero_phase_filter);
criterion_main!(benches);
