//! Benchmarks for the analyser snapshot and meter statistics.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use partials::dsp::{analyser::Analyser, meter::MeterReading};

pub fn bench_meter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/meter");

    // One frame's work: quantize the window, then peak and RMS
    for &size in &[1024usize, 2048, 4096] {
        let mut analyser = Analyser::new(size);
        let signal: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();
        analyser.push_block(&signal);
        let mut bytes = vec![0u8; size];

        group.bench_with_input(BenchmarkId::new("frame", size), &size, |b, _| {
            b.iter(|| {
                analyser.byte_time_domain_data(black_box(&mut bytes));
                black_box(MeterReading::from_bytes(&bytes))
            })
        });
    }

    group.finish();
}
