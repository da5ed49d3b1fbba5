//! Benchmarks for scheduled parameter evaluation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use partials::dsp::automation::AutomatedParam;

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_automation(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/automation");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Steady value: the common case once an envelope reaches sustain
        let mut steady = AutomatedParam::new(0.8);
        group.bench_with_input(BenchmarkId::new("steady", size), &size, |b, _| {
            b.iter(|| steady.render(black_box(&mut buffer), 0.0, SAMPLE_RATE))
        });

        // Exponential ramp: powf per sample, re-armed each iteration
        let mut param = AutomatedParam::new(0.001);
        group.bench_with_input(BenchmarkId::new("exponential_ramp", size), &size, |b, _| {
            b.iter(|| {
                param
                    .cancel_scheduled_values(0.0)
                    .set_value_at_time(0.001, 0.0);
                let _ = param.exponential_ramp_to_value_at_time(0.5, 1.0);
                param.render(black_box(&mut buffer), 0.0, SAMPLE_RATE);
            })
        });

        // Target approach: exp per sample, like the master gain
        let mut gain = AutomatedParam::new(1.0);
        group.bench_with_input(BenchmarkId::new("set_target", size), &size, |b, _| {
            b.iter(|| {
                gain.cancel_scheduled_values(0.0);
                let _ = gain.set_target_at_time(0.5, 0.0, 0.05);
                gain.render(black_box(&mut buffer), 0.0, SAMPLE_RATE);
            })
        });
    }

    group.finish();
}
