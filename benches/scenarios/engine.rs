//! Benchmarks for the whole engine: a held chord with every modulation
//! source active and the limiter ticking at 60 Hz.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use partials::{
    keymap::KeyId,
    synth::{params::ParamChange, EngineConfig},
};

use crate::BLOCK_SIZES;

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // C major triad plus octave, six partials, AM and FM on
        let mut engine = EngineConfig::new(48_000.0).build();
        for change in [
            ParamChange::PartialCount(6),
            ParamChange::AmDepth(0.3),
            ParamChange::FmDepth(4.0),
        ] {
            let _ = engine.apply(change);
        }
        for key in [b'Z', b'C', b'B', b'Q'] {
            engine.note_on(KeyId(key));
        }

        group.bench_with_input(BenchmarkId::new("chord_4_voices", size), &size, |b, _| {
            b.iter(|| black_box(engine.render(black_box(&mut buffer))))
        });

        // Note on and off every block, tails recycled through the voice pool
        let mut churn = EngineConfig::new(48_000.0).build();
        let _ = churn.apply(ParamChange::Release(0.0));
        group.bench_with_input(BenchmarkId::new("retrigger", size), &size, |b, _| {
            b.iter(|| {
                churn.note_on(KeyId(b'N'));
                black_box(churn.render(black_box(&mut buffer)));
                churn.note_off(KeyId(b'N'));
            })
        });
    }

    group.finish();
}
