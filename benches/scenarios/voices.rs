//! Benchmarks for additive voices.
//!
//! Cost grows with the partial count: every partial is an oscillator plus
//! two scheduled gain stages.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use partials::{
    graph::node::RenderCtx,
    keymap::KeyId,
    synth::{
        params::Params,
        voice::{Voice, VoiceId},
    },
};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let ctx = RenderCtx::new(SAMPLE_RATE, 1.0); // Past onset, attack and decay

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];
        let mut scratch = vec![0.0f32; size];
        let fm = vec![0.0f32; size];
        let lfo = vec![0.0f32; size];
        let ctx = ctx.with_modulation(&fm, &lfo);

        for partials in [3usize, 8, 16] {
            let mut params = Params::default();
            let _ = params.partial_volumes.resize(partials);
            let mut voice = Voice::new(VoiceId(0), KeyId(b'N'), 440.0, &params, 0.0);

            group.bench_with_input(
                BenchmarkId::new(format!("partials_{partials}"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        buffer.fill(0.0);
                        voice.render_into(black_box(&mut buffer), &mut scratch, black_box(&ctx));
                    })
                },
            );
        }
    }

    group.finish();
}
