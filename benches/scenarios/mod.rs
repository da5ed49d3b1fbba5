//! Real-world scenario benchmarks.
//!
//! These benchmarks model actual playing: held chords of additive voices
//! and the whole engine with modulation, headroom and limiter running.

mod engine;
mod voices;

pub use engine::bench_engine;
pub use voices::bench_voices;
