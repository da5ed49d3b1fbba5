//! Benchmarks for low-level DSP primitives.

mod automation;
mod meter;
mod oscillator;

pub use automation::bench_automation;
pub use meter::bench_meter;
pub use oscillator::bench_oscillator;
