//! Low-level primitives used by the graph nodes and the synth engine.
//!
//! Nothing here knows about notes or voices. These are the building blocks
//! of the automation runtime: scheduled parameter timelines, phase
//! accumulators, and the analyser window the limiter listens to.

/// Rolling byte-quantized window of recent output.
pub mod analyser;
/// Time-scheduled parameter values (jumps, ramps, target approaches).
pub mod automation;
/// Peak/RMS statistics and dB readouts.
pub mod meter;
/// Waveforms and the phase accumulator.
pub mod oscillator;

pub use automation::AutomatedParam;
pub use oscillator::Waveform;
