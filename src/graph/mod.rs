//! Scheduled building blocks the synth engine wires together.
//!
//! Graph nodes wrap the low-level primitives with block rendering, node
//! lifecycle (oscillators stop, routes disconnect) and modulation inputs.

/// Gain stages with an optional summed modulation input.
pub mod gain;
/// Low frequency oscillators with a scheduled rate.
pub mod lfo;
/// Core traits shared by all graph nodes.
pub mod node;
/// Audio-band oscillators with start/stop and FM input.
pub mod oscillator;

pub use node::{GraphNode, RenderCtx};
