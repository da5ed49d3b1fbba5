pub mod dsp;
pub mod error;
pub mod graph; // Scheduled nodes: oscillators, LFOs, gain stages
pub mod keymap;
pub mod synth; // Voices, modulation routing, headroom and limiting

pub use error::{Error, Result};

pub const MAX_BLOCK_SIZE: usize = 2048;

/// Smallest gain handed to exponential scheduling. Exponential curves cannot
/// reach or cross zero.
pub const GAIN_FLOOR: f32 = 0.0001;
