//! Error types for partials.

use thiserror::Error;

/// Result type alias for partials operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the automation runtime and the parameter store.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Exponential ramps are undefined for targets at or below zero.
    #[error("exponential ramp target must be positive, got {0}")]
    NonPositiveRampTarget(f32),

    /// Target approaches need a non-negative time constant.
    #[error("time constant must be non-negative, got {0}")]
    NegativeTimeConstant(f64),

    /// The node has already been stopped and torn down.
    #[error("{0} has already stopped")]
    NodeStopped(&'static str),

    /// A modulation route was disconnected twice.
    #[error("{0} route is not connected")]
    NotConnected(&'static str),

    /// Partial volume index past the configured partial count.
    #[error("partial index {index} out of range for {len} partials")]
    PartialIndexOutOfRange {
        /// Requested index (zero-based).
        index: usize,
        /// Current partial count.
        len: usize,
    },

    /// A voice needs at least one partial.
    #[error("partial count must be at least 1")]
    ZeroPartials,

    /// Waveform name not recognised.
    #[error("unknown waveform: {0}")]
    UnknownWaveform(String),
}
