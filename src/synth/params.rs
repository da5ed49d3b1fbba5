//! Parameter store: everything the control surface can change.
//!
//! The engine owns one `Params`. It is only ever mutated through
//! [`ParamChange`] so the engine can fan each change out to live voices and
//! modulation sources as it is applied.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{dsp::oscillator::Waveform, Error, Result};

/// Per-partial volumes used when a partial index has no user value yet.
pub const DEFAULT_PARTIAL_VOLUMES: [f32; 8] = [0.6, 0.25, 0.12, 0.06, 0.03, 0.015, 0.008, 0.004];

/// Volume for partial indices past the default table.
pub const FALLBACK_PARTIAL_VOLUME: f32 = 0.01;

pub const DEFAULT_PARTIAL_COUNT: usize = 3;

/// Partials every pooled voice has room for. Larger counts still play but
/// grow the voice's bank the first time they are used.
pub const MAX_PARTIALS: usize = 16;

/// Default volume of the zero-based partial `index`.
pub fn default_partial_volume(index: usize) -> f32 {
    DEFAULT_PARTIAL_VOLUMES
        .get(index)
        .copied()
        .unwrap_or(FALLBACK_PARTIAL_VOLUME)
}

/// Ordered partial volumes. The length is the partial count.
///
/// Growing keeps existing entries and fills new slots from the default
/// table; shrinking drops the tail. Voices already sounding are never
/// touched by a resize.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PartialVolumes(Vec<f32>);

impl PartialVolumes {
    pub fn with_count(count: usize) -> Self {
        Self((0..count).map(default_partial_volume).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Volume at `index`, falling back to the default table.
    pub fn get(&self, index: usize) -> f32 {
        self.0
            .get(index)
            .copied()
            .unwrap_or_else(|| default_partial_volume(index))
    }

    pub fn sum(&self) -> f32 {
        self.0.iter().sum()
    }

    pub fn resize(&mut self, count: usize) -> Result<()> {
        if count == 0 {
            return Err(Error::ZeroPartials);
        }
        let start = self.0.len();
        self.0.truncate(count);
        self.0.extend((start..count).map(default_partial_volume));
        Ok(())
    }

    pub fn set(&mut self, index: usize, value: f32) -> Result<()> {
        let len = self.0.len();
        let slot = self
            .0
            .get_mut(index)
            .ok_or(Error::PartialIndexOutOfRange { index, len })?;
        *slot = value.clamp(0.0, 1.0);
        Ok(())
    }
}

impl Default for PartialVolumes {
    fn default() -> Self {
        Self::with_count(DEFAULT_PARTIAL_COUNT)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    pub waveform: Waveform,
    pub partial_volumes: PartialVolumes,

    // ADSR, seconds except sustain
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,

    pub am_rate: f32,
    pub am_depth: f32,
    pub fm_rate: f32,
    pub fm_depth: f32, // Hz
    pub partials_lfo_rate: f32,
    pub partials_lfo_depth: f32,

    pub limiter_threshold: f32,
    pub limiter_ceiling: f32,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            partial_volumes: PartialVolumes::default(),
            attack: 0.005,
            decay: 0.05,
            sustain: 0.8,
            release: 0.3,
            am_rate: 5.0,
            am_depth: 0.0,
            fm_rate: 5.0,
            fm_depth: 0.0,
            partials_lfo_rate: 1.0,
            partials_lfo_depth: 0.25,
            limiter_threshold: 0.2,
            limiter_ceiling: 0.4,
        }
    }
}

/// One control-change event.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamChange {
    Waveform(Waveform),
    LimiterThreshold(f32),
    LimiterCeiling(f32),
    AmRate(f32),
    AmDepth(f32),
    FmRate(f32),
    FmDepth(f32),
    PartialsLfoRate(f32),
    PartialsLfoDepth(f32),
    Attack(f32),
    Decay(f32),
    Sustain(f32),
    Release(f32),
    PartialCount(usize),
    /// Zero-based partial index.
    PartialVolume { index: usize, value: f32 },
}

impl Params {
    pub fn num_partials(&self) -> usize {
        self.partial_volumes.len()
    }

    /// Store a change. Times are floored at zero and levels clamped to
    /// [0, 1]; the threshold/ceiling relation is left to the control
    /// surface.
    pub fn apply(&mut self, change: ParamChange) -> Result<()> {
        match change {
            ParamChange::Waveform(waveform) => self.waveform = waveform,
            ParamChange::LimiterThreshold(v) => self.limiter_threshold = v,
            ParamChange::LimiterCeiling(v) => self.limiter_ceiling = v,
            ParamChange::AmRate(v) => self.am_rate = v,
            ParamChange::AmDepth(v) => self.am_depth = v.clamp(0.0, 1.0),
            ParamChange::FmRate(v) => self.fm_rate = v,
            ParamChange::FmDepth(v) => self.fm_depth = v.max(0.0),
            ParamChange::PartialsLfoRate(v) => self.partials_lfo_rate = v,
            ParamChange::PartialsLfoDepth(v) => self.partials_lfo_depth = v.clamp(0.0, 1.0),
            ParamChange::Attack(v) => self.attack = v.max(0.0),
            ParamChange::Decay(v) => self.decay = v.max(0.0),
            ParamChange::Sustain(v) => self.sustain = v.clamp(0.0, 1.0),
            ParamChange::Release(v) => self.release = v.max(0.0),
            ParamChange::PartialCount(count) => self.partial_volumes.resize(count)?,
            ParamChange::PartialVolume { index, value } => self.partial_volumes.set(index, value)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_start_with_three_partials() {
        let params = Params::default();
        assert_eq!(params.num_partials(), 3);
        assert_eq!(params.partial_volumes.as_slice(), &[0.6, 0.25, 0.12]);
    }

    #[test]
    fn growing_keeps_edits_and_fills_from_table() {
        let mut volumes = PartialVolumes::default();
        volumes.set(0, 0.9).unwrap();
        volumes.resize(10).unwrap();

        assert_eq!(volumes.get(0), 0.9);
        assert_eq!(volumes.get(3), 0.06);
        assert_eq!(volumes.get(7), 0.004);
        assert_eq!(volumes.get(9), FALLBACK_PARTIAL_VOLUME);
    }

    #[test]
    fn shrinking_drops_tail() {
        let mut volumes = PartialVolumes::with_count(5);
        volumes.resize(2).unwrap();
        assert_eq!(volumes.as_slice(), &[0.6, 0.25]);
    }

    #[test]
    fn zero_partials_rejected() {
        let mut params = Params::default();
        assert_eq!(params.apply(ParamChange::PartialCount(0)), Err(Error::ZeroPartials));
        assert_eq!(params.num_partials(), 3);
    }

    #[test]
    fn volume_index_checked_against_count() {
        let mut params = Params::default();
        assert_eq!(
            params.apply(ParamChange::PartialVolume { index: 3, value: 0.5 }),
            Err(Error::PartialIndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn levels_and_times_are_clamped() {
        let mut params = Params::default();
        params.apply(ParamChange::Sustain(1.5)).unwrap();
        params.apply(ParamChange::Release(-1.0)).unwrap();
        params
            .apply(ParamChange::PartialVolume { index: 1, value: 2.0 })
            .unwrap();

        assert_eq!(params.sustain, 1.0);
        assert_eq!(params.release, 0.0);
        assert_eq!(params.partial_volumes.get(1), 1.0);
    }

    #[test]
    fn threshold_above_ceiling_is_stored_as_given() {
        let mut params = Params::default();
        params.apply(ParamChange::LimiterThreshold(0.9)).unwrap();
        assert_eq!(params.limiter_threshold, 0.9);
        assert_eq!(params.limiter_ceiling, 0.4);
    }
}
