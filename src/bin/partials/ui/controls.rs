//! Control surface: the list of editable parameters and how they step.

use partials::synth::params::{ParamChange, Params, MAX_PARTIALS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Waveform,
    LimiterThreshold,
    LimiterCeiling,
    AmRate,
    AmDepth,
    FmRate,
    FmDepth,
    PartialsLfoRate,
    PartialsLfoDepth,
    Attack,
    Decay,
    Sustain,
    Release,
    PartialCount,
    /// Zero-based partial index
    PartialVolume(usize),
}

const FIXED: [Control; 14] = [
    Control::Waveform,
    Control::LimiterThreshold,
    Control::LimiterCeiling,
    Control::AmRate,
    Control::AmDepth,
    Control::FmRate,
    Control::FmDepth,
    Control::PartialsLfoRate,
    Control::PartialsLfoDepth,
    Control::Attack,
    Control::Decay,
    Control::Sustain,
    Control::Release,
    Control::PartialCount,
];

/// Every row of the control panel. The volume rows follow the partial count.
pub fn control_list(num_partials: usize) -> Vec<Control> {
    FIXED
        .iter()
        .copied()
        .chain((0..num_partials).map(Control::PartialVolume))
        .collect()
}

/// (min, max, step) for continuous controls.
fn range(control: Control) -> (f32, f32, f32) {
    match control {
        Control::LimiterThreshold | Control::LimiterCeiling => (0.0, 1.0, 0.01),
        Control::AmRate | Control::FmRate => (0.1, 20.0, 0.1),
        Control::PartialsLfoRate => (0.1, 10.0, 0.1),
        Control::AmDepth | Control::PartialsLfoDepth => (0.0, 1.0, 0.05),
        Control::FmDepth => (0.0, 50.0, 0.5),
        Control::Attack => (0.0, 2.0, 0.005),
        Control::Decay => (0.0, 2.0, 0.01),
        Control::Sustain => (0.0, 1.0, 0.05),
        Control::Release => (0.0, 5.0, 0.05),
        Control::PartialVolume(_) => (0.0, 1.0, 0.01),
        Control::PartialCount => (1.0, MAX_PARTIALS as f32, 1.0),
        Control::Waveform => (0.0, 0.0, 0.0),
    }
}

/// Move `value` by `steps` on the step grid, clamped to the range.
fn nudge(value: f32, steps: i32, (min, max, step): (f32, f32, f32)) -> f32 {
    let snapped = (value / step).round() + steps as f32;
    (snapped * step).clamp(min, max)
}

impl Control {
    pub fn label(self) -> String {
        match self {
            Control::Waveform => "Waveform".into(),
            Control::LimiterThreshold => "Limiter threshold".into(),
            Control::LimiterCeiling => "Limiter ceiling".into(),
            Control::AmRate => "AM rate (Hz)".into(),
            Control::AmDepth => "AM depth".into(),
            Control::FmRate => "FM rate (Hz)".into(),
            Control::FmDepth => "FM depth (Hz)".into(),
            Control::PartialsLfoRate => "Partials LFO rate (Hz)".into(),
            Control::PartialsLfoDepth => "Partials LFO depth".into(),
            Control::Attack => "Attack (s)".into(),
            Control::Decay => "Decay (s)".into(),
            Control::Sustain => "Sustain".into(),
            Control::Release => "Release (s)".into(),
            Control::PartialCount => "Partials".into(),
            Control::PartialVolume(index) => format!("Partial {} volume", index + 1),
        }
    }

    fn value(self, params: &Params) -> f32 {
        match self {
            Control::Waveform => 0.0,
            Control::LimiterThreshold => params.limiter_threshold,
            Control::LimiterCeiling => params.limiter_ceiling,
            Control::AmRate => params.am_rate,
            Control::AmDepth => params.am_depth,
            Control::FmRate => params.fm_rate,
            Control::FmDepth => params.fm_depth,
            Control::PartialsLfoRate => params.partials_lfo_rate,
            Control::PartialsLfoDepth => params.partials_lfo_depth,
            Control::Attack => params.attack,
            Control::Decay => params.decay,
            Control::Sustain => params.sustain,
            Control::Release => params.release,
            Control::PartialCount => params.num_partials() as f32,
            Control::PartialVolume(index) => params.partial_volumes.get(index),
        }
    }

    /// The change produced by stepping this control `steps` notches.
    /// `None` when the value would not move.
    pub fn step(self, params: &Params, steps: i32) -> Option<ParamChange> {
        if let Control::Waveform = self {
            let waveform = if steps >= 0 {
                params.waveform.next()
            } else {
                params.waveform.previous()
            };
            return Some(ParamChange::Waveform(waveform));
        }

        let current = self.value(params);
        let v = nudge(current, steps, range(self));
        if v == current {
            return None;
        }

        let change = match self {
            Control::Waveform => return None,
            Control::LimiterThreshold => ParamChange::LimiterThreshold(v),
            Control::LimiterCeiling => ParamChange::LimiterCeiling(v),
            Control::AmRate => ParamChange::AmRate(v),
            Control::AmDepth => ParamChange::AmDepth(v),
            Control::FmRate => ParamChange::FmRate(v),
            Control::FmDepth => ParamChange::FmDepth(v),
            Control::PartialsLfoRate => ParamChange::PartialsLfoRate(v),
            Control::PartialsLfoDepth => ParamChange::PartialsLfoDepth(v),
            Control::Attack => ParamChange::Attack(v),
            Control::Decay => ParamChange::Decay(v),
            Control::Sustain => ParamChange::Sustain(v),
            Control::Release => ParamChange::Release(v),
            Control::PartialCount => ParamChange::PartialCount(v.round() as usize),
            Control::PartialVolume(index) => ParamChange::PartialVolume { index, value: v },
        };
        Some(change)
    }

    pub fn readout(self, params: &Params) -> String {
        let v = self.value(params);
        match self {
            Control::Waveform => params.waveform.name().to_string(),
            Control::AmRate | Control::FmRate | Control::FmDepth | Control::PartialsLfoRate => {
                format!("{v:.1}")
            }
            Control::Attack | Control::Decay | Control::Sustain | Control::Release => {
                adsr_readout(v)
            }
            Control::PartialCount => format!("{}", params.num_partials()),
            _ => format!("{v:.2}"),
        }
    }
}

/// Envelope values get an extra decimal in the 0.1..1 band.
pub fn adsr_readout(v: f32) -> String {
    if v >= 1.0 || v < 0.1 {
        format!("{v:.2}")
    } else {
        format!("{v:.3}")
    }
}
