use crate::dsp::analyser::normalize_byte;

/// RMS boost applied to the bar so typical program material fills it.
pub const VISUAL_BOOST: f32 = 1.6;

/// Below this RMS the readout shows "-∞" instead of a logarithm.
pub const SILENCE_RMS: f32 = 1e-6;

/// Level statistics of one analyser snapshot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeterReading {
    pub peak: f32,
    pub rms: f32,
    /// Display-only bar level in [0, 1]. Not used for gain control.
    pub visual_level: f32,
}

impl MeterReading {
    pub fn new(peak: f32, rms: f32) -> Self {
        Self {
            peak,
            rms,
            visual_level: (rms * VISUAL_BOOST).min(1.0),
        }
    }

    /// Compute stats from unsigned analyser bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::default();
        }
        let mut peak = 0.0f32;
        let mut sum = 0.0f32;
        for &byte in bytes {
            let v = normalize_byte(byte);
            peak = peak.max(v.abs());
            sum += v * v;
        }
        Self::new(peak, (sum / bytes.len() as f32).sqrt())
    }

    pub fn decibels(&self) -> Option<f32> {
        (self.rms > SILENCE_RMS).then(|| 20.0 * self.rms.log10())
    }

    pub fn db_label(&self) -> String {
        match self.decibels() {
            Some(db) => format!("{db:.1}"),
            None => "-∞".to_string(),
        }
    }

    /// Numeric readout, e.g. `0.010 (-40.0 dB)`.
    pub fn readout(&self) -> String {
        format!("{:.3} ({} dB)", self.rms, self.db_label())
    }
}
