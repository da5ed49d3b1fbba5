use crate::synth::arbiter::{GainRequest, GainSource};

/*
Peak Limiter
============

Once per display frame the limiter looks at the latest analyser window and
decides whether to pull the master gain down, let it back up, or leave it.

Vocabulary
----------

  threshold   Peak level that triggers gain reduction.

  ceiling     Level the measured peak should be brought down to.

  hysteresis  Release only happens once the peak is HYSTERESIS below the
              threshold, so a signal hovering right at the threshold does
              not flap between engaged and released every frame.


The State Machine
-----------------

              peak > threshold
   ┌──────────┐ ─────────────────→ ┌─────────┐
   │ Released │                    │ Engaged │ ←─┐ peak > threshold:
   └──────────┘ ←───────────────── └─────────┘ ──┘ reduce further
        peak < threshold - HYSTERESIS

On engage (and every frame the peak stays above threshold) the gain heads
to `min(g, g * ceiling / peak)` with a fast time constant. The `min` means
this path can only ever lower the gain. On release it glides back to 1.0
with a slow time constant, regardless of what the headroom estimate would
prefer.
*/

pub const ATTACK_TIME_CONSTANT: f64 = 0.005;
pub const RELEASE_TIME_CONSTANT: f64 = 0.5;
pub const HYSTERESIS: f32 = 0.05;
pub const RELEASE_TARGET: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LimiterState {
    #[default]
    Released,
    Engaged,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimiterSettings {
    pub threshold: f32,
    pub ceiling: f32,
}

#[derive(Debug, Default)]
pub struct Limiter {
    state: LimiterState,
}

impl Limiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LimiterState {
        self.state
    }

    pub fn is_engaged(&self) -> bool {
        self.state == LimiterState::Engaged
    }

    /// Run one frame. `current_gain` is the master gain right now.
    ///
    /// Returns the gain request to submit, if any.
    pub fn process(&mut self, peak: f32, current_gain: f32, settings: LimiterSettings) -> Option<GainRequest> {
        if peak > settings.threshold {
            let required = settings.ceiling / peak;
            let target = current_gain.min(current_gain * required);
            if self.state != LimiterState::Engaged {
                tracing::debug!(peak, target, "limiter engaged");
            }
            self.state = LimiterState::Engaged;
            return Some(GainRequest {
                source: GainSource::Limiter,
                target,
                time_constant: ATTACK_TIME_CONSTANT,
            });
        }

        if self.state == LimiterState::Engaged && peak < settings.threshold - HYSTERESIS {
            tracing::debug!(peak, "limiter released");
            self.state = LimiterState::Released;
            return Some(GainRequest {
                source: GainSource::Limiter,
                target: RELEASE_TARGET,
                time_constant: RELEASE_TIME_CONSTANT,
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: LimiterSettings = LimiterSettings {
        threshold: 0.2,
        ceiling: 0.4,
    };

    #[test]
    fn hot_peak_halves_gain() {
        let mut limiter = Limiter::new();
        let request = limiter.process(0.8, 1.0, SETTINGS).unwrap();

        assert!((request.target - 0.5).abs() < 1e-6);
        assert_eq!(request.time_constant, ATTACK_TIME_CONSTANT);
        assert_eq!(request.source, GainSource::Limiter);
        assert!(limiter.is_engaged());
    }

    #[test]
    fn engage_never_raises_gain() {
        // ceiling / peak > 1 would raise the gain; the min() prevents it
        let mut limiter = Limiter::new();
        let request = limiter.process(0.3, 0.6, SETTINGS).unwrap();
        assert!((request.target - 0.6).abs() < 1e-6);
    }

    #[test]
    fn quiet_signal_does_nothing_when_released() {
        let mut limiter = Limiter::new();
        assert_eq!(limiter.process(0.05, 1.0, SETTINGS), None);
        assert_eq!(limiter.state(), LimiterState::Released);
    }

    #[test]
    fn no_release_inside_hysteresis_band() {
        let mut limiter = Limiter::new();
        limiter.process(0.5, 1.0, SETTINGS);

        // Oscillate just below threshold, never under threshold - 0.05
        for &peak in &[0.19, 0.16, 0.2, 0.151, 0.18] {
            assert_eq!(limiter.process(peak, 0.8, SETTINGS), None, "peak {peak}");
            assert!(limiter.is_engaged());
        }
    }

    #[test]
    fn releases_below_hysteresis_band() {
        let mut limiter = Limiter::new();
        limiter.process(0.5, 1.0, SETTINGS);

        let request = limiter.process(0.1, 0.8, SETTINGS).unwrap();
        assert_eq!(request.target, RELEASE_TARGET);
        assert_eq!(request.time_constant, RELEASE_TIME_CONSTANT);
        assert_eq!(limiter.state(), LimiterState::Released);

        // Already released: nothing more to do
        assert_eq!(limiter.process(0.0, 0.9, SETTINGS), None);
    }

    #[test]
    fn stays_engaged_and_keeps_reducing_while_hot() {
        let mut limiter = Limiter::new();
        let first = limiter.process(0.8, 1.0, SETTINGS).unwrap();
        let second = limiter.process(0.8, first.target, SETTINGS).unwrap();
        assert!(second.target < first.target);
        assert!(limiter.is_engaged());
    }
}
