use crate::{dsp::automation::AutomatedParam, graph::node::RenderCtx, Error, Result};

/*
Gain Stage
==========

A gain stage multiplies its input by a scheduled gain. It may also take a
modulation input: an LFO signal scaled by its own scheduled `depth` and
*added* to the gain, the way a control signal is summed into a parameter.

  y[n] = x[n] * (gain(t) + lfo[n] * depth(t))

With a bipolar LFO the effective gain swings symmetrically around `gain`,
between gain - depth and gain + depth. Nothing clamps the sum: a swing
that dips below zero inverts the signal for that stretch.
*/

pub struct GainStage {
    pub gain: AutomatedParam,
    pub depth: AutomatedParam,
    modulated: bool,
}

impl GainStage {
    /// Plain stage with no modulation input.
    pub fn new(gain: f32) -> Self {
        Self {
            gain: AutomatedParam::new(gain),
            depth: AutomatedParam::new(0.0),
            modulated: false,
        }
    }

    /// Stage with a modulation input scaled by `depth`.
    pub fn modulated(gain: f32, depth: f32) -> Self {
        Self {
            gain: AutomatedParam::new(gain),
            depth: AutomatedParam::new(depth),
            modulated: true,
        }
    }

    /// Plain stage holding `gain`, timeline cleared.
    pub fn reset(&mut self, gain: f32) {
        self.gain.reset(gain);
        self.depth.reset(0.0);
        self.modulated = false;
    }

    /// Modulated stage holding `gain` and `depth`, timelines cleared.
    pub fn reset_modulated(&mut self, gain: f32, depth: f32) {
        self.gain.reset(gain);
        self.depth.reset(depth);
        self.modulated = true;
    }

    pub fn is_modulated(&self) -> bool {
        self.modulated
    }

    /// Detach the modulation input. The resting gain keeps running.
    pub fn disconnect_modulation(&mut self) -> Result<()> {
        if !self.modulated {
            return Err(Error::NotConnected("gain modulation"));
        }
        self.modulated = false;
        Ok(())
    }

    /// Effective gain at time `t` given the modulation signal value there.
    #[inline]
    pub fn gain_at(&mut self, t: f64, modulation: f32) -> f32 {
        let base = self.gain.value_at(t);
        if self.modulated {
            base + modulation * self.depth.value_at(t)
        } else {
            base
        }
    }

    /// Multiply `block` in place. `modulation` may be shorter than the block
    /// (missing samples count as zero).
    pub fn process(&mut self, block: &mut [f32], modulation: &[f32], ctx: &RenderCtx) {
        for (i, sample) in block.iter_mut().enumerate() {
            let m = modulation.get(i).copied().unwrap_or(0.0);
            *sample *= self.gain_at(ctx.sample_time(i), m);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_stage_scales_by_gain() {
        let mut stage = GainStage::new(0.5);
        let mut block = [1.0f32, -1.0, 0.5];
        stage.process(&mut block, &[], &RenderCtx::new(1_000.0, 0.0));
        assert_eq!(block, [0.5, -0.5, 0.25]);
    }

    #[test]
    fn plain_stage_ignores_modulation_signal() {
        let mut stage = GainStage::new(1.0);
        let mut block = [1.0f32; 2];
        stage.process(&mut block, &[1.0, -1.0], &RenderCtx::new(1_000.0, 0.0));
        assert_eq!(block, [1.0, 1.0]);
    }

    #[test]
    fn modulation_swings_around_resting_gain() {
        let mut stage = GainStage::modulated(0.75, 0.25);
        let mut block = [1.0f32; 3];
        stage.process(&mut block, &[1.0, 0.0, -1.0], &RenderCtx::new(1_000.0, 0.0));
        assert_eq!(block, [1.0, 0.75, 0.5]);
    }

    #[test]
    fn disconnected_stage_stops_following_lfo() {
        let mut stage = GainStage::modulated(0.5, 0.5);
        stage.disconnect_modulation().unwrap();
        assert!(!stage.is_modulated());
        assert_eq!(stage.gain_at(0.0, 1.0), 0.5);
        assert_eq!(
            stage.disconnect_modulation(),
            Err(Error::NotConnected("gain modulation"))
        );
    }

    #[test]
    fn reset_reconnects_and_clears_schedule() {
        let mut stage = GainStage::modulated(0.5, 0.5);
        stage.gain.linear_ramp_to_value_at_time(1.0, 1.0);
        stage.disconnect_modulation().unwrap();

        stage.reset_modulated(0.2, 0.1);
        assert!(stage.is_modulated());
        assert!(!stage.gain.has_pending());
        assert!((stage.gain_at(3.0, 1.0) - 0.3).abs() < 1e-6);

        stage.reset(0.4);
        assert!(!stage.is_modulated());
        assert_eq!(stage.gain_at(3.0, 1.0), 0.4);
    }
}
