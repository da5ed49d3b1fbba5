use crate::{
    dsp::{automation::AutomatedParam, oscillator::OscillatorBlock},
    graph::node::{GraphNode, RenderCtx},
};

/*
LFO (Low Frequency Oscillator)
==============================

An LFO is an oscillator that runs at sub-audio frequencies to modulate
parameters over time. Its output is a bipolar control signal in [-1, 1];
whoever consumes it decides the scale (a feed gain) and where it is summed
in (a gain or a frequency).

The synth runs three of them for its whole lifetime:

  Tremolo:   LFO → bus gain            (amplitude, whole mix)
  Vibrato:   LFO → partial frequency   (Hz offset, every partial)
  Partials:  LFO → partial amplitude   (scaled per partial loudness)

Rate is a scheduled parameter, so a rate change lands on the next sample
without restarting the phase.
*/

pub struct LfoNode {
    osc: OscillatorBlock,
    pub rate: AutomatedParam, // Hz, independent of any note
}

impl LfoNode {
    pub fn sine(rate: f32) -> Self {
        Self {
            osc: OscillatorBlock::sine(),
            rate: AutomatedParam::new(rate),
        }
    }
}

impl GraphNode for LfoNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        for (i, sample) in out.iter_mut().enumerate() {
            let rate = self.rate.value_at(ctx.sample_time(i));
            *sample = self.osc.next_sample(rate, ctx.sample_rate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lfo_sine_output_range() {
        let mut lfo = LfoNode::sine(5.0);
        let mut buffer = vec![0.0; 1024];
        lfo.render_block(&mut buffer, &RenderCtx::new(48_000.0, 0.0));

        for &sample in &buffer {
            assert!(
                (-1.0..=1.0).contains(&sample),
                "LFO sine sample {} out of range [-1.0, 1.0]",
                sample
            );
        }
    }

    #[test]
    fn test_lfo_completes_one_cycle_per_period() {
        // 10 Hz at 1 kHz: a full cycle every 100 samples
        let mut lfo = LfoNode::sine(10.0);
        let mut buffer = vec![0.0; 101];
        lfo.render_block(&mut buffer, &RenderCtx::new(1_000.0, 0.0));

        assert!((buffer[25] - 1.0).abs() < 1e-3);
        assert!((buffer[75] + 1.0).abs() < 1e-3);
        assert!(buffer[100].abs() < 1e-3);
    }

    #[test]
    fn test_rate_change_applies_at_scheduled_time() {
        let mut lfo = LfoNode::sine(0.0);
        lfo.rate.set_value_at_time(250.0, 0.002);

        let mut buffer = vec![0.0; 4];
        lfo.render_block(&mut buffer, &RenderCtx::new(1_000.0, 0.0));

        // Frozen at phase 0 until the new rate kicks in, then a quarter cycle
        assert_eq!(&buffer[..3], &[0.0, 0.0, 0.0]);
        assert!((buffer[3] - 1.0).abs() < 1e-4);
    }
}
