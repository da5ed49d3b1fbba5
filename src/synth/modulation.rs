use crate::{
    dsp::automation::AutomatedParam,
    graph::{
        gain::GainStage,
        lfo::LfoNode,
        node::{GraphNode, RenderCtx},
    },
    synth::params::Params,
    MAX_BLOCK_SIZE,
};

/*
Modulation Sources
==================

Three free-running sine LFOs live for the whole life of the engine. Each one
renders a block of raw [-1, 1] signal; what happens to that signal depends
on the source.

  AM (tremolo)
      lfo ──→ × d/2 ──→ tremolo stage gain (resting 1 - d/2) ──→ whole bus
      The bus gain swings over [1 - d, 1]. At depth 0 the stage is a plain
      unity gain.

  FM (vibrato)
      lfo ──→ × depth Hz ──→ frequency offset of every connected partial
      The offset is a flat number of Hz, the same for every partial.

  Partials LFO
      lfo ──→ (raw) ──→ each partial's own scaling gain (amp * depth / 2)
      The per-partial scale lives in the voice; only the shared raw signal
      is rendered here.

Rates and depths are scheduled at the current render time so a change lands
on the next sample without resetting any LFO phase.
*/

pub struct ModulationSources {
    am_lfo: LfoNode,
    tremolo: GainStage,

    fm_lfo: LfoNode,
    fm_depth: AutomatedParam, // Hz

    partials_lfo: LfoNode,

    am_buffer: Vec<f32>,
    fm_buffer: Vec<f32>,
    partials_buffer: Vec<f32>,
    len: usize,
}

impl ModulationSources {
    pub fn new(params: &Params) -> Self {
        let d = params.am_depth;
        Self {
            am_lfo: LfoNode::sine(params.am_rate),
            tremolo: GainStage::modulated(1.0 - d / 2.0, d / 2.0),
            fm_lfo: LfoNode::sine(params.fm_rate),
            fm_depth: AutomatedParam::new(params.fm_depth),
            partials_lfo: LfoNode::sine(params.partials_lfo_rate),
            am_buffer: vec![0.0; MAX_BLOCK_SIZE],
            fm_buffer: vec![0.0; MAX_BLOCK_SIZE],
            partials_buffer: vec![0.0; MAX_BLOCK_SIZE],
            len: 0,
        }
    }

    pub fn set_am_rate(&mut self, rate: f32, now: f64) {
        self.am_lfo
            .rate
            .cancel_scheduled_values(now)
            .set_value_at_time(rate, now);
    }

    /// Re-centre the tremolo stage for depth `d` in [0, 1].
    pub fn set_am_depth(&mut self, d: f32, now: f64) {
        self.tremolo
            .gain
            .cancel_scheduled_values(now)
            .set_value_at_time(1.0 - d / 2.0, now);
        self.tremolo
            .depth
            .cancel_scheduled_values(now)
            .set_value_at_time(d / 2.0, now);
    }

    pub fn set_fm_rate(&mut self, rate: f32, now: f64) {
        self.fm_lfo
            .rate
            .cancel_scheduled_values(now)
            .set_value_at_time(rate, now);
    }

    pub fn set_fm_depth(&mut self, hz: f32, now: f64) {
        self.fm_depth
            .cancel_scheduled_values(now)
            .set_value_at_time(hz, now);
    }

    pub fn set_partials_lfo_rate(&mut self, rate: f32, now: f64) {
        self.partials_lfo
            .rate
            .cancel_scheduled_values(now)
            .set_value_at_time(rate, now);
    }

    /// Tremolo (resting gain, swing) at time `t`.
    pub fn tremolo_at(&mut self, t: f64) -> (f32, f32) {
        (self.tremolo.gain.value_at(t), self.tremolo.depth.value_at(t))
    }

    pub fn fm_depth_at(&mut self, t: f64) -> f32 {
        self.fm_depth.value_at(t)
    }

    /// Advance all three LFOs by `len` samples starting at `ctx.time`.
    pub fn render(&mut self, len: usize, ctx: &RenderCtx) {
        let len = len.min(MAX_BLOCK_SIZE);
        self.len = len;

        self.am_lfo.render_block(&mut self.am_buffer[..len], ctx);
        self.partials_lfo
            .render_block(&mut self.partials_buffer[..len], ctx);

        let fm = &mut self.fm_buffer[..len];
        self.fm_lfo.render_block(fm, ctx);
        for (i, sample) in fm.iter_mut().enumerate() {
            *sample *= self.fm_depth.value_at(ctx.sample_time(i));
        }
    }

    /// Vibrato offsets in Hz for the last rendered block.
    pub fn fm(&self) -> &[f32] {
        &self.fm_buffer[..self.len]
    }

    /// Raw partials LFO signal for the last rendered block.
    pub fn partials_lfo(&self) -> &[f32] {
        &self.partials_buffer[..self.len]
    }

    /// Run `block` through the tremolo stage using the last rendered AM signal.
    pub fn apply_tremolo(&mut self, block: &mut [f32], ctx: &RenderCtx) {
        let am = &self.am_buffer[..self.len];
        self.tremolo.process(block, am, ctx);
    }
}
