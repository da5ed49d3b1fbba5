use crate::{
    dsp::oscillator::Waveform,
    graph::{
        gain::GainStage,
        node::{GraphNode, RenderCtx},
        oscillator::OscNode,
    },
    keymap::KeyId,
    synth::params::Params,
    GAIN_FLOOR,
};

/*
Additive Voice
==============

A voice is one held key rendered as a bank of harmonic partials. Partial
`i` (1-based) runs at `fundamental * i` and has three stages in series:

    oscillator ──→ envelope ──→ amplitude (+ partials LFO) ──→ mix bus
        ↑
    vibrato (Hz offset, shared by every partial)


Amplitude Stage
---------------

Each partial has a configured loudness `amp`. The partials LFO swings the
stage by `amp * depth / 2` in both directions, so the resting gain is
lowered by the same amount to keep the bottom of the swing at or above
zero:

    contribution = amp * depth / 2
    base_gain    = max(GAIN_FLOOR, amp - contribution)

    gain(t) = base_gain + lfo(t) * contribution    ∈ [amp - 2c, amp]

The stage fades in exponentially from ONSET_LEVEL to `base_gain` over
ONSET_TIME. That fade is fixed and shorter than most user attacks; it only
exists to keep the very first samples click-free.

Changes made while the key is held scale the LFO by the full depth:

    depth change     scale = amp * depth            base_gain untouched
    volume change    scale = amp * depth            base_gain = amp

So after a live change the swing is no longer pinned inside [0, amp].


Envelope Stage
--------------

  Level
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
        Attack Decay  Sustain  Release

Attack and decay are scheduled up front as two linear ramps. Release is
scheduled on note-off and always starts from the level the envelope has
*actually* reached, so letting go mid-attack ramps down from wherever the
attack got to instead of jumping to 1.0 or the sustain level.


Lifecycle
---------

    Stopped ──start──→ Active ──note_off──→ Releasing ──stop time passed──┐
       ↑                                                                  │
       └──────────────────────────────────────────────────────────────────┘

Releasing voices keep sounding their tail but no longer count as held
keys. The oscillators stop STOP_MARGIN after the release ramp ends.

A `Voice` is a reusable slot. `start` rebuilds every partial in place from
the current parameters, so a stopped slot turns into a new note without
touching the allocator. The partial bank only grows when a note asks for
more partials than the slot has ever held.
*/

/// Length of the fixed amplitude fade-in, seconds.
pub const ONSET_TIME: f64 = 0.05;

/// Starting point of the amplitude fade-in.
pub const ONSET_LEVEL: f32 = 0.001;

/// Extra time after the release ramp before the oscillators stop.
pub const STOP_MARGIN: f64 = 0.05;

/// Partials-LFO swing for a partial of loudness `amp`.
#[inline]
pub fn lfo_contribution(amp: f32, depth: f32) -> f32 {
    amp * depth / 2.0
}

/// Resting gain of the amplitude stage.
#[inline]
pub fn base_gain(amp: f32, depth: f32) -> f32 {
    (amp - lfo_contribution(amp, depth)).max(GAIN_FLOOR)
}

/// Partials-LFO scale installed by changes made while a key is held.
#[inline]
pub fn live_lfo_scale(amp: f32, depth: f32) -> f32 {
    amp * depth
}

pub struct Partial {
    multiplier: usize,
    base_amplitude: f32,
    osc: OscNode,
    envelope: GainStage,
    amplitude: GainStage,
}

impl Partial {
    /// Silent placeholder, brought to life by `start`.
    fn idle() -> Self {
        Self {
            multiplier: 0,
            base_amplitude: 0.0,
            osc: OscNode::new(Waveform::Sine, 0.0),
            envelope: GainStage::new(GAIN_FLOOR),
            amplitude: GainStage::modulated(ONSET_LEVEL, 0.0),
        }
    }

    fn start(
        &mut self,
        multiplier: usize,
        fundamental: f32,
        waveform: Waveform,
        amp: f32,
        params: &Params,
        now: f64,
    ) {
        let depth = params.partials_lfo_depth;
        self.multiplier = multiplier;
        self.base_amplitude = amp;

        self.osc.restart(waveform, fundamental * multiplier as f32);
        if let Err(err) = self.osc.connect_fm() {
            tracing::trace!(%err, "fm route not connected");
        }

        self.amplitude
            .reset_modulated(ONSET_LEVEL, lfo_contribution(amp, depth));
        self.amplitude.gain.set_value_at_time(ONSET_LEVEL, now);
        if let Err(err) = self
            .amplitude
            .gain
            .exponential_ramp_to_value_at_time(base_gain(amp, depth), now + ONSET_TIME)
        {
            tracing::warn!(%err, multiplier, "partial onset ramp rejected");
        }

        let attack_end = now + params.attack as f64;
        self.envelope.reset(GAIN_FLOOR);
        self.envelope
            .gain
            .set_value_at_time(GAIN_FLOOR, now)
            .linear_ramp_to_value_at_time(1.0, attack_end)
            .linear_ramp_to_value_at_time(params.sustain, attack_end + params.decay as f64);
    }

    pub fn multiplier(&self) -> usize {
        self.multiplier
    }

    pub fn base_amplitude(&self) -> f32 {
        self.base_amplitude
    }

    pub fn frequency(&self) -> f32 {
        self.osc.frequency.value()
    }

    pub fn waveform(&self) -> Waveform {
        self.osc.waveform()
    }

    /// Envelope level at `now`.
    pub fn envelope_level(&mut self, now: f64) -> f32 {
        self.envelope.gain.value_at(now)
    }

    /// Resting gain and LFO scale as last scheduled.
    pub fn amplitude_targets(&mut self, now: f64) -> (f32, f32) {
        (self.amplitude.gain.value_at(now), self.amplitude.depth.value_at(now))
    }

    pub fn is_fm_connected(&self) -> bool {
        self.osc.is_fm_connected()
    }

    pub fn is_lfo_connected(&self) -> bool {
        self.amplitude.is_modulated()
    }

    pub fn is_sounding(&self) -> bool {
        self.osc.is_active()
    }

    pub fn stop_time(&self) -> Option<f64> {
        self.osc.stop_time()
    }

    /// Live loudness change: rest at `amp`, swing by `amp * depth`.
    pub fn set_amplitude(&mut self, amp: f32, depth: f32, now: f64) {
        self.base_amplitude = amp;
        self.amplitude
            .gain
            .cancel_scheduled_values(now)
            .set_value_at_time(amp, now);
        self.set_lfo_depth(depth, now);
    }

    /// Live depth change. Only the LFO scale moves.
    pub fn set_lfo_depth(&mut self, depth: f32, now: f64) {
        self.amplitude
            .depth
            .cancel_scheduled_values(now)
            .set_value_at_time(live_lfo_scale(self.base_amplitude, depth), now);
    }

    /// Start the release ramp from the current envelope level and schedule
    /// the oscillator stop. Returns the stop time.
    fn release(&mut self, release: f32, now: f64) -> f64 {
        let current = self.envelope.gain.value_at(now);
        self.envelope
            .gain
            .cancel_scheduled_values(now)
            .set_value_at_time(current, now)
            .linear_ramp_to_value_at_time(GAIN_FLOOR, now + release as f64);

        // Both routes may already be gone if the voice is being torn down
        if let Err(err) = self.osc.disconnect_fm() {
            tracing::trace!(%err, multiplier = self.multiplier, "fm disconnect skipped");
        }
        if let Err(err) = self.amplitude.disconnect_modulation() {
            tracing::trace!(%err, multiplier = self.multiplier, "lfo disconnect skipped");
        }

        let stop_at = now + release as f64 + STOP_MARGIN;
        if let Err(err) = self.osc.stop(stop_at) {
            tracing::trace!(%err, multiplier = self.multiplier, "stop skipped");
        }
        stop_at
    }

    fn render_into(&mut self, mix: &mut [f32], scratch: &mut [f32], ctx: &RenderCtx) {
        if !self.osc.is_active() {
            return;
        }
        let block = &mut scratch[..mix.len()];
        self.osc.render_block(block, ctx);
        self.envelope.process(block, &[], ctx);
        self.amplitude.process(block, ctx.partials_lfo, ctx);

        for (m, s) in mix.iter_mut().zip(block.iter()) {
            *m += s;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Active,    // Key held, envelope in attack/decay/sustain
    Releasing, // Key released, release tail still sounding
    Stopped,   // Oscillators stopped, ready to drop
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub u64);

/// One key's worth of partials sharing a fundamental.
///
/// Only the first `len` partials of the bank belong to the current note.
pub struct Voice {
    id: VoiceId,
    key: KeyId,
    fundamental: f32,
    partials: Vec<Partial>,
    len: usize,
    created_at: f64,
    state: VoiceState,
    stop_time: Option<f64>,
}

impl Voice {
    /// Stopped slot with room for `max_partials` partials.
    pub fn idle(max_partials: usize) -> Self {
        Self {
            id: VoiceId(0),
            key: KeyId(0),
            fundamental: 0.0,
            partials: (0..max_partials).map(|_| Partial::idle()).collect(),
            len: 0,
            created_at: 0.0,
            state: VoiceState::Stopped,
            stop_time: None,
        }
    }

    /// A slot sized for `params`, already started.
    pub fn new(id: VoiceId, key: KeyId, fundamental: f32, params: &Params, now: f64) -> Self {
        let mut voice = Self::idle(params.num_partials());
        voice.start(id, key, fundamental, params, now);
        voice
    }

    /// Build and start every partial from the current parameters.
    ///
    /// The partial count is read once here; later count changes do not
    /// reach this voice.
    pub fn start(&mut self, id: VoiceId, key: KeyId, fundamental: f32, params: &Params, now: f64) {
        let count = params.num_partials();
        if count > self.partials.len() {
            tracing::debug!(count, capacity = self.partials.len(), "growing partial bank");
            self.partials.resize_with(count, Partial::idle);
        }

        for (index, partial) in self.partials[..count].iter_mut().enumerate() {
            let amp = params.partial_volumes.get(index);
            partial.start(index + 1, fundamental, params.waveform, amp, params, now);
        }

        self.id = id;
        self.key = key;
        self.fundamental = fundamental;
        self.len = count;
        self.created_at = now;
        self.state = VoiceState::Active;
        self.stop_time = None;
    }

    pub fn id(&self) -> VoiceId {
        self.id
    }

    pub fn key(&self) -> KeyId {
        self.key
    }

    pub fn fundamental(&self) -> f32 {
        self.fundamental
    }

    pub fn created_at(&self) -> f64 {
        self.created_at
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    /// False once every oscillator of a released voice has stopped.
    pub fn is_active(&self) -> bool {
        self.state != VoiceState::Stopped
    }

    pub fn stop_time(&self) -> Option<f64> {
        self.stop_time
    }

    pub fn partial_count(&self) -> usize {
        self.len
    }

    pub fn partials(&self) -> &[Partial] {
        &self.partials[..self.len]
    }

    pub fn partials_mut(&mut self) -> &mut [Partial] {
        &mut self.partials[..self.len]
    }

    /// Note-off. Only an active voice can be released.
    pub fn release(&mut self, release: f32, now: f64) {
        if self.state != VoiceState::Active {
            return;
        }
        let stop_at = self.partials[..self.len]
            .iter_mut()
            .map(|partial| partial.release(release, now))
            .fold(now, f64::max);
        self.stop_time = Some(stop_at);
        self.state = VoiceState::Releasing;
    }

    /// Update the partial at zero-based `index`, if this voice has one.
    pub fn set_partial_amplitude(&mut self, index: usize, amp: f32, depth: f32, now: f64) -> bool {
        match self.partials_mut().get_mut(index) {
            Some(partial) => {
                partial.set_amplitude(amp, depth, now);
                true
            }
            None => false,
        }
    }

    /// Push a new partials-LFO depth into every partial.
    pub fn set_lfo_depth(&mut self, depth: f32, now: f64) {
        for partial in self.partials_mut() {
            partial.set_lfo_depth(depth, now);
        }
    }

    /// Add this voice into `mix`. `scratch` must be at least as long as
    /// `mix` and is overwritten.
    pub fn render_into(&mut self, mix: &mut [f32], scratch: &mut [f32], ctx: &RenderCtx) {
        if self.state == VoiceState::Stopped {
            return;
        }
        for partial in &mut self.partials[..self.len] {
            partial.render_into(mix, scratch, ctx);
        }

        if self.state == VoiceState::Releasing && self.partials().iter().all(|p| !p.is_sounding()) {
            self.state = VoiceState::Stopped;
        }
    }
}
