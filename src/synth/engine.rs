use crate::{
    dsp::{
        analyser::{Analyser, DEFAULT_ANALYSER_SIZE},
        meter::MeterReading,
    },
    graph::node::{GraphNode, RenderCtx},
    keymap::KeyId,
    synth::{
        arbiter::{GainArbiter, GainRequest, GainSource},
        headroom::{safe_gain, HEADROOM_TIME_CONSTANT},
        limiter::{Limiter, LimiterSettings, LimiterState},
        manager::VoiceManager,
        message::{MessageReceiver, SynthMessage},
        modulation::ModulationSources,
        params::{ParamChange, Params},
    },
    Result, MAX_BLOCK_SIZE,
};

/*
Engine
======

The engine is the one object that owns everything that makes sound:

    ┌──────────────┐   ┌─────────────┐   ┌─────────┐   ┌─────────┐
    │ VoiceManager │ → │ master gain │ → │ tremolo │ → │ analyser│ → out
    └──────────────┘   └─────────────┘   └─────────┘   └─────────┘
           ↑                  ↑               ↑             │
      FM, partials LFO    GainArbiter      AM LFO           │ every frame
           │              ↑        ↑                        ↓
    ModulationSources  headroom  limiter ←──────────── MeterReading

Everything runs on `&mut self`, so note events, parameter changes and
limiter ticks are applied in the order they arrive and never race each
other. Time is the render clock: samples rendered divided by the sample
rate. All scheduling uses that clock, which keeps the whole engine
deterministic and lets tests step through it sample by sample.


Frames
------

With a frame rate set, a render call is split at frame boundaries
(every `sample_rate / frame_rate` samples). At each boundary the engine
snapshots the analyser, runs the limiter and emits a `FrameReport`. Without
a frame rate the caller drives `tick_meter` by hand.
*/

pub const DEFAULT_FRAME_RATE: f32 = 60.0;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub sample_rate: f32,
    pub analyser_size: usize,
    pub frame_rate: Option<f32>,
    pub params: Params,
}

impl EngineConfig {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            analyser_size: DEFAULT_ANALYSER_SIZE,
            frame_rate: Some(DEFAULT_FRAME_RATE),
            params: Params::default(),
        }
    }

    pub fn with_analyser_size(mut self, size: usize) -> Self {
        self.analyser_size = size.max(1);
        self
    }

    pub fn with_frame_rate(mut self, rate: f32) -> Self {
        self.frame_rate = (rate > 0.0).then_some(rate);
        self
    }

    /// No automatic limiter ticks; call [`Engine::tick_meter`] directly.
    pub fn without_frame_clock(mut self) -> Self {
        self.frame_rate = None;
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn build(self) -> Engine {
        Engine::new(self)
    }
}

/// What the meter needs to draw one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameReport {
    pub time: f64,
    pub reading: MeterReading,
    pub master_gain: f32,
    pub active_voices: usize,
    pub draining_voices: usize,
    pub limiter: LimiterState,
}

pub struct Engine {
    sample_rate: f32,
    params: Params,
    voices: VoiceManager,
    modulation: ModulationSources,
    master: GainArbiter,
    limiter: Limiter,
    analyser: Analyser,
    snapshot: Vec<u8>,
    clock: u64,
    frame_period: Option<u64>,
    until_frame: u64,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let frame_period = config
            .frame_rate
            .map(|rate| ((config.sample_rate / rate).round() as u64).max(1));
        let analyser = Analyser::new(config.analyser_size);

        Self {
            sample_rate: config.sample_rate,
            modulation: ModulationSources::new(&config.params),
            params: config.params,
            voices: VoiceManager::new(),
            master: GainArbiter::new(1.0),
            limiter: Limiter::new(),
            snapshot: vec![128; analyser.size()],
            analyser,
            clock: 0,
            frame_period,
            until_frame: frame_period.unwrap_or(0),
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Render clock in seconds.
    pub fn now(&self) -> f64 {
        self.clock as f64 / self.sample_rate as f64
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn voices(&self) -> &VoiceManager {
        &self.voices
    }

    pub fn voices_mut(&mut self) -> &mut VoiceManager {
        &mut self.voices
    }

    pub fn active_voices(&self) -> usize {
        self.voices.active_count()
    }

    pub fn draining_voices(&self) -> usize {
        self.voices.draining_count()
    }

    /// Master gain as of the last rendered sample.
    pub fn master_gain(&self) -> f32 {
        self.master.current()
    }

    pub fn last_gain_request(&self) -> Option<GainRequest> {
        self.master.last_request()
    }

    pub fn limiter_state(&self) -> LimiterState {
        self.limiter.state()
    }

    /// Press `key`. Unmapped keys and keys already held do nothing.
    pub fn note_on(&mut self, key: KeyId) -> bool {
        let Some(frequency) = key.frequency() else {
            tracing::trace!(key = key.0, "unmapped key ignored");
            return false;
        };

        let now = self.now();
        if !self.voices.note_on(key, frequency, &self.params, now) {
            return false;
        }
        self.recompute_headroom(now);
        true
    }

    pub fn note_off(&mut self, key: KeyId) -> bool {
        let now = self.now();
        if !self.voices.note_off(key, self.params.release, now) {
            return false;
        }
        self.recompute_headroom(now);
        true
    }

    pub fn all_notes_off(&mut self) -> usize {
        let now = self.now();
        let released = self.voices.all_notes_off(self.params.release, now);
        if released > 0 {
            self.recompute_headroom(now);
        }
        released
    }

    /// Store a parameter change and push it into whatever is already
    /// running.
    pub fn apply(&mut self, change: ParamChange) -> Result<()> {
        self.params.apply(change)?;

        let now = self.now();
        let depth = self.params.partials_lfo_depth;
        match change {
            ParamChange::AmRate(_) => self.modulation.set_am_rate(self.params.am_rate, now),
            ParamChange::AmDepth(_) => self.modulation.set_am_depth(self.params.am_depth, now),
            ParamChange::FmRate(_) => self.modulation.set_fm_rate(self.params.fm_rate, now),
            ParamChange::FmDepth(_) => self.modulation.set_fm_depth(self.params.fm_depth, now),
            ParamChange::PartialsLfoRate(_) => self
                .modulation
                .set_partials_lfo_rate(self.params.partials_lfo_rate, now),
            ParamChange::PartialsLfoDepth(_) => {
                // Draining voices have their LFO route detached already
                for voice in self.voices.active_voices_mut() {
                    voice.set_lfo_depth(depth, now);
                }
            }
            ParamChange::PartialVolume { index, .. } => {
                let amp = self.params.partial_volumes.get(index);
                for voice in self.voices.active_voices_mut() {
                    voice.set_partial_amplitude(index, amp, depth, now);
                }
                self.recompute_headroom(now);
            }
            ParamChange::PartialCount(_) => self.recompute_headroom(now),
            // Read at the next note-on or note-off, or by the limiter tick
            ParamChange::Waveform(_)
            | ParamChange::Attack(_)
            | ParamChange::Decay(_)
            | ParamChange::Sustain(_)
            | ParamChange::Release(_)
            | ParamChange::LimiterThreshold(_)
            | ParamChange::LimiterCeiling(_) => {}
        }
        Ok(())
    }

    pub fn handle(&mut self, message: SynthMessage) {
        match message {
            SynthMessage::NoteOn { key } => {
                self.note_on(key);
            }
            SynthMessage::NoteOff { key } => {
                self.note_off(key);
            }
            SynthMessage::Param(change) => {
                if let Err(err) = self.apply(change) {
                    tracing::warn!(%err, ?change, "parameter change rejected");
                }
            }
            SynthMessage::AllNotesOff => {
                self.all_notes_off();
            }
        }
    }

    /// Apply every pending control message.
    pub fn drain_messages<R: MessageReceiver + ?Sized>(&mut self, rx: &mut R) -> usize {
        let mut handled = 0;
        while let Some(message) = rx.pop() {
            self.handle(message);
            handled += 1;
        }
        handled
    }

    /// Ask for the headroom-safe master gain for the current voice count.
    pub fn recompute_headroom(&mut self, now: f64) {
        let target = safe_gain(
            self.voices.active_count(),
            self.params.partial_volumes.as_slice(),
        );
        self.master.request(
            GainRequest {
                source: GainSource::Headroom,
                target,
                time_constant: HEADROOM_TIME_CONSTANT,
            },
            now,
        );
    }

    /// Snapshot the analyser, run the limiter and report.
    pub fn tick_meter(&mut self) -> FrameReport {
        self.analyser.byte_time_domain_data(&mut self.snapshot);
        let reading = MeterReading::from_bytes(&self.snapshot);

        let now = self.now();
        let master_gain = self.master.value_at(now);
        let settings = LimiterSettings {
            threshold: self.params.limiter_threshold,
            ceiling: self.params.limiter_ceiling,
        };
        if let Some(request) = self.limiter.process(reading.peak, master_gain, settings) {
            self.master.request(request, now);
        }

        FrameReport {
            time: now,
            reading,
            master_gain,
            active_voices: self.voices.active_count(),
            draining_voices: self.voices.draining_count(),
            limiter: self.limiter.state(),
        }
    }

    /// Render `out`, returning the most recent frame report produced.
    pub fn render(&mut self, out: &mut [f32]) -> Option<FrameReport> {
        let mut latest = None;
        self.render_with(out, |report| latest = Some(report));
        latest
    }

    /// Render `out`, calling `on_frame` at every frame boundary crossed.
    pub fn render_with<F: FnMut(FrameReport)>(&mut self, out: &mut [f32], mut on_frame: F) {
        let mut offset = 0;
        while offset < out.len() {
            let mut len = (out.len() - offset).min(MAX_BLOCK_SIZE);
            if self.frame_period.is_some() {
                len = len.min(self.until_frame as usize);
            }

            self.render_block(&mut out[offset..offset + len]);
            offset += len;

            if let Some(period) = self.frame_period {
                self.until_frame -= len as u64;
                if self.until_frame == 0 {
                    self.until_frame = period;
                    on_frame(self.tick_meter());
                }
            }
        }
    }

    fn render_block(&mut self, block: &mut [f32]) {
        let now = self.now();
        let ctx = RenderCtx::new(self.sample_rate, now);

        self.modulation.render(block.len(), &ctx);
        let voice_ctx = RenderCtx::new(self.sample_rate, now)
            .with_modulation(self.modulation.fm(), self.modulation.partials_lfo());
        self.voices.render_block(block, &voice_ctx);

        for (i, sample) in block.iter_mut().enumerate() {
            *sample *= self.master.value_at(ctx.sample_time(i));
        }
        self.modulation.apply_tremolo(block, &ctx);
        self.analyser.push_block(block);

        self.clock += block.len() as u64;
    }
}
