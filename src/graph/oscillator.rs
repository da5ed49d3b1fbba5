use crate::{
    dsp::{
        automation::AutomatedParam,
        oscillator::{OscillatorBlock, Waveform},
    },
    graph::node::{GraphNode, RenderCtx},
    Error, Result,
};

/*
Audio Oscillator
================

An oscillator is the sound source of every partial. It runs at a fixed
frequency (the fundamental times the partial's multiplier) plus whatever
the vibrato LFO adds on top.

Lifecycle
---------

  Running   Producing samples. Every oscillator starts running as soon as
            it is created.

  Stopping  A stop time has been scheduled. Samples continue until the
            render clock reaches it.

  Stopped   Silent. Stopping again is an error, which voice teardown is
            expected to swallow. Only `restart` brings the node back, when
            a pooled voice slot is handed to a new note.

Frequency Modulation
--------------------

Vibrato is connected as an *additive* offset in Hz: every partial of every
voice gets the same absolute deviation, so upper partials wobble less in
relative (cent) terms than the fundamental.

  f(t) = frequency(t) + fm(t)     when the FM route is connected
  f(t) = frequency(t)             after it has been disconnected
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscState {
    Running,
    Stopping,
    Stopped,
}

pub struct OscNode {
    osc: OscillatorBlock,
    pub frequency: AutomatedParam,
    state: OscState,
    stop_time: f64,
    fm_connected: bool,
}

impl OscNode {
    pub fn new(waveform: Waveform, frequency: f32) -> Self {
        Self {
            osc: OscillatorBlock::new(waveform),
            frequency: AutomatedParam::new(frequency),
            state: OscState::Running,
            stop_time: f64::INFINITY,
            fm_connected: false,
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.osc.waveform()
    }

    /// Run again from phase zero with a fresh frequency timeline and no
    /// FM route.
    pub fn restart(&mut self, waveform: Waveform, frequency: f32) {
        self.osc.set_waveform(waveform);
        self.osc.reset();
        self.frequency.reset(frequency);
        self.state = OscState::Running;
        self.stop_time = f64::INFINITY;
        self.fm_connected = false;
    }

    pub fn state(&self) -> OscState {
        self.state
    }

    pub fn stop_time(&self) -> Option<f64> {
        self.stop_time.is_finite().then_some(self.stop_time)
    }

    /// Schedule the oscillator to fall silent at `time`.
    ///
    /// Rescheduling a pending stop moves it; stopping a stopped node fails.
    pub fn stop(&mut self, time: f64) -> Result<()> {
        if self.state == OscState::Stopped {
            return Err(Error::NodeStopped("oscillator"));
        }
        self.stop_time = time;
        self.state = OscState::Stopping;
        Ok(())
    }

    pub fn connect_fm(&mut self) -> Result<()> {
        if self.state == OscState::Stopped {
            return Err(Error::NodeStopped("oscillator"));
        }
        self.fm_connected = true;
        Ok(())
    }

    pub fn disconnect_fm(&mut self) -> Result<()> {
        if !self.fm_connected {
            return Err(Error::NotConnected("fm"));
        }
        self.fm_connected = false;
        Ok(())
    }

    pub fn is_fm_connected(&self) -> bool {
        self.fm_connected
    }
}

impl GraphNode for OscNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        for (i, sample) in out.iter_mut().enumerate() {
            let t = ctx.sample_time(i);
            if self.state == OscState::Stopped || t >= self.stop_time {
                self.state = OscState::Stopped;
                *sample = 0.0;
                continue;
            }

            let mut freq = self.frequency.value_at(t);
            if self.fm_connected {
                freq += ctx.fm_at(i);
            }
            *sample = self.osc.next_sample(freq, ctx.sample_rate);
        }
    }

    fn is_active(&self) -> bool {
        self.state != OscState::Stopped
    }
}
