use crate::dsp::automation::AutomatedParam;

/*
Master Gain Arbiter
===================

Two independent controllers want the master gain:

  Headroom   proactive; recomputed on every note-on/note-off from the
             number of held voices and the partial volumes

  Limiter    reactive; recomputed every frame from the measured peak

Neither knows about the other. Both requests have the same shape, "cancel
whatever is scheduled and glide toward `target` with time constant `tc`",
and the arbiter applies them in arrival order: the most recent request
wins outright. A limiter release heading back to 1.0 can therefore undo a
headroom reduction, and a note-on can lift the gain while the limiter is
engaged. That tension is deliberate to keep: the arbiter records the last
writer so it is visible, but it does not pick a side.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainSource {
    Headroom,
    Limiter,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainRequest {
    pub source: GainSource,
    pub target: f32,
    pub time_constant: f64,
}

pub struct GainArbiter {
    gain: AutomatedParam,
    last_request: Option<GainRequest>,
}

impl GainArbiter {
    pub fn new(initial: f32) -> Self {
        Self {
            gain: AutomatedParam::new(initial),
            last_request: None,
        }
    }

    /// Replace any pending automation with the request. Last writer wins.
    pub fn request(&mut self, request: GainRequest, now: f64) {
        // Reject before cancelling so a bad request leaves the schedule alone
        if request.time_constant < 0.0 {
            tracing::warn!(
                source = ?request.source,
                time_constant = request.time_constant,
                "gain request rejected"
            );
            return;
        }

        self.gain.cancel_scheduled_values(now);
        if let Err(err) = self
            .gain
            .set_target_at_time(request.target, now, request.time_constant)
        {
            tracing::warn!(%err, source = ?request.source, "gain request rejected");
            return;
        }
        self.last_request = Some(request);
    }

    /// Gain as of the last rendered sample.
    pub fn current(&self) -> f32 {
        self.gain.value()
    }

    pub fn value_at(&mut self, time: f64) -> f32 {
        self.gain.value_at(time)
    }

    pub fn last_request(&self) -> Option<GainRequest> {
        self.last_request
    }

    pub fn last_writer(&self) -> Option<GainSource> {
        self.last_request.map(|r| r.source)
    }
}
