use std::collections::VecDeque;

use crate::{Error, Result};

/*
Scheduled Parameter Automation
==============================

Every gain and frequency in the synth is an `AutomatedParam`: a value that
follows a timeline of scheduled events instead of being poked sample by
sample from the control side. The control side says "be at 1.0 by t=0.2"
and the render loop works out what the value is at every sample.

Vocabulary
----------

  event       One scheduled change: jump, linear ramp, exponential ramp or
              exponential approach ("target"). Events are kept sorted by time.

  anchor      The (time, value) pair of the last event the render clock has
              passed. Ramps start from the anchor.

  approach    A target event does not end by itself. From its start time the
              value glides toward the target forever, until the next event.

  time        Seconds on the render clock (f64 so long sessions keep sample
              accuracy).


The Shapes
----------

  set_value_at_time      jump at `time`, hold afterwards

  linear_ramp            v(t) = v0 + (v1 - v0) * (t - t0) / (t1 - t0)
                         starts at the anchor, ends at the event

  exponential_ramp       v(t) = v0 * (v1 / v0) ^ ((t - t0) / (t1 - t0))
                         v0 and v1 must share a sign and be non-zero, which
                         is why gains are floored at GAIN_FLOOR before use

  set_target_at_time     v(t) = target + (v0 - target) * e^(-(t - t0) / tc)
                         after one time constant ~63% of the distance is
                         covered, after five ~99%


Cancellation
------------

`cancel_scheduled_values(t)` drops every event at or after `t`. A ramp that
was in flight disappears with its end point, so the value falls back to the
anchor. Callers that want to continue from where the curve currently is
read `value_at(now)` first and re-anchor with `set_value_at_time`.


Evaluation Order
----------------

`value_at` expects a non-decreasing clock: passed events are folded into
the anchor and discarded. Events sharing a timestamp are applied in the
order they were scheduled, so "jump to 0 then ramp to 1 over 0 seconds"
lands on 1.


Reuse
-----

`reset` empties the timeline but keeps the queue's storage. Voices are
pooled, so after the first few notes every schedule lands in capacity the
parameter already owns and the audio thread never allocates for it.
*/

/// Events a parameter can hold before its queue grows.
pub const EVENT_CAPACITY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Event {
    SetValue {
        time: f64,
        value: f32,
    },
    LinearRamp {
        time: f64,
        value: f32,
    },
    ExponentialRamp {
        time: f64,
        value: f32,
    },
    SetTarget {
        time: f64,
        target: f32,
        time_constant: f64,
    },
}

impl Event {
    fn time(&self) -> f64 {
        match *self {
            Event::SetValue { time, .. }
            | Event::LinearRamp { time, .. }
            | Event::ExponentialRamp { time, .. }
            | Event::SetTarget { time, .. } => time,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AutomatedParam {
    events: VecDeque<Event>,
    anchor_time: f64,
    anchor_value: f32,
    approach: Option<(f32, f64)>,
    value: f32,
}

impl AutomatedParam {
    pub fn new(value: f32) -> Self {
        Self {
            events: VecDeque::with_capacity(EVENT_CAPACITY),
            anchor_time: 0.0,
            anchor_value: value,
            approach: None,
            value,
        }
    }

    /// Drop every event and hold `value` from time zero.
    pub fn reset(&mut self, value: f32) {
        self.events.clear();
        self.anchor_time = 0.0;
        self.anchor_value = value;
        self.approach = None;
        self.value = value;
    }

    /// Value computed by the most recent `value_at` call.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// True while events are waiting on the timeline.
    pub fn has_pending(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn set_value_at_time(&mut self, value: f32, time: f64) -> &mut Self {
        self.insert(Event::SetValue { time, value });
        self
    }

    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, time: f64) -> &mut Self {
        self.insert(Event::LinearRamp { time, value });
        self
    }

    pub fn exponential_ramp_to_value_at_time(&mut self, value: f32, time: f64) -> Result<&mut Self> {
        if value <= 0.0 {
            return Err(Error::NonPositiveRampTarget(value));
        }
        self.insert(Event::ExponentialRamp { time, value });
        Ok(self)
    }

    pub fn set_target_at_time(&mut self, target: f32, time: f64, time_constant: f64) -> Result<&mut Self> {
        if time_constant < 0.0 {
            return Err(Error::NegativeTimeConstant(time_constant));
        }
        self.insert(Event::SetTarget {
            time,
            target,
            time_constant,
        });
        Ok(self)
    }

    pub fn cancel_scheduled_values(&mut self, time: f64) -> &mut Self {
        self.events.retain(|event| event.time() < time);
        self
    }

    /// Advance the timeline to `time` and return the parameter value there.
    pub fn value_at(&mut self, time: f64) -> f32 {
        while let Some(event) = self.events.front().copied() {
            if event.time() > time {
                break;
            }

            let (value, approach) = match event {
                Event::SetValue { value, .. }
                | Event::LinearRamp { value, .. }
                | Event::ExponentialRamp { value, .. } => (value, None),
                Event::SetTarget {
                    time: start,
                    target,
                    time_constant,
                } => (self.resting_value(start), Some((target, time_constant))),
            };

            self.anchor_time = event.time();
            self.anchor_value = value;
            self.approach = approach;
            self.events.pop_front();
        }

        let value = match self.events.front().copied() {
            Some(Event::LinearRamp { time: end, value: to }) => {
                let from = self.anchor_value;
                match self.progress(time, end) {
                    Some(p) => from + (to - from) * p,
                    None => to,
                }
            }
            Some(Event::ExponentialRamp { time: end, value: to }) => {
                let from = self.anchor_value;
                if from * to <= 0.0 {
                    // No exponential curve joins values of different sign
                    from
                } else {
                    match self.progress(time, end) {
                        Some(p) => from * (to / from).powf(p),
                        None => to,
                    }
                }
            }
            _ => self.resting_value(time),
        };

        self.value = value;
        value
    }

    /// Fill `out` with one value per sample starting at `start_time`.
    pub fn render(&mut self, out: &mut [f32], start_time: f64, sample_rate: f32) {
        let dt = 1.0 / sample_rate as f64;
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = self.value_at(start_time + i as f64 * dt);
        }
    }

    fn insert(&mut self, event: Event) {
        // After any event sharing the same timestamp
        let index = self
            .events
            .iter()
            .position(|existing| existing.time() > event.time())
            .unwrap_or(self.events.len());
        self.events.insert(index, event);
    }

    fn progress(&self, time: f64, end: f64) -> Option<f32> {
        let span = end - self.anchor_time;
        if span <= 0.0 {
            return None;
        }
        Some(((time - self.anchor_time) / span).clamp(0.0, 1.0) as f32)
    }

    fn resting_value(&self, time: f64) -> f32 {
        match self.approach {
            Some((target, time_constant)) if time_constant > 0.0 => {
                let elapsed = (time - self.anchor_time).max(0.0);
                let decay = (-elapsed / time_constant).exp() as f32;
                target + (self.anchor_value - target) * decay
            }
            Some((target, _)) => target,
            None => self.anchor_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn holds_initial_value_without_events() {
        let mut param = AutomatedParam::new(0.7);
        assert!(close(param.value_at(0.0), 0.7));
        assert!(close(param.value_at(10.0), 0.7));
    }

    #[test]
    fn linear_ramp_interpolates_from_anchor() {
        let mut param = AutomatedParam::new(0.0);
        param
            .set_value_at_time(0.0, 1.0)
            .linear_ramp_to_value_at_time(1.0, 2.0);

        assert!(close(param.value_at(0.5), 0.0));
        assert!(close(param.value_at(1.5), 0.5));
        assert!(close(param.value_at(2.0), 1.0));
        assert!(close(param.value_at(3.0), 1.0));
        assert!(!param.has_pending());
    }

    #[test]
    fn chained_ramps_form_attack_and_decay() {
        let mut param = AutomatedParam::new(1.0);
        param
            .set_value_at_time(0.0001, 0.0)
            .linear_ramp_to_value_at_time(1.0, 0.1)
            .linear_ramp_to_value_at_time(0.5, 0.3);

        assert!(close(param.value_at(0.1), 1.0));
        assert!(close(param.value_at(0.2), 0.75));
        assert!(close(param.value_at(1.0), 0.5));
    }

    #[test]
    fn zero_length_ramp_jumps_to_target() {
        let mut param = AutomatedParam::new(0.0);
        param
            .set_value_at_time(0.0001, 0.5)
            .linear_ramp_to_value_at_time(1.0, 0.5);

        assert!(close(param.value_at(0.5), 1.0));
    }

    #[test]
    fn exponential_ramp_is_geometric() {
        let mut param = AutomatedParam::new(0.0);
        param.set_value_at_time(0.01, 0.0);
        param.exponential_ramp_to_value_at_time(1.0, 1.0).unwrap();

        // Halfway in time is the geometric mean of the end points
        assert!(close(param.value_at(0.5), 0.1));
        assert!(close(param.value_at(1.0), 1.0));
    }

    #[test]
    fn exponential_ramp_rejects_non_positive_target() {
        let mut param = AutomatedParam::new(1.0);
        assert_eq!(
            param.exponential_ramp_to_value_at_time(0.0, 1.0).err(),
            Some(Error::NonPositiveRampTarget(0.0))
        );
        assert!(!param.has_pending());
    }

    #[test]
    fn target_approach_covers_63_percent_per_time_constant() {
        let mut param = AutomatedParam::new(1.0);
        param.set_target_at_time(0.0, 0.0, 0.5).unwrap();

        let after_one = param.value_at(0.5);
        assert!((after_one - (-1.0f32).exp()).abs() < 1e-4);
        assert!(param.value_at(5.0) < 1e-4);
    }

    #[test]
    fn target_starts_from_value_reached_so_far() {
        let mut param = AutomatedParam::new(1.0);
        param.set_target_at_time(0.0, 0.0, 1.0).unwrap();
        let reached = param.value_at(1.0);

        param.cancel_scheduled_values(1.0);
        param.set_target_at_time(1.0, 1.0, 1.0).unwrap();

        assert!(close(param.value_at(1.0), reached));
        assert!(param.value_at(2.0) > reached);
    }

    #[test]
    fn cancel_drops_in_flight_ramp() {
        let mut param = AutomatedParam::new(0.0);
        param
            .set_value_at_time(0.0, 0.0)
            .linear_ramp_to_value_at_time(1.0, 1.0);
        assert!(close(param.value_at(0.5), 0.5));

        param.cancel_scheduled_values(0.5);
        // Ramp end point is gone, so the value falls back to the anchor
        assert!(close(param.value_at(0.6), 0.0));
    }

    #[test]
    fn hold_then_ramp_continues_from_current_value() {
        let mut param = AutomatedParam::new(0.0);
        param
            .set_value_at_time(0.0, 0.0)
            .linear_ramp_to_value_at_time(1.0, 1.0);

        let current = param.value_at(0.25);
        param
            .cancel_scheduled_values(0.25)
            .set_value_at_time(current, 0.25)
            .linear_ramp_to_value_at_time(0.0, 0.75);

        assert!(close(param.value_at(0.25), 0.25));
        assert!(close(param.value_at(0.5), 0.125));
        assert!(close(param.value_at(0.75), 0.0));
    }

    #[test]
    fn reset_clears_timeline_and_keeps_storage() {
        let mut param = AutomatedParam::new(0.0);
        for i in 0..20 {
            param.linear_ramp_to_value_at_time(i as f32, 1.0 + i as f64);
        }
        let grown = param.events.capacity();
        assert!(grown >= 20);

        param.reset(0.3);
        assert!(!param.has_pending());
        assert_eq!(param.events.capacity(), grown);
        assert!(close(param.value_at(5.0), 0.3));

        // Fresh schedule after a reset behaves like a new parameter
        param
            .set_value_at_time(0.0, 5.0)
            .linear_ramp_to_value_at_time(1.0, 6.0);
        assert!(close(param.value_at(5.5), 0.5));
    }

    #[test]
    fn render_fills_one_value_per_sample() {
        let mut param = AutomatedParam::new(0.0);
        param
            .set_value_at_time(0.0, 0.0)
            .linear_ramp_to_value_at_time(1.0, 0.004);

        let mut out = [0.0f32; 5];
        param.render(&mut out, 0.0, 1_000.0);

        for (i, &v) in out.iter().enumerate() {
            assert!(close(v, i as f32 * 0.25), "sample {i}: {v}");
        }
    }
}
