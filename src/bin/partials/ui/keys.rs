//! Held-key tracking for terminals that never report key releases.
//!
//! Without keyboard-enhancement support a terminal only sends presses, plus
//! auto-repeat presses while a key stays down. A key counts as released once
//! no press has arrived for a while: long enough after the first press to
//! cover the auto-repeat delay, shorter once repeats are flowing.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use partials::keymap::KeyId;

/// Grace period after the first press, before auto-repeat kicks in.
pub const INITIAL_HOLD: Duration = Duration::from_millis(600);

/// Grace period between auto-repeat presses.
pub const REPEAT_HOLD: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy)]
struct Held {
    last_seen: Instant,
    repeats: u32,
}

#[derive(Debug, Default)]
pub struct KeyTracker {
    held: HashMap<KeyId, Held>,
}

impl KeyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press. Returns true when this starts a new hold.
    pub fn press(&mut self, key: KeyId, now: Instant) -> bool {
        match self.held.get_mut(&key) {
            Some(held) => {
                held.last_seen = now;
                held.repeats += 1;
                false
            }
            None => {
                self.held.insert(
                    key,
                    Held {
                        last_seen: now,
                        repeats: 0,
                    },
                );
                true
            }
        }
    }

    /// Explicit release. Returns true if the key was held.
    pub fn release(&mut self, key: KeyId) -> bool {
        self.held.remove(&key).is_some()
    }

    /// Drop and return every key whose hold has timed out.
    pub fn expire(&mut self, now: Instant) -> Vec<KeyId> {
        let mut expired: Vec<KeyId> = self
            .held
            .iter()
            .filter(|(_, held)| {
                let grace = if held.repeats == 0 {
                    INITIAL_HOLD
                } else {
                    REPEAT_HOLD
                };
                now.saturating_duration_since(held.last_seen) > grace
            })
            .map(|(&key, _)| key)
            .collect();
        expired.sort();

        for key in &expired {
            self.held.remove(key);
        }
        expired
    }
}
