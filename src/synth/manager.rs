use std::collections::HashMap;

use crate::{
    graph::node::{GraphNode, RenderCtx},
    keymap::KeyId,
    synth::{
        params::{Params, MAX_PARTIALS},
        voice::{Voice, VoiceId, VoiceState},
    },
    MAX_BLOCK_SIZE,
};

/// Voice slots built up front.
pub const DEFAULT_VOICE_CAPACITY: usize = 64;

/// Maps held keys to voices and owns the release tails.
///
/// Voices live in a pool of slots allocated once. A key is either absent
/// or mapped to exactly one `Active` slot. Releasing a key unmaps it at
/// once, so the held-key count drops immediately while the tail keeps
/// sounding. A slot whose oscillators have stopped is free for the next
/// note. If every slot is busy the pool grows by one; notes are never
/// dropped or stolen.
pub struct VoiceManager {
    slots: Vec<Voice>,
    held: HashMap<KeyId, usize>,
    next_id: u64,
    scratch: Vec<f32>,
}

impl VoiceManager {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_VOICE_CAPACITY, MAX_PARTIALS)
    }

    /// Pool of `voices` slots, each with room for `partials` partials.
    pub fn with_capacity(voices: usize, partials: usize) -> Self {
        Self {
            slots: (0..voices).map(|_| Voice::idle(partials)).collect(),
            held: HashMap::with_capacity(voices),
            next_id: 0,
            scratch: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    /// Start a voice for `key`. Returns false if the key is already held,
    /// which also swallows OS key repeat.
    pub fn note_on(&mut self, key: KeyId, fundamental: f32, params: &Params, now: f64) -> bool {
        if self.held.contains_key(&key) {
            return false;
        }

        let slot = match self.slots.iter().position(|v| v.state() == VoiceState::Stopped) {
            Some(slot) => slot,
            None => {
                tracing::warn!(capacity = self.capacity(), "voice pool exhausted, growing");
                self.slots.push(Voice::idle(MAX_PARTIALS));
                self.slots.len() - 1
            }
        };

        let id = VoiceId(self.next_id);
        self.next_id += 1;

        let voice = &mut self.slots[slot];
        voice.start(id, key, fundamental, params, now);
        tracing::debug!(
            key = %key,
            voice = id.0,
            slot,
            partials = voice.partial_count(),
            fundamental,
            "note on"
        );
        self.held.insert(key, slot);
        true
    }

    /// Release the voice held by `key`. Returns false if the key is not held.
    pub fn note_off(&mut self, key: KeyId, release: f32, now: f64) -> bool {
        let Some(slot) = self.held.remove(&key) else {
            return false;
        };

        let voice = &mut self.slots[slot];
        voice.release(release, now);
        tracing::debug!(key = %key, voice = voice.id().0, stop = ?voice.stop_time(), "note off");
        true
    }

    /// Release every held key. Returns how many voices were released.
    pub fn all_notes_off(&mut self, release: f32, now: f64) -> usize {
        for &slot in self.held.values() {
            self.slots[slot].release(release, now);
        }
        let released = self.held.len();
        self.held.clear();
        tracing::debug!(released, "all notes off");
        released
    }

    /// Voice slots in the pool, busy or free.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of held keys. Draining voices are not counted.
    pub fn active_count(&self) -> usize {
        self.held.len()
    }

    pub fn draining_count(&self) -> usize {
        self.draining().count()
    }

    pub fn is_held(&self, key: KeyId) -> bool {
        self.held.contains_key(&key)
    }

    pub fn voice(&self, key: KeyId) -> Option<&Voice> {
        self.held.get(&key).map(|&slot| &self.slots[slot])
    }

    pub fn voice_mut(&mut self, key: KeyId) -> Option<&mut Voice> {
        let slot = *self.held.get(&key)?;
        self.slots.get_mut(slot)
    }

    /// Voices of held keys, for pushing live parameter changes.
    pub fn active_voices_mut(&mut self) -> impl Iterator<Item = &mut Voice> {
        self.slots
            .iter_mut()
            .filter(|voice| voice.state() == VoiceState::Active)
    }

    /// Released voices whose tails are still sounding.
    pub fn draining(&self) -> impl Iterator<Item = &Voice> {
        self.slots
            .iter()
            .filter(|voice| voice.state() == VoiceState::Releasing)
    }

    pub fn draining_mut(&mut self) -> impl Iterator<Item = &mut Voice> {
        self.slots
            .iter_mut()
            .filter(|voice| voice.state() == VoiceState::Releasing)
    }
}

impl Default for VoiceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphNode for VoiceManager {
    /// Sum every sounding voice, held or draining, into `out`.
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        out.fill(0.0);
        // The engine never renders more than MAX_BLOCK_SIZE at once
        if self.scratch.len() < out.len() {
            self.scratch.resize(out.len(), 0.0);
        }
        let scratch = &mut self.scratch[..out.len()];

        for voice in self.slots.iter_mut().filter(|voice| voice.is_active()) {
            let releasing = voice.state() == VoiceState::Releasing;
            voice.render_into(out, scratch, ctx);
            if releasing && !voice.is_active() {
                tracing::trace!(voice = voice.id().0, "voice torn down");
            }
        }
    }

    fn is_active(&self) -> bool {
        self.slots.iter().any(Voice::is_active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;
    const Z: KeyId = KeyId(b'Z');
    const X: KeyId = KeyId(b'X');

    fn render(manager: &mut VoiceManager, from: f64, samples: usize) -> Vec<f32> {
        let mut out = vec![0.0; samples];
        manager.render_block(&mut out, &RenderCtx::new(SAMPLE_RATE, from));
        out
    }

    #[test]
    fn duplicate_note_on_keeps_one_voice() {
        let mut manager = VoiceManager::new();
        let params = Params::default();

        assert!(manager.note_on(Z, 261.6, &params, 0.0));
        assert!(!manager.note_on(Z, 261.6, &params, 0.01));

        assert_eq!(manager.active_count(), 1);
        assert_eq!(manager.voice(Z).map(|v| v.id()), Some(VoiceId(0)));
    }

    #[test]
    fn note_off_removes_key_before_tail_ends() {
        let mut manager = VoiceManager::new();
        let params = Params {
            release: 5.0,
            ..Params::default()
        };
        manager.note_on(Z, 261.6, &params, 0.0);
        manager.note_on(X, 293.7, &params, 0.0);

        assert!(manager.note_off(Z, params.release, 0.1));
        assert!(!manager.is_held(Z));
        assert!(manager.is_held(X));
        assert_eq!(manager.active_count(), 1);
        assert_eq!(manager.draining_count(), 1);
        assert_eq!(manager.draining().next().map(|v| v.key()), Some(Z));
    }

    #[test]
    fn note_off_without_voice_is_noop() {
        let mut manager = VoiceManager::new();
        assert!(!manager.note_off(Z, 0.3, 0.0));
        assert_eq!(manager.draining_count(), 0);
    }

    #[test]
    fn key_can_retrigger_while_previous_tail_drains() {
        let mut manager = VoiceManager::new();
        let params = Params::default();
        manager.note_on(Z, 261.6, &params, 0.0);
        manager.note_off(Z, params.release, 0.1);

        assert!(manager.note_on(Z, 261.6, &params, 0.2));
        assert_eq!(manager.active_count(), 1);
        assert_eq!(manager.draining_count(), 1);
        assert_ne!(
            manager.voice(Z).map(|v| v.id()),
            manager.draining().next().map(|v| v.id())
        );
    }

    #[test]
    fn drained_voices_free_their_slot() {
        let mut manager = VoiceManager::new();
        let params = Params {
            release: 0.02,
            ..Params::default()
        };
        manager.note_on(Z, 261.6, &params, 0.0);
        manager.note_off(Z, params.release, 0.0);

        render(&mut manager, 0.0, 100);

        assert_eq!(manager.draining_count(), 0);
        assert!(!manager.is_active());
    }

    #[test]
    fn freed_slots_are_reused_without_growing() {
        let mut manager = VoiceManager::with_capacity(2, 4);
        let params = Params {
            release: 0.02,
            ..Params::default()
        };
        manager.note_on(Z, 261.6, &params, 0.0);
        manager.note_off(Z, params.release, 0.0);
        render(&mut manager, 0.0, 100);

        manager.note_on(X, 293.7, &params, 0.1);
        manager.note_on(Z, 261.6, &params, 0.1);

        assert_eq!(manager.capacity(), 2);
        assert_eq!(manager.active_count(), 2);
        assert!(render(&mut manager, 0.1, 50).iter().any(|&s| s != 0.0));
    }

    #[test]
    fn exhausted_pool_grows_instead_of_dropping() {
        let mut manager = VoiceManager::with_capacity(1, 4);
        let params = Params::default();

        assert!(manager.note_on(Z, 261.6, &params, 0.0));
        assert!(manager.note_on(X, 293.7, &params, 0.0));

        assert_eq!(manager.capacity(), 2);
        assert_eq!(manager.voice(X).map(|v| v.key()), Some(X));
    }

    #[test]
    fn all_notes_off_releases_every_key() {
        let mut manager = VoiceManager::new();
        let params = Params::default();
        manager.note_on(Z, 261.6, &params, 0.0);
        manager.note_on(X, 293.7, &params, 0.0);

        assert_eq!(manager.all_notes_off(params.release, 0.5), 2);
        assert_eq!(manager.active_count(), 0);
        assert_eq!(manager.draining_count(), 2);
        assert_eq!(manager.all_notes_off(params.release, 0.6), 0);
    }

    #[test]
    fn partial_count_change_does_not_resize_live_voices() {
        let mut manager = VoiceManager::new();
        let mut params = Params::default();
        manager.note_on(Z, 261.6, &params, 0.0);

        params.partial_volumes.resize(6).unwrap();
        manager.note_on(X, 293.7, &params, 0.1);

        assert_eq!(manager.voice(Z).map(Voice::partial_count), Some(3));
        assert_eq!(manager.voice(X).map(Voice::partial_count), Some(6));
    }
}
