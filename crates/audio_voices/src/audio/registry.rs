//! Voice registry
//!
//! Tracks every live voice, indexed by category. Each entry owns the
//! backend [`PlaybackHandle`] of its voice; removing an entry hands the
//! handle back to the caller, who must release it. Whichever path removes
//! an entry first (stop, expiry, replace, shutdown) gets the handle; the
//! others find nothing.

use crate::audio::backend::PlaybackHandle;
use crate::audio::error::AudioError;
use crate::audio::policy::{PlayDecision, PlaybackPolicy};
use crate::audio::voice::{Voice, VoiceCategory, VoiceId};
use slotmap::SlotMap;
use std::collections::BTreeMap;

/// Voice removed from the registry together with its resource
#[derive(Debug)]
pub struct RemovedVoice {
    /// Final state of the voice
    pub voice: Voice,
    /// Resource the caller must now release
    pub handle: PlaybackHandle,
}

/// Voice the registry refused to insert; the caller still owns the handle
#[derive(Debug)]
pub struct Rejected {
    /// Why the voice was refused
    pub error: AudioError,
    /// Resource the caller must release
    pub handle: PlaybackHandle,
}

#[derive(Debug)]
struct Entry {
    voice: Voice,
    handle: PlaybackHandle,
}

/// Category-indexed set of live voices
#[derive(Debug)]
pub struct VoiceRegistry {
    policy: PlaybackPolicy,
    voices: SlotMap<VoiceId, Entry>,
    by_category: BTreeMap<VoiceCategory, Vec<VoiceId>>,
}

impl VoiceRegistry {
    /// Create an empty registry governed by `policy`
    pub fn new(policy: PlaybackPolicy) -> Self {
        Self {
            policy,
            voices: SlotMap::with_key(),
            by_category: BTreeMap::new(),
        }
    }

    /// Policy the registry enforces
    pub fn policy(&self) -> &PlaybackPolicy {
        &self.policy
    }

    /// Insert a voice alongside whatever is live
    ///
    /// The voice's `id` is assigned here.
    ///
    /// # Errors
    /// `InvalidVoice` if the record is malformed.
    pub fn register(&mut self, voice: Voice, handle: PlaybackHandle) -> Result<VoiceId, Rejected> {
        if let Err(error) = voice.validate() {
            return Err(Rejected { error, handle });
        }
        Ok(self.insert(voice, handle))
    }

    /// Insert a voice, evicting incumbents when the category is exclusive
    ///
    /// Eviction and insertion happen in one step, so there is never a moment
    /// with two live voices in an exclusive category.
    ///
    /// # Errors
    /// `InvalidVoice` if the record is malformed; nothing is evicted.
    pub fn replace(&mut self, voice: Voice, handle: PlaybackHandle) -> Result<(VoiceId, Vec<RemovedVoice>), Rejected> {
        if let Err(error) = voice.validate() {
            return Err(Rejected { error, handle });
        }

        let evicted = match self.policy.on_play(voice.category) {
            PlayDecision::AllowConcurrent => Vec::new(),
            PlayDecision::ReplaceExisting => self.drain_category(voice.category),
        };
        let id = self.insert(voice, handle);
        Ok((id, evicted))
    }

    fn insert(&mut self, mut voice: Voice, handle: PlaybackHandle) -> VoiceId {
        let category = voice.category;
        let id = self.voices.insert_with_key(|id| {
            voice.id = id;
            Entry { voice, handle }
        });
        self.by_category.entry(category).or_default().push(id);
        id
    }

    /// Remove a voice; `None` if it is already gone
    pub fn unregister(&mut self, id: VoiceId) -> Option<RemovedVoice> {
        let entry = self.voices.remove(id)?;
        if let Some(ids) = self.by_category.get_mut(&entry.voice.category) {
            ids.retain(|other| *other != id);
        }
        Some(RemovedVoice {
            voice: entry.voice,
            handle: entry.handle,
        })
    }

    /// Remove every voice of a category
    pub fn drain_category(&mut self, category: VoiceCategory) -> Vec<RemovedVoice> {
        let ids = self.by_category.remove(&category).unwrap_or_default();
        ids.into_iter()
            .filter_map(|id| self.voices.remove(id))
            .map(|entry| RemovedVoice {
                voice: entry.voice,
                handle: entry.handle,
            })
            .collect()
    }

    /// Remove every voice
    pub fn drain_all(&mut self) -> Vec<RemovedVoice> {
        VoiceCategory::ALL
            .into_iter()
            .flat_map(|category| self.drain_category(category))
            .collect()
    }

    /// Remove every voice whose expiry has elapsed at `now`
    pub fn drain_expired(&mut self, now: f64) -> Vec<RemovedVoice> {
        let expired: Vec<VoiceId> = self
            .voices
            .iter()
            .filter(|(_, entry)| entry.voice.is_expired(now))
            .map(|(id, _)| id)
            .collect();

        expired.into_iter().filter_map(|id| self.unregister(id)).collect()
    }

    /// Snapshot of the live voices in a category, in start order
    pub fn active_voices(&self, category: VoiceCategory) -> Vec<Voice> {
        self.by_category
            .get(&category)
            .into_iter()
            .flatten()
            .filter_map(|id| self.voices.get(*id))
            .map(|entry| entry.voice.clone())
            .collect()
    }

    /// Look up a live voice
    pub fn get(&self, id: VoiceId) -> Option<&Voice> {
        self.voices.get(id).map(|entry| &entry.voice)
    }

    /// Backend handle of a live voice
    pub fn handle(&self, id: VoiceId) -> Option<&PlaybackHandle> {
        self.voices.get(id).map(|entry| &entry.handle)
    }

    /// Every live voice with its handle
    pub fn iter(&self) -> impl Iterator<Item = (&Voice, &PlaybackHandle)> {
        self.voices.values().map(|entry| (&entry.voice, &entry.handle))
    }

    /// Number of live voices in a category
    pub fn count(&self, category: VoiceCategory) -> usize {
        self.by_category.get(&category).map_or(0, Vec::len)
    }

    /// Total number of live voices
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    /// Check if no voice is live
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::voice::MixerTarget;

    fn effect(clip: &str, expire_at: Option<f64>) -> Voice {
        Voice::new(VoiceCategory::SoundEffect, clip, 0.5).with_timing(0.0, expire_at)
    }

    fn music(clip: &str) -> Voice {
        Voice::new(VoiceCategory::Music, clip, 0.0).with_looping(true)
    }

    #[test]
    fn test_register_assigns_id() {
        let mut registry = VoiceRegistry::new(PlaybackPolicy::default());
        let id = registry.register(effect("step", None), PlaybackHandle::new(1)).unwrap();

        let voice = registry.get(id).unwrap();
        assert_eq!(voice.id, id);
        assert_eq!(registry.count(VoiceCategory::SoundEffect), 1);
        assert_eq!(registry.handle(id).map(PlaybackHandle::raw), Some(1));
    }

    #[test]
    fn test_register_rejects_malformed_target() {
        let mut registry = VoiceRegistry::new(PlaybackPolicy::default());
        let voice = effect("step", None).with_mixer_target(Some(MixerTarget::new("")));

        let rejected = registry.register(voice, PlaybackHandle::new(9)).unwrap_err();
        assert!(matches!(rejected.error, AudioError::InvalidVoice(_)));
        assert_eq!(rejected.handle.raw(), 9);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let mut registry = VoiceRegistry::new(PlaybackPolicy::default());
        let id = registry.register(effect("step", None), PlaybackHandle::new(1)).unwrap();

        let removed = registry.unregister(id).unwrap();
        assert_eq!(removed.handle.raw(), 1);
        assert!(registry.unregister(id).is_none());
        assert_eq!(registry.count(VoiceCategory::SoundEffect), 0);
    }

    #[test]
    fn test_replace_evicts_exclusive_category() {
        let mut registry = VoiceRegistry::new(PlaybackPolicy::default());
        let (first, evicted) = registry.replace(music("theme_a"), PlaybackHandle::new(1)).unwrap();
        assert!(evicted.is_empty());

        let (second, evicted) = registry.replace(music("theme_b"), PlaybackHandle::new(2)).unwrap();
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].voice.id, first);
        assert_eq!(evicted[0].handle.raw(), 1);

        let live = registry.active_voices(VoiceCategory::Music);
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, second);
        assert_eq!(live[0].clip_id, "theme_b");
    }

    #[test]
    fn test_replace_keeps_concurrent_effects() {
        let mut registry = VoiceRegistry::new(PlaybackPolicy::default());
        for raw in 0..4 {
            let (_, evicted) = registry.replace(effect("step", None), PlaybackHandle::new(raw)).unwrap();
            assert!(evicted.is_empty());
        }
        assert_eq!(registry.count(VoiceCategory::SoundEffect), 4);
    }

    #[test]
    fn test_replace_only_touches_its_category() {
        let mut registry = VoiceRegistry::new(PlaybackPolicy::default());
        registry.replace(music("theme"), PlaybackHandle::new(1)).unwrap();
        registry.replace(effect("step", None), PlaybackHandle::new(2)).unwrap();

        let ambiance = Voice::new(VoiceCategory::Ambiance, "wind", 0.0).with_looping(true);
        let (_, evicted) = registry.replace(ambiance, PlaybackHandle::new(3)).unwrap();
        assert!(evicted.is_empty());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_failed_replace_evicts_nothing() {
        let mut registry = VoiceRegistry::new(PlaybackPolicy::default());
        registry.replace(music("theme"), PlaybackHandle::new(1)).unwrap();

        let bad = music("other").with_mixer_target(Some(MixerTarget::new(" ")));
        assert!(registry.replace(bad, PlaybackHandle::new(2)).is_err());
        assert_eq!(registry.active_voices(VoiceCategory::Music)[0].clip_id, "theme");
    }

    #[test]
    fn test_drain_expired() {
        let mut registry = VoiceRegistry::new(PlaybackPolicy::default());
        let short = registry.register(effect("short", Some(0.5)), PlaybackHandle::new(1)).unwrap();
        let long = registry.register(effect("long", Some(2.0)), PlaybackHandle::new(2)).unwrap();
        let endless = registry.register(effect("stream", None), PlaybackHandle::new(3)).unwrap();

        let expired = registry.drain_expired(1.0);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].voice.id, short);
        assert!(registry.get(long).is_some());
        assert!(registry.get(endless).is_some());

        let expired = registry.drain_expired(100.0);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].voice.id, long);
        assert!(registry.get(endless).is_some());
    }

    #[test]
    fn test_drain_all() {
        let mut registry = VoiceRegistry::new(PlaybackPolicy::default());
        registry.register(effect("step", None), PlaybackHandle::new(1)).unwrap();
        registry.replace(music("theme"), PlaybackHandle::new(2)).unwrap();

        let removed = registry.drain_all();
        assert_eq!(removed.len(), 2);
        assert!(registry.is_empty());
        assert_eq!(registry.count(VoiceCategory::Music), 0);
    }

    #[test]
    fn test_stale_id_never_aliases() {
        let mut registry = VoiceRegistry::new(PlaybackPolicy::default());
        let old = registry.register(effect("a", None), PlaybackHandle::new(1)).unwrap();
        registry.unregister(old).unwrap();
        let new = registry.register(effect("b", None), PlaybackHandle::new(2)).unwrap();

        assert_ne!(old, new);
        assert!(registry.get(old).is_none());
        assert!(registry.unregister(old).is_none());
        assert_eq!(registry.len(), 1);
    }
}
