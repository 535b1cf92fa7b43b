//! # Audio Voice Manager
//!
//! Single entry point for transient playback. Owns the registry, the mixer,
//! the snapshot controller and the backend behind one lock, so a replace, a
//! stop and the expiry sweep never interleave.
//!
//! ```
//! use audio_voices::audio::backend::headless::HeadlessBackend;
//! use audio_voices::audio::{AudioConfig, AudioVoiceManager, Clip, MixerTarget, VoiceCategory};
//!
//! let manager = AudioVoiceManager::new(HeadlessBackend::new(), AudioConfig::default()).unwrap();
//! let wind = Clip::new("wind", 0.0);
//! manager.play_loop(VoiceCategory::Ambiance, &wind, Some(MixerTarget::new("ambiance"))).unwrap();
//! assert_eq!(manager.active_voices(VoiceCategory::Ambiance).len(), 1);
//! ```

use crate::audio::backend::{PlaybackBackend, VoiceParams};
use crate::audio::clip::{ClipBank, ClipResource};
use crate::audio::config::{AudioConfig, PitchRange};
use crate::audio::error::{AudioError, AudioResult};
use crate::audio::mixer::MixerSystem;
use crate::audio::registry::{Rejected, RemovedVoice, VoiceRegistry};
use crate::audio::snapshot::{MixerSnapshot, SnapshotController};
use crate::audio::voice::{MixerTarget, Voice, VoiceCategory, VoiceId};
use crate::foundation::time::{Clock, MonotonicClock};
use parking_lot::Mutex;
use rand::Rng;
use std::sync::Arc;

/// What to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopTarget {
    /// Every voice of a category
    Category(VoiceCategory),
    /// One voice
    Voice(VoiceId),
}

/// General play request
///
/// `looping` left unset falls back to the category's default.
#[derive(Debug, Clone)]
pub struct PlayRequest<'a, C> {
    /// Category to play in
    pub category: VoiceCategory,
    /// Clip to play
    pub clip: &'a C,
    /// Playback speed multiplier
    pub pitch: f32,
    /// Loop override
    pub looping: Option<bool>,
    /// Routing destination; `None` routes to master
    pub mixer_target: Option<MixerTarget>,
}

impl<'a, C> PlayRequest<'a, C> {
    /// Request `clip` in `category` at normal pitch
    pub fn new(category: VoiceCategory, clip: &'a C) -> Self {
        Self {
            category,
            clip,
            pitch: 1.0,
            looping: None,
            mixer_target: None,
        }
    }

    /// Set pitch
    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    /// Override looping
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = Some(looping);
        self
    }

    /// Set routing destination
    pub fn with_mixer_target(mut self, target: Option<MixerTarget>) -> Self {
        self.mixer_target = target;
        self
    }
}

struct State<B: PlaybackBackend> {
    backend: B,
    registry: VoiceRegistry,
    mixer: MixerSystem,
    snapshots: SnapshotController,
    pitch_range: PitchRange,
    available: bool,
}

impl<B: PlaybackBackend> State<B> {
    fn release_all(&mut self, removed: Vec<RemovedVoice>, reason: &str) -> usize {
        let count = removed.len();
        for RemovedVoice { voice, handle } in removed {
            log::debug!("Releasing {} voice '{}' ({reason})", voice.category, voice.clip_id);
            self.backend.release(handle);
        }
        count
    }

    fn push_volumes(&mut self) {
        for (voice, handle) in self.registry.iter() {
            let volume = self.mixer.effective_level(voice.mixer_target.as_ref());
            self.backend.set_volume(handle, volume);
        }
    }
}

/// Policy-driven owner of every transient voice
pub struct AudioVoiceManager<B: PlaybackBackend> {
    state: Mutex<State<B>>,
    clock: Arc<dyn Clock>,
}

impl<B: PlaybackBackend> AudioVoiceManager<B> {
    /// Create a manager on the wall clock
    ///
    /// # Errors
    /// `InvalidParameter` if the configuration does not validate.
    pub fn new(backend: B, config: AudioConfig) -> AudioResult<Self> {
        Self::with_clock(backend, config, MonotonicClock::new())
    }

    /// Create a manager reading time from `clock`
    ///
    /// # Errors
    /// `InvalidParameter` if the configuration does not validate.
    pub fn with_clock(backend: B, config: AudioConfig, clock: impl Clock + 'static) -> AudioResult<Self> {
        config
            .validate()
            .map_err(|e| AudioError::InvalidParameter(format!("invalid audio configuration: {e}")))?;

        let mut snapshots = SnapshotController::new();
        for snapshot in &config.snapshots {
            snapshots.register(MixerSnapshot::from(snapshot));
        }

        log::info!(
            "Audio voice manager initialized with {} mixer groups and {} snapshots",
            config.mixer_groups.len(),
            config.snapshots.len()
        );

        Ok(Self {
            state: Mutex::new(State {
                backend,
                registry: VoiceRegistry::new(config.policy),
                mixer: config.build_mixer(),
                snapshots,
                pitch_range: config.pitch,
                available: true,
            }),
            clock: Arc::new(clock),
        })
    }

    /// Current time on the manager clock
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Play a clip according to the category policy
    ///
    /// In exclusive categories the incumbent is released before the new voice
    /// is started. On any error nothing changes.
    ///
    /// # Errors
    /// - `ManagerUnavailable` after shutdown
    /// - `InvalidParameter` for a pitch that is not finite and positive
    /// - `MissingResource` for an unplayable clip or unknown mixer group
    /// - `InvalidVoice` for a malformed voice, such as an empty mixer target
    /// - `BackendRefused` if the backend cannot provide a voice
    pub fn play(&self, request: PlayRequest<'_, B::Clip>) -> AudioResult<VoiceId> {
        let now = self.clock.now();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if !state.available {
            return Err(AudioError::ManagerUnavailable);
        }

        let PlayRequest {
            category,
            clip,
            pitch,
            looping,
            mixer_target,
        } = request;

        if !pitch.is_finite() || pitch <= 0.0 {
            return Err(AudioError::InvalidParameter(format!("pitch must be finite and > 0, got {pitch}")));
        }
        let clamped = state.pitch_range.clamp(pitch);
        if (clamped - pitch).abs() > f32::EPSILON {
            log::warn!("Pitch {pitch} for '{}' clamped to {clamped}", clip.id());
        }

        if !clip.is_valid() {
            return Err(AudioError::MissingResource(format!("clip '{}' is not playable", clip.id())));
        }

        let policy = state.registry.policy();
        let looping = looping.unwrap_or_else(|| policy.default_loop(category));
        let duration = clip.duration_seconds();
        let expire_at = policy.expiry(category, looping, duration, now);

        let voice = Voice::new(category, clip.id(), duration)
            .with_looping(looping)
            .with_pitch(clamped)
            .with_mixer_target(mixer_target)
            .with_timing(now, expire_at);
        voice.validate()?;
        if let Some(target) = &voice.mixer_target {
            state.mixer.resolve(target)?;
        }

        let params = VoiceParams {
            category,
            looping,
            pitch: clamped,
            volume: state.mixer.effective_level(voice.mixer_target.as_ref()),
            mixer_target: voice.mixer_target.clone(),
        };
        let handle = state.backend.acquire_voice(clip, &params).map_err(|e| {
            if matches!(e, AudioError::BackendRefused(_)) {
                log::warn!("Backend refused '{}': {e}", clip.id());
            }
            e
        })?;

        let (id, evicted) = match state.registry.replace(voice, handle) {
            Ok(inserted) => inserted,
            Err(Rejected { error, handle }) => {
                state.backend.release(handle);
                return Err(error);
            }
        };
        state.release_all(evicted, "replaced");

        if let Some(handle) = state.registry.handle(id) {
            state.backend.start(handle);
        }
        log::debug!("Playing {category} voice '{}' (loop: {looping}, pitch: {clamped})", clip.id());
        Ok(id)
    }

    /// Fire a one-shot effect that expires at the end of the clip
    ///
    /// # Errors
    /// As [`Self::play`].
    pub fn play_effect(&self, clip: &B::Clip, pitch: f32, mixer_target: Option<MixerTarget>) -> AudioResult<VoiceId> {
        self.play(
            PlayRequest::new(VoiceCategory::SoundEffect, clip)
                .with_pitch(pitch)
                .with_looping(false)
                .with_mixer_target(mixer_target),
        )
    }

    /// Start a looping bed, replacing the category's incumbent
    ///
    /// # Errors
    /// `InvalidParameter` for `SoundEffect`, otherwise as [`Self::play`].
    pub fn play_loop(
        &self,
        category: VoiceCategory,
        clip: &B::Clip,
        mixer_target: Option<MixerTarget>,
    ) -> AudioResult<VoiceId> {
        if category == VoiceCategory::SoundEffect {
            return Err(AudioError::InvalidParameter(
                "looping playback requires the ambiance or music category".to_string(),
            ));
        }
        self.play(
            PlayRequest::new(category, clip)
                .with_looping(true)
                .with_mixer_target(mixer_target),
        )
    }

    /// Play a random variation from a bank set at a jittered pitch
    ///
    /// # Errors
    /// `MissingResource` if the set is unknown or empty, otherwise as
    /// [`Self::play_effect`].
    pub fn play_from_bank<R: Rng + ?Sized>(
        &self,
        bank: &ClipBank<B::Clip>,
        set_name: &str,
        mixer_target: Option<MixerTarget>,
        rng: &mut R,
    ) -> AudioResult<VoiceId> {
        let (clip, pitch) = bank.pick(set_name, rng)?;
        self.play_effect(clip, pitch, mixer_target)
    }

    /// Stop a voice or a whole category
    ///
    /// Stopping something that is not playing is a no-op, also after
    /// shutdown. Returns how many voices were released.
    pub fn stop(&self, target: StopTarget) -> usize {
        let mut state = self.state.lock();
        let removed = match target {
            StopTarget::Category(category) => state.registry.drain_category(category),
            StopTarget::Voice(id) => state.registry.unregister(id).into_iter().collect(),
        };
        state.release_all(removed, "stopped")
    }

    /// Move the mixer towards a named snapshot
    ///
    /// Returns immediately. A transition requested while another is in flight
    /// retargets it from the levels audible right now.
    ///
    /// # Errors
    /// - `ManagerUnavailable` after shutdown
    /// - `MissingResource` for an unknown snapshot
    /// - `InvalidParameter` for a negative or non-finite duration
    pub fn transition_snapshot(&self, name: &str, duration_seconds: f32) -> AudioResult<()> {
        let now = self.clock.now();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if !state.available {
            return Err(AudioError::ManagerUnavailable);
        }

        state
            .snapshots
            .transition_to(name, duration_seconds, now, &mut state.mixer)?;
        log::debug!("Transitioning to snapshot '{name}' over {duration_seconds}s");
        state.push_volumes();
        Ok(())
    }

    /// Per-tick pass
    ///
    /// Releases expired voices, advances the snapshot transition and pushes
    /// effective volumes to every live voice. Returns how many voices expired.
    pub fn update(&self) -> usize {
        let now = self.clock.now();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if !state.available {
            return 0;
        }

        let expired = state.registry.drain_expired(now);
        let count = state.release_all(expired, "expired");
        state.snapshots.update(now, &mut state.mixer);
        state.push_volumes();
        count
    }

    /// Set a mixer group level
    ///
    /// # Errors
    /// `MissingResource` for an unknown group.
    pub fn set_group_level(&self, group: &str, level: f32) -> AudioResult<()> {
        let mut state = self.state.lock();
        state.mixer.set_level(group, level)?;
        state.push_volumes();
        Ok(())
    }

    /// Mute or unmute a mixer group
    ///
    /// # Errors
    /// `MissingResource` for an unknown group.
    pub fn set_group_muted(&self, group: &str, muted: bool) -> AudioResult<()> {
        let mut state = self.state.lock();
        if !state.mixer.contains(group) {
            return Err(AudioError::MissingResource(format!("unknown mixer group '{group}'")));
        }
        if muted {
            state.mixer.mute(group);
        } else {
            state.mixer.unmute(group);
        }
        state.push_volumes();
        Ok(())
    }

    /// Live voices of a category, in start order
    pub fn active_voices(&self, category: VoiceCategory) -> Vec<Voice> {
        self.state.lock().registry.active_voices(category)
    }

    /// Look up a live voice
    pub fn voice(&self, id: VoiceId) -> Option<Voice> {
        self.state.lock().registry.get(id).cloned()
    }

    /// Check if a voice is live and audible
    pub fn is_playing(&self, id: VoiceId) -> bool {
        let state = self.state.lock();
        state
            .registry
            .handle(id)
            .is_some_and(|handle| state.backend.is_playing(handle))
    }

    /// Number of live voices across all categories
    pub fn live_count(&self) -> usize {
        self.state.lock().registry.len()
    }

    /// Snapshot the mixer last settled at
    pub fn current_snapshot(&self) -> Option<String> {
        self.state.lock().snapshots.current().map(str::to_string)
    }

    /// Current level of a mixer group
    pub fn mixer_level(&self, group: &str) -> Option<f32> {
        self.state.lock().mixer.level(group)
    }

    /// Check if the manager still accepts requests
    pub fn is_available(&self) -> bool {
        self.state.lock().available
    }

    /// Run `f` against the backend
    pub fn with_backend<R>(&self, f: impl FnOnce(&B) -> R) -> R {
        f(&self.state.lock().backend)
    }

    /// Run `f` against the backend mutably, for device-level settings
    pub fn with_backend_mut<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        f(&mut self.state.lock().backend)
    }

    /// Release every voice and refuse further play requests
    ///
    /// Calling it again is a no-op.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        if !state.available {
            return;
        }
        state.available = false;

        let removed = state.registry.drain_all();
        let count = state.release_all(removed, "shutdown");
        state.backend.shutdown();
        log::info!("Audio voice manager shut down, released {count} voices");
    }
}

impl<B: PlaybackBackend> Drop for AudioVoiceManager<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
