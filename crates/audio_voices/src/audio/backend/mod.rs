//! Audio backend implementations
//!
//! Platform-independent abstraction over whatever actually makes sound. The
//! voice manager only sequences calls against this trait; it never touches
//! audio hardware itself.
//!
//! Playback is two-phase: `acquire_voice` prepares a silent voice and
//! `start` makes it audible. That lets the manager validate everything and
//! release evicted voices before the new one is heard.

pub mod headless;
#[cfg(feature = "rodio")]
pub mod rodio_backend;

use crate::audio::clip::ClipResource;
use crate::audio::error::AudioResult;
use crate::audio::voice::{MixerTarget, VoiceCategory};

/// Owned token for one backend playback resource
///
/// Not `Clone`: releasing consumes the handle, so each resource is released
/// exactly once.
#[derive(Debug, PartialEq, Eq, Hash)]
#[must_use = "dropping a PlaybackHandle without releasing it leaks the backend voice"]
pub struct PlaybackHandle {
    raw: u64,
}

impl PlaybackHandle {
    /// Wrap a backend-specific identifier
    pub fn new(raw: u64) -> Self {
        Self { raw }
    }

    /// Backend-specific identifier
    pub fn raw(&self) -> u64 {
        self.raw
    }
}

/// Parameters of a voice being acquired
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceParams {
    /// Category the voice plays in
    pub category: VoiceCategory,
    /// Repeat until released
    pub looping: bool,
    /// Playback speed multiplier
    pub pitch: f32,
    /// Initial volume (mixer effective level)
    pub volume: f32,
    /// Routing destination
    pub mixer_target: Option<MixerTarget>,
}

/// Playback backend trait for platform abstraction
pub trait PlaybackBackend {
    /// Clip type this backend can play
    type Clip: ClipResource;

    /// Prepare a voice for `clip`, silent until [`Self::start`]
    ///
    /// # Errors
    /// `BackendRefused` (or another [`crate::audio::AudioError`]) if no voice
    /// can be prepared. Nothing is retained on failure.
    fn acquire_voice(&mut self, clip: &Self::Clip, params: &VoiceParams) -> AudioResult<PlaybackHandle>;

    /// Make a prepared voice audible
    fn start(&mut self, handle: &PlaybackHandle);

    /// Stop and free a voice
    fn release(&mut self, handle: PlaybackHandle);

    /// Check if a voice is currently producing sound
    fn is_playing(&self, handle: &PlaybackHandle) -> bool;

    /// Set volume of a voice (0.0 = silent, 1.0 = full)
    fn set_volume(&mut self, _handle: &PlaybackHandle, _volume: f32) {}

    /// Release any resources held by the backend itself
    fn shutdown(&mut self) {}
}
