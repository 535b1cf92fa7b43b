//! Headless backend
//!
//! Plays nothing. Keeps a record of every voice it is asked for, so servers,
//! demos and tests can run the full voice lifecycle without an audio device
//! and inspect what would have been heard.

use super::{PlaybackBackend, PlaybackHandle, VoiceParams};
use crate::audio::clip::{Clip, ClipResource};
use crate::audio::error::{AudioError, AudioResult};
use std::collections::HashMap;

/// Lifecycle event recorded by the headless backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// Voice prepared for a clip
    Acquired {
        /// Raw handle value
        handle: u64,
        /// Clip being played
        clip_id: String,
    },
    /// Voice made audible
    Started {
        /// Raw handle value
        handle: u64,
    },
    /// Voice freed
    Released {
        /// Raw handle value
        handle: u64,
    },
}

/// State of one simulated voice
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessVoice {
    /// Clip being played
    pub clip_id: String,
    /// Acquisition parameters
    pub params: VoiceParams,
    /// Whether `start` has been called
    pub started: bool,
    /// Last volume pushed by the manager
    pub volume: f32,
}

/// Backend that records instead of playing
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    voices: HashMap<u64, HeadlessVoice>,
    events: Vec<BackendEvent>,
    next_id: u64,
    refusing: bool,
}

impl HeadlessBackend {
    /// Create a new headless backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse (or stop refusing) every acquisition
    pub fn set_refusing(&mut self, refusing: bool) {
        self.refusing = refusing;
    }

    /// Number of voices acquired and not yet released
    pub fn live_count(&self) -> usize {
        self.voices.len()
    }

    /// Look up a live voice by raw handle
    pub fn voice(&self, raw: u64) -> Option<&HeadlessVoice> {
        self.voices.get(&raw)
    }

    /// Clip ids of all started voices
    pub fn audible_clips(&self) -> Vec<&str> {
        let mut clips: Vec<&str> = self
            .voices
            .values()
            .filter(|voice| voice.started)
            .map(|voice| voice.clip_id.as_str())
            .collect();
        clips.sort_unstable();
        clips
    }

    /// Every lifecycle event in order
    pub fn events(&self) -> &[BackendEvent] {
        &self.events
    }

    /// How many times `raw` was released
    pub fn release_count(&self, raw: u64) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, BackendEvent::Released { handle } if *handle == raw))
            .count()
    }

    /// Total acquisitions so far
    pub fn acquired_total(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, BackendEvent::Acquired { .. }))
            .count()
    }

    /// Total releases so far
    pub fn released_total(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, BackendEvent::Released { .. }))
            .count()
    }
}

impl PlaybackBackend for HeadlessBackend {
    type Clip = Clip;

    fn acquire_voice(&mut self, clip: &Clip, params: &VoiceParams) -> AudioResult<PlaybackHandle> {
        if self.refusing {
            return Err(AudioError::BackendRefused(format!("headless backend refusing '{}'", clip.id())));
        }
        if !clip.is_valid() {
            return Err(AudioError::MissingResource(format!("clip '{}' is not playable", clip.id())));
        }

        let raw = self.next_id;
        self.next_id += 1;

        self.voices.insert(
            raw,
            HeadlessVoice {
                clip_id: clip.id().to_string(),
                params: params.clone(),
                started: false,
                volume: params.volume,
            },
        );
        self.events.push(BackendEvent::Acquired {
            handle: raw,
            clip_id: clip.id().to_string(),
        });

        Ok(PlaybackHandle::new(raw))
    }

    fn start(&mut self, handle: &PlaybackHandle) {
        if let Some(voice) = self.voices.get_mut(&handle.raw()) {
            voice.started = true;
            self.events.push(BackendEvent::Started { handle: handle.raw() });
        }
    }

    fn release(&mut self, handle: PlaybackHandle) {
        if self.voices.remove(&handle.raw()).is_some() {
            self.events.push(BackendEvent::Released { handle: handle.raw() });
        }
    }

    fn is_playing(&self, handle: &PlaybackHandle) -> bool {
        self.voices.get(&handle.raw()).is_some_and(|voice| voice.started)
    }

    fn set_volume(&mut self, handle: &PlaybackHandle, volume: f32) {
        if let Some(voice) = self.voices.get_mut(&handle.raw()) {
            voice.volume = volume;
        }
    }
}
