//! Voice records
//!
//! A [`Voice`] describes one active playback instance. The playback resource
//! itself stays with the registry entry; `Voice` is the cloneable description
//! that snapshots and queries hand out.

use crate::audio::error::{AudioError, AudioResult};
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    /// Opaque voice identifier
    ///
    /// Generational: once a voice is gone its id never matches a later voice.
    pub struct VoiceId;
}

/// Playback intent class governing concurrency and looping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VoiceCategory {
    /// One-shot effects (footsteps, hits, pickups)
    SoundEffect,
    /// Environmental beds
    Ambiance,
    /// Background music
    Music,
}

impl VoiceCategory {
    /// Every category, in registry order
    pub const ALL: [Self; 3] = [Self::SoundEffect, Self::Ambiance, Self::Music];

    /// Short lowercase name used in logs and configuration
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SoundEffect => "sfx",
            Self::Ambiance => "ambiance",
            Self::Music => "music",
        }
    }
}

impl fmt::Display for VoiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routing destination for a voice: the name of a mixer group
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MixerTarget(String);

impl MixerTarget {
    /// Route to the named mixer group
    pub fn new(group: impl Into<String>) -> Self {
        Self(group.into())
    }

    /// Group name
    pub fn group(&self) -> &str {
        &self.0
    }

    /// A target is well-formed when it names something
    pub fn is_well_formed(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl fmt::Display for MixerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One active playback instance
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    /// Assigned by the registry on insertion
    pub id: VoiceId,
    /// Playback intent
    pub category: VoiceCategory,
    /// Identifier of the clip being played
    pub clip_id: String,
    /// Clip length; 0 means unknown/streaming
    pub clip_duration_seconds: f32,
    /// Playback speed multiplier
    pub pitch: f32,
    /// Whether playback repeats until stopped
    pub looping: bool,
    /// Mixer group, `None` routes straight to master
    pub mixer_target: Option<MixerTarget>,
    /// Clock time the voice was accepted
    pub started_at: f64,
    /// Clock time after which the expiry sweep removes the voice
    pub expire_at: Option<f64>,
}

impl Voice {
    /// Describe a voice that has not been registered yet
    pub fn new(category: VoiceCategory, clip_id: impl Into<String>, clip_duration_seconds: f32) -> Self {
        Self {
            id: VoiceId::default(),
            category,
            clip_id: clip_id.into(),
            clip_duration_seconds,
            pitch: 1.0,
            looping: false,
            mixer_target: None,
            started_at: 0.0,
            expire_at: None,
        }
    }

    /// Set looping
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Set pitch multiplier
    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    /// Set routing destination
    pub fn with_mixer_target(mut self, target: Option<MixerTarget>) -> Self {
        self.mixer_target = target;
        self
    }

    /// Set start time and expiry
    pub fn with_timing(mut self, started_at: f64, expire_at: Option<f64>) -> Self {
        self.started_at = started_at;
        self.expire_at = expire_at;
        self
    }

    /// Check the record is well-formed enough to register
    pub fn validate(&self) -> AudioResult<()> {
        if let Some(target) = &self.mixer_target {
            if !target.is_well_formed() {
                return Err(AudioError::InvalidVoice(format!(
                    "{} voice for '{}' has an empty mixer target",
                    self.category, self.clip_id
                )));
            }
        }

        if !self.clip_duration_seconds.is_finite() || self.clip_duration_seconds < 0.0 {
            return Err(AudioError::InvalidVoice(format!(
                "clip '{}' has invalid duration {}",
                self.clip_id, self.clip_duration_seconds
            )));
        }

        if !self.pitch.is_finite() || self.pitch <= 0.0 {
            return Err(AudioError::InvalidVoice(format!(
                "clip '{}' has invalid pitch {}",
                self.clip_id, self.pitch
            )));
        }

        match self.expire_at {
            Some(at) if !at.is_finite() => Err(AudioError::InvalidVoice(format!(
                "clip '{}' has non-finite expiry",
                self.clip_id
            ))),
            Some(_) if self.looping => Err(AudioError::InvalidVoice(format!(
                "looping clip '{}' cannot expire",
                self.clip_id
            ))),
            _ => Ok(()),
        }
    }

    /// Check if the voice's expiry has elapsed
    pub fn is_expired(&self, now: f64) -> bool {
        self.expire_at.is_some_and(|at| now >= at)
    }

    /// Remaining time before expiry, infinite for non-expiring voices
    pub fn remaining(&self, now: f64) -> f64 {
        self.expire_at.map_or(f64::INFINITY, |at| (at - now).max(0.0))
    }
}
