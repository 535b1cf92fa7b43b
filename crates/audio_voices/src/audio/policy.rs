//! Playback policy
//!
//! Pure decision table: which categories may overlap, which loop by default
//! and when a voice expires. The manager consults it and never hard-codes
//! category behavior itself.

use crate::audio::voice::VoiceCategory;
use serde::{Deserialize, Serialize};

/// How a new voice coexists with live voices of its category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Concurrency {
    /// Any number of simultaneous voices
    Unbounded,
    /// At most one; a new voice evicts the incumbent
    Exclusive,
}

/// What the registry should do when a voice of a category is played
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayDecision {
    /// Insert alongside whatever is playing
    AllowConcurrent,
    /// Evict every live voice of the category, then insert
    ReplaceExisting,
}

/// Per-category behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Overlap behavior
    pub concurrency: Concurrency,
    /// Whether a non-looping voice is removed at clip end
    pub auto_expire: bool,
    /// Looping used when the caller does not say
    pub default_loop: bool,
}

impl CategoryRule {
    /// Built-in rule for a category
    pub const fn default_for(category: VoiceCategory) -> Self {
        match category {
            VoiceCategory::SoundEffect => Self {
                concurrency: Concurrency::Unbounded,
                auto_expire: true,
                default_loop: false,
            },
            VoiceCategory::Ambiance | VoiceCategory::Music => Self {
                concurrency: Concurrency::Exclusive,
                auto_expire: true,
                default_loop: true,
            },
        }
    }
}

/// Category decision table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackPolicy {
    /// Rule for sound effects
    pub sound_effect: CategoryRule,
    /// Rule for ambiance beds
    pub ambiance: CategoryRule,
    /// Rule for music
    pub music: CategoryRule,
}

impl Default for PlaybackPolicy {
    fn default() -> Self {
        Self {
            sound_effect: CategoryRule::default_for(VoiceCategory::SoundEffect),
            ambiance: CategoryRule::default_for(VoiceCategory::Ambiance),
            music: CategoryRule::default_for(VoiceCategory::Music),
        }
    }
}

impl PlaybackPolicy {
    /// Rule governing a category
    pub const fn rule(&self, category: VoiceCategory) -> &CategoryRule {
        match category {
            VoiceCategory::SoundEffect => &self.sound_effect,
            VoiceCategory::Ambiance => &self.ambiance,
            VoiceCategory::Music => &self.music,
        }
    }

    /// Override the rule for one category
    pub fn with_rule(mut self, category: VoiceCategory, rule: CategoryRule) -> Self {
        match category {
            VoiceCategory::SoundEffect => self.sound_effect = rule,
            VoiceCategory::Ambiance => self.ambiance = rule,
            VoiceCategory::Music => self.music = rule,
        }
        self
    }

    /// Decide how a new voice of `category` enters the registry
    pub const fn on_play(&self, category: VoiceCategory) -> PlayDecision {
        match self.rule(category).concurrency {
            Concurrency::Unbounded => PlayDecision::AllowConcurrent,
            Concurrency::Exclusive => PlayDecision::ReplaceExisting,
        }
    }

    /// Whether `category` loops unless told otherwise
    pub const fn default_loop(&self, category: VoiceCategory) -> bool {
        self.rule(category).default_loop
    }

    /// Expiry time for a voice started at `now`
    ///
    /// Looping voices never expire. A zero duration means the length is
    /// unknown (streamed source), so the voice lives until stopped rather
    /// than being dropped instantly.
    ///
    /// Expiry uses the clip's nominal length whatever the pitch. A backend
    /// that plays faster than 1.0 finishes early and stays silent until then;
    /// slower playback is cut off at `now + duration`.
    pub fn expiry(&self, category: VoiceCategory, looping: bool, duration_seconds: f32, now: f64) -> Option<f64> {
        if looping || !self.rule(category).auto_expire {
            return None;
        }
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            return None;
        }
        Some(now + f64::from(duration_seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let policy = PlaybackPolicy::default();
        assert_eq!(policy.on_play(VoiceCategory::SoundEffect), PlayDecision::AllowConcurrent);
        assert_eq!(policy.on_play(VoiceCategory::Ambiance), PlayDecision::ReplaceExisting);
        assert_eq!(policy.on_play(VoiceCategory::Music), PlayDecision::ReplaceExisting);

        assert!(!policy.default_loop(VoiceCategory::SoundEffect));
        assert!(policy.default_loop(VoiceCategory::Ambiance));
        assert!(policy.default_loop(VoiceCategory::Music));
    }

    #[test]
    fn test_effect_expires_at_clip_end() {
        let policy = PlaybackPolicy::default();
        assert_eq!(policy.expiry(VoiceCategory::SoundEffect, false, 0.5, 10.0), Some(10.5));
    }

    #[test]
    fn test_looping_never_expires() {
        let policy = PlaybackPolicy::default();
        assert_eq!(policy.expiry(VoiceCategory::Music, true, 120.0, 0.0), None);
        assert_eq!(policy.expiry(VoiceCategory::SoundEffect, true, 1.0, 0.0), None);
    }

    #[test]
    fn test_non_looping_bed_expires() {
        let policy = PlaybackPolicy::default();
        assert_eq!(policy.expiry(VoiceCategory::Ambiance, false, 4.0, 1.0), Some(5.0));
    }

    #[test]
    fn test_zero_duration_is_non_expiring() {
        let policy = PlaybackPolicy::default();
        assert_eq!(policy.expiry(VoiceCategory::SoundEffect, false, 0.0, 3.0), None);
    }

    #[test]
    fn test_overridden_rule() {
        let policy = PlaybackPolicy::default().with_rule(
            VoiceCategory::Ambiance,
            CategoryRule {
                concurrency: Concurrency::Unbounded,
                auto_expire: false,
                default_loop: true,
            },
        );
        assert_eq!(policy.on_play(VoiceCategory::Ambiance), PlayDecision::AllowConcurrent);
        assert_eq!(policy.expiry(VoiceCategory::Ambiance, false, 4.0, 0.0), None);
        assert_eq!(policy.on_play(VoiceCategory::Music), PlayDecision::ReplaceExisting);
    }
}
