//! # Audio Configuration
//!
//! Everything the voice manager reads at startup: category policy, the sane
//! pitch range, mixer groups and named snapshots. Loaded through
//! [`Config::load_from_file`] from TOML or RON.
//!
//! ```toml
//! log_level = "info"
//!
//! [pitch]
//! min = 0.1
//! max = 3.0
//!
//! [[mixer_groups]]
//! name = "music"
//! level = 1.0
//!
//! [[snapshots]]
//! name = "lowHealth"
//! [snapshots.levels]
//! music = 0.3
//! ```

use crate::audio::mixer::{MixerSystem, MASTER_GROUP};
use crate::audio::policy::PlaybackPolicy;
use crate::audio::snapshot::MixerSnapshot;
use crate::config::{Config, ConfigError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Accepted pitch multipliers
///
/// Requests at or below zero are rejected; anything else is clamped into
/// `min..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchRange {
    /// Lowest playable multiplier
    pub min: f32,
    /// Highest playable multiplier
    pub max: f32,
}

impl PitchRange {
    /// Clamp a pitch into the range
    pub fn clamp(&self, pitch: f32) -> f32 {
        pitch.clamp(self.min, self.max)
    }
}

impl Default for PitchRange {
    fn default() -> Self {
        Self { min: 0.1, max: 3.0 }
    }
}

/// One mixer group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixerGroupConfig {
    /// Group name used as a routing target
    pub name: String,
    /// Starting level (0.0 to 1.0)
    #[serde(default = "default_level")]
    pub level: f32,
}

fn default_level() -> f32 {
    1.0
}

/// One named snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Snapshot name
    pub name: String,
    /// Target level per group
    #[serde(default)]
    pub levels: BTreeMap<String, f32>,
}

impl From<&SnapshotConfig> for MixerSnapshot {
    fn from(config: &SnapshotConfig) -> Self {
        config
            .levels
            .iter()
            .fold(Self::new(config.name.clone()), |snapshot, (group, level)| {
                snapshot.with_level(group.clone(), *level)
            })
    }
}

/// Complete voice manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Log filter used by hosts that initialise logging from config
    pub log_level: String,
    /// Accepted pitch range
    pub pitch: PitchRange,
    /// Category decision table
    pub policy: PlaybackPolicy,
    /// Mixer groups besides master
    pub mixer_groups: Vec<MixerGroupConfig>,
    /// Named snapshots
    pub snapshots: Vec<SnapshotConfig>,
}

impl AudioConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            pitch: PitchRange::default(),
            policy: PlaybackPolicy::default(),
            mixer_groups: ["sfx", "ambiance", "music", "vocal"]
                .into_iter()
                .map(|name| MixerGroupConfig {
                    name: name.to_string(),
                    level: 1.0,
                })
                .collect(),
            snapshots: Vec::new(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set accepted pitch range
    pub fn with_pitch_range(mut self, min: f32, max: f32) -> Self {
        self.pitch = PitchRange { min, max };
        self
    }

    /// Replace the category policy
    pub fn with_policy(mut self, policy: PlaybackPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Add a mixer group
    pub fn with_mixer_group(mut self, name: impl Into<String>, level: f32) -> Self {
        self.mixer_groups.push(MixerGroupConfig {
            name: name.into(),
            level,
        });
        self
    }

    /// Add a snapshot
    pub fn with_snapshot(mut self, snapshot: &MixerSnapshot) -> Self {
        self.snapshots.push(SnapshotConfig {
            name: snapshot.name.clone(),
            levels: snapshot.levels.clone(),
        });
        self
    }

    /// Build the mixer described by this configuration
    pub fn build_mixer(&self) -> MixerSystem {
        MixerSystem::with_groups(self.mixer_groups.iter().map(|g| (g.name.clone(), g.level)))
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// `ConfigError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let PitchRange { min, max } = self.pitch;
        if !(min.is_finite() && max.is_finite()) || min <= 0.0 || min > max {
            return Err(ConfigError::Invalid(format!(
                "pitch range must satisfy 0 < min <= max, got {min}..={max}"
            )));
        }

        let mut groups: HashSet<&str> = HashSet::from([MASTER_GROUP]);
        for group in &self.mixer_groups {
            if group.name.trim().is_empty() {
                return Err(ConfigError::Invalid("mixer group with empty name".to_string()));
            }
            if group.name != MASTER_GROUP && !groups.insert(group.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate mixer group '{}'", group.name)));
            }
        }

        let mut names = HashSet::new();
        for snapshot in &self.snapshots {
            if !names.insert(snapshot.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate snapshot '{}'", snapshot.name)));
            }
            if let Some(group) = snapshot.levels.keys().find(|g| !groups.contains(g.as_str())) {
                return Err(ConfigError::Invalid(format!(
                    "snapshot '{}' targets unknown mixer group '{group}'",
                    snapshot.name
                )));
            }
        }

        Ok(())
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for AudioConfig {}
