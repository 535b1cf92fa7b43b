//! Audio mixer system
//!
//! Named mixer groups are the routing destinations voices play into. Each
//! group has a level (0.0 to 1.0) and a mute flag; the `master` group scales
//! every other group. Snapshot transitions drive group levels, mute stays a
//! user setting that snapshots never touch.

use crate::audio::error::{AudioError, AudioResult};
use crate::audio::voice::MixerTarget;
use std::collections::BTreeMap;

/// Name of the group every mixer has
pub const MASTER_GROUP: &str = "master";

#[derive(Debug, Clone, Copy, PartialEq)]
struct GroupState {
    level: f32,
    muted: bool,
}

impl Default for GroupState {
    fn default() -> Self {
        Self {
            level: 1.0,
            muted: false,
        }
    }
}

/// Audio mixer managing named groups
#[derive(Debug, Clone)]
pub struct MixerSystem {
    groups: BTreeMap<String, GroupState>,
}

impl MixerSystem {
    /// Create a mixer containing only the master group
    pub fn new() -> Self {
        let mut groups = BTreeMap::new();
        groups.insert(MASTER_GROUP.to_string(), GroupState::default());
        Self { groups }
    }

    /// Create a mixer with the given groups at the given levels
    pub fn with_groups<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = (S, f32)>,
        S: Into<String>,
    {
        let mut mixer = Self::new();
        for (name, level) in groups {
            mixer.add_group(name, level);
        }
        mixer
    }

    /// Add a group, or reset the level of an existing one
    pub fn add_group(&mut self, name: impl Into<String>, level: f32) {
        let state = self.groups.entry(name.into()).or_default();
        state.level = clamp_level(level);
    }

    /// Check if a group exists
    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    /// Check that a routing target names an existing group
    ///
    /// # Errors
    /// `MissingResource` if the group is unknown.
    pub fn resolve(&self, target: &MixerTarget) -> AudioResult<()> {
        if self.contains(target.group()) {
            Ok(())
        } else {
            Err(AudioError::MissingResource(format!("unknown mixer group '{target}'")))
        }
    }

    /// Set level for a group (clamped to 0.0 to 1.0)
    ///
    /// # Errors
    /// `MissingResource` if the group is unknown.
    pub fn set_level(&mut self, group: &str, level: f32) -> AudioResult<()> {
        let state = self
            .groups
            .get_mut(group)
            .ok_or_else(|| AudioError::MissingResource(format!("unknown mixer group '{group}'")))?;
        state.level = clamp_level(level);
        Ok(())
    }

    /// Get level for a group
    pub fn level(&self, group: &str) -> Option<f32> {
        self.groups.get(group).map(|state| state.level)
    }

    /// Current level of every group
    pub fn levels(&self) -> BTreeMap<String, f32> {
        self.groups
            .iter()
            .map(|(name, state)| (name.clone(), state.level))
            .collect()
    }

    /// Volume a voice routed to `target` should play at
    ///
    /// Considers the group's level and mute, then master's. `None` routes
    /// straight to master.
    pub fn effective_level(&self, target: Option<&MixerTarget>) -> f32 {
        let master = self.groups.get(MASTER_GROUP).copied().unwrap_or_default();
        if master.muted {
            return 0.0;
        }

        match target.map(MixerTarget::group) {
            None | Some(MASTER_GROUP) => master.level,
            Some(name) => match self.groups.get(name) {
                Some(state) if state.muted => 0.0,
                Some(state) => state.level * master.level,
                None => 0.0,
            },
        }
    }

    /// Mute a group
    pub fn mute(&mut self, group: &str) {
        if let Some(state) = self.groups.get_mut(group) {
            state.muted = true;
        }
    }

    /// Unmute a group
    pub fn unmute(&mut self, group: &str) {
        if let Some(state) = self.groups.get_mut(group) {
            state.muted = false;
        }
    }

    /// Check if a group is muted
    pub fn is_muted(&self, group: &str) -> bool {
        self.groups.get(group).is_some_and(|state| state.muted)
    }

    /// Toggle mute state for a group
    pub fn toggle_mute(&mut self, group: &str) {
        if let Some(state) = self.groups.get_mut(group) {
            state.muted = !state.muted;
        }
    }
}

impl Default for MixerSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_level(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn mixer() -> MixerSystem {
        MixerSystem::with_groups([("sfx", 1.0), ("music", 0.8)])
    }

    #[test]
    fn test_master_always_present() {
        let mixer = MixerSystem::new();
        assert!(mixer.contains(MASTER_GROUP));
        assert_eq!(mixer.level(MASTER_GROUP), Some(1.0));
    }

    #[test]
    fn test_level_clamping() {
        let mut mixer = mixer();
        mixer.set_level("sfx", 2.0).unwrap();
        assert_eq!(mixer.level("sfx"), Some(1.0));

        mixer.set_level("sfx", -0.5).unwrap();
        assert_eq!(mixer.level("sfx"), Some(0.0));

        mixer.set_level("sfx", f32::NAN).unwrap();
        assert_eq!(mixer.level("sfx"), Some(0.0));
    }

    #[test]
    fn test_unknown_group() {
        let mut mixer = mixer();
        assert!(matches!(mixer.set_level("vocal", 0.5), Err(AudioError::MissingResource(_))));
        assert!(mixer.resolve(&MixerTarget::new("vocal")).is_err());
        assert!(mixer.resolve(&MixerTarget::new("music")).is_ok());
    }

    #[test]
    fn test_effective_level_with_master() {
        let mut mixer = mixer();
        mixer.set_level(MASTER_GROUP, 0.5).unwrap();

        assert_relative_eq!(mixer.effective_level(Some(&MixerTarget::new("music"))), 0.4);
        assert_relative_eq!(mixer.effective_level(None), 0.5);
    }

    #[test]
    fn test_mute() {
        let mut mixer = mixer();
        let sfx = MixerTarget::new("sfx");

        mixer.mute("sfx");
        assert!(mixer.is_muted("sfx"));
        assert_eq!(mixer.effective_level(Some(&sfx)), 0.0);

        mixer.toggle_mute("sfx");
        assert_eq!(mixer.effective_level(Some(&sfx)), 1.0);

        mixer.mute(MASTER_GROUP);
        assert_eq!(mixer.effective_level(Some(&sfx)), 0.0);
        mixer.unmute(MASTER_GROUP);
        assert_eq!(mixer.effective_level(Some(&sfx)), 1.0);
    }

    #[test]
    fn test_levels_snapshot() {
        let levels = mixer().levels();
        assert_eq!(levels.len(), 3);
        assert_eq!(levels.get("music"), Some(&0.8));
    }
}
