//! Mixer snapshot controller
//!
//! A snapshot is a named set of mixer group levels. Transitions interpolate
//! linearly from whatever the mixer currently sounds like to the target over
//! a duration, polled against the clock on every update.
//!
//! Each transition owns the groups its snapshot names. A new request takes
//! those groups over from the current interpolated levels (last write wins
//! per group); transitions over other groups carry on. Nothing is queued.

use crate::audio::error::{AudioError, AudioResult};
use crate::audio::mixer::MixerSystem;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Named target state of mixer group levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixerSnapshot {
    /// Snapshot name
    pub name: String,
    /// Target level per group; unlisted groups are left alone
    pub levels: BTreeMap<String, f32>,
}

impl MixerSnapshot {
    /// Create an empty snapshot
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            levels: BTreeMap::new(),
        }
    }

    /// Set target level for a group (builder pattern)
    pub fn with_level(mut self, group: impl Into<String>, level: f32) -> Self {
        self.levels.insert(group.into(), level.clamp(0.0, 1.0));
        self
    }
}

/// In-flight transition over the groups it still owns
#[derive(Debug, Clone)]
struct Transition {
    target: String,
    from: BTreeMap<String, f32>,
    to: BTreeMap<String, f32>,
    started_at: f64,
    duration: f64,
    /// False once a later transition took over some of its groups
    intact: bool,
}

impl Transition {
    fn progress(&self, now: f64) -> f64 {
        if self.duration <= 0.0 {
            1.0
        } else {
            ((now - self.started_at) / self.duration).clamp(0.0, 1.0)
        }
    }

    /// Hand `groups` over to a newer transition
    fn yield_groups<'a>(&mut self, groups: impl Iterator<Item = &'a String>) {
        for group in groups {
            if self.to.remove(group).is_some() {
                self.from.remove(group);
                self.intact = false;
            }
        }
    }
}

/// Drives timed transitions between named snapshots
///
/// A transition is scoped to the groups its snapshot names. Transitions over
/// disjoint groups run side by side, each at its own pace; a new one takes
/// over only the groups it names from whatever was moving them.
#[derive(Debug, Default)]
pub struct SnapshotController {
    snapshots: HashMap<String, MixerSnapshot>,
    settled: Option<String>,
    transitions: Vec<Transition>,
}

impl SnapshotController {
    /// Create a controller with no snapshots
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a snapshot
    pub fn register(&mut self, snapshot: MixerSnapshot) {
        self.snapshots.insert(snapshot.name.clone(), snapshot);
    }

    /// Check if a snapshot is registered
    pub fn contains(&self, name: &str) -> bool {
        self.snapshots.contains_key(name)
    }

    /// Snapshot that most recently reached all of its levels
    pub fn current(&self) -> Option<&str> {
        self.settled.as_deref()
    }

    /// Latest snapshot being moved towards, or the settled one when idle
    pub fn target(&self) -> Option<&str> {
        self.transitions
            .last()
            .map(|t| t.target.as_str())
            .or(self.settled.as_deref())
    }

    /// Check if any transition is in flight
    pub fn is_transitioning(&self) -> bool {
        !self.transitions.is_empty()
    }

    /// Progress of the latest in-flight transition (0.0 to 1.0)
    pub fn progress(&self, now: f64) -> Option<f64> {
        self.transitions.last().map(|t| t.progress(now))
    }

    /// Start moving the snapshot's groups towards `name`
    ///
    /// In-flight transitions are first advanced to `now`, so the new one
    /// starts from the levels currently audible. Groups the snapshot names are
    /// taken from any older transition; its other groups keep moving.
    ///
    /// # Errors
    /// - `InvalidParameter` if the duration is negative or not finite
    /// - `MissingResource` if the snapshot, or a group it names, is unknown
    pub fn transition_to(
        &mut self,
        name: &str,
        duration_seconds: f32,
        now: f64,
        mixer: &mut MixerSystem,
    ) -> AudioResult<()> {
        if !duration_seconds.is_finite() || duration_seconds < 0.0 {
            return Err(AudioError::InvalidParameter(format!(
                "snapshot transition duration must be >= 0, got {duration_seconds}"
            )));
        }

        let snapshot = self
            .snapshots
            .get(name)
            .ok_or_else(|| AudioError::MissingResource(format!("unknown mixer snapshot '{name}'")))?;

        if let Some(group) = snapshot.levels.keys().find(|group| !mixer.contains(group)) {
            return Err(AudioError::MissingResource(format!(
                "snapshot '{name}' targets unknown mixer group '{group}'"
            )));
        }

        let to = snapshot.levels.clone();
        self.update(now, mixer);

        for transition in &mut self.transitions {
            transition.yield_groups(to.keys());
        }
        self.transitions.retain(|transition| {
            let keep = !transition.to.is_empty();
            if !keep {
                log::debug!("Retargeting snapshot transition '{}' -> '{name}'", transition.target);
            }
            keep
        });

        let from = to
            .keys()
            .filter_map(|group| mixer.level(group).map(|level| (group.clone(), level)))
            .collect();

        self.transitions.push(Transition {
            target: name.to_string(),
            from,
            to,
            started_at: now,
            duration: f64::from(duration_seconds),
            intact: true,
        });

        // Zero-length transitions land immediately
        self.update(now, mixer);
        Ok(())
    }

    /// Advance every in-flight transition and write levels into the mixer
    ///
    /// Returns `true` if any level was written.
    pub fn update(&mut self, now: f64, mixer: &mut MixerSystem) -> bool {
        if self.transitions.is_empty() {
            return false;
        }

        for transition in &self.transitions {
            let t = transition.progress(now);
            for (group, target_level) in &transition.to {
                let start = transition.from.get(group).copied().unwrap_or(*target_level);
                #[allow(clippy::cast_possible_truncation)]
                let level = start + (target_level - start) * t as f32;
                if let Err(e) = mixer.set_level(group, level) {
                    log::warn!("Snapshot '{}' could not set level: {e}", transition.target);
                }
            }
        }

        let (finished, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.transitions)
            .into_iter()
            .partition(|transition| transition.progress(now) >= 1.0);
        self.transitions = running;

        for transition in finished {
            if transition.intact {
                log::debug!("Mixer settled at snapshot '{}'", transition.target);
                self.settled = Some(transition.target);
            } else {
                log::debug!("Snapshot '{}' finished its remaining groups", transition.target);
            }
        }

        true
    }
}
