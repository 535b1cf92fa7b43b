//! # Audio
//!
//! Policy-driven voice management for transient game audio: one-shot
//! effects, looping ambiance and music beds, and mixer snapshot transitions.
//!
//! [`AudioVoiceManager`] is the only type most hosts touch. It sequences
//! calls against a [`PlaybackBackend`] and guarantees every voice it starts
//! is released exactly once.

pub mod backend;
pub mod clip;
pub mod config;
pub mod error;
pub mod manager;
pub mod mixer;
pub mod policy;
pub mod registry;
pub mod snapshot;
pub mod voice;

pub use backend::{PlaybackBackend, PlaybackHandle, VoiceParams};
pub use clip::{AudioFormat, Clip, ClipBank, ClipResource, ClipSet};
pub use config::{AudioConfig, MixerGroupConfig, PitchRange, SnapshotConfig};
pub use error::{AudioError, AudioResult};
pub use manager::{AudioVoiceManager, PlayRequest, StopTarget};
pub use mixer::{MixerSystem, MASTER_GROUP};
pub use policy::{CategoryRule, Concurrency, PlayDecision, PlaybackPolicy};
pub use registry::{Rejected, RemovedVoice, VoiceRegistry};
pub use snapshot::{MixerSnapshot, SnapshotController};
pub use voice::{MixerTarget, Voice, VoiceCategory, VoiceId};
