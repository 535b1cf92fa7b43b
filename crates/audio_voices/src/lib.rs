//! # Audio Voices
//!
//! Engine-independent manager for transient game audio.
//!
//! ## Features
//!
//! - **Category Policy**: Concurrent sound effects, exclusive ambiance and music beds
//! - **Scoped Lifetimes**: Every playback resource is released exactly once
//! - **Mixer Snapshots**: Interpolated group levels with last-write-wins retargeting
//! - **Pluggable Backends**: Headless for servers and tests, rodio for real output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use audio_voices::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AudioConfig::load_from_file("audio.toml")?;
//!     let manager = AudioVoiceManager::new(HeadlessBackend::new(), config)?;
//!
//!     let step = Clip::new("footstep_01", 0.35);
//!     manager.play_effect(&step, 1.0, Some(MixerTarget::new("sfx")))?;
//!     manager.play_loop(VoiceCategory::Music, &Clip::new("theme", 0.0), Some(MixerTarget::new("music")))?;
//!
//!     // Once per frame
//!     manager.update();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate, clippy::missing_const_for_fn)]

pub mod audio;
pub mod config;
pub mod foundation;

#[cfg(test)]
mod tests;

/// Common imports for audio users
pub mod prelude {
    pub use crate::{
        audio::{
            backend::headless::HeadlessBackend, AudioConfig, AudioError, AudioResult, AudioVoiceManager, Clip,
            ClipBank, ClipSet, MixerSnapshot, MixerTarget, PlayRequest, PlaybackBackend, StopTarget, Voice,
            VoiceCategory, VoiceId,
        },
        config::Config,
        foundation::time::{Clock, ManualClock, MonotonicClock},
    };
}
