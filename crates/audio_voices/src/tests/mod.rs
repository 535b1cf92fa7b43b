//! Cross-module scenario tests for the voice manager

mod lifecycle;

use crate::audio::backend::headless::HeadlessBackend;
use crate::audio::{AudioConfig, AudioVoiceManager, MixerSnapshot};
use crate::foundation::time::ManualClock;

/// Manager on a headless backend and a hand-driven clock, with the
/// `lowHealth`, `normal`, `off`, `musLowHealth` and `ambLowHealth` snapshots
/// registered
pub(crate) fn test_manager() -> (AudioVoiceManager<HeadlessBackend>, ManualClock) {
    let clock = ManualClock::new();
    let config = AudioConfig::new()
        .with_snapshot(&MixerSnapshot::new("lowHealth").with_level("music", 0.3).with_level("sfx", 1.0))
        .with_snapshot(&MixerSnapshot::new("normal").with_level("music", 1.0).with_level("sfx", 1.0))
        .with_snapshot(&MixerSnapshot::new("off").with_level("music", 0.0).with_level("ambiance", 0.0))
        .with_snapshot(&MixerSnapshot::new("musLowHealth").with_level("music", 0.2))
        .with_snapshot(&MixerSnapshot::new("ambLowHealth").with_level("ambiance", 0.0));
    let manager = AudioVoiceManager::with_clock(HeadlessBackend::new(), config, clock.clone())
        .unwrap_or_else(|e| panic!("test config should be valid: {e}"));
    (manager, clock)
}
