//! Rodio audio backend implementation
//!
//! Uses the Rodio library for cross-platform audio playback. One sink per
//! voice; pitch maps to `speed`, looping to `repeat_infinite`. `speed` also
//! changes the real play length, while the manager expires voices on the
//! clip's nominal length, so a pitched-down tail is cut at expiry.
//!
//! # Example
//!
//! ```no_run
//! use audio_voices::audio::backend::rodio_backend::{load_clip, RodioBackend};
//! use audio_voices::audio::{AudioVoiceManager, AudioConfig, MixerTarget};
//!
//! let backend = RodioBackend::new().unwrap();
//! let manager = AudioVoiceManager::new(backend, AudioConfig::default()).unwrap();
//!
//! let step = load_clip("step", "resources/audio/footstep_01.wav").unwrap();
//! manager.play_effect(&step, 1.0, Some(MixerTarget::new("sfx"))).unwrap();
//! ```

use super::{PlaybackBackend, PlaybackHandle, VoiceParams};
use crate::audio::clip::{Clip, ClipResource};
use crate::audio::error::{AudioError, AudioResult};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

/// Load a clip from disk, reading its duration from the decoder
///
/// Formats that cannot report a length up front get duration 0 and are
/// treated as streamed (never auto-expired).
///
/// # Errors
/// `MissingResource` if the file cannot be read or decoded.
pub fn load_clip(id: impl Into<String>, path: impl AsRef<Path>) -> AudioResult<Clip> {
    let path = path.as_ref();
    let bytes: Arc<[u8]> = std::fs::read(path)
        .map_err(|e| AudioError::MissingResource(format!("failed to open audio file {}: {e}", path.display())))?
        .into();

    let duration = Decoder::new(Cursor::new(Arc::clone(&bytes)))
        .map_err(|e| AudioError::MissingResource(format!("failed to decode {}: {e}", path.display())))?
        .total_duration()
        .map_or(0.0, |d| d.as_secs_f32());

    Clip::from_bytes(id, bytes, duration)
}

/// Rodio-based audio backend
pub struct RodioBackend {
    /// Audio output stream (must be kept alive)
    _output_stream: OutputStream,
    /// Output stream handle for creating sinks
    stream_handle: OutputStreamHandle,
    /// One sink per voice
    sinks: HashMap<u64, Sink>,
    /// Next raw handle value
    next_id: u64,
}

impl RodioBackend {
    /// Open the default output device
    ///
    /// # Errors
    /// `BackendInitFailed` if no output device can be opened.
    pub fn new() -> AudioResult<Self> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| AudioError::BackendInitFailed(format!("Failed to create audio output: {e}")))?;

        log::info!("Rodio audio backend initialized");
        Ok(Self {
            _output_stream: stream,
            stream_handle,
            sinks: HashMap::new(),
            next_id: 0,
        })
    }

    fn next_handle(&mut self) -> PlaybackHandle {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        PlaybackHandle::new(id)
    }
}

impl PlaybackBackend for RodioBackend {
    type Clip = Clip;

    fn acquire_voice(&mut self, clip: &Clip, params: &VoiceParams) -> AudioResult<PlaybackHandle> {
        let data = clip
            .data()
            .ok_or_else(|| AudioError::MissingResource(format!("clip '{}' has no audio data", clip.id())))?;

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| AudioError::BackendRefused(format!("Failed to create sink: {e}")))?;
        let source = Decoder::new(Cursor::new(Arc::clone(data)))
            .map_err(|e| AudioError::MissingResource(format!("Failed to decode '{}': {e}", clip.id())))?
            .speed(params.pitch);

        // Silent until started
        sink.pause();
        sink.set_volume(params.volume);
        if params.looping {
            sink.append(source.repeat_infinite());
        } else {
            sink.append(source);
        }

        let handle = self.next_handle();
        self.sinks.insert(handle.raw(), sink);
        Ok(handle)
    }

    fn start(&mut self, handle: &PlaybackHandle) {
        if let Some(sink) = self.sinks.get(&handle.raw()) {
            sink.play();
        }
    }

    fn release(&mut self, handle: PlaybackHandle) {
        if let Some(sink) = self.sinks.remove(&handle.raw()) {
            sink.stop();
        }
    }

    fn is_playing(&self, handle: &PlaybackHandle) -> bool {
        self.sinks
            .get(&handle.raw())
            .is_some_and(|sink| !sink.is_paused() && !sink.empty())
    }

    fn set_volume(&mut self, handle: &PlaybackHandle, volume: f32) {
        if let Some(sink) = self.sinks.get(&handle.raw()) {
            sink.set_volume(volume);
        }
    }

    fn shutdown(&mut self) {
        for (_raw, sink) in self.sinks.drain() {
            sink.stop();
        }
        log::info!("Rodio audio backend shutdown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::voice::VoiceCategory;

    fn params() -> VoiceParams {
        VoiceParams {
            category: VoiceCategory::SoundEffect,
            looping: false,
            pitch: 1.0,
            volume: 1.0,
            mixer_target: None,
        }
    }

    #[test]
    fn test_backend_initialization() {
        // May fail in CI/test environments without audio device
        if let Ok(mut backend) = RodioBackend::new() {
            assert!(backend.sinks.is_empty());
            backend.shutdown();
        }
    }

    #[test]
    fn test_handle_generation() {
        if let Ok(mut backend) = RodioBackend::new() {
            let h1 = backend.next_handle();
            let h2 = backend.next_handle();
            assert_ne!(h1.raw(), h2.raw());
        }
    }

    #[test]
    fn test_metadata_only_clip_is_missing_resource() {
        if let Ok(mut backend) = RodioBackend::new() {
            let result = backend.acquire_voice(&Clip::new("step", 0.3), &params());
            assert!(matches!(result, Err(AudioError::MissingResource(_))));
            assert!(backend.sinks.is_empty());
        }
    }

    #[test]
    fn test_undecodable_clip_is_missing_resource() {
        if let Ok(mut backend) = RodioBackend::new() {
            let clip = Clip::from_bytes("broken", b"RIFF\0\0\0\0garbage".to_vec(), 1.0).unwrap();
            let result = backend.acquire_voice(&clip, &params());
            assert!(matches!(result, Err(AudioError::MissingResource(_))));
        }
    }

    #[test]
    fn test_unknown_handle_is_not_playing() {
        if let Ok(backend) = RodioBackend::new() {
            assert!(!backend.is_playing(&PlaybackHandle::new(999)));
        }
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_clip("nope", "does/not/exist.wav");
        assert!(matches!(result, Err(AudioError::MissingResource(_))));
    }
}
