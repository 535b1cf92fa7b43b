//! Clip resources and variation banks
//!
//! A clip is anything the backend can play: it has an identity, a duration
//! and a validity check. [`Clip`] is the concrete type shipped with the
//! crate; it carries encoded bytes when a real backend needs them.
//!
//! [`ClipBank`] groups clips into named variation sets (several footstep
//! takes, several eat sounds) so gameplay code can ask for "a footstep" and
//! get a random take at a slightly jittered pitch.

use crate::audio::error::{AudioError, AudioResult};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;

/// Host-supplied clip capability
pub trait ClipResource {
    /// Stable identifier, recorded on every voice playing the clip
    fn id(&self) -> &str;

    /// Length in seconds; 0 when unknown (streamed)
    fn duration_seconds(&self) -> f32;

    /// Whether the clip can be played at all
    fn is_valid(&self) -> bool;
}

/// Supported audio formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// WAV uncompressed
    Wav,
    /// OGG Vorbis compressed
    Ogg,
    /// MP3 compressed
    Mp3,
    /// FLAC lossless
    Flac,
    /// Unknown format
    Unknown,
}

impl AudioFormat {
    /// Detect format from magic bytes
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.len() < 4 {
            return Self::Unknown;
        }

        match &bytes[0..4] {
            b"RIFF" => Self::Wav,
            b"OggS" => Self::Ogg,
            b"fLaC" => Self::Flac,
            // ID3 tag or bare frame sync
            [0xFF, 0xFB | 0xFA | 0xF3 | 0xF2, _, _] | [b'I', b'D', b'3', _] => Self::Mp3,
            _ => Self::Unknown,
        }
    }
}

/// Concrete clip: metadata plus optional encoded data
#[derive(Debug, Clone)]
pub struct Clip {
    id: String,
    duration_seconds: f32,
    data: Option<Arc<[u8]>>,
    format: AudioFormat,
}

impl Clip {
    /// Metadata-only clip, for backends that resolve audio by id
    pub fn new(id: impl Into<String>, duration_seconds: f32) -> Self {
        Self {
            id: id.into(),
            duration_seconds,
            data: None,
            format: AudioFormat::Unknown,
        }
    }

    /// Clip from encoded file bytes
    ///
    /// # Errors
    /// `MissingResource` if the bytes are empty or not a recognised format.
    pub fn from_bytes(id: impl Into<String>, bytes: impl Into<Arc<[u8]>>, duration_seconds: f32) -> AudioResult<Self> {
        let id = id.into();
        let data: Arc<[u8]> = bytes.into();

        if data.is_empty() {
            return Err(AudioError::MissingResource(format!("clip '{id}' has no audio data")));
        }

        let format = AudioFormat::detect(&data);
        if format == AudioFormat::Unknown {
            return Err(AudioError::MissingResource(format!("clip '{id}' is not a recognised audio format")));
        }

        Ok(Self {
            id,
            duration_seconds,
            data: Some(data),
            format,
        })
    }

    /// Encoded bytes, if this clip carries any
    pub fn data(&self) -> Option<&Arc<[u8]>> {
        self.data.as_ref()
    }

    /// Detected encoding
    pub fn format(&self) -> AudioFormat {
        self.format
    }
}

impl ClipResource for Clip {
    fn id(&self) -> &str {
        &self.id
    }

    fn duration_seconds(&self) -> f32 {
        self.duration_seconds
    }

    fn is_valid(&self) -> bool {
        !self.id.is_empty()
            && self.duration_seconds.is_finite()
            && self.duration_seconds >= 0.0
            && (self.data.is_none() || self.format != AudioFormat::Unknown)
    }
}

/// Variations of one sound with a pitch jitter range
#[derive(Debug, Clone)]
pub struct ClipSet<C = Clip> {
    clips: Vec<C>,
    pitch_min: f32,
    pitch_max: f32,
}

impl<C: ClipResource> ClipSet<C> {
    /// Set with no pitch jitter
    pub fn new(clips: Vec<C>) -> Self {
        Self {
            clips,
            pitch_min: 1.0,
            pitch_max: 1.0,
        }
    }

    /// Randomise pitch within `min..=max` on every pick
    ///
    /// Bounds are swapped if given backwards.
    pub fn with_pitch_jitter(mut self, min: f32, max: f32) -> Self {
        self.pitch_min = min.min(max);
        self.pitch_max = min.max(max);
        self
    }

    /// Number of variations
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Whether the set has no variations
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Pitch range applied by [`Self::pick`]
    pub fn pitch_range(&self) -> (f32, f32) {
        (self.pitch_min, self.pitch_max)
    }

    /// Pick a random variation and a pitch for it
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(&C, f32)> {
        let clip = self.clips.choose(rng)?;
        let pitch = if self.pitch_max > self.pitch_min {
            rng.gen_range(self.pitch_min..=self.pitch_max)
        } else {
            self.pitch_min
        };
        Some((clip, pitch))
    }
}

/// Named collection of variation sets
#[derive(Debug, Clone)]
pub struct ClipBank<C = Clip> {
    name: String,
    sets: HashMap<String, ClipSet<C>>,
}

impl<C: ClipResource> ClipBank<C> {
    /// Create an empty bank
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sets: HashMap::new(),
        }
    }

    /// Bank name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add or replace a variation set
    pub fn insert(&mut self, set_name: impl Into<String>, set: ClipSet<C>) {
        self.sets.insert(set_name.into(), set);
    }

    /// Look up a variation set
    pub fn set(&self, set_name: &str) -> Option<&ClipSet<C>> {
        self.sets.get(set_name)
    }

    /// Check if a set is present and non-empty
    pub fn contains(&self, set_name: &str) -> bool {
        self.sets.get(set_name).is_some_and(|set| !set.is_empty())
    }

    /// Pick a random clip and pitch from a named set
    ///
    /// # Errors
    /// `MissingResource` if the set is unknown or empty.
    pub fn pick<R: Rng + ?Sized>(&self, set_name: &str, rng: &mut R) -> AudioResult<(&C, f32)> {
        self.sets
            .get(set_name)
            .and_then(|set| set.pick(rng))
            .ok_or_else(|| {
                AudioError::MissingResource(format!("bank '{}' has no clips in set '{set_name}'", self.name))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_format_detection() {
        assert_eq!(AudioFormat::detect(b"RIFF....WAVE"), AudioFormat::Wav);
        assert_eq!(AudioFormat::detect(b"OggS...."), AudioFormat::Ogg);
        assert_eq!(AudioFormat::detect(b"fLaC...."), AudioFormat::Flac);
        assert_eq!(AudioFormat::detect(b"ID3\x04...."), AudioFormat::Mp3);
        assert_eq!(AudioFormat::detect(b"ABCD"), AudioFormat::Unknown);
        assert_eq!(AudioFormat::detect(b"AB"), AudioFormat::Unknown);
    }

    #[test]
    fn test_empty_data_fails() {
        let result = Clip::from_bytes("empty", Vec::<u8>::new(), 1.0);
        assert!(matches!(result, Err(AudioError::MissingResource(_))));
    }

    #[test]
    fn test_unknown_data_fails() {
        let result = Clip::from_bytes("noise", b"not audio".to_vec(), 1.0);
        assert!(matches!(result, Err(AudioError::MissingResource(_))));
    }

    #[test]
    fn test_clip_validity() {
        assert!(Clip::new("step", 0.3).is_valid());
        assert!(Clip::new("stream", 0.0).is_valid());
        assert!(!Clip::new("", 0.3).is_valid());
        assert!(!Clip::new("broken", -1.0).is_valid());
        assert!(!Clip::new("broken", f32::NAN).is_valid());

        let wav = Clip::from_bytes("wav", b"RIFF0000WAVE".to_vec(), 0.2).unwrap();
        assert!(wav.is_valid());
        assert_eq!(wav.format(), AudioFormat::Wav);
        assert!(wav.data().is_some());
    }

    #[test]
    fn test_set_pick_stays_in_range() {
        let set = ClipSet::new(vec![Clip::new("step_a", 0.3), Clip::new("step_b", 0.3)])
            .with_pitch_jitter(1.05, 0.95);
        assert_eq!(set.pitch_range(), (0.95, 1.05));

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let (clip, pitch) = set.pick(&mut rng).unwrap();
            assert!(clip.id().starts_with("step_"));
            assert!((0.95..=1.05).contains(&pitch));
        }
    }

    #[test]
    fn test_set_without_jitter_uses_unit_pitch() {
        let set = ClipSet::new(vec![Clip::new("hit", 0.5)]);
        let mut rng = StdRng::seed_from_u64(1);
        let (_, pitch) = set.pick(&mut rng).unwrap();
        assert_eq!(pitch, 1.0);
    }

    #[test]
    fn test_bank_missing_set() {
        let mut bank = ClipBank::new("player");
        bank.insert("eat", ClipSet::<Clip>::new(Vec::new()));
        let mut rng = StdRng::seed_from_u64(3);

        assert!(!bank.contains("eat"));
        assert!(matches!(bank.pick("eat", &mut rng), Err(AudioError::MissingResource(_))));
        assert!(matches!(bank.pick("drink", &mut rng), Err(AudioError::MissingResource(_))));
    }

    #[test]
    fn test_bank_picks_from_set() {
        let mut bank = ClipBank::new("player");
        bank.insert("chop", ClipSet::new(vec![Clip::new("chop_1", 0.4)]));
        let mut rng = StdRng::seed_from_u64(3);

        let (clip, _) = bank.pick("chop", &mut rng).unwrap();
        assert_eq!(clip.id(), "chop_1");
        assert_eq!(bank.name(), "player");
    }
}
