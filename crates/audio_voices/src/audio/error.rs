//! Audio error taxonomy
//!
//! Every variant is local and recoverable. Operations validate before they
//! mutate, so an `Err` always means nothing changed.

/// Errors returned by the voice manager and its backends
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Voice record is malformed (bad mixer target, bad duration)
    #[error("Invalid voice: {0}")]
    InvalidVoice(String),

    /// Caller supplied an out-of-range value (pitch, duration, category)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Clip, mixer group or snapshot could not be resolved
    #[error("Missing resource: {0}")]
    MissingResource(String),

    /// Manager has been shut down
    #[error("Audio voice manager is unavailable")]
    ManagerUnavailable,

    /// Backend declined to acquire a voice
    #[error("Backend refused playback: {0}")]
    BackendRefused(String),

    /// Backend could not open its output device
    #[error("Backend initialization failed: {0}")]
    BackendInitFailed(String),
}

/// Result alias for audio operations
pub type AudioResult<T> = Result<T, AudioError>;
