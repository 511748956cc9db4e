//! Error types for the playback core

use lyra_core::LyraError;
use thiserror::Error;

/// Playback core errors
///
/// Only contract violations and capacity limits surface to callers. Failures of
/// collaborators (unplayable tracks, engine commands, listener panics) are
/// logged and recovered from inside the core.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// A precondition of the call was violated (bad range, malformed criteria)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Adding the tracks would exceed the configured tracklist length
    #[error("Tracklist may contain at most {max} tracks")]
    CapacityExceeded {
        /// Configured maximum length
        max: usize,
    },

    /// The core actor is no longer running
    #[error("Core actor has stopped")]
    ActorStopped,

    /// Persisted state could not be used
    #[error("State error: {0}")]
    State(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Collaborator error
    #[error(transparent)]
    Core(#[from] LyraError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PlaybackError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
