/// Core error types for Lyra
use thiserror::Error;

/// Result type alias using `LyraError`
pub type Result<T> = std::result::Result<T, LyraError>;

/// Core error type for Lyra
///
/// Collaborators (backends, audio engines, mixers) report failures with this
/// type. The playback core never lets these escape to clients; it logs them and
/// recovers.
#[derive(Error, Debug)]
pub enum LyraError {
    /// Backend failures (lookup, URI translation, browsing)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Audio engine failures
    #[error("Audio error: {0}")]
    Audio(String),

    /// Mixer failures
    #[error("Mixer error: {0}")]
    Mixer(String),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl LyraError {
    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create an audio error
    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }

    /// Create a mixer error
    pub fn mixer(msg: impl Into<String>) -> Self {
        Self::Mixer(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = LyraError::not_found("Track", "local:track:a.flac");
        assert_eq!(err.to_string(), "Track not found: local:track:a.flac");
    }

    #[test]
    fn test_helper_constructors() {
        assert!(matches!(LyraError::audio("x"), LyraError::Audio(_)));
        assert!(matches!(LyraError::backend("x"), LyraError::Backend(_)));
        assert!(matches!(LyraError::mixer("x"), LyraError::Mixer(_)));
        assert_eq!(
            LyraError::invalid_input("bad").to_string(),
            "Invalid input: bad"
        );
    }
}
