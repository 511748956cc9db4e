/// Playback state shared by the core and audio engines
use serde::{Deserialize, Serialize};
use std::fmt;

/// Playback state
///
/// ```text
/// STOPPED -> PLAYING (play)    PLAYING -> STOPPED (stop)
/// STOPPED -> PAUSED  (pause)   PLAYING -> PAUSED  (pause)
/// PAUSED  -> PLAYING (resume)  PLAYING -> PLAYING (play)
/// PAUSED  -> STOPPED (stop)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Nothing is playing
    #[default]
    Stopped,
    /// Audio is playing
    Playing,
    /// Playback is paused
    Paused,
}

impl PlaybackState {
    /// Lowercase name, as used on the wire and in logs
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackState::Stopped => "stopped",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
