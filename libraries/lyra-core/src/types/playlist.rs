/// Playlist domain type
use crate::types::Track;
use serde::{Deserialize, Serialize};

/// A playlist owned by a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    /// Playlist URI
    pub uri: String,

    /// Playlist name
    pub name: Option<String>,

    /// Playlist tracks
    #[serde(default)]
    pub tracks: Vec<Track>,

    /// Modification time in milliseconds since the Unix epoch
    pub last_modified: Option<i64>,
}

impl Playlist {
    /// Create an empty playlist
    pub fn new(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: Some(name.into()),
            tracks: Vec::new(),
            last_modified: None,
        }
    }
}
