/// Lightweight references to library objects
use serde::{Deserialize, Serialize};

/// Kind of object a `Ref` points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefType {
    Album,
    Artist,
    Directory,
    Playlist,
    Track,
}

/// Reference to a library object by URI, with a display name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ref {
    /// Object URI
    pub uri: String,

    /// Display name
    pub name: Option<String>,

    /// Object kind
    #[serde(rename = "type")]
    pub kind: RefType,
}

impl Ref {
    fn with_kind(kind: RefType, uri: impl Into<String>, name: Option<String>) -> Self {
        Self {
            uri: uri.into(),
            name,
            kind,
        }
    }

    /// Reference to a track
    pub fn track(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_kind(RefType::Track, uri, Some(name.into()))
    }

    /// Reference to a directory
    pub fn directory(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_kind(RefType::Directory, uri, Some(name.into()))
    }

    /// Reference to a playlist
    pub fn playlist(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_kind(RefType::Playlist, uri, Some(name.into()))
    }
}
