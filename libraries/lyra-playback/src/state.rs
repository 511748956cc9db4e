//! Persisted core state
//!
//! A JSON snapshot of tracklist, history, playback and mixer, written on
//! shutdown and restored (partially, per `Coverage`) on startup.

use crate::error::{PlaybackError, Result};
use crate::history::HistoryEntry;
use crate::types::TracklistOptions;
use lyra_core::{PlaybackState, TlTrack, Tlid};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Saved tracklist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracklistState {
    /// Entries in tracklist order
    pub tl_tracks: Vec<TlTrack>,

    /// Tlid counter at save time
    pub next_tlid: Tlid,

    /// Mode flags
    #[serde(flatten)]
    pub options: TracklistOptions,
}

impl Default for TracklistState {
    fn default() -> Self {
        Self {
            tl_tracks: Vec::new(),
            next_tlid: Tlid::FIRST,
            options: TracklistOptions::default(),
        }
    }
}

/// Saved history, most recent first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
    /// History entries
    pub history: Vec<HistoryEntry>,
}

/// Saved playback position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    /// Current track at save time
    pub tlid: Option<Tlid>,

    /// Position in milliseconds
    pub time_position: u64,

    /// Playback state
    pub state: PlaybackState,
}

/// Saved mixer settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixerState {
    /// Volume (0-100)
    pub volume: Option<u8>,

    /// Mute state
    pub mute: Option<bool>,
}

/// Everything the core saves
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreState {
    /// Tracklist entries and modes
    #[serde(default)]
    pub tracklist: TracklistState,

    /// Playback history
    #[serde(default)]
    pub history: HistoryState,

    /// Playback position
    #[serde(default)]
    pub playback: PlaybackSnapshot,

    /// Mixer settings
    #[serde(default)]
    pub mixer: MixerState,
}

/// State file contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredState {
    /// Version of the software that wrote the file
    pub version: String,

    /// Saved state
    pub state: CoreState,
}

impl StoredState {
    /// Wrap a state snapshot with the current version
    pub fn new(state: CoreState) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            state,
        }
    }
}

/// Reads and writes the state file
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Store at an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved state, deleting the file afterwards
    ///
    /// Loading is attempted once: a file that fails to parse is still removed
    /// so the next start is clean. A missing file is `Ok(None)`.
    pub async fn load(&self) -> Result<Option<StoredState>> {
        tracing::info!("Loading state from {}", self.path.display());

        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No saved state at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            tracing::info!("Failed to delete {}: {}", self.path.display(), e);
        }

        let stored: StoredState = serde_json::from_str(&contents)
            .map_err(|e| PlaybackError::State(format!("{}: {e}", self.path.display())))?;
        Ok(Some(stored))
    }

    /// Write the state, creating the parent directory if needed
    pub async fn save(&self, state: &StoredState) -> Result<()> {
        tracing::info!("Saving state to {}", self.path.display());

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(state)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra_core::Track;
    use tempfile::TempDir;

    fn sample_state() -> StoredState {
        StoredState::new(CoreState {
            tracklist: TracklistState {
                tl_tracks: vec![TlTrack::new(Tlid::new(3), Track::new("dummy:a"))],
                next_tlid: Tlid::new(4),
                options: TracklistOptions {
                    repeat: true,
                    ..Default::default()
                },
            },
            playback: PlaybackSnapshot {
                tlid: Some(Tlid::new(3)),
                time_position: 500,
                state: PlaybackState::Paused,
            },
            mixer: MixerState {
                volume: Some(40),
                mute: Some(false),
            },
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_save_then_load_deletes_file() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("core").join("state.json"));

        store.save(&sample_state()).await.unwrap();
        assert!(store.path().exists());

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, sample_state());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_only_tried_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = StateStore::new(&path);
        assert!(matches!(store.load().await, Err(PlaybackError::State(_))));
        assert!(store.load().await.unwrap().is_none());
    }

    #[test]
    fn test_mode_flags_are_flattened() {
        let json = serde_json::to_value(&sample_state()).unwrap();
        assert_eq!(json["state"]["tracklist"]["repeat"], true);
        assert_eq!(json["state"]["playback"]["state"], "paused");
    }
}
