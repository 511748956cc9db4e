//! Core configuration

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Hard upper bound for `max_tracklist_length`
pub const TRACKLIST_LENGTH_LIMIT: usize = 10_000;

/// Configuration for the playback core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Maximum number of entries in the tracklist
    #[serde(default = "default_max_tracklist_length")]
    pub max_tracklist_length: usize,

    /// Restore the saved state on startup and save it on shutdown
    #[serde(default)]
    pub restore_state: bool,

    /// Directory for persistent data
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Maximum number of history entries kept in memory (unbounded if unset)
    #[serde(default)]
    pub history_max_size: Option<usize>,
}

fn default_max_tracklist_length() -> usize {
    TRACKLIST_LENGTH_LIMIT
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_tracklist_length: default_max_tracklist_length(),
            restore_state: false,
            data_dir: default_data_dir(),
            history_max_size: None,
        }
    }
}

impl CoreConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(1..=TRACKLIST_LENGTH_LIMIT).contains(&self.max_tracklist_length) {
            return Err(PlaybackError::Config(format!(
                "max_tracklist_length must be between 1 and {TRACKLIST_LENGTH_LIMIT}, got {}",
                self.max_tracklist_length
            )));
        }

        if self.history_max_size == Some(0) {
            return Err(PlaybackError::Config(
                "history_max_size must be at least 1 when set".to_string(),
            ));
        }

        Ok(())
    }

    /// Path of the saved core state
    pub fn state_file(&self) -> PathBuf {
        self.data_dir.join("core").join("state.json")
    }
}
