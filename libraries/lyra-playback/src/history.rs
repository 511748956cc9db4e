//! Playback history tracking
//!
//! Most recent entry first. Playing a track that is already in the history
//! moves it to the front with a fresh timestamp instead of duplicating it.

use crate::state::HistoryState;
use chrono::Utc;
use lyra_core::{Ref, Track};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Number of entries written to the saved state (about a day of music)
pub const SAVED_HISTORY_LIMIT: usize = 500;

/// A played track and when it started
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,

    /// Reference to the played track
    pub track: Ref,
}

/// Playback history, optionally bounded
#[derive(Debug, Clone, Default)]
pub struct History {
    /// History buffer (most recent = front)
    entries: VecDeque<HistoryEntry>,

    /// Maximum history size, unbounded if `None`
    max_size: Option<usize>,
}

impl History {
    /// Create an empty history
    pub fn new(max_size: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            max_size,
        }
    }

    /// Record that a track started playing
    pub fn add(&mut self, track: &Track) {
        let entry = HistoryEntry {
            timestamp: Utc::now().timestamp_millis(),
            track: Ref::track(track.uri.clone(), track.display_name()),
        };

        self.entries.retain(|existing| existing.track != entry.track);
        self.entries.push_front(entry);

        if let Some(max_size) = self.max_size {
            self.entries.truncate(max_size);
        }
    }

    /// Get number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if history is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, most recent first
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub(crate) fn save_state(&self) -> HistoryState {
        if self.entries.len() > SAVED_HISTORY_LIMIT {
            tracing::info!("Limiting history to {} tracks", SAVED_HISTORY_LIMIT);
        }
        HistoryState {
            history: self
                .entries
                .iter()
                .take(SAVED_HISTORY_LIMIT)
                .cloned()
                .collect(),
        }
    }

    pub(crate) fn load_state(&mut self, state: HistoryState) {
        self.entries = state.history.into();
        if let Some(max_size) = self.max_size {
            self.entries.truncate(max_size);
        }
    }
}
