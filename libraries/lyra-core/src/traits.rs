/// Collaborator traits consumed by the playback core
use crate::error::Result;
use crate::types::{PlaybackState, Playlist, Ref, SearchQuery, SearchResult, Track};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Stream tags reported by the audio engine (tag name -> values)
pub type Tags = HashMap<String, Vec<String>>;

/// Called by the audio engine once the source for a URI has been created
pub type SourceSetupCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Notifications emitted asynchronously by an audio engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AudioEvent {
    /// Playback position changed (after a seek or a stream start)
    PositionChanged {
        /// Position in milliseconds
        position: u64,
    },

    /// The engine started reading a new stream; `None` when it released the
    /// stream entirely (stop)
    StreamChanged {
        /// URI now being read
        uri: Option<String>,
    },

    /// Engine state changed
    StateChanged {
        /// Previous engine state
        old_state: PlaybackState,
        /// New engine state
        new_state: PlaybackState,
        /// State the engine is heading for, if still transitioning
        target_state: Option<PlaybackState>,
    },

    /// Some stream tags changed
    TagsChanged {
        /// Names of the tags that changed
        tags: Vec<String>,
    },

    /// The last stream ran out and nothing was queued after it
    ReachedEndOfStream,
}

impl AudioEvent {
    /// Event name, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            AudioEvent::PositionChanged { .. } => "position_changed",
            AudioEvent::StreamChanged { .. } => "stream_changed",
            AudioEvent::StateChanged { .. } => "state_changed",
            AudioEvent::TagsChanged { .. } => "tags_changed",
            AudioEvent::ReachedEndOfStream => "reached_end_of_stream",
        }
    }
}

/// Receiver of engine notifications
///
/// The engine calls `emit` from whatever context produces the notification;
/// implementations must only enqueue, never process inline.
#[async_trait]
pub trait AudioEventSink: Send + Sync {
    /// Queue a notification for the core
    fn emit(&self, event: AudioEvent);

    /// The current stream is about to finish
    ///
    /// Resolves once the core has picked the next stream (and called
    /// `set_uri` for it, if there is one). Engines must await this before
    /// deciding whether the stream ended.
    async fn about_to_finish(&self);
}

/// Audio output pipeline
///
/// Driven exclusively by the playback core. Commands return once the engine
/// has accepted them; results of state changes arrive later as `AudioEvent`s.
#[async_trait]
pub trait AudioEngine: Send + Sync {
    /// Register where notifications should go
    fn set_event_sink(&self, sink: Arc<dyn AudioEventSink>);

    /// Reset the engine before a new URI is set
    async fn prepare_change(&self) -> Result<()>;

    /// Set the URI to play next
    async fn set_uri(&self, uri: &str, live_stream: bool, download: bool) -> Result<()>;

    /// Register a callback for source setup of the next URI
    async fn set_source_setup_callback(&self, callback: Option<SourceSetupCallback>)
        -> Result<()>;

    /// Start (or resume) playback
    async fn start_playback(&self) -> Result<()>;

    /// Pause playback
    async fn pause_playback(&self) -> Result<()>;

    /// Stop playback and release the stream
    async fn stop_playback(&self) -> Result<()>;

    /// Current position in milliseconds
    async fn get_position(&self) -> Result<u64>;

    /// Seek to a position in milliseconds
    async fn set_position(&self, position: u64) -> Result<()>;

    /// Tags of the current stream
    async fn get_current_tags(&self) -> Result<Tags>;
}

/// Library part of a backend
#[async_trait]
pub trait LibraryProvider: Send + Sync {
    /// Root directory shown when browsing the library top level
    fn root_directory(&self) -> Option<Ref> {
        None
    }

    /// List the children of a directory URI
    async fn browse(&self, uri: &str) -> Result<Vec<Ref>>;

    /// Resolve a URI to the tracks it stands for
    async fn lookup(&self, uri: &str) -> Result<Vec<Track>>;

    /// Search the library, limited to `uris` when given
    ///
    /// `Ok(None)` means the backend cannot search.
    async fn search(
        &self,
        _query: &SearchQuery,
        _uris: Option<&[String]>,
        _exact: bool,
    ) -> Result<Option<SearchResult>> {
        Ok(None)
    }
}

/// Playlists part of a backend
#[async_trait]
pub trait PlaylistsProvider: Send + Sync {
    /// References to every playlist the backend has
    async fn as_list(&self) -> Result<Vec<Ref>>;

    /// Items of a playlist, `None` if it does not exist
    async fn get_items(&self, uri: &str) -> Result<Option<Vec<Ref>>>;

    /// Full playlist, `None` if it does not exist
    async fn lookup(&self, uri: &str) -> Result<Option<Playlist>>;

    /// Create an empty playlist named `name`
    async fn create(&self, name: &str) -> Result<Option<Playlist>>;

    /// Store `playlist`; returns the playlist as saved, which may have a new URI
    async fn save(&self, playlist: Playlist) -> Result<Option<Playlist>>;

    /// Delete a playlist; returns whether it existed
    async fn delete(&self, uri: &str) -> Result<bool>;

    /// Reload playlists from their source
    async fn refresh(&self) -> Result<()> {
        Ok(())
    }
}

/// Playback part of a backend
///
/// The defaults play the tracklist URI unchanged; backends usually only
/// override `translate_uri`.
#[async_trait]
pub trait PlaybackProvider: Send + Sync {
    /// Translate a tracklist URI into something the audio engine can read
    ///
    /// `Ok(None)` marks the track as unplayable.
    async fn translate_uri(&self, uri: &str) -> Result<Option<String>> {
        Ok(Some(uri.to_string()))
    }

    /// Whether the URI is a live stream (no buffering, data dropped on pause)
    fn is_live(&self, _uri: &str) -> bool {
        false
    }

    /// Whether the engine should download the whole resource before playing
    fn should_download(&self, _uri: &str) -> bool {
        false
    }

    /// Callback for tweaking the engine source once it is created
    fn source_setup_callback(&self) -> Option<SourceSetupCallback> {
        None
    }
}

/// Content backend owning one or more URI schemes
pub trait Backend: Send + Sync {
    /// Human readable backend name, used in logs
    fn name(&self) -> &str;

    /// URI schemes handled by this backend
    fn uri_schemes(&self) -> Vec<String>;

    /// Library provider, if the backend has a library
    fn library(&self) -> Option<&dyn LibraryProvider> {
        None
    }

    /// Playback provider, if the backend can play its URIs
    fn playback(&self) -> Option<&dyn PlaybackProvider> {
        None
    }

    /// Playlists provider, if the backend stores playlists
    fn playlists(&self) -> Option<&dyn PlaylistsProvider> {
        None
    }
}

/// Volume control
#[async_trait]
pub trait Mixer: Send + Sync {
    /// Volume in `0..=100`, `None` if unknown
    async fn get_volume(&self) -> Result<Option<u8>>;

    /// Set volume in `0..=100`; returns whether the mixer accepted it
    async fn set_volume(&self, volume: u8) -> Result<bool>;

    /// Mute state, `None` if unknown
    async fn get_mute(&self) -> Result<Option<bool>>;

    /// Set mute state; returns whether the mixer accepted it
    async fn set_mute(&self, mute: bool) -> Result<bool>;
}
