//! Core events and their dispatch
//!
//! Every state change the core makes is announced as a `CoreEvent` on the
//! `EventBus`. Listeners implement `CoreListener` and only override the
//! handlers they care about; everything else is a no-op.

use lyra_core::{PlaybackState, Playlist, TlTrack};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

/// Events emitted by the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CoreEvent {
    /// Playback of a track was paused
    TrackPlaybackPaused {
        /// The paused track
        tl_track: TlTrack,
        /// Position when paused, in milliseconds
        time_position: u64,
    },

    /// Playback of a track was resumed
    TrackPlaybackResumed {
        /// The resumed track
        tl_track: TlTrack,
        /// Position when resumed, in milliseconds
        time_position: u64,
    },

    /// A track started playing
    TrackPlaybackStarted {
        /// The started track
        tl_track: TlTrack,
    },

    /// A track stopped playing (finished, skipped, or stopped)
    TrackPlaybackEnded {
        /// The ended track
        tl_track: TlTrack,
        /// Position when it ended, in milliseconds
        time_position: u64,
    },

    /// Playback state changed
    PlaybackStateChanged {
        /// Previous state
        old_state: PlaybackState,
        /// New state
        new_state: PlaybackState,
    },

    /// The tracklist contents changed
    TracklistChanged,

    /// A tracklist mode flag changed
    OptionsChanged,

    /// Mixer volume changed
    VolumeChanged {
        /// New volume (0-100)
        volume: u8,
    },

    /// Mixer mute changed
    MuteChanged {
        /// New mute state
        mute: bool,
    },

    /// A seek completed
    Seeked {
        /// New position in milliseconds
        time_position: u64,
    },

    /// The stream title of a live stream changed
    StreamTitleChanged {
        /// New title
        title: String,
    },

    /// Backends finished loading their playlists
    PlaylistsLoaded,

    /// A playlist was created or changed
    PlaylistChanged {
        /// The playlist
        playlist: Playlist,
    },

    /// A playlist was deleted
    PlaylistDeleted {
        /// URI of the deleted playlist
        uri: String,
    },
}

impl CoreEvent {
    /// Event name as used on the wire
    pub fn name(&self) -> &'static str {
        match self {
            CoreEvent::TrackPlaybackPaused { .. } => "track_playback_paused",
            CoreEvent::TrackPlaybackResumed { .. } => "track_playback_resumed",
            CoreEvent::TrackPlaybackStarted { .. } => "track_playback_started",
            CoreEvent::TrackPlaybackEnded { .. } => "track_playback_ended",
            CoreEvent::PlaybackStateChanged { .. } => "playback_state_changed",
            CoreEvent::TracklistChanged => "tracklist_changed",
            CoreEvent::OptionsChanged => "options_changed",
            CoreEvent::VolumeChanged { .. } => "volume_changed",
            CoreEvent::MuteChanged { .. } => "mute_changed",
            CoreEvent::Seeked { .. } => "seeked",
            CoreEvent::StreamTitleChanged { .. } => "stream_title_changed",
            CoreEvent::PlaylistsLoaded => "playlists_loaded",
            CoreEvent::PlaylistChanged { .. } => "playlist_changed",
            CoreEvent::PlaylistDeleted { .. } => "playlist_deleted",
        }
    }
}

/// Notifications a backend raises about its own content
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// Playlists finished loading
    PlaylistsLoaded,
    /// A playlist was created or changed
    PlaylistChanged(Playlist),
    /// A playlist was deleted
    PlaylistDeleted(String),
}

impl From<BackendEvent> for CoreEvent {
    fn from(event: BackendEvent) -> Self {
        match event {
            BackendEvent::PlaylistsLoaded => CoreEvent::PlaylistsLoaded,
            BackendEvent::PlaylistChanged(playlist) => CoreEvent::PlaylistChanged { playlist },
            BackendEvent::PlaylistDeleted(uri) => CoreEvent::PlaylistDeleted { uri },
        }
    }
}

/// Receiver of core events
///
/// Handlers run on the core's task and must return quickly. A panicking
/// handler is logged and skipped.
#[allow(unused_variables)]
pub trait CoreListener: Send + Sync {
    /// Route an event to its handler
    fn on_event(&self, event: &CoreEvent) {
        match event {
            CoreEvent::TrackPlaybackPaused {
                tl_track,
                time_position,
            } => self.track_playback_paused(tl_track, *time_position),
            CoreEvent::TrackPlaybackResumed {
                tl_track,
                time_position,
            } => self.track_playback_resumed(tl_track, *time_position),
            CoreEvent::TrackPlaybackStarted { tl_track } => self.track_playback_started(tl_track),
            CoreEvent::TrackPlaybackEnded {
                tl_track,
                time_position,
            } => self.track_playback_ended(tl_track, *time_position),
            CoreEvent::PlaybackStateChanged {
                old_state,
                new_state,
            } => self.playback_state_changed(*old_state, *new_state),
            CoreEvent::TracklistChanged => self.tracklist_changed(),
            CoreEvent::OptionsChanged => self.options_changed(),
            CoreEvent::VolumeChanged { volume } => self.volume_changed(*volume),
            CoreEvent::MuteChanged { mute } => self.mute_changed(*mute),
            CoreEvent::Seeked { time_position } => self.seeked(*time_position),
            CoreEvent::StreamTitleChanged { title } => self.stream_title_changed(title),
            CoreEvent::PlaylistsLoaded => self.playlists_loaded(),
            CoreEvent::PlaylistChanged { playlist } => self.playlist_changed(playlist),
            CoreEvent::PlaylistDeleted { uri } => self.playlist_deleted(uri),
        }
    }

    /// A track was paused
    fn track_playback_paused(&self, tl_track: &TlTrack, time_position: u64) {}

    /// A track was resumed
    fn track_playback_resumed(&self, tl_track: &TlTrack, time_position: u64) {}

    /// A track started playing
    fn track_playback_started(&self, tl_track: &TlTrack) {}

    /// A track stopped playing
    fn track_playback_ended(&self, tl_track: &TlTrack, time_position: u64) {}

    /// Playback state changed
    fn playback_state_changed(&self, old_state: PlaybackState, new_state: PlaybackState) {}

    /// The tracklist changed
    fn tracklist_changed(&self) {}

    /// A tracklist mode flag changed
    fn options_changed(&self) {}

    /// Volume changed
    fn volume_changed(&self, volume: u8) {}

    /// Mute changed
    fn mute_changed(&self, mute: bool) {}

    /// A seek completed
    fn seeked(&self, time_position: u64) {}

    /// Stream title changed
    fn stream_title_changed(&self, title: &str) {}

    /// Playlists finished loading
    fn playlists_loaded(&self) {}

    /// A playlist changed
    fn playlist_changed(&self, playlist: &Playlist) {}

    /// A playlist was deleted
    fn playlist_deleted(&self, uri: &str) {}
}

/// Handle returned by `EventBus::register`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Fan-out of core events to registered listeners
///
/// Delivery is synchronous and in registration order.
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<Vec<(ListenerId, Arc<dyn CoreListener>)>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.lock().len())
            .finish()
    }
}

impl EventBus {
    /// Create a bus without listeners
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(ListenerId, Arc<dyn CoreListener>)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a listener
    pub fn register(&self, listener: Arc<dyn CoreListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, listener));
        id
    }

    /// Remove a listener; returns whether it was registered
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }

    /// Deliver an event to every listener
    pub fn send(&self, event: CoreEvent) {
        tracing::debug!("Sending {} event", event.name());

        // Snapshot so listeners may register/unregister from their handlers
        let listeners: Vec<Arc<dyn CoreListener>> =
            self.lock().iter().map(|(_, l)| Arc::clone(l)).collect();

        for listener in listeners {
            let result = catch_unwind(AssertUnwindSafe(|| listener.on_event(&event)));
            if result.is_err() {
                tracing::warn!("Listener panicked while handling {} event", event.name());
            }
        }
    }
}

/// Listener forwarding events into a broadcast channel
///
/// Slow subscribers lag and lose events instead of blocking the core.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    sender: broadcast::Sender<CoreEvent>,
}

impl ChannelListener {
    /// Create a listener with the given channel capacity
    pub fn new(capacity: usize) -> (Self, broadcast::Receiver<CoreEvent>) {
        let (sender, receiver) = broadcast::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Open another receiver
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.sender.subscribe()
    }
}

impl CoreListener for ChannelListener {
    fn on_event(&self, event: &CoreEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event.clone());
    }
}

/// Listener recording every event it receives
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<CoreEvent>>,
}

impl EventLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events, oldest first
    pub fn events(&self) -> Vec<CoreEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Names of the recorded events, oldest first
    pub fn names(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(CoreEvent::name)
            .collect()
    }

    /// Forget recorded events
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl CoreListener for EventLog {
    fn on_event(&self, event: &CoreEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
