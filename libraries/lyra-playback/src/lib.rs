//! Lyra Playback - the music server core
//!
//! This crate provides:
//! - Tracklist with repeat, random, single and consume modes
//! - Playback state machine driving an asynchronous audio engine
//! - Event dispatch to registered listeners
//! - Playback history
//! - Mixer, library search and playlists routed over pluggable backends
//! - State persistence across restarts
//!
//! # Architecture
//!
//! `Core` owns every controller and is driven one operation at a time.
//! `CoreHandle` runs it on a dedicated tokio task, so clients and the audio
//! engine talk to it through messages and never share mutable state.
//!
//! Audio output, content and volume are provided through the traits in
//! `lyra-core`. `DummyAudio` and `DummyBackend` implement them in memory.
//!
//! # Example
//!
//! ```rust
//! use lyra_core::Track;
//! use lyra_playback::{Backends, Core, CoreConfig, DummyAudio, DummyBackend};
//! use std::sync::Arc;
//!
//! # async fn example() -> lyra_playback::Result<()> {
//! let backends = Backends::new(vec![Arc::new(DummyBackend::new("dummy"))])?;
//! let audio = Arc::new(DummyAudio::new());
//! let mut core = Core::new(CoreConfig::default(), audio, backends, None)?;
//!
//! core.add(vec![Track::new("dummy:a")], None).await?;
//! core.play(None).await;
//! assert_eq!(core.pending_tl_track().unwrap().track.uri, "dummy:a");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod actor;
pub mod config;
pub mod controller;
pub mod dummy;
pub mod error;
pub mod events;
pub mod history;
pub mod library;
pub mod mixer;
pub mod playback;
pub mod playlists;
pub mod shuffle;
pub mod state;
pub mod tracklist;
pub mod types;

pub use actor::{CoreHandle, PlaybackStatus};
pub use config::{CoreConfig, TRACKLIST_LENGTH_LIMIT};
pub use controller::Core;
pub use dummy::{DummyAudio, DummyBackend};
pub use error::{PlaybackError, Result};
pub use events::{
    BackendEvent, ChannelListener, CoreEvent, CoreListener, EventBus, EventLog, ListenerId,
};
pub use history::{History, HistoryEntry};
pub use library::{Backends, LibraryController};
pub use mixer::{MixerController, SoftwareMixer};
pub use playback::Playback;
pub use playlists::PlaylistsController;
pub use state::{
    CoreState, MixerState, PlaybackSnapshot, StateStore, StoredState, TracklistState,
};
pub use tracklist::Tracklist;
pub use types::{Coverage, Criteria, TracklistField, TracklistOptions};
