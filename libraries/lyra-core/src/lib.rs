//! Lyra Core
//!
//! Domain types, traits, and error handling shared by every Lyra crate.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `TlTrack`, `Ref`, `Playlist`, `PlaybackState`,
//!   `SearchQuery`
//! - **Collaborator Traits**: `AudioEngine`, `Backend`, `LibraryProvider`,
//!   `PlaybackProvider`, `PlaylistsProvider`, `Mixer`
//! - **Error Handling**: Unified `LyraError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use lyra_core::types::{Artist, Track};
//!
//! let track = Track::new("local:track:song.flac")
//!     .with_name("Song")
//!     .with_artists(vec![Artist::new("Band")])
//!     .with_length(215_000);
//!
//! assert_eq!(track.uri_scheme().as_deref(), Some("local"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{LyraError, Result};
pub use traits::{
    AudioEngine, AudioEvent, AudioEventSink, Backend, LibraryProvider, Mixer, PlaybackProvider,
    PlaylistsProvider, SourceSetupCallback, Tags,
};
pub use types::{
    uri_scheme, Album, Artist, PlaybackState, Playlist, Ref, RefType, SearchField, SearchQuery,
    SearchResult, TlTrack, Tlid, Track,
};
