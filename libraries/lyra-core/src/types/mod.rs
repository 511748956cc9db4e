mod ids;
mod playback_state;
mod playlist;
mod reference;
mod search;
mod track;

pub use ids::{TlTrack, Tlid};
pub use playback_state::PlaybackState;
pub use playlist::Playlist;
pub use reference::{Ref, RefType};
pub use search::{SearchField, SearchQuery, SearchResult};
pub use track::{uri_scheme, Album, Artist, Track};
