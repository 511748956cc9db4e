/// Track domain types
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Artist credited on a track or album
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artist {
    /// Artist URI
    pub uri: Option<String>,

    /// Artist name
    pub name: Option<String>,
}

impl Artist {
    /// Create an artist with only a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uri: None,
            name: Some(name.into()),
        }
    }
}

/// Album a track belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Album {
    /// Album URI
    pub uri: Option<String>,

    /// Album name
    pub name: Option<String>,

    /// Album artists
    #[serde(default)]
    pub artists: Vec<Artist>,

    /// Number of tracks on the album
    pub num_tracks: Option<u32>,

    /// Release date (`YYYY` or `YYYY-MM-DD`)
    pub date: Option<String>,
}

impl Album {
    /// Create an album with only a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uri: None,
            name: Some(name.into()),
            artists: Vec::new(),
            num_tracks: None,
            date: None,
        }
    }
}

/// Immutable description of a playable item
///
/// Tracks are values: "changing" a track means building a new one with the
/// `with_*` methods.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Track {
    /// Track URI; the scheme selects the owning backend
    pub uri: String,

    /// Track name
    pub name: Option<String>,

    /// Track artists
    #[serde(default)]
    pub artists: Vec<Artist>,

    /// Track album
    pub album: Option<Album>,

    /// Genre
    pub genre: Option<String>,

    /// Track number in the album
    pub track_no: Option<u32>,

    /// Disc number in the album
    pub disc_no: Option<u32>,

    /// Release date (`YYYY` or `YYYY-MM-DD`)
    pub date: Option<String>,

    /// Duration in milliseconds; unknown for live streams
    pub length: Option<u64>,

    /// Bitrate in kbit/s
    pub bitrate: Option<u32>,

    /// Free-form comment
    pub comment: Option<String>,

    /// MusicBrainz recording ID
    pub musicbrainz_id: Option<String>,

    /// Modification time in milliseconds since the Unix epoch
    pub last_modified: Option<i64>,
}

impl Track {
    /// Create a track with only a URI
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: None,
            artists: Vec::new(),
            album: None,
            genre: None,
            track_no: None,
            disc_no: None,
            date: None,
            length: None,
            bitrate: None,
            comment: None,
            musicbrainz_id: None,
            last_modified: None,
        }
    }

    /// Copy of this track with a new name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Copy of this track with new artists
    #[must_use]
    pub fn with_artists(mut self, artists: Vec<Artist>) -> Self {
        self.artists = artists;
        self
    }

    /// Copy of this track with a new album
    #[must_use]
    pub fn with_album(mut self, album: Album) -> Self {
        self.album = Some(album);
        self
    }

    /// Copy of this track with a new length in milliseconds
    #[must_use]
    pub fn with_length(mut self, length_ms: u64) -> Self {
        self.length = Some(length_ms);
        self
    }

    /// Copy of this track with the length removed (live streams)
    #[must_use]
    pub fn without_length(mut self) -> Self {
        self.length = None;
        self
    }

    /// Copy of this track with a new genre
    #[must_use]
    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    /// Get the track length as a Duration
    pub fn duration(&self) -> Option<Duration> {
        self.length.map(Duration::from_millis)
    }

    /// URI scheme of the track, used to route it to a backend
    ///
    /// Returns `None` when the URI cannot be parsed.
    pub fn uri_scheme(&self) -> Option<String> {
        uri_scheme(&self.uri)
    }

    /// Display name used by history and status views: `"Artist, Artist - Name"`
    pub fn display_name(&self) -> String {
        let mut parts = Vec::new();

        let artist_names: Vec<&str> = self
            .artists
            .iter()
            .filter_map(|artist| artist.name.as_deref())
            .collect();
        if !artist_names.is_empty() {
            parts.push(artist_names.join(", "));
        }
        if let Some(name) = &self.name {
            parts.push(name.clone());
        }

        parts.join(" - ")
    }
}

/// Extract the scheme of a URI (`"local:track:x"` -> `"local"`)
pub fn uri_scheme(uri: &str) -> Option<String> {
    url::Url::parse(uri).ok().map(|url| url.scheme().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_scheme() {
        assert_eq!(Track::new("dummy:a").uri_scheme().as_deref(), Some("dummy"));
        assert_eq!(
            Track::new("file:///music/a.flac").uri_scheme().as_deref(),
            Some("file")
        );
        assert_eq!(
            Track::new("https://radio.example/stream").uri_scheme().as_deref(),
            Some("https")
        );
        assert_eq!(Track::new("no scheme here").uri_scheme(), None);
    }

    #[test]
    fn test_display_name_joins_artists_and_name() {
        let track = Track::new("dummy:a")
            .with_name("Song")
            .with_artists(vec![Artist::new("Alice"), Artist::new("Bob")]);
        assert_eq!(track.display_name(), "Alice, Bob - Song");
    }

    #[test]
    fn test_display_name_without_artists() {
        assert_eq!(Track::new("dummy:a").with_name("Song").display_name(), "Song");
        assert_eq!(Track::new("dummy:a").display_name(), "");
    }

    #[test]
    fn test_with_methods_leave_original_untouched() {
        let original = Track::new("dummy:a").with_length(1234);
        let changed = original.clone().without_length();
        assert_eq!(original.length, Some(1234));
        assert_eq!(changed.length, None);
        assert_eq!(original.duration(), Some(Duration::from_millis(1234)));
    }
}
