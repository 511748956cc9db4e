//! Library search queries and results
use crate::types::{Album, Artist, Track};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Track field a search term applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    /// Any of the text fields below
    Any,
    Uri,
    TrackName,
    Album,
    Artist,
    Albumartist,
    Genre,
    Date,
    Comment,
    MusicbrainzId,
}

impl SearchField {
    /// Parse a field name as used in queries
    pub fn parse(name: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(name.to_string())).ok()
    }
}

/// Search terms per field
///
/// A track matches when, for every field, it matches every term given for
/// that field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchQuery {
    terms: BTreeMap<SearchField, Vec<String>>,
}

impl SearchQuery {
    /// Empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a term for `field`
    #[must_use]
    pub fn with(mut self, field: SearchField, term: impl Into<String>) -> Self {
        self.terms.entry(field).or_default().push(term.into());
        self
    }

    /// Whether the query has no terms at all
    pub fn is_empty(&self) -> bool {
        self.terms.values().all(Vec::is_empty)
    }

    /// Terms per field
    pub fn terms(&self) -> impl Iterator<Item = (SearchField, &[String])> {
        self.terms
            .iter()
            .map(|(field, terms)| (*field, terms.as_slice()))
    }

    /// Whether `track` satisfies every term
    ///
    /// Exact matching compares whole values; otherwise a term matches any
    /// value containing it, ignoring case.
    pub fn matches(&self, track: &Track, exact: bool) -> bool {
        self.terms.iter().all(|(field, terms)| {
            let values = field_values(track, *field);
            terms
                .iter()
                .all(|term| values.iter().any(|value| term_matches(value, term, exact)))
        })
    }
}

fn term_matches(value: &str, term: &str, exact: bool) -> bool {
    if exact {
        value == term
    } else {
        value.to_lowercase().contains(&term.to_lowercase())
    }
}

fn artist_names(artists: &[Artist]) -> impl Iterator<Item = &str> {
    artists.iter().filter_map(|artist| artist.name.as_deref())
}

fn field_values(track: &Track, field: SearchField) -> Vec<&str> {
    let album = track.album.as_ref();
    match field {
        SearchField::Any => [
            SearchField::Uri,
            SearchField::TrackName,
            SearchField::Album,
            SearchField::Artist,
            SearchField::Albumartist,
            SearchField::Genre,
            SearchField::Date,
            SearchField::Comment,
            SearchField::MusicbrainzId,
        ]
        .into_iter()
        .flat_map(|field| field_values(track, field))
        .collect(),
        SearchField::Uri => vec![track.uri.as_str()],
        SearchField::TrackName => track.name.as_deref().into_iter().collect(),
        SearchField::Album => album.and_then(|a| a.name.as_deref()).into_iter().collect(),
        SearchField::Artist => artist_names(&track.artists).collect(),
        SearchField::Albumartist => album
            .map(|a| artist_names(&a.artists).collect())
            .unwrap_or_default(),
        SearchField::Genre => track.genre.as_deref().into_iter().collect(),
        SearchField::Date => track.date.as_deref().into_iter().collect(),
        SearchField::Comment => track.comment.as_deref().into_iter().collect(),
        SearchField::MusicbrainzId => track.musicbrainz_id.as_deref().into_iter().collect(),
    }
}

/// What one backend found for a search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// URI of the search, if the backend names it
    pub uri: Option<String>,

    /// Matching tracks
    #[serde(default)]
    pub tracks: Vec<Track>,

    /// Matching artists
    #[serde(default)]
    pub artists: Vec<Artist>,

    /// Matching albums
    #[serde(default)]
    pub albums: Vec<Album>,
}
