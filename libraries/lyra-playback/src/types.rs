//! Core types for tracklist modes, filtering, and state restoration

use crate::error::{PlaybackError, Result};
use lyra_core::{TlTrack, Tlid};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Tracklist mode flags
///
/// The four flags are independent; their combination decides how next,
/// previous and end-of-track candidates are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TracklistOptions {
    /// Wrap around at the end of the tracklist
    pub repeat: bool,

    /// Pick tracks in a random order, each once per lap
    pub random: bool,

    /// Stop after the current track (or loop it, with `repeat`)
    pub single: bool,

    /// Remove tracks from the tracklist once played
    pub consume: bool,
}

/// Fields the tracklist can be filtered on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TracklistField {
    Tlid,
    Uri,
    Name,
    Genre,
    Date,
    Comment,
    MusicbrainzId,
}

impl TracklistField {
    /// Field name as used in criteria objects
    pub fn as_str(self) -> &'static str {
        match self {
            TracklistField::Tlid => "tlid",
            TracklistField::Uri => "uri",
            TracklistField::Name => "name",
            TracklistField::Genre => "genre",
            TracklistField::Date => "date",
            TracklistField::Comment => "comment",
            TracklistField::MusicbrainzId => "musicbrainz_id",
        }
    }
}

impl FromStr for TracklistField {
    type Err = PlaybackError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tlid" => Ok(TracklistField::Tlid),
            "uri" => Ok(TracklistField::Uri),
            "name" => Ok(TracklistField::Name),
            "genre" => Ok(TracklistField::Genre),
            "date" => Ok(TracklistField::Date),
            "comment" => Ok(TracklistField::Comment),
            "musicbrainz_id" => Ok(TracklistField::MusicbrainzId),
            other => Err(PlaybackError::invalid_argument(format!(
                "Expected query field to be one of tlid, uri, name, genre, date, comment, \
                 musicbrainz_id, not {other:?}"
            ))),
        }
    }
}

/// Tracklist filter
///
/// Each rule maps a field to a set of candidate values. An entry matches when,
/// for every rule, its field value is one of the candidates. No rules at all
/// match every entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    tlids: BTreeSet<Tlid>,
    fields: BTreeMap<TracklistField, BTreeSet<String>>,
}

impl Criteria {
    /// Criteria matching every entry
    pub fn new() -> Self {
        Self::default()
    }

    /// Criteria matching the given tracklist IDs
    pub fn tlids(tlids: impl IntoIterator<Item = Tlid>) -> Self {
        Self::new().with_tlids(tlids)
    }

    /// Criteria matching the given URIs
    pub fn uris<S: Into<String>>(uris: impl IntoIterator<Item = S>) -> Self {
        Self::new().with_field(TracklistField::Uri, uris)
    }

    /// Add a tlid rule
    #[must_use]
    pub fn with_tlids(mut self, tlids: impl IntoIterator<Item = Tlid>) -> Self {
        self.tlids.extend(tlids);
        self
    }

    /// Add a rule for a track field
    ///
    /// Passing `TracklistField::Tlid` parses the values as tracklist IDs and
    /// silently skips values that are not numbers; use `with_tlids` instead.
    #[must_use]
    pub fn with_field<S: Into<String>>(
        mut self,
        field: TracklistField,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        if field == TracklistField::Tlid {
            let tlids = values
                .into_iter()
                .filter_map(|value| value.into().parse::<u32>().ok())
                .map(Tlid::new);
            return self.with_tlids(tlids);
        }
        self.fields
            .entry(field)
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Parse criteria from a JSON object such as `{"uri": ["a", "b"], "tlid": [1]}`
    ///
    /// Every value must be an array: a bare string would otherwise be matched
    /// character by character, so it is rejected.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            PlaybackError::invalid_argument(format!("Expected a query dictionary, not {value}"))
        })?;

        let mut criteria = Self::new();
        for (key, values) in object {
            let field: TracklistField = key.parse()?;
            let values = values.as_array().ok_or_else(|| {
                PlaybackError::invalid_argument(format!(
                    "Expected \"{key}\" to be a list of values, not {values}"
                ))
            })?;

            if field == TracklistField::Tlid {
                for tlid in values {
                    let tlid = tlid
                        .as_u64()
                        .and_then(|id| u32::try_from(id).ok())
                        .filter(|id| *id >= 1)
                        .ok_or_else(|| {
                            PlaybackError::invalid_argument(format!(
                                "Expected \"tlid\" values to be positive integers, not {tlid}"
                            ))
                        })?;
                    criteria.tlids.insert(Tlid::new(tlid));
                }
                continue;
            }

            let mut strings = BTreeSet::new();
            for item in values {
                match item.as_str() {
                    Some(s) if !s.trim().is_empty() => {
                        strings.insert(s.to_string());
                    }
                    _ => {
                        return Err(PlaybackError::invalid_argument(format!(
                            "Expected \"{key}\" to be a list of strings, not {item}"
                        )))
                    }
                }
            }
            criteria.fields.entry(field).or_default().extend(strings);
        }

        Ok(criteria)
    }

    /// Whether the criteria has no rules
    pub fn is_empty(&self) -> bool {
        self.tlids.is_empty() && self.fields.is_empty()
    }

    /// Whether a tracklist entry satisfies every rule
    pub fn matches(&self, tl_track: &TlTrack) -> bool {
        if !self.tlids.is_empty() && !self.tlids.contains(&tl_track.tlid) {
            return false;
        }

        let track = &tl_track.track;
        self.fields.iter().all(|(field, candidates)| {
            let value = match field {
                TracklistField::Uri => Some(track.uri.as_str()),
                TracklistField::Name => track.name.as_deref(),
                TracklistField::Genre => track.genre.as_deref(),
                TracklistField::Date => track.date.as_deref(),
                TracklistField::Comment => track.comment.as_deref(),
                TracklistField::MusicbrainzId => track.musicbrainz_id.as_deref(),
                TracklistField::Tlid => None,
            };
            value.is_some_and(|value| candidates.contains(value))
        })
    }
}

/// Parts of saved state to restore
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Coverage {
    /// Tracklist entries and the tlid counter
    Tracklist,
    /// Repeat/random/single/consume flags
    Mode,
    /// Resume the track that was playing (needs `Tracklist`)
    PlayLast,
    /// Volume and mute
    Mixer,
    /// Playback history
    History,
}

impl Coverage {
    /// Every restoration category
    pub const ALL: [Coverage; 5] = [
        Coverage::Tracklist,
        Coverage::Mode,
        Coverage::PlayLast,
        Coverage::Mixer,
        Coverage::History,
    ];

    /// Name as used in configuration
    pub fn as_str(self) -> &'static str {
        match self {
            Coverage::Tracklist => "tracklist",
            Coverage::Mode => "mode",
            Coverage::PlayLast => "play-last",
            Coverage::Mixer => "mixer",
            Coverage::History => "history",
        }
    }
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Coverage {
    type Err = PlaybackError;

    fn from_str(s: &str) -> Result<Self> {
        Coverage::ALL
            .into_iter()
            .find(|coverage| coverage.as_str() == s)
            .ok_or_else(|| PlaybackError::invalid_argument(format!("Unknown coverage: {s}")))
    }
}
