/// Tracklist identifiers
use crate::types::Track;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tracklist identifier
///
/// Allocated by the tracklist, starting at 1 and increasing for the lifetime of
/// the tracklist. A tlid is never reused, even after its entry is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tlid(u32);

impl Tlid {
    /// The first identifier handed out by an empty tracklist
    pub const FIRST: Tlid = Tlid(1);

    /// Create a tracklist ID
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the inner value
    pub fn get(self) -> u32 {
        self.0
    }

    /// The identifier allocated after this one
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Tlid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Tlid {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// A track queued in the tracklist
///
/// The same `Track` may be queued several times; the tlid tells the entries
/// apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TlTrack {
    /// Tracklist ID
    pub tlid: Tlid,

    /// The queued track
    pub track: Track,
}

impl TlTrack {
    /// Pair a tracklist ID with a track
    pub fn new(tlid: Tlid, track: Track) -> Self {
        Self { tlid, track }
    }
}
