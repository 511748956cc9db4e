//! Tracklist: the ordered queue of tracks staged for playback
//!
//! The tracklist only owns data. It never talks to playback or to listeners;
//! `Core` runs the playback reaction and emits `tracklist_changed` /
//! `options_changed` after each mutation reported here.

use crate::error::{PlaybackError, Result};
use crate::shuffle::ShuffleBuffer;
use crate::state::TracklistState;
use crate::types::{Criteria, TracklistOptions};
use lyra_core::{TlTrack, Tlid, Track};
use rand::seq::SliceRandom;
use rand::thread_rng;

/// Ordered sequence of queued tracks with repeat/random/single/consume modes
#[derive(Debug, Clone)]
pub struct Tracklist {
    tl_tracks: Vec<TlTrack>,
    next_tlid: Tlid,
    version: u64,
    options: TracklistOptions,
    picks: ShuffleBuffer,
    max_length: usize,
}

impl Tracklist {
    /// Create an empty tracklist holding at most `max_length` entries
    pub fn new(max_length: usize) -> Self {
        Self {
            tl_tracks: Vec::new(),
            next_tlid: Tlid::FIRST,
            version: 0,
            options: TracklistOptions::default(),
            picks: ShuffleBuffer::new(),
            max_length,
        }
    }

    // ===== Queries =====

    /// All entries in tracklist order
    pub fn tl_tracks(&self) -> &[TlTrack] {
        &self.tl_tracks
    }

    /// All tracks in tracklist order
    pub fn tracks(&self) -> Vec<Track> {
        self.tl_tracks.iter().map(|tl| tl.track.clone()).collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.tl_tracks.len()
    }

    /// Whether the tracklist is empty
    pub fn is_empty(&self) -> bool {
        self.tl_tracks.is_empty()
    }

    /// Change counter, increased on every mutation and never reset
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Identifier the next added entry will get
    pub fn next_tlid(&self) -> Tlid {
        self.next_tlid
    }

    /// Maximum number of entries
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Entry with the given tlid
    pub fn get(&self, tlid: Tlid) -> Option<&TlTrack> {
        self.tl_tracks.iter().find(|tl| tl.tlid == tlid)
    }

    /// Position of the entry with the given tlid
    pub fn index(&self, tlid: Tlid) -> Option<usize> {
        self.tl_tracks.iter().position(|tl| tl.tlid == tlid)
    }

    /// Entries in `[start, end)`, clamped to the tracklist bounds
    pub fn slice(&self, start: usize, end: usize) -> Vec<TlTrack> {
        let end = end.min(self.len());
        let start = start.min(end);
        self.tl_tracks[start..end].to_vec()
    }

    /// Entries matching every rule of `criteria`, in tracklist order
    pub fn filter(&self, criteria: &Criteria) -> Vec<TlTrack> {
        self.tl_tracks
            .iter()
            .filter(|tl| criteria.matches(tl))
            .cloned()
            .collect()
    }

    // ===== Modes =====

    /// Current mode flags
    pub fn options(&self) -> TracklistOptions {
        self.options
    }

    /// Set repeat mode; returns whether the flag changed
    pub fn set_repeat(&mut self, value: bool) -> bool {
        let changed = self.options.repeat != value;
        self.options.repeat = value;
        changed
    }

    /// Set random mode; returns whether the flag changed
    ///
    /// Enabling random always starts a fresh lap so that the very next
    /// selection is already random.
    pub fn set_random(&mut self, value: bool) -> bool {
        let changed = self.options.random != value;
        self.options.random = value;
        if value {
            self.refill_picks();
        } else {
            self.picks.clear();
        }
        changed
    }

    /// Set single mode; returns whether the flag changed
    pub fn set_single(&mut self, value: bool) -> bool {
        let changed = self.options.single != value;
        self.options.single = value;
        changed
    }

    /// Set consume mode; returns whether the flag changed
    pub fn set_consume(&mut self, value: bool) -> bool {
        let changed = self.options.consume != value;
        self.options.consume = value;
        changed
    }

    fn refill_picks(&mut self) {
        tracing::debug!("Shuffling tracks");
        self.picks.refill(self.tl_tracks.iter().map(|tl| tl.tlid));
    }

    // ===== Selection =====

    /// Track to play when the user asks for the next one
    ///
    /// With random enabled this is the head of the current lap; it stays the
    /// head until `mark_playing` or `mark_unplayable` consumes it.
    pub fn next_track(&mut self, reference: Option<&TlTrack>) -> Option<TlTrack> {
        if self.tl_tracks.is_empty() {
            return None;
        }

        if self.options.random {
            if self.picks.is_empty() && (self.options.repeat || reference.is_none()) {
                self.refill_picks();
            }
            return self
                .picks
                .peek()
                .and_then(|tlid| self.get(tlid))
                .cloned();
        }

        let len = self.tl_tracks.len();
        let mut next_index = reference
            .and_then(|tl| self.index(tl.tlid))
            .map_or(0, |index| index + 1);

        if self.options.repeat {
            if self.options.consume && len == 1 {
                return None;
            }
            next_index %= len;
        } else if next_index >= len {
            return None;
        }

        self.tl_tracks.get(next_index).cloned()
    }

    /// Track to play when the user asks for the previous one
    ///
    /// Random and consume have no stable notion of "before", so the reference
    /// itself is returned. With repeat the first entry wraps to the last one.
    pub fn previous_track(&self, reference: Option<&TlTrack>) -> Option<TlTrack> {
        if self.options.random || self.options.consume {
            return reference.cloned();
        }

        let position = reference.and_then(|tl| self.index(tl.tlid))?;
        match position {
            0 if self.options.repeat => self.tl_tracks.last().cloned(),
            0 => None,
            position => self.tl_tracks.get(position - 1).cloned(),
        }
    }

    /// Track to play when the reference finishes on its own
    pub fn eot_track(&mut self, reference: Option<&TlTrack>) -> Option<TlTrack> {
        if self.options.single && self.options.repeat {
            return reference.cloned();
        }
        if self.options.single {
            return None;
        }
        self.next_track(reference)
    }

    // ===== Mutations =====

    /// Insert tracks at `at_position` (or append), allocating a tlid per track
    ///
    /// Nothing is inserted when the result would exceed the maximum length.
    /// The version only changes when at least one track was added.
    pub fn add(&mut self, tracks: Vec<Track>, at_position: Option<usize>) -> Result<Vec<TlTrack>> {
        if let Some(at) = at_position {
            if at > self.tl_tracks.len() {
                return Err(PlaybackError::invalid_argument(format!(
                    "at_position {at} is beyond the tracklist length {}",
                    self.tl_tracks.len()
                )));
            }
        }
        if self.tl_tracks.len() + tracks.len() > self.max_length {
            return Err(PlaybackError::CapacityExceeded {
                max: self.max_length,
            });
        }
        if tracks.is_empty() {
            return Ok(Vec::new());
        }

        let added: Vec<TlTrack> = tracks
            .into_iter()
            .map(|track| {
                let tl_track = TlTrack::new(self.next_tlid, track);
                self.next_tlid = self.next_tlid.next();
                tl_track
            })
            .collect();

        let at = at_position.unwrap_or(self.tl_tracks.len());
        self.tl_tracks.splice(at..at, added.iter().cloned());

        if self.options.random {
            self.picks.extend(added.iter().map(|tl| tl.tlid));
        }
        self.version += 1;

        Ok(added)
    }

    /// Remove every entry matching `criteria`
    ///
    /// Returns the removed entries; the version is untouched when nothing
    /// matched.
    pub fn remove(&mut self, criteria: &Criteria) -> Vec<TlTrack> {
        let (removed, kept): (Vec<TlTrack>, Vec<TlTrack>) = std::mem::take(&mut self.tl_tracks)
            .into_iter()
            .partition(|tl| criteria.matches(tl));
        self.tl_tracks = kept;

        if !removed.is_empty() {
            self.picks
                .retain(|tlid| !removed.iter().any(|tl| tl.tlid == tlid));
            self.version += 1;
        }
        removed
    }

    /// Remove every entry; always counts as a change
    pub fn clear(&mut self) {
        self.tl_tracks.clear();
        self.picks.clear();
        self.version += 1;
    }

    /// Move the entries in `[start, end)` to `to_position`, keeping their order
    ///
    /// `start == end` moves the single entry at `start`.
    pub fn move_range(&mut self, start: usize, end: usize, to_position: usize) -> Result<()> {
        let end = if start == end { end + 1 } else { end };
        let len = self.tl_tracks.len();

        if start >= end {
            return Err(PlaybackError::invalid_argument(
                "start must be smaller than end",
            ));
        }
        if end > len {
            return Err(PlaybackError::invalid_argument(
                "end can not be larger than tracklist length",
            ));
        }
        if to_position > len {
            return Err(PlaybackError::invalid_argument(
                "to_position can not be larger than tracklist length",
            ));
        }

        let moved: Vec<TlTrack> = self.tl_tracks.drain(start..end).collect();
        let at = to_position.min(self.tl_tracks.len());
        self.tl_tracks.splice(at..at, moved);
        self.version += 1;
        Ok(())
    }

    /// Randomly permute `[start, end)`, defaulting to the whole tracklist
    pub fn shuffle(&mut self, start: Option<usize>, end: Option<usize>) -> Result<()> {
        let len = self.tl_tracks.len();
        if let (Some(start), Some(end)) = (start, end) {
            if start >= end {
                return Err(PlaybackError::invalid_argument(
                    "start must be smaller than end",
                ));
            }
        }
        if start.is_some_and(|start| start > 0 && start >= len) {
            return Err(PlaybackError::invalid_argument(
                "start can not be larger than tracklist length",
            ));
        }
        if end.is_some_and(|end| end > len) {
            return Err(PlaybackError::invalid_argument(
                "end can not be larger than tracklist length",
            ));
        }

        let end = end.unwrap_or(len);
        let start = start.unwrap_or(0);
        self.tl_tracks[start..end].shuffle(&mut thread_rng());
        self.version += 1;
        Ok(())
    }

    /// Replace the entries with restored ones
    ///
    /// The tlid counter never goes backwards, so restored identifiers cannot
    /// collide with ones handed out before.
    pub fn restore(&mut self, tl_tracks: Vec<TlTrack>, next_tlid: Tlid) {
        let highest = tl_tracks
            .iter()
            .map(|tl| tl.tlid.next())
            .max()
            .unwrap_or(Tlid::FIRST);
        self.next_tlid = self.next_tlid.max(next_tlid).max(highest);
        self.tl_tracks = tl_tracks;
        if self.options.random {
            self.refill_picks();
        } else {
            self.picks.clear();
        }
        self.version += 1;
    }

    // ===== Playback lifecycle hooks =====

    /// The entry started playing; it leaves the current random lap
    pub fn mark_playing(&mut self, tl_track: &TlTrack) {
        if self.options.random {
            self.picks.consume(tl_track.tlid);
        }
    }

    /// The entry could not be played
    ///
    /// Under consume the entry is also removed; returns whether it was.
    pub fn mark_unplayable(&mut self, tl_track: &TlTrack) -> bool {
        tracing::warn!("Track is not playable: {}", tl_track.track.uri);

        let removed = self.options.consume
            && !self.remove(&Criteria::tlids([tl_track.tlid])).is_empty();
        if self.options.random {
            self.picks.consume(tl_track.tlid);
        }
        removed
    }

    /// The entry finished playing
    ///
    /// Under consume the entry is removed; returns whether it was.
    pub fn mark_played(&mut self, tl_track: Option<&TlTrack>) -> bool {
        match tl_track {
            Some(tl_track) if self.options.consume => {
                !self.remove(&Criteria::tlids([tl_track.tlid])).is_empty()
            }
            _ => false,
        }
    }

    // ===== Persistence =====

    /// Snapshot of entries, tlid counter and modes
    pub fn save_state(&self) -> TracklistState {
        TracklistState {
            tl_tracks: self.tl_tracks.clone(),
            next_tlid: self.next_tlid,
            options: self.options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===== Helpers =====

    fn track(uri: &str) -> Track {
        Track::new(uri).with_length(1234)
    }

    fn tracklist_with(uris: &[&str]) -> Tracklist {
        let mut tracklist = Tracklist::new(100);
        tracklist
            .add(uris.iter().map(|uri| track(uri)).collect(), None)
            .unwrap();
        tracklist
    }

    fn uris(tl_tracks: &[TlTrack]) -> Vec<&str> {
        tl_tracks.iter().map(|tl| tl.track.uri.as_str()).collect()
    }

    // ===== Add / remove =====

    #[test]
    fn test_add_allocates_increasing_tlids() {
        let tracklist = tracklist_with(&["dummy:a", "dummy:b", "dummy:a"]);
        let tlids: Vec<u32> = tracklist.tl_tracks().iter().map(|tl| tl.tlid.get()).collect();
        assert_eq!(tlids, vec![1, 2, 3]);
        assert_eq!(tracklist.version(), 1);
    }

    #[test]
    fn test_add_empty_does_not_bump_version() {
        let mut tracklist = Tracklist::new(10);
        assert!(tracklist.add(vec![], None).unwrap().is_empty());
        assert_eq!(tracklist.version(), 0);
    }

    #[test]
    fn test_add_at_position_inserts_in_order() {
        let mut tracklist = tracklist_with(&["dummy:a", "dummy:d"]);
        tracklist
            .add(vec![track("dummy:b"), track("dummy:c")], Some(1))
            .unwrap();
        assert_eq!(
            uris(tracklist.tl_tracks()),
            vec!["dummy:a", "dummy:b", "dummy:c", "dummy:d"]
        );
    }

    #[test]
    fn test_add_beyond_length_is_invalid() {
        let mut tracklist = tracklist_with(&["dummy:a"]);
        let err = tracklist.add(vec![track("dummy:b")], Some(2)).unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidArgument(_)));
        assert_eq!(tracklist.len(), 1);
    }

    #[test]
    fn test_add_over_capacity_leaves_tracklist_untouched() {
        let mut tracklist = Tracklist::new(2);
        tracklist.add(vec![track("dummy:a")], None).unwrap();

        let err = tracklist
            .add(vec![track("dummy:b"), track("dummy:c")], None)
            .unwrap_err();
        assert!(matches!(err, PlaybackError::CapacityExceeded { max: 2 }));
        assert_eq!(tracklist.len(), 1);
        assert_eq!(tracklist.version(), 1);
        assert_eq!(tracklist.next_tlid(), Tlid::new(2));
    }

    #[test]
    fn test_remove_never_reuses_tlids() {
        let mut tracklist = tracklist_with(&["dummy:a", "dummy:b"]);
        let removed = tracklist.remove(&Criteria::uris(["dummy:b"]));
        assert_eq!(removed.len(), 1);

        let added = tracklist.add(vec![track("dummy:c")], None).unwrap();
        assert_eq!(added[0].tlid, Tlid::new(3));
    }

    #[test]
    fn test_remove_without_match_is_noop() {
        let mut tracklist = tracklist_with(&["dummy:a"]);
        let version = tracklist.version();
        assert!(tracklist.remove(&Criteria::uris(["dummy:x"])).is_empty());
        assert_eq!(tracklist.version(), version);
    }

    #[test]
    fn test_clear_always_bumps_version() {
        let mut tracklist = Tracklist::new(10);
        tracklist.clear();
        tracklist.clear();
        assert_eq!(tracklist.version(), 2);
    }

    #[test]
    fn test_slice_is_clamped() {
        let tracklist = tracklist_with(&["dummy:a", "dummy:b", "dummy:c"]);
        assert_eq!(uris(&tracklist.slice(1, 2)), vec!["dummy:b"]);
        assert_eq!(uris(&tracklist.slice(2, 10)), vec!["dummy:c"]);
        assert!(tracklist.slice(5, 1).is_empty());
    }

    // ===== Move / shuffle =====

    #[test]
    fn test_move_to_end() {
        let mut tracklist = tracklist_with(&["dummy:a", "dummy:b", "dummy:c"]);
        tracklist.move_range(0, 1, 2).unwrap();
        assert_eq!(
            uris(tracklist.tl_tracks()),
            vec!["dummy:b", "dummy:c", "dummy:a"]
        );
        assert_eq!(tracklist.version(), 2);
    }

    #[test]
    fn test_move_single_item_when_start_equals_end() {
        let mut tracklist = tracklist_with(&["dummy:a", "dummy:b", "dummy:c"]);
        tracklist.move_range(2, 2, 0).unwrap();
        assert_eq!(
            uris(tracklist.tl_tracks()),
            vec!["dummy:c", "dummy:a", "dummy:b"]
        );
    }

    #[test]
    fn test_move_range_keeps_internal_order() {
        let mut tracklist = tracklist_with(&["dummy:a", "dummy:b", "dummy:c", "dummy:d"]);
        tracklist.move_range(0, 2, 4).unwrap();
        assert_eq!(
            uris(tracklist.tl_tracks()),
            vec!["dummy:c", "dummy:d", "dummy:a", "dummy:b"]
        );
    }

    #[test]
    fn test_move_rejects_bad_ranges() {
        let mut tracklist = tracklist_with(&["dummy:a", "dummy:b", "dummy:c"]);
        assert!(tracklist.move_range(2, 1, 0).is_err());
        assert!(tracklist.move_range(0, 4, 0).is_err());
        assert!(tracklist.move_range(0, 1, 4).is_err());
        assert_eq!(tracklist.version(), 1);
    }

    #[test]
    fn test_shuffle_subrange_keeps_outside_entries() {
        let mut tracklist = tracklist_with(&["dummy:a", "dummy:b", "dummy:c", "dummy:d"]);
        tracklist.shuffle(Some(1), Some(3)).unwrap();
        let order = uris(tracklist.tl_tracks());
        assert_eq!(order[0], "dummy:a");
        assert_eq!(order[3], "dummy:d");
        assert_eq!(tracklist.version(), 2);
    }

    #[test]
    fn test_shuffle_rejects_bad_ranges() {
        let mut tracklist = tracklist_with(&["dummy:a", "dummy:b"]);
        assert!(tracklist.shuffle(Some(1), Some(1)).is_err());
        assert!(tracklist.shuffle(None, Some(3)).is_err());
        assert!(tracklist.shuffle(Some(2), None).is_err());
        assert!(tracklist.shuffle(Some(5), None).is_err());
        assert_eq!(tracklist.version(), 1);
    }

    // ===== Selection =====

    #[test]
    fn test_next_walks_in_order_and_stops() {
        let mut tracklist = tracklist_with(&["dummy:a", "dummy:b"]);
        let first = tracklist.next_track(None).unwrap();
        let second = tracklist.next_track(Some(&first)).unwrap();
        assert_eq!(second.track.uri, "dummy:b");
        assert!(tracklist.next_track(Some(&second)).is_none());
    }

    #[test]
    fn test_next_with_repeat_wraps() {
        let mut tracklist = tracklist_with(&["dummy:a", "dummy:b"]);
        tracklist.set_repeat(true);
        let last = tracklist.tl_tracks()[1].clone();
        assert_eq!(
            tracklist.next_track(Some(&last)).unwrap().track.uri,
            "dummy:a"
        );
    }

    #[test]
    fn test_next_with_repeat_and_consume_on_last_entry() {
        let mut tracklist = tracklist_with(&["dummy:a"]);
        tracklist.set_repeat(true);
        tracklist.set_consume(true);
        let only = tracklist.tl_tracks()[0].clone();
        assert!(tracklist.next_track(Some(&only)).is_none());
    }

    #[test]
    fn test_next_from_removed_reference_starts_over() {
        let mut tracklist = tracklist_with(&["dummy:a", "dummy:b"]);
        let ghost = TlTrack::new(Tlid::new(99), track("dummy:x"));
        assert_eq!(
            tracklist.next_track(Some(&ghost)).unwrap().track.uri,
            "dummy:a"
        );
    }

    #[test]
    fn test_eot_with_single() {
        let mut tracklist = tracklist_with(&["dummy:a", "dummy:b"]);
        let first = tracklist.tl_tracks()[0].clone();

        tracklist.set_single(true);
        assert!(tracklist.eot_track(Some(&first)).is_none());

        tracklist.set_repeat(true);
        assert_eq!(tracklist.eot_track(Some(&first)), Some(first));
    }

    #[test]
    fn test_previous_in_order() {
        let tracklist = tracklist_with(&["dummy:a", "dummy:b"]);
        let first = tracklist.tl_tracks()[0].clone();
        let second = tracklist.tl_tracks()[1].clone();
        assert_eq!(tracklist.previous_track(Some(&second)), Some(first.clone()));
        assert!(tracklist.previous_track(Some(&first)).is_none());
        assert!(tracklist.previous_track(None).is_none());
    }

    #[test]
    fn test_previous_with_repeat_wraps_to_last() {
        let mut tracklist = tracklist_with(&["dummy:a", "dummy:b", "dummy:c"]);
        tracklist.set_repeat(true);
        let first = tracklist.tl_tracks()[0].clone();
        assert_eq!(
            tracklist.previous_track(Some(&first)).unwrap().track.uri,
            "dummy:c"
        );
    }

    #[test]
    fn test_previous_with_consume_or_random_returns_reference() {
        let mut tracklist = tracklist_with(&["dummy:a", "dummy:b"]);
        let second = tracklist.tl_tracks()[1].clone();

        tracklist.set_consume(true);
        assert_eq!(tracklist.previous_track(Some(&second)), Some(second.clone()));

        tracklist.set_consume(false);
        tracklist.set_random(true);
        assert_eq!(tracklist.previous_track(Some(&second)), Some(second));
    }

    #[test]
    fn test_random_lap_visits_each_once() {
        let mut tracklist = tracklist_with(&["dummy:a", "dummy:b", "dummy:c", "dummy:d"]);
        tracklist.set_random(true);

        let mut seen = Vec::new();
        let mut current: Option<TlTrack> = None;
        while let Some(next) = tracklist.next_track(current.as_ref()) {
            tracklist.mark_playing(&next);
            seen.push(next.tlid);
            current = Some(next);
        }

        seen.sort();
        let all: Vec<Tlid> = tracklist.tl_tracks().iter().map(|tl| tl.tlid).collect();
        assert_eq!(seen, all);
    }

    #[test]
    fn test_random_peek_is_stable_until_marked() {
        let mut tracklist = tracklist_with(&["dummy:a", "dummy:b", "dummy:c"]);
        tracklist.set_random(true);
        let first = tracklist.next_track(None);
        assert_eq!(tracklist.next_track(None), first);
    }

    #[test]
    fn test_random_append_mid_lap_extends_picks() {
        let mut tracklist = tracklist_with(&["dummy:a", "dummy:b"]);
        tracklist.set_random(true);
        let first = tracklist.next_track(None).unwrap();
        tracklist.mark_playing(&first);

        tracklist.add(vec![track("dummy:c")], None).unwrap();

        let mut rest = Vec::new();
        let mut current = Some(first.clone());
        while let Some(next) = tracklist.next_track(current.as_ref()) {
            tracklist.mark_playing(&next);
            rest.push(next.tlid);
            current = Some(next);
        }
        assert_eq!(rest.len(), 2);
        assert!(!rest.contains(&first.tlid));
    }

    #[test]
    fn test_set_flags_report_changes() {
        let mut tracklist = Tracklist::new(10);
        assert!(tracklist.set_repeat(true));
        assert!(!tracklist.set_repeat(true));
        assert!(tracklist.set_random(true));
        assert!(!tracklist.set_random(true));
        assert!(!tracklist.set_single(false));
        assert!(tracklist.set_consume(true));
        assert_eq!(tracklist.version(), 0);
    }

    // ===== Lifecycle hooks =====

    #[test]
    fn test_mark_played_with_consume_removes_entry() {
        let mut tracklist = tracklist_with(&["dummy:a", "dummy:b"]);
        let first = tracklist.tl_tracks()[0].clone();

        assert!(!tracklist.mark_played(Some(&first)));
        assert_eq!(tracklist.len(), 2);

        tracklist.set_consume(true);
        assert!(tracklist.mark_played(Some(&first)));
        assert_eq!(uris(tracklist.tl_tracks()), vec!["dummy:b"]);
        assert!(!tracklist.mark_played(None));
    }

    #[test]
    fn test_mark_unplayable_with_consume_removes_entry() {
        let mut tracklist = tracklist_with(&["dummy:a", "dummy:b"]);
        tracklist.set_consume(true);
        let first = tracklist.tl_tracks()[0].clone();
        assert!(tracklist.mark_unplayable(&first));
        assert_eq!(tracklist.len(), 1);
    }

    #[test]
    fn test_restore_keeps_tlid_counter_monotonic() {
        let mut tracklist = tracklist_with(&["dummy:a", "dummy:b", "dummy:c"]);
        let saved = vec![TlTrack::new(Tlid::new(1), track("dummy:x"))];
        tracklist.restore(saved, Tlid::new(2));

        assert_eq!(tracklist.len(), 1);
        assert_eq!(tracklist.next_tlid(), Tlid::new(4));
        assert_eq!(tracklist.version(), 2);
    }
}
