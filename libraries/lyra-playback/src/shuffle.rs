//! Shuffle buffer for random mode
//!
//! Holds the picks remaining in the current lap. The head is the next random
//! track; it is only consumed once playback actually starts it (or it proved
//! unplayable), so peeking is side-effect free.

use lyra_core::Tlid;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};
use std::collections::VecDeque;

/// Remaining random picks for the current lap
#[derive(Debug, Clone, Default)]
pub struct ShuffleBuffer {
    picks: VecDeque<Tlid>,
}

impl ShuffleBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new lap over the given entries (Fisher-Yates)
    pub fn refill(&mut self, tlids: impl IntoIterator<Item = Tlid>) {
        let mut picks: Vec<Tlid> = tlids.into_iter().collect();
        picks.shuffle(&mut thread_rng());
        self.picks = picks.into();
    }

    /// Next pick without consuming it
    pub fn peek(&self) -> Option<Tlid> {
        self.picks.front().copied()
    }

    /// Remove an entry from the lap
    ///
    /// Returns whether the entry was still pending.
    pub fn consume(&mut self, tlid: Tlid) -> bool {
        match self.picks.iter().position(|pick| *pick == tlid) {
            Some(index) => {
                self.picks.remove(index);
                true
            }
            None => false,
        }
    }

    /// Add entries appended mid-lap at random positions among the remaining picks
    pub fn extend(&mut self, tlids: impl IntoIterator<Item = Tlid>) {
        let mut rng = thread_rng();
        for tlid in tlids {
            let at = rng.gen_range(0..=self.picks.len());
            self.picks.insert(at, tlid);
        }
    }

    /// Keep only the picks still in the tracklist
    pub fn retain(&mut self, mut keep: impl FnMut(Tlid) -> bool) {
        self.picks.retain(|tlid| keep(*tlid));
    }

    /// Drop every remaining pick
    pub fn clear(&mut self) {
        self.picks.clear();
    }

    /// Whether the lap is finished
    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    /// Number of remaining picks
    pub fn len(&self) -> usize {
        self.picks.len()
    }

    /// Whether an entry is still pending in this lap
    pub fn contains(&self, tlid: Tlid) -> bool {
        self.picks.contains(&tlid)
    }
}
