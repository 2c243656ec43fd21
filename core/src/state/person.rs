use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use hashbrown::HashMap;

/// Temporal state for one tracked person.
///
/// Lifecycle: NotInProcess (no current region) -> InRegion(r) -> ... -> Exited.
/// Exiting keeps `visited` intact; a track that reappears under the same id
/// just transitions again.
#[derive(Debug, Clone)]
pub struct PersonState {
    /// Region occupied at the last processed frame
    pub current_region: Option<String>,
    /// Every region entered during this track's lifetime. Never shrinks.
    visited: BTreeSet<String>,
    /// Entry time per region, removed once the visit's dwell is evaluated
    entered_at: HashMap<String, NaiveDateTime>,
    /// Consecutive stand + hand-in-sink frames
    pub handwash_frames: u32,
    /// Last frame this track was observed or transitioned
    pub last_seen: NaiveDateTime,
}

impl PersonState {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            current_region: None,
            visited: BTreeSet::new(),
            entered_at: HashMap::new(),
            handwash_frames: 0,
            last_seen: now,
        }
    }

    /// Move into `region`. The entry stamp is only set if none is pending,
    /// so an unevaluated earlier visit keeps its original start.
    pub fn enter(&mut self, region: &str, now: NaiveDateTime) {
        self.current_region = Some(region.to_string());
        self.visited.insert(region.to_string());
        if !self.entered_at.contains_key(region) {
            self.entered_at.insert(region.to_string(), now);
        }
    }

    /// Leave the current region without entering another
    pub fn clear_region(&mut self) -> Option<String> {
        self.current_region.take()
    }

    pub fn has_visited(&self, region: &str) -> bool {
        self.visited.contains(region)
    }

    pub fn entered_at(&self, region: &str) -> Option<NaiveDateTime> {
        self.entered_at.get(region).copied()
    }

    /// Remove and return the pending entry stamp for `region`
    pub fn take_entry(&mut self, region: &str) -> Option<NaiveDateTime> {
        self.entered_at.remove(region)
    }

    /// Advance the hand-washing counter. A failing frame resets it to zero.
    pub fn record_handwash_frame(&mut self, qualifies: bool) -> u32 {
        if qualifies {
            self.handwash_frames = self.handwash_frames.saturating_add(1);
        } else {
            self.handwash_frames = 0;
        }
        self.handwash_frames
    }

    pub fn touch(&mut self, now: NaiveDateTime) {
        if now > self.last_seen {
            self.last_seen = now;
        }
    }
}
