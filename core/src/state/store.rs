use chrono::{NaiveDateTime, TimeDelta};
use hashbrown::{HashMap, HashSet};

use crate::observation::TrackId;

use super::PersonState;

/// Pure storage for per-track state.
/// Transition inference lives in `transitions`, rule logic in `rules`.
#[derive(Debug, Clone, Default)]
pub struct TrackStore {
    tracks: HashMap<TrackId, PersonState>,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Accessors ---

    pub fn get(&self, track_id: TrackId) -> Option<&PersonState> {
        self.tracks.get(&track_id)
    }

    /// Fetch a track's state, creating it on first sight, and mark it seen at `now`
    pub fn touch(&mut self, track_id: TrackId, now: NaiveDateTime) -> &mut PersonState {
        let state = self
            .tracks
            .entry(track_id)
            .or_insert_with(|| PersonState::new(now));
        state.touch(now);
        state
    }

    /// Fetch a track's state, creating it on first sight, without marking it seen.
    /// Synthesized exits go through here so a lost track still ages out.
    pub fn get_or_create(&mut self, track_id: TrackId, now: NaiveDateTime) -> &mut PersonState {
        self.tracks
            .entry(track_id)
            .or_insert_with(|| PersonState::new(now))
    }

    pub fn contains(&self, track_id: TrackId) -> bool {
        self.tracks.contains_key(&track_id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Tracks absent from `present` that still occupy a region, in ascending id order
    pub fn lost_tracks(&self, present: &HashSet<TrackId>) -> Vec<TrackId> {
        let mut lost: Vec<TrackId> = self
            .tracks
            .iter()
            .filter(|(id, state)| !present.contains(*id) && state.current_region.is_some())
            .map(|(id, _)| *id)
            .collect();
        lost.sort_unstable();
        lost
    }

    // --- Eviction ---

    /// Drop tracks not seen within `idle_timeout` of `now`, sparing ids in `active`.
    /// Returns the evicted ids in ascending order.
    pub fn evict_idle(
        &mut self,
        now: NaiveDateTime,
        idle_timeout: TimeDelta,
        active: &HashSet<TrackId>,
    ) -> Vec<TrackId> {
        let mut evicted = Vec::new();
        self.tracks.retain(|id, state| {
            let keep = active.contains(id)
                || now.signed_duration_since(state.last_seen) < idle_timeout;
            if !keep {
                evicted.push(*id);
            }
            keep
        });
        evicted.sort_unstable();
        evicted
    }
}
