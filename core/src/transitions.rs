//! Region transition resolution.
//!
//! Inference diffs each observation's region against the stored current
//! region, then synthesizes exits for region holders missing from the frame.
//! A caller-supplied transition list replaces inference for that call,
//! loss detection included.

use chrono::NaiveDateTime;
use hashbrown::HashSet;

use crate::observation::{PersonFrameObservation, RegionTransition, TrackId};
use crate::state::TrackStore;

/// A transition after it has been applied to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTransition {
    /// The transition as applied, stamped with `at`
    pub transition: RegionTransition,
    pub at: NaiveDateTime,
    /// Entry stamp of the exited region, taken out of the store on apply.
    /// `None` if the track has no pending visit for `from`.
    pub exited_entry: Option<NaiveDateTime>,
}

impl ResolvedTransition {
    pub fn track_id(&self) -> TrackId {
        self.transition.track_id
    }
}

/// Diff observations against stored regions. Read-only: the returned
/// transitions take effect through [`apply_transition`].
///
/// Output order: observation-driven transitions in input order, then
/// synthesized exits for lost tracks in ascending id order.
pub fn infer_transitions(
    store: &TrackStore,
    observations: &[PersonFrameObservation],
    frame_time: NaiveDateTime,
) -> Vec<RegionTransition> {
    let mut transitions = Vec::new();

    for obs in observations {
        let at = obs.timestamp.unwrap_or(frame_time);
        let stored = store
            .get(obs.track_id)
            .and_then(|s| s.current_region.as_deref());

        match (obs.region.as_deref(), stored) {
            (Some(region), stored) if stored != Some(region) => {
                transitions.push(RegionTransition::new(obs.track_id, stored, Some(region)).at(at));
            }
            (None, Some(stored)) => {
                transitions.push(RegionTransition::new(obs.track_id, Some(stored), None).at(at));
            }
            _ => {}
        }
    }

    let present: HashSet<TrackId> = observations.iter().map(|o| o.track_id).collect();
    for track_id in store.lost_tracks(&present) {
        let stored = store
            .get(track_id)
            .and_then(|s| s.current_region.as_deref());
        tracing::debug!(track_id, region = ?stored, "Track lost while in region, synthesizing exit");
        transitions.push(RegionTransition::new(track_id, stored, None).at(frame_time));
    }

    transitions
}

/// Apply one transition to the store: take the exited region's entry stamp,
/// then enter the new region or clear the current one.
pub fn apply_transition(
    store: &mut TrackStore,
    transition: &RegionTransition,
    frame_time: NaiveDateTime,
) -> ResolvedTransition {
    let at = transition.timestamp.unwrap_or(frame_time);
    let state = store.get_or_create(transition.track_id, at);

    let exited_entry = transition
        .from
        .as_deref()
        .and_then(|region| state.take_entry(region));

    match transition.to.as_deref() {
        Some(region) => state.enter(region, at),
        None => {
            state.clear_region();
        }
    }

    tracing::debug!(
        track_id = transition.track_id,
        from = ?transition.from,
        to = ?transition.to,
        %at,
        "Region transition"
    );

    ResolvedTransition {
        transition: transition.clone().at(at),
        at,
        exited_entry,
    }
}
