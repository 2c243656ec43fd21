//! Workflow compliance engine.
//!
//! One engine per camera stream. The detection loop calls [`ComplianceEngine::step`]
//! once per processed frame; the call is synchronous and returns that frame's
//! events in a fixed order:
//!
//! ```text
//!   observations ──┬─► hairnet rule ──────────────────────────┐
//!                  │                                           │
//!                  ├─► transitions (inferred or explicit)      │
//!                  │      └─► apply to store ─► skip-drying ───┤
//!                  │                        └─► dwell ─────────┤
//!                  │                                           ▼
//!                  └─► hand-washing debounce ──────────► cooldown gate ─► events
//! ```
//!
//! After the rules run, tracks idle past the configured timeout are evicted
//! together with their cooldown history.

use chrono::{NaiveDateTime, TimeDelta};
use hashbrown::HashSet;
use hygiene_types::RuleConfig;

use crate::config::{self, ConfigError};
use crate::cooldown::CooldownGate;
use crate::events::{ComplianceEvent, EventSink};
use crate::observation::{PersonFrameObservation, RegionTransition, TrackId};
use crate::rules::RuleEvaluator;
use crate::state::{PersonState, TrackStore};
use crate::time::{secs_to_delta, wall_clock_now};
use crate::transitions::{apply_transition, infer_transitions};

#[cfg(test)]
mod engine_tests;

#[derive(Debug, Clone)]
pub struct ComplianceEngine {
    rules: RuleEvaluator,
    store: TrackStore,
    cooldown: CooldownGate,
    idle_timeout: Option<TimeDelta>,
    frames_processed: u64,
}

impl ComplianceEngine {
    /// Build an engine, rejecting invalid configs up front.
    pub fn new(config: RuleConfig) -> Result<Self, ConfigError> {
        config::validate(&config)?;
        Ok(Self::from_validated(config))
    }

    pub(crate) fn from_validated(config: RuleConfig) -> Self {
        Self {
            cooldown: CooldownGate::new(config.cooldown_secs),
            idle_timeout: config.idle_timeout_secs().map(secs_to_delta),
            rules: RuleEvaluator::new(config),
            store: TrackStore::new(),
            frames_processed: 0,
        }
    }

    // --- Accessors ---

    pub fn config(&self) -> &RuleConfig {
        self.rules.config()
    }

    pub fn track(&self, track_id: TrackId) -> Option<&PersonState> {
        self.store.get(track_id)
    }

    pub fn tracked_count(&self) -> usize {
        self.store.len()
    }

    pub fn cooldown_entries(&self) -> usize {
        self.cooldown.len()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    // --- Processing ---

    /// Process one frame. The frame time is the latest timestamp override among
    /// the inputs, or wall-clock now when none carries one.
    pub fn step(
        &mut self,
        observations: &[PersonFrameObservation],
        explicit: Option<&[RegionTransition]>,
    ) -> Vec<ComplianceEvent> {
        let frame_time = frame_time(observations, explicit).unwrap_or_else(wall_clock_now);
        self.step_at(observations, explicit, frame_time)
    }

    /// Process one frame at a caller-chosen frame time. Inputs without their
    /// own timestamp are stamped with `frame_time`.
    pub fn step_at(
        &mut self,
        observations: &[PersonFrameObservation],
        explicit: Option<&[RegionTransition]>,
        frame_time: NaiveDateTime,
    ) -> Vec<ComplianceEvent> {
        if !self.config().enabled {
            return Vec::new();
        }
        self.frames_processed += 1;

        for obs in observations {
            self.store.touch(obs.track_id, obs.timestamp.unwrap_or(frame_time));
        }
        for transition in explicit.unwrap_or_default() {
            self.store
                .touch(transition.track_id, transition.timestamp.unwrap_or(frame_time));
        }

        let mut candidates = Vec::new();

        for obs in observations {
            let at = obs.timestamp.unwrap_or(frame_time);
            candidates.extend(self.rules.hairnet(obs, at));
        }

        let transitions = match explicit {
            Some(list) => list.to_vec(),
            None => infer_transitions(&self.store, observations, frame_time),
        };
        for transition in &transitions {
            let resolved = apply_transition(&mut self.store, transition, frame_time);
            candidates.extend(
                self.rules
                    .skip_drying(&resolved, self.store.get(resolved.track_id())),
            );
            candidates.extend(self.rules.dwell(&resolved));
        }

        for obs in observations {
            let at = obs.timestamp.unwrap_or(frame_time);
            let state = self.store.touch(obs.track_id, at);
            candidates.extend(self.rules.handwashing(obs, at, state));
        }

        let events: Vec<ComplianceEvent> = candidates
            .into_iter()
            .filter(|event| {
                self.cooldown
                    .should_emit(event.track_id, event.kind, event.timestamp)
            })
            .collect();

        self.housekeeping(observations, explicit, frame_time);
        events
    }

    /// [`step`](Self::step), then hand every emitted event to each sink in order.
    pub fn step_dispatch(
        &mut self,
        observations: &[PersonFrameObservation],
        explicit: Option<&[RegionTransition]>,
        sinks: &mut [&mut dyn EventSink],
    ) -> Vec<ComplianceEvent> {
        let events = self.step(observations, explicit);
        dispatch(&events, sinks);
        events
    }

    fn housekeeping(
        &mut self,
        observations: &[PersonFrameObservation],
        explicit: Option<&[RegionTransition]>,
        frame_time: NaiveDateTime,
    ) {
        self.cooldown.prune(frame_time);

        let Some(timeout) = self.idle_timeout else {
            return;
        };
        let active: HashSet<TrackId> = observations
            .iter()
            .map(|o| o.track_id)
            .chain(explicit.unwrap_or_default().iter().map(|t| t.track_id))
            .collect();

        for track_id in self.store.evict_idle(frame_time, timeout, &active) {
            self.cooldown.forget_track(track_id);
            tracing::debug!(track_id, %frame_time, "Evicted idle track");
        }
    }
}

/// Hand events to sinks in emission order
pub fn dispatch(events: &[ComplianceEvent], sinks: &mut [&mut dyn EventSink]) {
    for event in events {
        for sink in sinks.iter_mut() {
            sink.handle_event(event);
        }
    }
}

/// Latest timestamp override among a frame's inputs
fn frame_time(
    observations: &[PersonFrameObservation],
    explicit: Option<&[RegionTransition]>,
) -> Option<NaiveDateTime> {
    observations
        .iter()
        .filter_map(|o| o.timestamp)
        .chain(explicit.unwrap_or_default().iter().filter_map(|t| t.timestamp))
        .max()
}
