//! Compliance rules.
//!
//! Each rule is a function from one observation or one resolved transition
//! (plus the track's state) to at most one candidate event. The engine calls
//! them in a fixed order: hairnet per observation, then skip-drying and dwell
//! per transition, then hand-washing per observation.

use chrono::{NaiveDateTime, TimeDelta};
use hygiene_types::{RegionRole, RuleConfig};

use crate::events::ComplianceEvent;
use crate::observation::PersonFrameObservation;
use crate::state::PersonState;
use crate::time::{delta_secs, secs_to_delta};
use crate::transitions::ResolvedTransition;

/// Rule set bound to one configuration.
#[derive(Debug, Clone)]
pub struct RuleEvaluator {
    config: RuleConfig,
}

impl RuleEvaluator {
    pub fn new(config: RuleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Hairnet admission: anyone at the sink without a hairnet, every frame.
    pub fn hairnet(&self, obs: &PersonFrameObservation, at: NaiveDateTime) -> Option<ComplianceEvent> {
        let region = obs.region.as_deref()?;
        if !self.config.regions.is(region, RegionRole::Sink) || obs.hairnet_present {
            return None;
        }
        Some(ComplianceEvent::no_hairnet_at_sink(obs.track_id, at, region))
    }

    /// Process order: sink straight to work with no dryer visit this lifetime.
    pub fn skip_drying(
        &self,
        resolved: &ResolvedTransition,
        state: Option<&PersonState>,
    ) -> Option<ComplianceEvent> {
        let regions = &self.config.regions;
        let (sink, work, dryer) = (&regions.sink, &regions.work, &regions.dryer);
        if !resolved.transition.is_between(sink, work) {
            return None;
        }
        if state.is_some_and(|s| s.has_visited(dryer)) {
            return None;
        }
        Some(ComplianceEvent::skip_drying(
            resolved.track_id(),
            resolved.at,
            sink,
            work,
        ))
    }

    /// Dwell time: a timed region left before its minimum (strictly less).
    /// The entry stamp was consumed on apply, so each visit is judged once.
    pub fn dwell(&self, resolved: &ResolvedTransition) -> Option<ComplianceEvent> {
        let region = resolved.transition.from.as_deref()?;
        let entered = resolved.exited_entry?;
        let required_secs = self.config.min_dwell_for(region)?;

        let dwell = resolved.at.signed_duration_since(entered).max(TimeDelta::zero());
        if dwell >= secs_to_delta(required_secs) {
            return None;
        }
        Some(ComplianceEvent::insufficient_dwell(
            resolved.track_id(),
            resolved.at,
            region,
            delta_secs(dwell),
            required_secs,
        ))
    }

    /// Hand-washing debounce. Updates the track's counter on every
    /// observation; fires on every frame once the requirement is met.
    pub fn handwashing(
        &self,
        obs: &PersonFrameObservation,
        at: NaiveDateTime,
        state: &mut PersonState,
    ) -> Option<ComplianceEvent> {
        let stand = &self.config.regions.stand;
        let qualifies = obs.hand_in_sink && obs.region.as_deref() == Some(stand.as_str());
        let consecutive = state.record_handwash_frame(qualifies);

        let required = self.config.handwash_min_consecutive_frames;
        if !qualifies || consecutive < required {
            return None;
        }
        Some(ComplianceEvent::handwashing_active(
            obs.track_id,
            at,
            stand,
            consecutive,
            required,
        ))
    }
}
