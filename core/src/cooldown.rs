//! Per-(track, kind) suppression of repeated emissions.

use chrono::{NaiveDateTime, TimeDelta};
use hashbrown::HashMap;

use crate::events::EventKind;
use crate::observation::TrackId;
use crate::time::secs_to_delta;

pub type CooldownKey = (TrackId, EventKind);

#[derive(Debug, Clone)]
pub struct CooldownGate {
    window: TimeDelta,
    last_emitted: HashMap<CooldownKey, NaiveDateTime>,
}

impl CooldownGate {
    pub fn new(cooldown_secs: f64) -> Self {
        Self {
            window: secs_to_delta(cooldown_secs),
            last_emitted: HashMap::new(),
        }
    }

    /// Decide whether a candidate may be emitted. On `true`, `now` becomes
    /// the key's last emission time. A zero window passes everything and
    /// records nothing.
    pub fn should_emit(&mut self, track_id: TrackId, kind: EventKind, now: NaiveDateTime) -> bool {
        if self.window <= TimeDelta::zero() {
            return true;
        }

        if let Some(last) = self.last_emitted.get(&(track_id, kind))
            && now.signed_duration_since(*last) < self.window
        {
            tracing::trace!(track_id, %kind, %now, last = %last, "Suppressed by cooldown");
            return false;
        }

        self.last_emitted.insert((track_id, kind), now);
        true
    }

    /// Drop entries whose window has fully elapsed at `now`
    pub fn prune(&mut self, now: NaiveDateTime) {
        let window = self.window;
        self.last_emitted
            .retain(|_, last| now.signed_duration_since(*last) < window);
    }

    /// Drop every entry belonging to `track_id`
    pub fn forget_track(&mut self, track_id: TrackId) {
        self.last_emitted.retain(|(id, _), _| *id != track_id);
    }

    pub fn len(&self) -> usize {
        self.last_emitted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_emitted.is_empty()
    }
}
