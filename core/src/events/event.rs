use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::observation::TrackId;

/// Kinds of events the rule engine emits.
/// Closed set: every rule maps to exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// Person at the sink without a hairnet
    NoHairnetAtSink,
    /// Sink straight to work area without visiting the dryer
    SkipDrying,
    /// Left a timed region before its minimum dwell
    InsufficientDwellTime,
    /// Hands in sink at the stand for enough consecutive frames
    HandwashingActive,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::NoHairnetAtSink,
        EventKind::SkipDrying,
        EventKind::InsufficientDwellTime,
        EventKind::HandwashingActive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoHairnetAtSink => "NO_HAIRNET_AT_SINK",
            Self::SkipDrying => "SKIP_DRYING",
            Self::InsufficientDwellTime => "INSUFFICIENT_DWELL_TIME",
            Self::HandwashingActive => "HANDWASHING_ACTIVE",
        }
    }

    /// Activity events describe normal behaviour; everything else is a violation.
    pub fn is_violation(&self) -> bool {
        !matches!(self, Self::HandwashingActive)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compliance or activity event produced by one `step` call.
///
/// `evidence` is a sorted JSON object, so serializing the same event twice
/// always produces the same bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub track_id: TrackId,
    pub timestamp: NaiveDateTime,
    pub evidence: Map<String, Value>,
}

impl ComplianceEvent {
    pub fn new(
        kind: EventKind,
        track_id: TrackId,
        timestamp: NaiveDateTime,
        evidence: Map<String, Value>,
    ) -> Self {
        Self {
            kind,
            track_id,
            timestamp,
            evidence,
        }
    }

    pub fn no_hairnet_at_sink(track_id: TrackId, timestamp: NaiveDateTime, region: &str) -> Self {
        let mut evidence = Map::new();
        evidence.insert("region".into(), region.into());
        Self::new(EventKind::NoHairnetAtSink, track_id, timestamp, evidence)
    }

    pub fn skip_drying(track_id: TrackId, timestamp: NaiveDateTime, from: &str, to: &str) -> Self {
        let mut evidence = Map::new();
        evidence.insert("from".into(), from.into());
        evidence.insert("to".into(), to.into());
        Self::new(EventKind::SkipDrying, track_id, timestamp, evidence)
    }

    pub fn insufficient_dwell(
        track_id: TrackId,
        timestamp: NaiveDateTime,
        region: &str,
        dwell_seconds: f64,
        required_seconds: f64,
    ) -> Self {
        let mut evidence = Map::new();
        evidence.insert("region".into(), region.into());
        evidence.insert("dwell_seconds".into(), dwell_seconds.into());
        evidence.insert("required_seconds".into(), required_seconds.into());
        Self::new(EventKind::InsufficientDwellTime, track_id, timestamp, evidence)
    }

    pub fn handwashing_active(
        track_id: TrackId,
        timestamp: NaiveDateTime,
        region: &str,
        consecutive: u32,
        required_consecutive: u32,
    ) -> Self {
        let mut evidence = Map::new();
        evidence.insert("region".into(), region.into());
        evidence.insert("hand_in_sink".into(), true.into());
        evidence.insert("consecutive".into(), consecutive.into());
        evidence.insert("required_consecutive".into(), required_consecutive.into());
        Self::new(EventKind::HandwashingActive, track_id, timestamp, evidence)
    }

    pub fn region(&self) -> Option<&str> {
        self.evidence.get("region").and_then(Value::as_str)
    }

    pub fn dwell_seconds(&self) -> Option<f64> {
        self.evidence.get("dwell_seconds").and_then(Value::as_f64)
    }
}
