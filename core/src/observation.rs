//! Per-frame input contract from the upstream detector/tracker.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Stable identity assigned by the upstream tracker
pub type TrackId = u64;

/// One tracked person in one processed frame.
///
/// Region containment is decided upstream; `region` is `None` when the person
/// is not inside any named zone this frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonFrameObservation {
    pub track_id: TrackId,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub hairnet_present: bool,
    #[serde(default)]
    pub hand_in_sink: bool,
    /// Overrides the frame time for this observation (replay and tests)
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
}

impl PersonFrameObservation {
    /// Observation outside every region, no hairnet, hands out of the sink
    pub fn new(track_id: TrackId) -> Self {
        Self {
            track_id,
            region: None,
            hairnet_present: false,
            hand_in_sink: false,
            timestamp: None,
        }
    }

    pub fn in_region(track_id: TrackId, region: impl Into<String>) -> Self {
        Self::new(track_id).region(region)
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn hairnet(mut self, present: bool) -> Self {
        self.hairnet_present = present;
        self
    }

    pub fn hand_in_sink(mut self, in_sink: bool) -> Self {
        self.hand_in_sink = in_sink;
        self
    }

    pub fn at(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// A region change for one track. `from == None` is an entry from outside
/// every region, `to == None` an exit to outside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionTransition {
    pub track_id: TrackId,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    /// When the transition happened. Inferred transitions always carry one;
    /// caller-supplied ones fall back to the frame time.
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
}

impl RegionTransition {
    pub fn new(track_id: TrackId, from: Option<&str>, to: Option<&str>) -> Self {
        Self {
            track_id,
            from: from.map(str::to_string),
            to: to.map(str::to_string),
            timestamp: None,
        }
    }

    pub fn at(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// `true` for a move between two named regions, e.g. `sink -> work`
    pub fn is_between(&self, from: &str, to: &str) -> bool {
        self.from.as_deref() == Some(from) && self.to.as_deref() == Some(to)
    }
}
