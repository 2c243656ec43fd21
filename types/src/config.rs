//! Rule engine configuration.
//!
//! Every field carries a serde default so a partial TOML file (or none at all)
//! still yields a usable configuration. Validation lives in `hygiene-core`,
//! which refuses to build an engine from an invalid config.

use serde::{Deserialize, Serialize};

/// Workflow role a named region plays in the hand-washing process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionRole {
    Entrance,
    Stand,
    Sink,
    Dryer,
    Work,
}

impl RegionRole {
    pub const ALL: [RegionRole; 5] = [
        RegionRole::Entrance,
        RegionRole::Stand,
        RegionRole::Sink,
        RegionRole::Dryer,
        RegionRole::Work,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entrance => "entrance",
            Self::Stand => "stand",
            Self::Sink => "sink",
            Self::Dryer => "dryer",
            Self::Work => "work",
        }
    }
}

/// Region labels as produced by the upstream zone classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionNames {
    pub entrance: String,
    pub stand: String,
    pub sink: String,
    pub dryer: String,
    pub work: String,
}

impl Default for RegionNames {
    fn default() -> Self {
        Self {
            entrance: RegionRole::Entrance.as_str().to_string(),
            stand: RegionRole::Stand.as_str().to_string(),
            sink: RegionRole::Sink.as_str().to_string(),
            dryer: RegionRole::Dryer.as_str().to_string(),
            work: RegionRole::Work.as_str().to_string(),
        }
    }
}

impl RegionNames {
    /// Configured label for a role
    pub fn name(&self, role: RegionRole) -> &str {
        match role {
            RegionRole::Entrance => &self.entrance,
            RegionRole::Stand => &self.stand,
            RegionRole::Sink => &self.sink,
            RegionRole::Dryer => &self.dryer,
            RegionRole::Work => &self.work,
        }
    }

    /// Reverse lookup. Unknown labels map to `None` and are inert to the rules.
    pub fn role_of(&self, region: &str) -> Option<RegionRole> {
        RegionRole::ALL
            .into_iter()
            .find(|role| self.name(*role) == region)
    }

    pub fn is(&self, region: &str, role: RegionRole) -> bool {
        self.name(role) == region
    }
}

/// Minimum dwell per timed region, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DwellThresholds {
    pub stand_secs: f64,
    pub sink_secs: f64,
    pub dryer_secs: f64,
}

impl Default for DwellThresholds {
    fn default() -> Self {
        Self {
            stand_secs: 20.0,
            sink_secs: 5.0,
            dryer_secs: 10.0,
        }
    }
}

impl DwellThresholds {
    /// Threshold for a role, `None` for roles without a dwell requirement
    pub fn for_role(&self, role: RegionRole) -> Option<f64> {
        match role {
            RegionRole::Stand => Some(self.stand_secs),
            RegionRole::Sink => Some(self.sink_secs),
            RegionRole::Dryer => Some(self.dryer_secs),
            RegionRole::Entrance | RegionRole::Work => None,
        }
    }
}

/// Complete configuration for one compliance engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Master switch. A disabled engine ignores every frame.
    pub enabled: bool,

    pub regions: RegionNames,

    pub min_dwell: DwellThresholds,

    /// Minimum seconds between two emissions of one event kind for one track.
    /// Zero disables suppression.
    pub cooldown_secs: f64,

    /// Consecutive stand + hand-in-sink frames before hand-washing counts as active
    pub handwash_min_consecutive_frames: u32,

    /// Tracks unseen for this long are dropped from memory. Zero keeps them forever.
    pub track_idle_timeout_secs: f64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            regions: RegionNames::default(),
            min_dwell: DwellThresholds::default(),
            cooldown_secs: 10.0,
            handwash_min_consecutive_frames: 5,
            track_idle_timeout_secs: 300.0,
        }
    }
}

impl RuleConfig {
    /// Minimum dwell for a region label, if that label is a timed region
    pub fn min_dwell_for(&self, region: &str) -> Option<f64> {
        self.regions
            .role_of(region)
            .and_then(|role| self.min_dwell.for_role(role))
    }

    /// Idle timeout in seconds, `None` when eviction is disabled
    pub fn idle_timeout_secs(&self) -> Option<f64> {
        (self.track_idle_timeout_secs > 0.0).then_some(self.track_idle_timeout_secs)
    }
}
