//! Hand-hygiene workflow compliance engine.
//!
//! Turns per-frame person observations (track id, region, hairnet and
//! hand-in-sink flags) into discrete compliance and activity events.
//! Detection, region geometry and event persistence live outside this crate.

pub mod config;
pub mod cooldown;
pub mod engine;
pub mod events;
pub mod observation;
pub mod registry;
pub mod rules;
pub mod state;
pub mod time;
pub mod transitions;

// Re-exports for convenience
pub use config::ConfigError;
pub use engine::ComplianceEngine;
pub use events::{ComplianceEvent, EventKind, EventSink, JsonLinesSink, LogSink};
pub use hygiene_types::RuleConfig;
pub use observation::{PersonFrameObservation, RegionTransition, TrackId};
pub use registry::EngineRegistry;
