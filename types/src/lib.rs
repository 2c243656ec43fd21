//! Shared configuration types for the hygiene workflow monitor.

pub mod config;
pub mod formatting;

pub use config::{DwellThresholds, RegionNames, RegionRole, RuleConfig};
