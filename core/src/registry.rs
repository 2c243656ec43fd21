//! Per-camera engine registry.
//!
//! Each camera stream gets its own [`ComplianceEngine`], so track ids from
//! different cameras never share state. The registry itself is plain owned
//! data; callers that drive several cameras from different threads wrap it
//! in a `Mutex` or keep one registry per thread.

use std::collections::BTreeMap;

use hygiene_types::RuleConfig;

use crate::config::{self, ConfigError};
use crate::engine::ComplianceEngine;
use crate::events::ComplianceEvent;
use crate::observation::{PersonFrameObservation, RegionTransition};

#[derive(Debug, Clone)]
pub struct EngineRegistry {
    config: RuleConfig,
    engines: BTreeMap<String, ComplianceEngine>,
}

impl EngineRegistry {
    /// Validate the shared config once; engines created later cannot fail.
    pub fn new(config: RuleConfig) -> Result<Self, ConfigError> {
        config::validate(&config)?;
        Ok(Self {
            config,
            engines: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Engine for `camera`, created on first use
    pub fn engine_mut(&mut self, camera: &str) -> &mut ComplianceEngine {
        let config = &self.config;
        self.engines.entry(camera.to_string()).or_insert_with(|| {
            tracing::info!(camera, "Creating compliance engine for camera");
            ComplianceEngine::from_validated(config.clone())
        })
    }

    pub fn engine(&self, camera: &str) -> Option<&ComplianceEngine> {
        self.engines.get(camera)
    }

    pub fn step(
        &mut self,
        camera: &str,
        observations: &[PersonFrameObservation],
        explicit: Option<&[RegionTransition]>,
    ) -> Vec<ComplianceEvent> {
        self.engine_mut(camera).step(observations, explicit)
    }

    /// Drop a camera's engine and all of its track state
    pub fn remove(&mut self, camera: &str) -> Option<ComplianceEngine> {
        self.engines.remove(camera)
    }

    /// Camera ids in sorted order
    pub fn cameras(&self) -> impl Iterator<Item = &str> {
        self.engines.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}
