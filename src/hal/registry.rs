use super::drivers::OpenGazeSource;
use super::mock::{ReplaySource, SimulatedSource};
use super::SampleSource;
use crate::core::Clock;
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

type SourceFactory =
    Box<dyn Fn(&Value, Arc<dyn Clock>) -> Result<Box<dyn SampleSource>> + Send + Sync>;

/// Registry of available sample source families, selected by name at
/// configuration time
pub struct SourceRegistry {
    sources: HashMap<String, SourceFactory>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    /// Registry with every source family this crate ships
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_source("simulated", |params, clock| {
            Ok(Box::new(SimulatedSource::from_params(params, clock)?) as Box<dyn SampleSource>)
        });
        registry.register_source("replay", |params, clock| {
            Ok(Box::new(ReplaySource::from_params(params, clock)?) as Box<dyn SampleSource>)
        });
        registry.register_source("open-gaze", |params, clock| {
            Ok(Box::new(OpenGazeSource::from_params(params, clock)?) as Box<dyn SampleSource>)
        });
        registry
    }

    pub fn register_source<F>(&mut self, kind: &str, factory: F)
    where
        F: Fn(&Value, Arc<dyn Clock>) -> Result<Box<dyn SampleSource>> + Send + Sync + 'static,
    {
        self.sources.insert(kind.to_string(), Box::new(factory));
    }

    pub fn create_source(
        &self,
        kind: &str,
        params: &Value,
        clock: Arc<dyn Clock>,
    ) -> Result<Box<dyn SampleSource>> {
        let factory = self
            .sources
            .get(kind)
            .ok_or_else(|| anyhow!("Unknown sample source: {}", kind))?;
        factory(params, clock).with_context(|| format!("Failed to create {} source", kind))
    }

    pub fn list_sources(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.sources.keys().cloned().collect();
        kinds.sort();
        kinds
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
