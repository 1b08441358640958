use crate::filter::FilterKernel;
use crate::hal::TrackerGeometry;
use crate::resilience::ReconnectPolicy;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Complete runtime configuration. Every field has a default, so a partial
/// JSON document is enough.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GazeConfig {
    pub source: SourceConfig,
    pub geometry: TrackerGeometry,
    pub filter: FilterConfig,
    pub estimator: EstimatorConfig,
    pub reconnect: ReconnectPolicy,
    pub magnification: MagnificationConfig,
    pub scroll: ScrollConfig,
    pub trigger: TriggerConfig,
    pub host: HostConfig,
}

impl GazeConfig {
    pub fn from_json(value: Value) -> Result<Self> {
        let config: GazeConfig =
            serde_json::from_value(value).context("Failed to deserialize gaze config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .context(format!("Failed to read config from {:?}", path))?;
        let value: Value = serde_json::from_str(&json)
            .context(format!("Failed to parse config at {:?}", path))?;
        Self::from_json(value)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize gaze config")?;
        fs::write(path, json).context(format!("Failed to write config to {:?}", path))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.filter.window_ms == 0 {
            return Err(anyhow!("filter.window_ms must be positive"));
        }
        if self.filter.max_history == 0 {
            return Err(anyhow!("filter.max_history must be positive"));
        }
        if !(self.magnification.zoom > 0.0 && self.magnification.zoom <= 1.0) {
            return Err(anyhow!(
                "magnification.zoom must be in (0, 1], got {}",
                self.magnification.zoom
            ));
        }
        if self.magnification.animation_s <= 0.0 {
            return Err(anyhow!("magnification.animation_s must be positive"));
        }
        if self.trigger.offsets.is_empty() {
            return Err(anyhow!("trigger.offsets must not be empty"));
        }
        if let Some(lifetime) = self.host.max_lifetime_s {
            if lifetime <= 0.0 {
                return Err(anyhow!("host.max_lifetime_s must be positive"));
            }
        }
        Ok(())
    }
}

/// Which sample source family to build and its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: String,
    pub params: Value,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: "simulated".to_string(),
            params: Value::Object(Default::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub kernel: FilterKernel,
    pub window_ms: u64,
    pub outlier_removal: bool,
    pub outlier_threshold_px: f64,
    pub dispersion_px: f64,
    /// Samples kept for filtering
    pub max_history: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            kernel: FilterKernel::Linear,
            window_ms: 150,
            outlier_removal: true,
            outlier_threshold_px: 80.0,
            dispersion_px: 45.0,
            max_history: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Real gaze older than this falls back to the pointer
    pub stale_threshold_s: f64,
    pub pointer_override: PointerOverrideConfig,
    pub drift_resolution: (usize, usize),
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            stale_threshold_s: 0.5,
            pointer_override: PointerOverrideConfig::default(),
            drift_resolution: (5, 5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerOverrideConfig {
    pub enabled: bool,
    pub init_distance_px: f64,
    pub init_window_s: f64,
    pub stop_after_s: f64,
}

impl Default for PointerOverrideConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            init_distance_px: 100.0,
            init_window_s: 0.25,
            stop_after_s: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagnificationConfig {
    /// Page-space scale at full magnification (0.5 shows half the page)
    pub zoom: f64,
    pub animation_s: f64,
    /// Fixation needed to zoom in and again to commit
    pub fixation_s: f64,
    pub dimming: bool,
    pub dimming_s: f64,
    pub dimming_value: f64,
}

impl Default for MagnificationConfig {
    fn default() -> Self {
        Self {
            zoom: 0.5,
            animation_s: 0.4,
            fixation_s: 0.5,
            dimming: true,
            dimming_s: 0.5,
            dimming_value: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Fraction of the web view height forming the top and bottom zones
    pub edge_zone: f64,
    /// Page pixels per second at the outer edge
    pub max_speed: f64,
    /// Resting in the centre zone this long ends scrolling
    pub rest_s: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            edge_zone: 0.25,
            max_speed: 900.0,
            rest_s: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Button size relative to the window height
    pub button_size: f64,
    pub dwell_s: f64,
    /// Horizontal positions probed inside the target, in order
    pub offsets: Vec<f64>,
    /// Minimum distance between buttons, in button sizes
    pub min_distance_factor: f64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            button_size: 0.08,
            dwell_s: 0.6,
            offsets: vec![0.5, 0.3, 0.7, 0.4, 0.6, 0.2, 0.8, 0.1, 0.9],
            min_distance_factor: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Abort pipelines running longer than this; off when None
    pub max_lifetime_s: Option<f64>,
    /// Log a warning once a pipeline has run this long
    pub stall_warning_s: f64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            max_lifetime_s: None,
            stall_warning_s: 30.0,
        }
    }
}
