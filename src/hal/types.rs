use serde::{Deserialize, Serialize};

/// Physical setup handed to a tracker on connect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerGeometry {
    pub monitor_width_mm: f64,
    pub monitor_height_mm: f64,
    /// Distance from the tracker to the monitor plane
    pub tracker_depth_mm: f64,
    /// Vertical distance from the tracker to the lower monitor edge
    pub tracker_vertical_mm: f64,
    pub tracker_angle_deg: f64,
    /// Screen resolution the tracker should map pixels to
    pub screen_width_px: u32,
    pub screen_height_px: u32,
}

impl Default for TrackerGeometry {
    fn default() -> Self {
        Self {
            monitor_width_mm: 531.0,
            monitor_height_mm: 299.0,
            tracker_depth_mm: 20.0,
            tracker_vertical_mm: 10.0,
            tracker_angle_deg: 20.0,
            screen_width_px: 1920,
            screen_height_px: 1080,
        }
    }
}

/// Result of `SampleSource::connect`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub connected: bool,
    /// Native sample rate in Hz
    pub sample_rate: u32,
    pub geometry_ok: bool,
}

impl SourceInfo {
    pub fn connected(sample_rate: u32) -> Self {
        Self {
            connected: true,
            sample_rate,
            geometry_ok: true,
        }
    }

    pub fn not_connected() -> Self {
        Self {
            connected: false,
            sample_rate: 0,
            geometry_ok: false,
        }
    }
}

/// Whether a source is still delivering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceHealth {
    Ok,
    /// Connection dropped; reconnecting may help
    Lost,
    /// I/O fault reported by the device
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationResult {
    NotSupported,
    Ok,
    Bad,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationPointResult {
    Ok,
    Bad,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    /// Screen pixels
    pub x: i32,
    pub y: i32,
    pub result: CalibrationPointResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub result: CalibrationResult,
    pub points: Vec<CalibrationPoint>,
}

impl CalibrationReport {
    pub fn not_supported() -> Self {
        Self {
            result: CalibrationResult::NotSupported,
            points: Vec::new(),
        }
    }

    pub fn failed() -> Self {
        Self {
            result: CalibrationResult::Failed,
            points: Vec::new(),
        }
    }
}

/// One eye inside the tracking volume. Coordinates are -1..1:
/// x left to right, y lower to upper, z near to far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EyePosition {
    pub tracked: bool,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackboxInfo {
    pub left: EyePosition,
    pub right: EyePosition,
}
