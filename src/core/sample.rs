use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Unit of a raw sample's coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSystem {
    /// Pixels on the physical screen
    ScreenPixels,
    /// 0..1 over the physical screen
    ScreenRelative,
}

/// One gaze observation as reported by a sample source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub x: f64,
    pub y: f64,
    pub coordinate_system: CoordinateSystem,
    /// Monotonic time since the source clock's epoch
    #[serde(with = "duration_secs")]
    pub timestamp: Duration,
    /// False on tracking loss
    pub valid: bool,
}

impl RawSample {
    pub fn new(x: f64, y: f64, coordinate_system: CoordinateSystem, timestamp: Duration) -> Self {
        Self {
            x,
            y,
            coordinate_system,
            timestamp,
            valid: true,
        }
    }

    pub fn pixels(x: f64, y: f64, timestamp: Duration) -> Self {
        Self::new(x, y, CoordinateSystem::ScreenPixels, timestamp)
    }

    pub fn relative(x: f64, y: f64, timestamp: Duration) -> Self {
        Self::new(x, y, CoordinateSystem::ScreenRelative, timestamp)
    }

    /// Tracking-loss marker
    pub fn invalid(timestamp: Duration) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            coordinate_system: CoordinateSystem::ScreenPixels,
            timestamp,
            valid: false,
        }
    }

    /// Combine a binocular reading. Both vendors we talk to report (0,0)
    /// for a lost eye, so the per-axis maximum keeps the tracked one.
    pub fn from_binocular(
        left: (f64, f64),
        right: (f64, f64),
        coordinate_system: CoordinateSystem,
        timestamp: Duration,
    ) -> Self {
        let x = left.0.max(right.0);
        let y = left.1.max(right.1);
        let mut sample = Self::new(x, y, coordinate_system, timestamp);
        sample.valid = !(x == 0.0 && y == 0.0);
        sample
    }

    /// Same sample expressed in screen pixels
    pub fn to_screen_pixels(&self, screen_width: f64, screen_height: f64) -> Self {
        match self.coordinate_system {
            CoordinateSystem::ScreenPixels => *self,
            CoordinateSystem::ScreenRelative => Self {
                x: self.x * screen_width,
                y: self.y * screen_height,
                coordinate_system: CoordinateSystem::ScreenPixels,
                ..*self
            },
        }
    }
}

pub(crate) mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(serde::de::Error::custom("timestamp must be a non-negative number of seconds"));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binocular_takes_axis_max() {
        let s = RawSample::from_binocular(
            (0.0, 0.0),
            (0.4, 0.6),
            CoordinateSystem::ScreenRelative,
            Duration::ZERO,
        );
        assert!(s.valid);
        assert_eq!((s.x, s.y), (0.4, 0.6));
    }

    #[test]
    fn test_binocular_both_lost_is_invalid() {
        let s = RawSample::from_binocular(
            (0.0, 0.0),
            (0.0, 0.0),
            CoordinateSystem::ScreenPixels,
            Duration::ZERO,
        );
        assert!(!s.valid);
    }

    #[test]
    fn test_relative_to_pixels() {
        let s = RawSample::relative(0.5, 0.25, Duration::from_millis(5));
        let p = s.to_screen_pixels(1920.0, 1080.0);
        assert_eq!(p.coordinate_system, CoordinateSystem::ScreenPixels);
        assert_eq!((p.x, p.y), (960.0, 270.0));
        assert_eq!(p.timestamp, Duration::from_millis(5));
    }

    #[test]
    fn test_timestamp_serializes_as_seconds() {
        let s = RawSample::pixels(1.0, 2.0, Duration::from_millis(1500));
        let json = serde_json::to_value(s).unwrap();
        assert_eq!(json["timestamp"], 1.5);
        assert_eq!(json["coordinate_system"], "screen_pixels");
    }
}
