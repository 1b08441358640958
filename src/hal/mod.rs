pub mod drivers;
pub mod mock;
pub mod queue;
pub mod registry;
pub mod traits;
pub mod types;

pub use queue::SampleQueue;
pub use registry::SourceRegistry;
pub use traits::SampleSource;
pub use types::{
    CalibrationPoint, CalibrationPointResult, CalibrationReport, CalibrationResult, EyePosition,
    SourceHealth, SourceInfo, TrackboxInfo, TrackerGeometry,
};
