pub mod drift;
pub mod gaze;
pub mod pointer;
pub mod status;

pub use drift::DriftGrid;
pub use gaze::GazeEstimator;
pub use pointer::PointerOverride;
pub use status::{TrackerEvent, TrackerStatus};
