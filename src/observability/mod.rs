pub mod metrics;
pub mod monitor;

pub use metrics::{GazeMetrics, MetricsSnapshot};
pub use monitor::GazeMonitor;
