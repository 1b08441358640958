use super::GazeMetrics;
use std::sync::Arc;

pub struct GazeMonitor {
    metrics: Arc<GazeMetrics>,
}

impl GazeMonitor {
    pub fn new(metrics: Arc<GazeMetrics>) -> Self {
        Self { metrics }
    }

    pub fn generate_report(&self) -> String {
        let s = self.metrics.snapshot();

        if s.frames == 0 {
            return "No frames processed".to_string();
        }

        let emulated_pct = s.emulated_frames as f64 * 100.0 / s.frames as f64;

        let mut report = String::from("=== Gaze Metrics ===\n");
        report.push_str(&format!(
            "\n[input]\n  Samples: {} received, {} invalid\n  Frames: {} frames processed ({:.1}% emulated)\n  Avg Frame: {}μs\n",
            s.samples_received, s.invalid_samples, s.frames, emulated_pct, s.avg_frame_us
        ));
        report.push_str(&format!(
            "\n[tracker]\n  Connects: {} of {} attempts\n  Drops: {}\n",
            s.connects, s.connect_attempts, s.disconnects
        ));
        report.push_str(&format!(
            "\n[pipelines]\n  Started: {}\n  Finished: {}\n  Aborted: {}\n  Commands: {}\n",
            s.pipelines_started, s.pipelines_finished, s.pipelines_aborted, s.commands_dispatched
        ));

        report
    }

    pub fn metrics(&self) -> &Arc<GazeMetrics> {
        &self.metrics
    }
}
