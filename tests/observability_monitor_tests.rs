use gazeflow::observability::{GazeMetrics, GazeMonitor};
use std::sync::Arc;

#[test]
fn test_report_before_any_frame() {
    let monitor = GazeMonitor::new(Arc::new(GazeMetrics::new()));
    assert_eq!(monitor.generate_report(), "No frames processed");
}

#[test]
fn test_report_counts_frames_and_pipelines() {
    let metrics = Arc::new(GazeMetrics::new());
    for emulated in [true, false, false] {
        let started = metrics.start_frame();
        metrics.record_frame(emulated);
        metrics.finish_frame(started);
    }
    metrics.record_samples(10, 2);
    metrics.record_connect_attempt();
    metrics.record_connected();
    metrics.record_pipeline_started();
    metrics.record_pipeline_finished();
    metrics.record_commands(4);

    let report = GazeMonitor::new(metrics.clone()).generate_report();
    assert!(report.contains("=== Gaze Metrics ==="));
    assert!(report.contains("3 frames processed"));
    assert!(report.contains("33.3% emulated"));
    assert!(report.contains("10 received, 2 invalid"));
    assert!(report.contains("Connects: 1 of 1 attempts"));
    assert!(report.contains("Commands: 4"));

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.frames, 3);
    assert_eq!(snapshot.emulated_frames, 1);
}

#[test]
fn test_metrics_shared_across_threads() {
    let metrics = Arc::new(GazeMetrics::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let metrics = metrics.clone();
            std::thread::spawn(move || {
                for _ in 0..250 {
                    metrics.record_frame(false);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(metrics.frames(), 1000);
}
