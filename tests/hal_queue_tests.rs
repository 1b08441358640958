use gazeflow::core::{Clock, ManualClock, RawSample};
use gazeflow::hal::mock::ReplaySource;
use gazeflow::hal::{SampleQueue, SampleSource, SourceRegistry, TrackerGeometry};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_drain_twice_returns_nothing_new() {
    let queue = SampleQueue::new();
    queue.push_batch((0..3).map(|i| RawSample::pixels(i as f64, 0.0, Duration::from_millis(i))));

    assert_eq!(queue.drain_all().len(), 3);
    assert!(queue.drain_all().is_empty());
    assert!(queue.is_empty());
}

#[test]
fn test_concurrent_producers_keep_per_thread_order() {
    let queue = Arc::new(SampleQueue::new());
    let producers = 4;
    let per_producer = 500;

    let handles: Vec<_> = (0..producers)
        .map(|p| {
            let queue = queue.clone();
            std::thread::spawn(move || {
                for i in 0..per_producer {
                    // x identifies the producer, y the sequence number
                    queue.push(RawSample::pixels(p as f64, i as f64, Duration::from_micros(i)));
                }
            })
        })
        .collect();

    let mut drained = Vec::new();
    while drained.len() < producers * per_producer as usize {
        drained.extend(queue.drain_all());
        std::thread::yield_now();
    }
    for handle in handles {
        handle.join().unwrap();
    }
    drained.extend(queue.drain_all());

    assert_eq!(drained.len(), producers * per_producer as usize);
    for p in 0..producers {
        let sequence: Vec<f64> = drained
            .iter()
            .filter(|s| s.x == p as f64)
            .map(|s| s.y)
            .collect();
        assert_eq!(sequence.len(), per_producer as usize);
        assert!(sequence.windows(2).all(|w| w[0] < w[1]), "producer {} out of order", p);
    }
}

#[test]
fn test_registry_lists_builtin_sources() {
    let registry = SourceRegistry::with_builtins();
    assert_eq!(registry.list_sources(), vec!["open-gaze", "replay", "simulated"]);
}

#[test]
fn test_registry_rejects_unknown_kind() {
    let registry = SourceRegistry::with_builtins();
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new());
    let err = registry
        .create_source("tobii-pro", &serde_json::json!({}), clock)
        .err()
        .unwrap();
    assert!(err.to_string().contains("tobii-pro"));
}

#[test]
fn test_registry_creates_simulated_source() {
    let registry = SourceRegistry::with_builtins();
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new());
    let source = registry
        .create_source("simulated", &serde_json::json!({}), clock)
        .unwrap();
    assert_eq!(source.kind(), "simulated");
}

#[tokio::test]
async fn test_replay_pushes_recorded_samples_in_order() {
    let mut file = NamedTempFile::new().unwrap();
    let samples: Vec<RawSample> = (0..5)
        .map(|i| RawSample::pixels(100.0 + i as f64, 200.0, Duration::from_millis(i * 250)))
        .collect();
    let recording = serde_json::json!({ "sample_rate": 500, "samples": samples });
    write!(file, "{}", recording).unwrap();

    let clock = Arc::new(ManualClock::new());
    clock.set(Duration::from_secs(10));
    let mut source = ReplaySource::new(file.path(), clock.clone());
    let queue = Arc::new(SampleQueue::new());

    let info = source
        .connect(&TrackerGeometry::default(), queue.clone())
        .await
        .unwrap();
    assert!(info.connected);
    assert_eq!(info.sample_rate, 500);

    let mut received = Vec::new();
    for _ in 0..600 {
        received.extend(queue.drain_all());
        if source.is_finished() {
            received.extend(queue.drain_all());
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    source.disconnect().unwrap();

    assert_eq!(received.len(), 5);
    let xs: Vec<f64> = received.iter().map(|s| s.x).collect();
    assert_eq!(xs, vec![100.0, 101.0, 102.0, 103.0, 104.0]);
    // Re-based onto the source clock
    assert_eq!(received[0].timestamp, Duration::from_secs(10));
    assert_eq!(received[4].timestamp, Duration::from_secs(11));
}

#[test]
fn test_replay_of_empty_recording_reports_absent_device() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", serde_json::json!({ "samples": [] })).unwrap();

    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new());
    let mut source = ReplaySource::new(file.path(), clock);
    let info = tokio_test::block_on(
        source.connect(&TrackerGeometry::default(), Arc::new(SampleQueue::new())),
    )
    .unwrap();
    assert!(!info.connected);
}

#[test]
fn test_replay_of_missing_file_is_an_error() {
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new());
    let mut source = ReplaySource::new("/nonexistent/recording.json", clock);
    let result = tokio_test::block_on(
        source.connect(&TrackerGeometry::default(), Arc::new(SampleQueue::new())),
    );
    let err = result.err().unwrap();
    assert!(format!("{:#}", err).contains("Failed to read recording"));
}
