use crate::core::{Clock, RawSample};
use crate::hal::{
    CalibrationReport, CalibrationResult, EyePosition, SampleQueue, SampleSource, SourceHealth,
    SourceInfo, TrackboxInfo, TrackerGeometry,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use crossbeam_channel::{RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, warn};

/// One step of a scripted gaze path, in screen pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedFixation {
    pub x: f64,
    pub y: f64,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
enum SimulatedMode {
    /// Capture thread cycles through fixations with deterministic jitter
    Scripted {
        fixations: Vec<ScriptedFixation>,
        jitter_px: f64,
    },
    /// Samples arrive only through a `SimulatedFeed`
    Manual,
}

#[derive(Default)]
struct FeedShared {
    queue: Mutex<Option<Arc<SampleQueue>>>,
    lost: AtomicBool,
    failing_connects: AtomicUsize,
    calibration: Mutex<Option<CalibrationReport>>,
    trackbox: Mutex<TrackboxInfo>,
}

/// Handle for driving a simulated tracker from outside: push samples,
/// drop the connection, make connects fail
#[derive(Clone)]
pub struct SimulatedFeed {
    shared: Arc<FeedShared>,
    clock: Arc<dyn Clock>,
}

impl SimulatedFeed {
    /// Push a valid sample in screen pixels stamped with the source clock.
    /// Returns false while disconnected.
    pub fn push(&self, x: f64, y: f64) -> bool {
        self.push_sample(RawSample::pixels(x, y, self.clock.now()))
    }

    /// Push a tracking-loss sample
    pub fn push_invalid(&self) -> bool {
        self.push_sample(RawSample::invalid(self.clock.now()))
    }

    pub fn push_sample(&self, sample: RawSample) -> bool {
        if self.shared.lost.load(Ordering::SeqCst) {
            return false;
        }
        let queue = self.shared.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match queue.as_ref() {
            Some(queue) => {
                queue.push(sample);
                true
            }
            None => false,
        }
    }

    /// Simulate the device going away mid-stream
    pub fn sever(&self) {
        self.shared.lost.store(true, Ordering::SeqCst);
        *self.shared.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    /// The next `count` connects report the device as absent
    pub fn fail_next_connects(&self, count: usize) {
        self.shared.failing_connects.store(count, Ordering::SeqCst);
    }

    pub fn set_calibration(&self, report: CalibrationReport) {
        *self.shared.calibration.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(report);
    }

    pub fn set_trackbox(&self, info: TrackboxInfo) {
        *self.shared.trackbox.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = info;
    }

    pub fn is_connected(&self) -> bool {
        !self.shared.lost.load(Ordering::SeqCst)
            && self
                .shared
                .queue
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .is_some()
    }
}

struct CaptureThread {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Software eye tracker for demos and tests
pub struct SimulatedSource {
    mode: SimulatedMode,
    rate_hz: u32,
    connect_delay: Duration,
    clock: Arc<dyn Clock>,
    shared: Arc<FeedShared>,
    capture: Option<CaptureThread>,
}

impl SimulatedSource {
    fn with_mode(mode: SimulatedMode, rate_hz: u32, clock: Arc<dyn Clock>) -> Self {
        let shared = FeedShared::default();
        *shared.trackbox.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = TrackboxInfo {
            left: EyePosition {
                tracked: true,
                x: -0.1,
                ..Default::default()
            },
            right: EyePosition {
                tracked: true,
                x: 0.1,
                ..Default::default()
            },
        };

        Self {
            mode,
            rate_hz: rate_hz.max(1),
            connect_delay: Duration::ZERO,
            clock,
            shared: Arc::new(shared),
            capture: None,
        }
    }

    /// Source fed only through the returned handle
    pub fn manual(clock: Arc<dyn Clock>) -> (Self, SimulatedFeed) {
        let source = Self::with_mode(SimulatedMode::Manual, 60, clock);
        let feed = source.feed();
        (source, feed)
    }

    pub fn scripted(
        clock: Arc<dyn Clock>,
        fixations: Vec<ScriptedFixation>,
        rate_hz: u32,
        jitter_px: f64,
    ) -> Result<Self> {
        if fixations.is_empty() {
            return Err(anyhow!("Scripted source needs at least one fixation"));
        }
        Ok(Self::with_mode(
            SimulatedMode::Scripted {
                fixations,
                jitter_px,
            },
            rate_hz,
            clock,
        ))
    }

    /// Build from JSON params: `mode` ("scripted" | "manual"), `rate_hz`,
    /// `jitter_px`, `fixations`, `connect_delay_ms`
    pub fn from_params(params: &Value, clock: Arc<dyn Clock>) -> Result<Self> {
        let rate_hz = params["rate_hz"].as_u64().unwrap_or(60) as u32;
        let mode = params["mode"].as_str().unwrap_or("scripted");

        let mut source = match mode {
            "manual" => {
                let mut source = Self::manual(clock).0;
                source.rate_hz = rate_hz.max(1);
                source
            }
            "scripted" => {
                let fixations = match params.get("fixations") {
                    Some(list) => serde_json::from_value(list.clone())?,
                    None => default_script(),
                };
                let jitter_px = params["jitter_px"].as_f64().unwrap_or(4.0);
                Self::scripted(clock, fixations, rate_hz, jitter_px)?
            }
            _ => return Err(anyhow!("Unknown simulated source mode: {}", mode)),
        };

        if let Some(delay) = params["connect_delay_ms"].as_u64() {
            source.connect_delay = Duration::from_millis(delay);
        }
        Ok(source)
    }

    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    pub fn feed(&self) -> SimulatedFeed {
        SimulatedFeed {
            shared: self.shared.clone(),
            clock: self.clock.clone(),
        }
    }

    fn spawn_capture(&mut self, fixations: Vec<ScriptedFixation>, jitter_px: f64) {
        let feed = self.feed();
        let rate_hz = self.rate_hz;
        let period = Duration::from_secs_f64(1.0 / rate_hz as f64);
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);

        let handle = std::thread::spawn(move || {
            let mut n: u64 = 0;
            loop {
                match stop_rx.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => {}
                    _ => break,
                }

                let target = script_target(&fixations, n, rate_hz);
                let t = n as f64;
                let x = target.x + jitter_px * (t * 1.7).sin();
                let y = target.y + jitter_px * (t * 2.3).cos();
                if !feed.push(x, y) {
                    break;
                }
                n += 1;
            }
        });

        self.capture = Some(CaptureThread { stop_tx, handle });
    }

    fn stop_capture(&mut self) {
        if let Some(capture) = self.capture.take() {
            let _ = capture.stop_tx.send(());
            if capture.handle.join().is_err() {
                warn!("simulated capture thread panicked");
            }
        }
    }
}

fn default_script() -> Vec<ScriptedFixation> {
    vec![
        ScriptedFixation { x: 960.0, y: 540.0, duration_ms: 1500 },
        ScriptedFixation { x: 400.0, y: 300.0, duration_ms: 1200 },
        ScriptedFixation { x: 1500.0, y: 800.0, duration_ms: 1200 },
    ]
}

/// Fixation active for the n-th sample of a looping script
fn script_target(fixations: &[ScriptedFixation], n: u64, rate_hz: u32) -> &ScriptedFixation {
    let lengths: Vec<u64> = fixations
        .iter()
        .map(|f| (f.duration_ms * rate_hz as u64 / 1000).max(1))
        .collect();
    let cycle: u64 = lengths.iter().sum();
    let mut index = n % cycle.max(1);
    for (fixation, len) in fixations.iter().zip(lengths) {
        if index < len {
            return fixation;
        }
        index -= len;
    }
    &fixations[0]
}

#[async_trait]
impl SampleSource for SimulatedSource {
    fn kind(&self) -> &str {
        "simulated"
    }

    async fn connect(
        &mut self,
        _geometry: &TrackerGeometry,
        queue: Arc<SampleQueue>,
    ) -> Result<SourceInfo> {
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }

        let refused = self
            .shared
            .failing_connects
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            debug!("simulated tracker refusing connect");
            return Ok(SourceInfo::not_connected());
        }

        self.stop_capture();
        *self.shared.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(queue);
        self.shared.lost.store(false, Ordering::SeqCst);

        if let SimulatedMode::Scripted { fixations, jitter_px } = self.mode.clone() {
            self.spawn_capture(fixations, jitter_px);
        }

        Ok(SourceInfo::connected(self.rate_hz))
    }

    fn disconnect(&mut self) -> Result<()> {
        self.stop_capture();
        *self.shared.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }

    fn poll_health(&mut self) -> SourceHealth {
        if self.shared.lost.load(Ordering::SeqCst) {
            SourceHealth::Lost
        } else {
            SourceHealth::Ok
        }
    }

    async fn calibrate(&mut self) -> Result<CalibrationReport> {
        let configured = self
            .shared
            .calibration
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        Ok(configured.unwrap_or(CalibrationReport {
            result: CalibrationResult::Ok,
            points: Vec::new(),
        }))
    }

    fn trackbox_info(&self) -> TrackboxInfo {
        *self.shared.trackbox.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for SimulatedSource {
    fn drop(&mut self) {
        self.stop_capture();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ManualClock, SystemClock};

    #[tokio::test]
    async fn test_manual_feed_reaches_queue_after_connect() {
        let clock = Arc::new(ManualClock::new());
        let (mut source, feed) = SimulatedSource::manual(clock.clone());
        let queue = Arc::new(SampleQueue::new());

        assert!(!feed.push(1.0, 1.0));

        let info = source.connect(&TrackerGeometry::default(), queue.clone()).await.unwrap();
        assert!(info.connected);
        assert_eq!(info.sample_rate, 60);

        clock.advance(Duration::from_millis(10));
        assert!(feed.push(100.0, 200.0));

        let batch = queue.drain_all();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].timestamp, Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_sever_reports_lost() {
        let (mut source, feed) = SimulatedSource::manual(Arc::new(ManualClock::new()));
        let queue = Arc::new(SampleQueue::new());
        source.connect(&TrackerGeometry::default(), queue.clone()).await.unwrap();

        feed.sever();
        assert_eq!(source.poll_health(), SourceHealth::Lost);
        assert!(!feed.push(1.0, 1.0));
        assert!(!feed.is_connected());

        source.connect(&TrackerGeometry::default(), queue).await.unwrap();
        assert_eq!(source.poll_health(), SourceHealth::Ok);
        assert!(feed.is_connected());
    }

    #[tokio::test]
    async fn test_failing_connects_are_counted_down() {
        let (mut source, feed) = SimulatedSource::manual(Arc::new(ManualClock::new()));
        let queue = Arc::new(SampleQueue::new());
        feed.fail_next_connects(2);

        for _ in 0..2 {
            let info = source.connect(&TrackerGeometry::default(), queue.clone()).await.unwrap();
            assert!(!info.connected);
        }
        let info = source.connect(&TrackerGeometry::default(), queue).await.unwrap();
        assert!(info.connected);
    }

    #[tokio::test]
    async fn test_scripted_source_streams() {
        let params = serde_json::json!({
            "rate_hz": 200,
            "fixations": [{ "x": 500.0, "y": 500.0, "duration_ms": 1000 }],
            "jitter_px": 2.0
        });
        let mut source = SimulatedSource::from_params(&params, Arc::new(SystemClock::new())).unwrap();
        let queue = Arc::new(SampleQueue::new());
        source.connect(&TrackerGeometry::default(), queue.clone()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        source.disconnect().unwrap();

        let batch = queue.drain_all();
        assert!(!batch.is_empty());
        for sample in batch {
            assert!((sample.x - 500.0).abs() <= 2.0);
            assert!((sample.y - 500.0).abs() <= 2.0);
        }
    }

    #[test]
    fn test_script_target_cycles() {
        let script = vec![
            ScriptedFixation { x: 1.0, y: 1.0, duration_ms: 100 },
            ScriptedFixation { x: 2.0, y: 2.0, duration_ms: 100 },
        ];
        assert_eq!(script_target(&script, 0, 100).x, 1.0);
        assert_eq!(script_target(&script, 10, 100).x, 2.0);
        assert_eq!(script_target(&script, 20, 100).x, 1.0);
    }

    #[test]
    fn test_empty_script_rejected() {
        let params = serde_json::json!({ "fixations": [] });
        assert!(SimulatedSource::from_params(&params, Arc::new(SystemClock::new())).is_err());
    }
}
