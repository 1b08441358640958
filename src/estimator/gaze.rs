use super::{DriftGrid, PointerOverride, TrackerEvent, TrackerStatus};
use crate::config::GazeConfig;
use crate::core::{Clock, FrameContext, GazeInputState, RawSample, Vec2};
use crate::filter::{Filter, FixationEstimate, WeightedAverageFilter};
use crate::hal::{
    CalibrationReport, CalibrationResult, SampleQueue, SampleSource, SourceHealth, SourceInfo,
    TrackboxInfo, TrackerGeometry,
};
use crate::observability::GazeMetrics;
use crate::resilience::ReconnectSchedule;
use anyhow::Result;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, error, info, warn};

type ConnectOutcome = (Box<dyn SampleSource>, Result<SourceInfo>);

/// Owns the tracker connection and turns queued samples into one
/// `GazeInputState` per frame.
///
/// Connecting happens on a task spawned onto the injected runtime; the
/// frame loop only polls for its outcome. While no tracker streams, or its
/// last valid sample is older than the stale threshold, pointer coordinates
/// stand in for gaze.
pub struct GazeEstimator {
    source: Option<Box<dyn SampleSource>>,
    source_kind: String,
    queue: Arc<SampleQueue>,
    filter: Box<dyn Filter>,
    drift: DriftGrid,
    status: TrackerStatus,
    schedule: ReconnectSchedule,
    pending_connect: Option<oneshot::Receiver<ConnectOutcome>>,
    connect_wanted: bool,

    runtime: Handle,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<TrackerEvent>,
    metrics: Option<Arc<GazeMetrics>>,

    geometry: TrackerGeometry,
    stale_threshold: f64,
    max_history: usize,
    history: VecDeque<RawSample>,
    last_valid: Option<Duration>,
    last_estimate: Option<FixationEstimate>,
    pointer_override: PointerOverride,
    sample_rate: u32,
}

impl GazeEstimator {
    pub fn new(
        source: Box<dyn SampleSource>,
        config: &GazeConfig,
        clock: Arc<dyn Clock>,
        runtime: Handle,
    ) -> Self {
        let (events, _) = broadcast::channel(32);
        let (res_x, res_y) = config.estimator.drift_resolution;

        Self {
            source_kind: source.kind().to_string(),
            source: Some(source),
            queue: Arc::new(SampleQueue::new()),
            filter: Box::new(WeightedAverageFilter::from_config(&config.filter)),
            drift: DriftGrid::new(res_x, res_y, Vec2::new(1280.0, 720.0)),
            status: TrackerStatus::NotConnected,
            schedule: ReconnectSchedule::new(config.reconnect.clone()),
            pending_connect: None,
            connect_wanted: false,
            runtime,
            clock,
            events,
            metrics: None,
            geometry: config.geometry.clone(),
            stale_threshold: config.estimator.stale_threshold_s,
            max_history: config.filter.max_history.max(1),
            history: VecDeque::new(),
            last_valid: None,
            last_estimate: None,
            pointer_override: PointerOverride::new(&config.estimator.pointer_override),
            sample_rate: 0,
        }
    }

    pub fn with_filter(mut self, filter: Box<dyn Filter>) -> Self {
        self.filter = filter;
        self
    }

    /// Publish events on an externally owned channel
    pub fn with_events(mut self, events: broadcast::Sender<TrackerEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<GazeMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn status(&self) -> TrackerStatus {
        self.status
    }

    pub fn source_kind(&self) -> &str {
        &self.source_kind
    }

    /// Native rate reported by the connected source, 0 before the first connect
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.events.subscribe()
    }

    pub fn drift(&self) -> &DriftGrid {
        &self.drift
    }

    pub fn drift_mut(&mut self) -> &mut DriftGrid {
        &mut self.drift
    }

    pub fn last_estimate(&self) -> Option<&FixationEstimate> {
        self.last_estimate.as_ref()
    }

    pub fn queue(&self) -> &Arc<SampleQueue> {
        &self.queue
    }

    /// Begin connecting. Returns immediately; progress shows in `status`.
    pub fn start(&mut self) {
        self.connect_wanted = true;
        if self.status != TrackerStatus::NotConnected {
            return;
        }
        if self.pending_connect.is_some() {
            // Connect from before a `disconnect` is still running; adopt it
            self.set_status(TrackerStatus::Connecting);
        } else {
            self.begin_connect();
        }
    }

    /// Drop the tracker and stay disconnected until `start` is called again
    pub fn disconnect(&mut self) {
        self.connect_wanted = false;
        self.schedule.reset();
        if let Some(source) = self.source.as_mut() {
            if let Err(e) = source.disconnect() {
                warn!(error = %e, "tracker disconnect failed");
            }
        }
        self.set_status(TrackerStatus::NotConnected);
    }

    /// Run the device calibration and publish the outcome. OK and BAD
    /// results invalidate the accumulated drift correction.
    pub async fn calibrate(&mut self) -> CalibrationReport {
        let report = match (self.status.is_connected(), self.source.as_mut()) {
            (true, Some(source)) => match source.calibrate().await {
                Ok(report) => report,
                Err(e) => {
                    warn!(error = %e, "calibration failed");
                    CalibrationReport::failed()
                }
            },
            _ => {
                warn!("calibration requested without a connected tracker");
                CalibrationReport::failed()
            }
        };

        if matches!(report.result, CalibrationResult::Ok | CalibrationResult::Bad) {
            self.drift.reset();
        }
        info!(result = ?report.result, points = report.points.len(), "calibration finished");
        let _ = self.events.send(TrackerEvent::Calibration(report.clone()));
        report
    }

    pub fn trackbox_info(&self) -> TrackboxInfo {
        match (&self.source, self.status.is_connected()) {
            (Some(source), true) => source.trackbox_info(),
            _ => TrackboxInfo::default(),
        }
    }

    /// Advance one frame
    pub fn update(&mut self, frame: &FrameContext) -> GazeInputState {
        let now = self.clock.now();
        self.drift.set_extent(frame.window.size());

        self.poll_connect(now);

        if self.status == TrackerStatus::NotConnected
            && self.connect_wanted
            && self.pending_connect.is_none()
            && self.schedule.take_due(now)
        {
            self.begin_connect();
        }

        if self.status.is_connected() {
            self.poll_health(now);
        }

        self.ingest(frame);

        let estimate = self.filter.apply(self.history.make_contiguous(), now, &self.drift);
        if estimate.is_some() {
            self.last_estimate = estimate.clone();
        }

        let gaze_age = self
            .last_valid
            .map(|t| now.saturating_sub(t).as_secs_f64())
            .unwrap_or(f64::INFINITY);
        let override_active = self.pointer_override.update(frame.dt, frame.pointer);

        let real = match &estimate {
            Some(estimate)
                if self.status == TrackerStatus::Streaming
                    && gaze_age <= self.stale_threshold
                    && !override_active =>
            {
                Some(estimate)
            }
            _ => None,
        };

        let state = match real {
            Some(estimate) => GazeInputState {
                gaze_x: estimate.gaze_x,
                gaze_y: estimate.gaze_y,
                fixation_duration: estimate.fixation_duration,
                gaze_emulated: false,
                gaze_age,
                window_focused: frame.window_focused,
                instant_interaction: frame.instant_interaction,
                gaze_upon_gui: false,
            },
            None => GazeInputState {
                gaze_x: frame.pointer.x,
                gaze_y: frame.pointer.y,
                fixation_duration: 0.0,
                gaze_emulated: true,
                gaze_age,
                window_focused: frame.window_focused,
                instant_interaction: frame.instant_interaction,
                gaze_upon_gui: false,
            },
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_frame(state.gaze_emulated);
        }
        state
    }

    fn ingest(&mut self, frame: &FrameContext) {
        if let Some(source) = self.source.as_mut() {
            if self.status.is_connected() {
                source.fetch_samples(&self.queue);
            }
        }

        let batch = self.queue.drain_all();
        if batch.is_empty() {
            return;
        }

        let origin = frame.window.origin();
        let total = batch.len();
        let mut invalid = 0;
        for sample in batch {
            let mut sample = sample.to_screen_pixels(frame.screen_size.x, frame.screen_size.y);
            sample.x -= origin.x;
            sample.y -= origin.y;

            if sample.valid {
                self.last_valid = Some(self.last_valid.map_or(sample.timestamp, |t| t.max(sample.timestamp)));
            } else {
                invalid += 1;
            }

            self.history.push_back(sample);
            while self.history.len() > self.max_history {
                self.history.pop_front();
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_samples(total, invalid);
        }

        if self.status == TrackerStatus::Connected && self.last_valid.is_some() {
            self.set_status(TrackerStatus::Streaming);
        }
    }

    fn begin_connect(&mut self) {
        let Some(mut source) = self.source.take() else {
            return;
        };

        self.queue.clear();
        let geometry = self.geometry.clone();
        let queue = self.queue.clone();
        let (tx, rx) = oneshot::channel();

        self.runtime.spawn(async move {
            let result = source.connect(&geometry, queue).await;
            let _ = tx.send((source, result));
        });

        if let Some(metrics) = &self.metrics {
            metrics.record_connect_attempt();
        }
        self.pending_connect = Some(rx);
        self.set_status(TrackerStatus::Connecting);
    }

    fn poll_connect(&mut self, now: Duration) {
        let Some(rx) = self.pending_connect.as_mut() else {
            return;
        };

        let (mut source, result) = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(oneshot::error::TryRecvError::Empty) => return,
            Err(oneshot::error::TryRecvError::Closed) => {
                error!(kind = %self.source_kind, "connect task ended without returning the source");
                self.pending_connect = None;
                self.connect_wanted = false;
                self.set_status(TrackerStatus::NotConnected);
                return;
            }
        };
        self.pending_connect = None;

        if !self.connect_wanted {
            let _ = source.disconnect();
            self.source = Some(source);
            self.set_status(TrackerStatus::NotConnected);
            return;
        }

        match result {
            Ok(info) if info.connected => {
                self.source = Some(source);
                self.sample_rate = info.sample_rate;
                self.filter.reset();
                self.filter.set_sample_rate(info.sample_rate);
                self.history.clear();
                self.last_valid = None;
                self.schedule.reset();
                if !info.geometry_ok {
                    warn!(kind = %self.source_kind, "tracker rejected geometry setup");
                }
                if let Some(metrics) = &self.metrics {
                    metrics.record_connected();
                }
                info!(kind = %self.source_kind, sample_rate = info.sample_rate, "tracker connected");
                self.set_status(TrackerStatus::Connected);
            }
            Ok(_) => {
                self.source = Some(source);
                debug!(kind = %self.source_kind, "tracker not available");
                self.set_status(TrackerStatus::NotConnected);
                self.schedule_retry(now);
            }
            Err(e) => {
                self.source = Some(source);
                warn!(kind = %self.source_kind, error = %e, "tracker connect failed");
                self.set_status(TrackerStatus::NotConnected);
                self.schedule_retry(now);
            }
        }
    }

    fn poll_health(&mut self, now: Duration) {
        let Some(source) = self.source.as_mut() else {
            return;
        };

        match source.poll_health() {
            SourceHealth::Ok => {}
            SourceHealth::Lost => {
                warn!(kind = %self.source_kind, "tracker connection lost");
                let _ = source.disconnect();
                self.on_drop(now);
            }
            SourceHealth::Failed(reason) => {
                warn!(kind = %self.source_kind, reason = %reason, "tracker reported an I/O fault");
                let _ = source.disconnect();
                self.set_status(TrackerStatus::Error);
                self.on_drop(now);
            }
        }
    }

    fn on_drop(&mut self, now: Duration) {
        if let Some(metrics) = &self.metrics {
            metrics.record_disconnect();
        }
        self.set_status(TrackerStatus::NotConnected);
        self.schedule_retry(now);
    }

    fn schedule_retry(&mut self, now: Duration) {
        if !self.connect_wanted {
            return;
        }
        if self.schedule.on_failure(now) {
            debug!(
                attempts = self.schedule.attempts(),
                retry_at = ?self.schedule.next_at(),
                "tracker reconnect scheduled"
            );
        } else {
            warn!(
                attempts = self.schedule.attempts(),
                "giving up on tracker reconnects"
            );
        }
    }

    fn set_status(&mut self, target: TrackerStatus) {
        if self.status == target {
            return;
        }
        if !self.status.can_transition_to(target) {
            error!(
                from = self.status.name(),
                to = target.name(),
                "invalid tracker status transition"
            );
            debug_assert!(false, "invalid tracker status transition");
            return;
        }

        let from = std::mem::replace(&mut self.status, target);
        debug!(from = from.name(), to = target.name(), "tracker status changed");
        let _ = self.events.send(TrackerEvent::StatusChanged { from, to: target });
    }
}

impl Drop for GazeEstimator {
    fn drop(&mut self) {
        if let Some(source) = self.source.as_mut() {
            let _ = source.disconnect();
        }
    }
}
