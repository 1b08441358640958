use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters shared by the estimator and the pipeline host
#[derive(Debug, Default)]
pub struct GazeMetrics {
    samples_received: AtomicU64,
    invalid_samples: AtomicU64,
    frames: AtomicU64,
    emulated_frames: AtomicU64,
    connect_attempts: AtomicU64,
    connects: AtomicU64,
    disconnects: AtomicU64,
    pipelines_started: AtomicU64,
    pipelines_finished: AtomicU64,
    pipelines_aborted: AtomicU64,
    commands_dispatched: AtomicU64,
    total_frame_us: AtomicU64,
}

/// Point-in-time copy of `GazeMetrics`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub samples_received: u64,
    pub invalid_samples: u64,
    pub frames: u64,
    pub emulated_frames: u64,
    pub connect_attempts: u64,
    pub connects: u64,
    pub disconnects: u64,
    pub pipelines_started: u64,
    pub pipelines_finished: u64,
    pub pipelines_aborted: u64,
    pub commands_dispatched: u64,
    pub avg_frame_us: u64,
}

impl GazeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_samples(&self, total: usize, invalid: usize) {
        self.samples_received.fetch_add(total as u64, Ordering::Relaxed);
        self.invalid_samples.fetch_add(invalid as u64, Ordering::Relaxed);
    }

    pub fn record_frame(&self, emulated: bool) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        if emulated {
            self.emulated_frames.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_connect_attempt(&self) {
        self.connect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connected(&self) {
        self.connects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pipeline_started(&self) {
        self.pipelines_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pipeline_finished(&self) {
        self.pipelines_finished.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pipeline_aborted(&self) {
        self.pipelines_aborted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_commands(&self, count: usize) {
        self.commands_dispatched.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn start_frame(&self) -> Instant {
        Instant::now()
    }

    pub fn finish_frame(&self, start: Instant) {
        let us = start.elapsed().as_micros() as u64;
        self.total_frame_us.fetch_add(us, Ordering::Relaxed);
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn emulated_frames(&self) -> u64 {
        self.emulated_frames.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let frames = self.frames.load(Ordering::Relaxed);
        let total_us = self.total_frame_us.load(Ordering::Relaxed);
        MetricsSnapshot {
            samples_received: self.samples_received.load(Ordering::Relaxed),
            invalid_samples: self.invalid_samples.load(Ordering::Relaxed),
            frames,
            emulated_frames: self.emulated_frames.load(Ordering::Relaxed),
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            connects: self.connects.load(Ordering::Relaxed),
            disconnects: self.disconnects.load(Ordering::Relaxed),
            pipelines_started: self.pipelines_started.load(Ordering::Relaxed),
            pipelines_finished: self.pipelines_finished.load(Ordering::Relaxed),
            pipelines_aborted: self.pipelines_aborted.load(Ordering::Relaxed),
            commands_dispatched: self.commands_dispatched.load(Ordering::Relaxed),
            avg_frame_us: if frames == 0 { 0 } else { total_us / frames },
        }
    }
}
