use super::queue::SampleQueue;
use super::types::{CalibrationReport, SourceHealth, SourceInfo, TrackboxInfo, TrackerGeometry};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Capability implemented by every eye tracker family.
///
/// A source owns its capture context (device callback thread, socket reader
/// task, replay thread) and pushes `RawSample`s into the queue it was handed
/// on connect. The frame loop never waits on a source: `connect` and
/// `calibrate` are awaited on a background task and everything else is
/// synchronous and cheap.
#[async_trait]
pub trait SampleSource: Send {
    /// Source family identifier (e.g., "simulated", "open-gaze")
    fn kind(&self) -> &str;

    /// Connect and start streaming into `queue`.
    ///
    /// `Ok` with `connected == false` means the device is absent; `Err` is
    /// reserved for I/O faults.
    async fn connect(
        &mut self,
        geometry: &TrackerGeometry,
        queue: Arc<SampleQueue>,
    ) -> Result<SourceInfo>;

    /// Stop streaming and release the device
    fn disconnect(&mut self) -> Result<()>;

    /// Pull-style sources copy newly available samples here. Callback-driven
    /// sources push on their own and keep the default.
    fn fetch_samples(&mut self, _queue: &SampleQueue) {}

    fn poll_health(&mut self) -> SourceHealth;

    async fn calibrate(&mut self) -> Result<CalibrationReport> {
        Ok(CalibrationReport::not_supported())
    }

    fn trackbox_info(&self) -> TrackboxInfo {
        TrackboxInfo::default()
    }
}
