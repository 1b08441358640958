use crate::core::{Clock, RawSample};
use crate::hal::{SampleQueue, SampleSource, SourceHealth, SourceInfo, TrackerGeometry};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use crossbeam_channel::{RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info};

/// On-disk recording: samples in capture order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    #[serde(default)]
    pub sample_rate: Option<u32>,
    pub samples: Vec<RawSample>,
}

impl Recording {
    /// Sample rate from the file, or estimated from timestamps
    pub fn effective_sample_rate(&self) -> u32 {
        if let Some(rate) = self.sample_rate {
            return rate;
        }
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) if self.samples.len() > 1 && last.timestamp > first.timestamp => {
                let span = (last.timestamp - first.timestamp).as_secs_f64();
                ((self.samples.len() - 1) as f64 / span).round() as u32
            }
            _ => 60,
        }
    }
}

/// Replays a recorded session with its original inter-sample timing.
/// Timestamps are re-based onto the source clock at connect time.
pub struct ReplaySource {
    path: PathBuf,
    looping: bool,
    clock: Arc<dyn Clock>,
    finished: Arc<AtomicBool>,
    capture: Option<(Sender<()>, JoinHandle<()>)>,
}

impl ReplaySource {
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            looping: false,
            clock,
            finished: Arc::new(AtomicBool::new(false)),
            capture: None,
        }
    }

    /// Params: `path` (required), `loop` (default false)
    pub fn from_params(params: &Value, clock: Arc<dyn Clock>) -> Result<Self> {
        let path = params["path"]
            .as_str()
            .ok_or_else(|| anyhow!("Replay source requires a 'path' parameter"))?;
        let mut source = Self::new(path, clock);
        source.looping = params["loop"].as_bool().unwrap_or(false);
        Ok(source)
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Whether a non-looping replay has pushed its last sample
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    fn stop_capture(&mut self) {
        if let Some((stop_tx, handle)) = self.capture.take() {
            let _ = stop_tx.send(());
            let _ = handle.join();
        }
    }
}

pub async fn load_recording(path: &std::path::Path) -> Result<Recording> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read recording {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid recording {}", path.display()))
}

#[async_trait]
impl SampleSource for ReplaySource {
    fn kind(&self) -> &str {
        "replay"
    }

    async fn connect(
        &mut self,
        _geometry: &TrackerGeometry,
        queue: Arc<SampleQueue>,
    ) -> Result<SourceInfo> {
        let recording = load_recording(&self.path).await?;
        if recording.samples.is_empty() {
            return Ok(SourceInfo::not_connected());
        }

        self.stop_capture();
        let sample_rate = recording.effective_sample_rate();
        let samples = recording.samples;
        let looping = self.looping;
        let clock = self.clock.clone();
        let finished = self.finished.clone();
        finished.store(false, Ordering::SeqCst);

        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let handle = std::thread::spawn(move || {
            let mut base = clock.now();
            'replay: loop {
                let first = samples[0].timestamp;
                let mut previous = first;
                for sample in &samples {
                    let gap = sample.timestamp.saturating_sub(previous);
                    previous = sample.timestamp;
                    match stop_rx.recv_timeout(gap) {
                        Err(RecvTimeoutError::Timeout) => {}
                        _ => break 'replay,
                    }
                    queue.push(RawSample {
                        timestamp: base + (sample.timestamp - first),
                        ..*sample
                    });
                }
                if !looping {
                    break;
                }
                base = clock.now();
            }
            finished.store(true, Ordering::SeqCst);
        });

        self.capture = Some((stop_tx, handle));
        info!(path = %self.path.display(), sample_rate, "replay started");
        Ok(SourceInfo::connected(sample_rate))
    }

    fn disconnect(&mut self) -> Result<()> {
        debug!(path = %self.path.display(), "replay stopped");
        self.stop_capture();
        Ok(())
    }

    fn poll_health(&mut self) -> SourceHealth {
        SourceHealth::Ok
    }
}

impl Drop for ReplaySource {
    fn drop(&mut self) {
        self.stop_capture();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_sample_rate_estimated_from_timestamps() {
        let recording = Recording {
            sample_rate: None,
            samples: (0..11)
                .map(|i| RawSample::pixels(0.0, 0.0, Duration::from_millis(i * 10)))
                .collect(),
        };
        assert_eq!(recording.effective_sample_rate(), 100);
    }

    #[test]
    fn test_missing_path_rejected() {
        let clock: Arc<dyn Clock> = Arc::new(crate::core::SystemClock::new());
        assert!(ReplaySource::from_params(&serde_json::json!({}), clock).is_err());
    }
}
