//! OpenGaze API client (Gazepoint and compatible trackers).
//!
//! The tracker serves XML records over TCP, one per line:
//! `<REC FPOGX="0.50" FPOGY="0.40" FPOGV="1" />`. Point-of-gaze values are
//! fractions of the screen.

use crate::core::{Clock, RawSample};
use crate::hal::{SampleQueue, SampleSource, SourceHealth, SourceInfo, TrackerGeometry};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const DEFAULT_ADDRESS: &str = "127.0.0.1:4242";
const DEFAULT_SAMPLE_RATE: u32 = 60;

pub struct OpenGazeSource {
    address: String,
    connect_timeout: Duration,
    clock: Arc<dyn Clock>,
    health: Arc<Mutex<SourceHealth>>,
    writer: Option<OwnedWriteHalf>,
    reader: Option<JoinHandle<()>>,
}

impl OpenGazeSource {
    pub fn new(address: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            address: address.into(),
            connect_timeout: Duration::from_secs(2),
            clock,
            health: Arc::new(Mutex::new(SourceHealth::Ok)),
            writer: None,
            reader: None,
        }
    }

    /// Params: `address` (default 127.0.0.1:4242), `connect_timeout_ms`
    pub fn from_params(params: &Value, clock: Arc<dyn Clock>) -> Result<Self> {
        let address = params["address"].as_str().unwrap_or(DEFAULT_ADDRESS);
        let mut source = Self::new(address, clock);
        if let Some(ms) = params["connect_timeout_ms"].as_u64() {
            source.connect_timeout = Duration::from_millis(ms);
        }
        Ok(source)
    }

    fn set_health(health: &Mutex<SourceHealth>, value: SourceHealth) {
        *health.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = value;
    }
}

/// Attributes of a `<REC .../>` line, or None for any other record
pub fn parse_record(line: &str) -> Option<HashMap<String, String>> {
    let body = line.trim().strip_prefix("<REC")?.trim_end();
    let body = body.strip_suffix("/>")?;

    let mut attributes = HashMap::new();
    let mut rest = body;
    while let Some(eq) = rest.find('=') {
        let key = rest[..eq].trim().to_string();
        let after = rest[eq + 1..].trim_start().strip_prefix('"')?;
        let close = after.find('"')?;
        attributes.insert(key, after[..close].to_string());
        rest = &after[close + 1..];
    }
    Some(attributes)
}

/// Convert a record to a sample. Missing point-of-gaze fields yield None.
pub fn record_to_sample(attributes: &HashMap<String, String>, timestamp: Duration) -> Option<RawSample> {
    let x: f64 = attributes.get("FPOGX")?.parse().ok()?;
    let y: f64 = attributes.get("FPOGY")?.parse().ok()?;
    let valid = attributes.get("FPOGV").map(|v| v == "1").unwrap_or(true);

    let mut sample = RawSample::relative(x, y, timestamp);
    sample.valid = valid && !(x == 0.0 && y == 0.0);
    Some(sample)
}

#[async_trait]
impl SampleSource for OpenGazeSource {
    fn kind(&self) -> &str {
        "open-gaze"
    }

    async fn connect(
        &mut self,
        _geometry: &TrackerGeometry,
        queue: Arc<SampleQueue>,
    ) -> Result<SourceInfo> {
        self.disconnect()?;

        let stream = match tokio::time::timeout(
            self.connect_timeout,
            TcpStream::connect(&self.address),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                debug!(address = %self.address, error = %e, "open-gaze server not reachable");
                return Ok(SourceInfo::not_connected());
            }
            Err(_) => {
                debug!(address = %self.address, "open-gaze connect timed out");
                return Ok(SourceInfo::not_connected());
            }
        };

        let (read_half, mut write_half) = stream.into_split();
        write_half
            .write_all(b"<SET ID=\"ENABLE_SEND_POG_FIX\" STATE=\"1\" />\r\n<SET ID=\"ENABLE_SEND_DATA\" STATE=\"1\" />\r\n")
            .await
            .context("Failed to enable open-gaze data stream")?;

        Self::set_health(&self.health, SourceHealth::Ok);
        let health = self.health.clone();
        let clock = self.clock.clone();

        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(read_half).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let Some(attributes) = parse_record(&line) else {
                            continue;
                        };
                        if let Some(sample) = record_to_sample(&attributes, clock.now()) {
                            queue.push(sample);
                        }
                    }
                    Ok(None) => {
                        warn!("open-gaze server closed the connection");
                        Self::set_health(&health, SourceHealth::Lost);
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "open-gaze read failed");
                        Self::set_health(&health, SourceHealth::Failed(e.to_string()));
                        break;
                    }
                }
            }
        });

        self.writer = Some(write_half);
        self.reader = Some(reader);
        info!(address = %self.address, "open-gaze tracker connected");
        Ok(SourceInfo::connected(DEFAULT_SAMPLE_RATE))
    }

    fn disconnect(&mut self) -> Result<()> {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.writer = None;
        Ok(())
    }

    fn poll_health(&mut self) -> SourceHealth {
        self.health.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }
}

impl Drop for OpenGazeSource {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record() {
        let attrs = parse_record(r#"<REC FPOGX="0.25" FPOGY="0.75" FPOGV="1" />"#).unwrap();
        assert_eq!(attrs["FPOGX"], "0.25");
        assert_eq!(attrs["FPOGV"], "1");

        let sample = record_to_sample(&attrs, Duration::from_millis(3)).unwrap();
        assert!(sample.valid);
        assert_eq!((sample.x, sample.y), (0.25, 0.75));
    }

    #[test]
    fn test_non_record_lines_ignored() {
        assert!(parse_record(r#"<ACK ID="ENABLE_SEND_DATA" STATE="1" />"#).is_none());
        assert!(parse_record("garbage").is_none());
    }

    #[test]
    fn test_invalid_flag_marks_sample_invalid() {
        let attrs = parse_record(r#"<REC FPOGX="0.5" FPOGY="0.5" FPOGV="0" />"#).unwrap();
        assert!(!record_to_sample(&attrs, Duration::ZERO).unwrap().valid);
    }
}
