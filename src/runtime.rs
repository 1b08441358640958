use crate::actions::PipelineKind;
use crate::config::GazeConfig;
use crate::core::{Clock, FrameContext, GazeInputState, PageView};
use crate::engine::{DrawCommand, PageCommand, Pipeline, PipelineHost, PipelineId};
use crate::estimator::{GazeEstimator, TrackerEvent, TrackerStatus};
use crate::hal::{SampleSource, SourceRegistry};
use crate::observability::{GazeMetrics, GazeMonitor};
use crate::trigger::{TriggerCollection, TriggerVisual};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// Everything the rendering layer needs after one frame
#[derive(Debug, Clone)]
pub struct FrameOutput {
    pub input: GazeInputState,
    pub status: TrackerStatus,
    pub commands: Vec<PageCommand>,
    pub triggers: Vec<TriggerVisual>,
    pub draw: Vec<DrawCommand>,
}

/// Composition root wiring estimator, triggers and pipeline host
pub struct GazeRuntime {
    config: GazeConfig,
    estimator: GazeEstimator,
    triggers: TriggerCollection,
    host: PipelineHost,
    metrics: Arc<GazeMetrics>,
}

impl GazeRuntime {
    pub fn new(
        config: GazeConfig,
        source: Box<dyn SampleSource>,
        clock: Arc<dyn Clock>,
        runtime: Handle,
    ) -> Self {
        let metrics = Arc::new(GazeMetrics::new());
        let estimator =
            GazeEstimator::new(source, &config, clock, runtime).with_metrics(metrics.clone());
        let triggers = TriggerCollection::new(config.trigger.clone());
        let host = PipelineHost::new(config.host.clone()).with_metrics(metrics.clone());

        Self {
            config,
            estimator,
            triggers,
            host,
            metrics,
        }
    }

    /// Create the configured source through `registry`
    pub fn from_config(
        config: GazeConfig,
        registry: &SourceRegistry,
        clock: Arc<dyn Clock>,
        runtime: Handle,
    ) -> Result<Self> {
        let source = registry
            .create_source(&config.source.kind, &config.source.params, clock.clone())
            .context("Failed to set up gaze runtime")?;
        Ok(Self::new(config, source, clock, runtime))
    }

    /// Publish tracker events on an externally owned channel
    pub fn with_events(mut self, events: broadcast::Sender<TrackerEvent>) -> Self {
        self.estimator = self.estimator.with_events(events);
        self
    }

    pub fn config(&self) -> &GazeConfig {
        &self.config
    }

    pub fn estimator(&self) -> &GazeEstimator {
        &self.estimator
    }

    pub fn estimator_mut(&mut self) -> &mut GazeEstimator {
        &mut self.estimator
    }

    pub fn triggers(&self) -> &TriggerCollection {
        &self.triggers
    }

    pub fn triggers_mut(&mut self) -> &mut TriggerCollection {
        &mut self.triggers
    }

    pub fn host(&self) -> &PipelineHost {
        &self.host
    }

    pub fn metrics(&self) -> &Arc<GazeMetrics> {
        &self.metrics
    }

    pub fn monitor(&self) -> GazeMonitor {
        GazeMonitor::new(self.metrics.clone())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.estimator.subscribe()
    }

    pub fn start(&mut self) {
        info!(kind = self.estimator.source_kind(), "Starting gaze runtime");
        self.estimator.start();
    }

    pub fn start_pipeline(&mut self, kind: PipelineKind) -> Result<PipelineId> {
        let pipeline = kind.build(&self.config)?;
        Ok(self.host.push(pipeline))
    }

    pub fn push_pipeline(&mut self, pipeline: Pipeline) -> PipelineId {
        self.host.push(pipeline)
    }

    pub fn abort_pipeline(&mut self, id: PipelineId, view: &PageView) -> bool {
        self.host.abort(id, view, self.estimator.drift())
    }

    pub fn abort_all(&mut self, view: &PageView) {
        self.host.abort_all(view, self.estimator.drift());
    }

    /// Pause pipelines and triggers, e.g. while the page is hidden
    pub fn suspend(&mut self, view: &PageView) {
        self.host.suspend_all(view, self.estimator.drift());
        self.triggers.deactivate();
    }

    pub fn resume(&mut self, view: &PageView) {
        self.host.resume_all(view, self.estimator.drift());
    }

    /// Run one frame: estimate gaze, advance pipelines, then evaluate
    /// triggers. Pipelines started by a trigger run from the next frame on.
    pub fn tick(&mut self, frame: &FrameContext, view: &PageView) -> FrameOutput {
        let started = self.metrics.start_frame();

        let mut input = self.estimator.update(frame);
        if !input.usable(self.config.estimator.stale_threshold_s) {
            input.mark_consumed();
        }

        // Gaze on a trigger button belongs to the overlay, not the page.
        // Triggers still see it so their own dwell can run.
        let mut page_input = input.clone();
        if self.triggers.covers(input.gaze(), view) {
            page_input.mark_consumed();
        }

        let commands = self
            .host
            .update(frame.dt, &page_input, view, self.estimator.drift());

        // Triggers stay quiet while an interaction is in progress
        if self.host.is_empty() && !self.host.is_suspended() {
            self.triggers.activate();
        } else {
            self.triggers.deactivate();
        }
        for (id, kind) in self.triggers.update(frame.dt, &input, view) {
            match kind.build(&self.config) {
                Ok(pipeline) => {
                    let pipeline_id = self.host.push(pipeline);
                    debug!(trigger = id, pipeline = pipeline_id, ?kind, "Pipeline started by trigger");
                }
                Err(e) => error!(trigger = id, error = %e, "Failed to build pipeline"),
            }
        }

        let output = FrameOutput {
            input: page_input,
            status: self.estimator.status(),
            commands,
            triggers: self.triggers.visuals(view),
            draw: self.host.draw(),
        };

        self.metrics.finish_frame(started);
        output
    }
}
