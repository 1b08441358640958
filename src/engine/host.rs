use super::action::{ActionContext, DrawCommand, PageCommand};
use super::pipeline::Pipeline;
use super::state::PipelineState;
use crate::config::HostConfig;
use crate::core::{GazeInputState, PageView};
use crate::estimator::DriftGrid;
use crate::observability::GazeMetrics;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Handle to a pipeline owned by a [`PipelineHost`]
pub type PipelineId = u64;

struct HostedPipeline {
    id: PipelineId,
    pipeline: Pipeline,
    age: f64,
    stall_warned: bool,
}

/// Owns the active pipelines, runs them every frame and collects their
/// page commands for dispatch.
///
/// Pipelines are independent of each other. A pipeline that never
/// finishes is only aborted when `max_lifetime_s` is configured.
pub struct PipelineHost {
    pipelines: Vec<HostedPipeline>,
    next_id: PipelineId,
    config: HostConfig,
    metrics: Option<Arc<GazeMetrics>>,
    pending: Vec<PageCommand>,
    suspended: bool,
}

impl PipelineHost {
    pub fn new(config: HostConfig) -> Self {
        Self {
            pipelines: Vec::new(),
            next_id: 1,
            config,
            metrics: None,
            pending: Vec::new(),
            suspended: false,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<GazeMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn push(&mut self, pipeline: Pipeline) -> PipelineId {
        let id = self.next_id;
        self.next_id += 1;
        debug!(id, pipeline = pipeline.name(), "Pipeline enqueued");
        if let Some(metrics) = &self.metrics {
            metrics.record_pipeline_started();
        }
        self.pipelines.push(HostedPipeline {
            id,
            pipeline,
            age: 0.0,
            stall_warned: false,
        });
        id
    }

    /// Run every pipeline for one frame and return the page commands they
    /// produced, including those left by aborts since the last frame.
    pub fn update(
        &mut self,
        dt: f64,
        input: &GazeInputState,
        view: &PageView,
        drift: &DriftGrid,
    ) -> Vec<PageCommand> {
        let mut commands = std::mem::take(&mut self.pending);

        if !self.suspended {
            let mut ctx = ActionContext::new(view, drift, &mut commands);
            for hosted in &mut self.pipelines {
                hosted.age += dt;

                if let Some(max) = self.config.max_lifetime_s {
                    if hosted.age > max {
                        warn!(
                            id = hosted.id,
                            pipeline = hosted.pipeline.name(),
                            age_s = hosted.age,
                            "Pipeline exceeded its lifetime, aborting"
                        );
                        hosted.pipeline.abort(&mut ctx);
                        continue;
                    }
                }

                if hosted.pipeline.update(dt, input, &mut ctx) {
                    continue;
                }

                if !hosted.stall_warned && hosted.age > self.config.stall_warning_s {
                    hosted.stall_warned = true;
                    warn!(
                        id = hosted.id,
                        pipeline = hosted.pipeline.name(),
                        action = hosted.pipeline.current_index(),
                        age_s = hosted.age,
                        "Pipeline has not finished"
                    );
                }
            }
        }

        self.remove_terminal();

        if let Some(metrics) = &self.metrics {
            metrics.record_commands(commands.len());
        }
        commands
    }

    /// Abort one pipeline. Its teardown commands are returned by the next
    /// `update`. Returns false for an unknown id.
    pub fn abort(&mut self, id: PipelineId, view: &PageView, drift: &DriftGrid) -> bool {
        let Some(hosted) = self.pipelines.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        let mut ctx = ActionContext::new(view, drift, &mut self.pending);
        hosted.pipeline.abort(&mut ctx);
        info!(id, pipeline = hosted.pipeline.name(), "Pipeline aborted");
        self.remove_terminal();
        true
    }

    pub fn abort_all(&mut self, view: &PageView, drift: &DriftGrid) {
        let mut ctx = ActionContext::new(view, drift, &mut self.pending);
        for hosted in &mut self.pipelines {
            hosted.pipeline.abort(&mut ctx);
        }
        self.remove_terminal();
    }

    /// Pause every pipeline, e.g. while the page is not visible
    pub fn suspend_all(&mut self, view: &PageView, drift: &DriftGrid) {
        if self.suspended {
            return;
        }
        self.suspended = true;
        let mut ctx = ActionContext::new(view, drift, &mut self.pending);
        for hosted in &mut self.pipelines {
            hosted.pipeline.deactivate(&mut ctx);
        }
    }

    pub fn resume_all(&mut self, view: &PageView, drift: &DriftGrid) {
        if !self.suspended {
            return;
        }
        self.suspended = false;
        let mut ctx = ActionContext::new(view, drift, &mut self.pending);
        for hosted in &mut self.pipelines {
            hosted.pipeline.activate(&mut ctx);
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn draw(&self) -> Vec<DrawCommand> {
        let mut out = Vec::new();
        for hosted in &self.pipelines {
            hosted.pipeline.draw(&mut out);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    pub fn contains(&self, id: PipelineId) -> bool {
        self.pipelines.iter().any(|p| p.id == id)
    }

    pub fn ids(&self) -> Vec<PipelineId> {
        self.pipelines.iter().map(|p| p.id).collect()
    }

    pub fn active_action_count(&self) -> usize {
        self.pipelines.iter().map(|p| p.pipeline.active_count()).sum()
    }

    fn remove_terminal(&mut self) {
        let metrics = self.metrics.as_ref();
        self.pipelines.retain(|hosted| match hosted.pipeline.state() {
            PipelineState::Finished => {
                debug!(id = hosted.id, pipeline = hosted.pipeline.name(), "Pipeline finished");
                if let Some(m) = metrics {
                    m.record_pipeline_finished();
                }
                false
            }
            PipelineState::Aborted => {
                if let Some(m) = metrics {
                    m.record_pipeline_aborted();
                }
                false
            }
            _ => true,
        });
    }
}

impl Default for PipelineHost {
    fn default() -> Self {
        Self::new(HostConfig::default())
    }
}
