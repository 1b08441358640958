use super::dom::{window_relative, DomTarget, DomTrigger};
use crate::actions::PipelineKind;
use crate::config::TriggerConfig;
use crate::core::{GazeInputState, PageView, Vec2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What the overlay needs to draw one trigger button
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerVisual {
    pub id: u64,
    pub kind: PipelineKind,
    /// Button centre relative to the window
    pub position: Vec2,
    /// Button size relative to the window
    pub size: Vec2,
    pub visible: bool,
    pub offset_index: usize,
    pub progress: f64,
}

/// Triggers of one page, kept in insertion order. Placement of a trigger
/// only depends on the ones inserted before it.
pub struct TriggerCollection {
    triggers: Vec<DomTrigger>,
    config: TriggerConfig,
    active: bool,
}

impl TriggerCollection {
    pub fn new(config: TriggerConfig) -> Self {
        Self {
            triggers: Vec::new(),
            config,
            active: true,
        }
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    /// Add a trigger, or retarget the existing one with the same id
    pub fn insert(&mut self, target: DomTarget, kind: PipelineKind) {
        if let Some(existing) = self.triggers.iter_mut().find(|t| t.id() == target.id) {
            existing.set_target(target);
            return;
        }
        debug!(id = target.id, node_type = %target.node_type, ?kind, "Trigger added");
        self.triggers.push(DomTrigger::new(target, kind));
    }

    /// Returns false if no trigger has that id
    pub fn update_target(&mut self, target: DomTarget) -> bool {
        match self.triggers.iter_mut().find(|t| t.id() == target.id) {
            Some(trigger) => {
                trigger.set_target(target);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.triggers.len();
        self.triggers.retain(|t| t.id() != id);
        before != self.triggers.len()
    }

    pub fn clear(&mut self) {
        self.triggers.clear();
    }

    pub fn schedule(&mut self, id: u64) -> bool {
        match self.triggers.iter_mut().find(|t| t.id() == id) {
            Some(trigger) => {
                trigger.schedule();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: u64) -> Option<&DomTrigger> {
        self.triggers.iter().find(|t| t.id() == id)
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Inactive triggers keep their placement but never fire. Scheduled
    /// fires are kept until the collection is active again.
    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Gaze in window pixels lies on a button currently drawn
    pub fn covers(&self, gaze: Vec2, view: &PageView) -> bool {
        if !self.active {
            return false;
        }
        let relative = window_relative(gaze, view);
        self.triggers
            .iter()
            .any(|t| t.is_visible() && t.button_rect(view, &self.config).contains(relative))
    }

    /// Place every trigger, then evaluate dwell. Returns the triggers that
    /// fired this frame.
    pub fn update(&mut self, dt: f64, input: &GazeInputState, view: &PageView) -> Vec<(u64, PipelineKind)> {
        for i in 0..self.triggers.len() {
            let (earlier, rest) = self.triggers.split_at_mut(i);
            if let Some(trigger) = rest.first_mut() {
                trigger.update_position(earlier, view, &self.config);
            }
        }

        if !self.active {
            return Vec::new();
        }

        let mut fired = Vec::new();
        for trigger in &mut self.triggers {
            if trigger.update(dt, input, view, &self.config) {
                debug!(id = trigger.id(), kind = ?trigger.kind(), "Trigger fired");
                fired.push((trigger.id(), trigger.kind()));
            }
        }
        fired
    }

    pub fn visuals(&self, view: &PageView) -> Vec<TriggerVisual> {
        self.triggers
            .iter()
            .map(|t| TriggerVisual {
                id: t.id(),
                kind: t.kind(),
                position: t.position(),
                size: t.button_rect(view, &self.config).size(),
                visible: t.is_visible() && self.active,
                offset_index: t.offset_index(),
                progress: t.progress(&self.config),
            })
            .collect()
    }
}

impl Default for TriggerCollection {
    fn default() -> Self {
        Self::new(TriggerConfig::default())
    }
}
