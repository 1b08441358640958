use crate::actions::PipelineKind;
use crate::config::TriggerConfig;
use crate::core::{GazeInputState, PageView, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Interactable page element a trigger is attached to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomTarget {
    pub id: u64,
    /// e.g. "link", "text_input"
    pub node_type: String,
    /// Bounding rects in document pixels
    pub rects: Vec<Rect>,
    /// Fixed elements do not move with the page scroll
    #[serde(default)]
    pub fixed: bool,
}

impl DomTarget {
    /// Centre of the first rect in document pixels
    pub fn dom_position(&self) -> Vec2 {
        self.rects.first().map(Rect::center).unwrap_or(Vec2::ZERO)
    }

    pub fn is_visible(&self) -> bool {
        self.rects
            .first()
            .map(|r| r.width != 0.0 && r.height != 0.0)
            .unwrap_or(false)
    }
}

/// Window pixels to window-relative coordinates
pub(crate) fn window_relative(p: Vec2, view: &PageView) -> Vec2 {
    let window = view.window_size;
    Vec2::new(
        if window.x > 0.0 { p.x / window.x } else { 0.0 },
        if window.y > 0.0 { p.y / window.y } else { 0.0 },
    )
}

/// Dwell button placed on a page element. Fires a pipeline of `kind`.
#[derive(Debug, Clone)]
pub struct DomTrigger {
    target: DomTarget,
    kind: PipelineKind,
    visible: bool,
    triggered: bool,
    scheduled: bool,
    /// Button centre relative to the window
    position: Vec2,
    offset_index: usize,
    dwell: f64,
    armed: bool,
}

impl DomTrigger {
    pub fn new(target: DomTarget, kind: PipelineKind) -> Self {
        Self {
            target,
            kind,
            visible: false,
            triggered: false,
            scheduled: false,
            position: Vec2::ZERO,
            offset_index: 0,
            dwell: 0.0,
            armed: true,
        }
    }

    pub fn id(&self) -> u64 {
        self.target.id
    }

    pub fn kind(&self) -> PipelineKind {
        self.kind
    }

    pub fn target(&self) -> &DomTarget {
        &self.target
    }

    pub fn set_target(&mut self, target: DomTarget) {
        self.target = target;
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn offset_index(&self) -> usize {
        self.offset_index
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Dwell progress, 0..1
    pub fn progress(&self, config: &TriggerConfig) -> f64 {
        if config.dwell_s > 0.0 {
            (self.dwell / config.dwell_s).min(1.0)
        } else {
            0.0
        }
    }

    /// Fire on the next update without waiting for a dwell
    pub fn schedule(&mut self) {
        self.scheduled = true;
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// Pick the horizontal offset within the target and recompute the
    /// button position. `earlier` are the triggers placed before this one
    /// in the same frame.
    pub fn update_position(&mut self, earlier: &[DomTrigger], view: &PageView, config: &TriggerConfig) {
        self.visible = self.target.is_visible();
        let Some(rect) = self.target.rects.first().copied() else {
            return;
        };
        if config.offsets.is_empty() {
            self.offset_index = 0;
            self.position = view.document_to_window_relative(rect.center(), self.target.fixed);
            return;
        }

        let at_offset = |index: usize| {
            let x = rect.x + rect.width * config.offsets[index];
            view.document_to_window_relative(Vec2::new(x, rect.center().y), self.target.fixed)
        };
        let min_distance = config.min_distance_factor * config.button_size;

        let mut index = 0;
        for other in earlier {
            if other.target.dom_position().distance(self.target.dom_position()) < 1.0
                && other.target.node_type == self.target.node_type
                && other.target.fixed == self.target.fixed
            {
                index = other.offset_index;
                break;
            }
            while index < config.offsets.len() && other.position.distance(at_offset(index)) < min_distance {
                index += 1;
            }
        }
        if index >= config.offsets.len() {
            index = 0;
        }

        self.offset_index = index;
        self.position = at_offset(index);
    }

    /// Button area relative to the window
    pub fn button_rect(&self, view: &PageView, config: &TriggerConfig) -> Rect {
        let aspect = if view.window_size.x > 0.0 {
            view.window_size.y / view.window_size.x
        } else {
            1.0
        };
        let size = Vec2::new(config.button_size * aspect, config.button_size);
        Rect::new(
            self.position.x - size.x / 2.0,
            self.position.y - size.y / 2.0,
            size.x,
            size.y,
        )
    }

    /// Returns true at most once per dwell episode, or when scheduled.
    /// Emulated gaze only fires through instant interaction.
    pub fn update(&mut self, dt: f64, input: &GazeInputState, view: &PageView, config: &TriggerConfig) -> bool {
        let gaze = window_relative(input.gaze(), view);
        let inside = self.visible && !input.gaze_upon_gui && self.button_rect(view, config).contains(gaze);

        if !inside {
            self.dwell = 0.0;
            self.armed = true;
        } else if self.armed {
            if !input.gaze_emulated {
                self.dwell += dt;
            }
            if input.instant_interaction || (!input.gaze_emulated && self.dwell >= config.dwell_s) {
                self.triggered = true;
                self.armed = false;
                self.dwell = 0.0;
            }
        }

        let triggered = self.triggered || self.scheduled;
        self.triggered = false;
        self.scheduled = false;
        triggered
    }
}
