use crate::config::ScrollConfig;
use crate::core::{GazeInputState, Vec2};
use crate::engine::{Action, ActionContext, ActionSlots, DrawCommand, PageCommand};
use anyhow::{anyhow, Result};
use gazeflow_macros::ActionMeta;
use serde_json::Value;

/// Scroll while the gaze rests near a web view edge. Finishes once the
/// gaze has stayed in the centre for `rest_s` or on instant interaction.
#[derive(ActionMeta, Debug, Clone)]
#[action_meta(name = "Gaze Scroll", category = "Navigation")]
pub struct GazeScrollAction {
    /// Width of the scroll zones, relative to the web view
    #[param(default = "0.25", min = 0.01, max = 0.5)]
    pub edge_zone: f64,

    /// Page pixels per second at the very edge
    #[param(default = "900.0", min = 0.0)]
    pub max_speed: f64,

    #[param(default = "1.0", min = 0.0)]
    pub rest_s: f64,

    slots: ActionSlots,
    rest: f64,
    scrolled: Vec2,
    marker: Option<Vec2>,
}

impl Default for GazeScrollAction {
    fn default() -> Self {
        Self::from_config(&ScrollConfig::default())
    }
}

impl GazeScrollAction {
    pub fn from_config(config: &ScrollConfig) -> Self {
        Self {
            edge_zone: config.edge_zone,
            max_speed: config.max_speed,
            rest_s: config.rest_s,
            slots: ActionSlots::declare(&Self::metadata()),
            rest: 0.0,
            scrolled: Vec2::ZERO,
            marker: None,
        }
    }

    /// Total page pixels scrolled so far
    pub fn scrolled(&self) -> Vec2 {
        self.scrolled
    }

    fn axis_speed(&self, relative: f64) -> f64 {
        let relative = relative.clamp(0.0, 1.0);
        if relative < self.edge_zone {
            -self.max_speed * (self.edge_zone - relative) / self.edge_zone
        } else if relative > 1.0 - self.edge_zone {
            self.max_speed * (relative - (1.0 - self.edge_zone)) / self.edge_zone
        } else {
            0.0
        }
    }
}

impl Action for GazeScrollAction {
    fn id(&self) -> &str {
        "gaze_scroll"
    }

    fn slots(&self) -> &ActionSlots {
        &self.slots
    }

    fn slots_mut(&mut self) -> &mut ActionSlots {
        &mut self.slots
    }

    fn configure(&mut self, params: &Value) -> Result<()> {
        if let Some(v) = params.get("edge_zone").and_then(|v| v.as_f64()) {
            if !(v > 0.0 && v <= 0.5) {
                return Err(anyhow!("edge_zone must be in (0, 0.5], got {}", v));
            }
            self.edge_zone = v;
        }
        if let Some(v) = params.get("max_speed").and_then(|v| v.as_f64()) {
            self.max_speed = v.max(0.0);
        }
        if let Some(v) = params.get("rest_s").and_then(|v| v.as_f64()) {
            self.rest_s = v.max(0.0);
        }
        Ok(())
    }

    fn update(&mut self, dt: f64, input: &GazeInputState, ctx: &mut ActionContext) -> bool {
        if input.instant_interaction {
            return true;
        }
        if input.gaze_upon_gui {
            self.marker = None;
            return false;
        }

        let relative = ctx.view.window_to_webview_relative(input.gaze());
        let velocity = Vec2::new(self.axis_speed(relative.x), self.axis_speed(relative.y));

        if velocity == Vec2::ZERO {
            self.marker = None;
            self.rest += dt;
            return self.rest >= self.rest_s;
        }

        self.rest = 0.0;
        self.marker = Some(input.gaze());
        let delta = velocity * dt;
        self.scrolled += delta;
        ctx.emit(PageCommand::Scroll { delta });
        false
    }

    fn draw(&self, out: &mut Vec<DrawCommand>) {
        if let Some(at) = self.marker {
            out.push(DrawCommand::Marker { at });
        }
    }

    /// Scroll back to where the page was on activation
    fn abort(&mut self, ctx: &mut ActionContext) {
        if self.scrolled != Vec2::ZERO {
            ctx.emit(PageCommand::Scroll {
                delta: self.scrolled * -1.0,
            });
            self.scrolled = Vec2::ZERO;
        }
    }
}
