use crate::core::{GazeInputState, Vec2};
use crate::engine::{Action, ActionContext, ActionSlots, DrawCommand, SlotValue};
use anyhow::Result;
use gazeflow_macros::ActionMeta;
use serde_json::Value;
use tracing::error;

/// Single dwell coordinate selection without magnification
#[derive(ActionMeta, Debug, Clone)]
#[action_meta(name = "Dwell Coordinate", category = "Coordinate")]
pub struct DwellCoordinateAction {
    #[output(kind = "vec2")]
    _coordinate: (),

    #[param(default = "0.8", min = 0.0)]
    pub dwell_s: f64,

    /// Report the coordinate without drift correction
    #[param(default = "false")]
    pub raw: bool,

    slots: ActionSlots,
    progress: f64,
    gaze: Vec2,
}

impl Default for DwellCoordinateAction {
    fn default() -> Self {
        Self {
            _coordinate: (),
            dwell_s: 0.8,
            raw: false,
            slots: ActionSlots::declare(&Self::metadata()),
            progress: 0.0,
            gaze: Vec2::ZERO,
        }
    }
}

impl Action for DwellCoordinateAction {
    fn id(&self) -> &str {
        "dwell_coordinate"
    }

    fn slots(&self) -> &ActionSlots {
        &self.slots
    }

    fn slots_mut(&mut self) -> &mut ActionSlots {
        &mut self.slots
    }

    fn configure(&mut self, params: &Value) -> Result<()> {
        if let Some(v) = params.get("dwell_s").and_then(|v| v.as_f64()) {
            self.dwell_s = v.max(0.0);
        }
        if let Some(v) = params.get("raw").and_then(|v| v.as_bool()) {
            self.raw = v;
        }
        Ok(())
    }

    fn update(&mut self, _dt: f64, input: &GazeInputState, ctx: &mut ActionContext) -> bool {
        self.gaze = input.gaze();
        if input.gaze_upon_gui {
            self.progress = 0.0;
            return false;
        }

        self.progress = if input.gaze_emulated {
            0.0
        } else if self.dwell_s > 0.0 {
            (input.fixation_duration / self.dwell_s).min(1.0)
        } else {
            1.0
        };

        if !input.instant_interaction && self.progress < 1.0 {
            return false;
        }

        let window_px = if self.raw {
            ctx.drift.invert(self.gaze)
        } else {
            self.gaze
        };
        let relative = ctx.view.window_to_webview_relative(window_px);
        let page = ctx.view.webview_relative_to_page(relative);
        match self.slots.set_output("coordinate", SlotValue::Vec2(page)) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to set dwell output");
                false
            }
        }
    }

    fn draw(&self, out: &mut Vec<DrawCommand>) {
        if self.progress > 0.0 {
            out.push(DrawCommand::Progress {
                at: self.gaze,
                progress: self.progress,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PageView;
    use crate::estimator::DriftGrid;

    #[test]
    fn test_dwell_outputs_page_coordinate() {
        let mut view = PageView::fullscreen(800.0, 600.0);
        view.resolution = Vec2::new(1600.0, 1200.0);
        let drift = DriftGrid::default();
        let mut commands = Vec::new();
        let mut ctx = ActionContext::new(&view, &drift, &mut commands);
        let mut action = DwellCoordinateAction::default();

        let mut input = GazeInputState {
            gaze_x: 400.0,
            gaze_y: 150.0,
            fixation_duration: 0.4,
            gaze_emulated: false,
            gaze_age: 0.0,
            ..Default::default()
        };
        assert!(!action.update(0.1, &input, &mut ctx));
        let mut drawn = Vec::new();
        action.draw(&mut drawn);
        assert!(matches!(drawn[0], DrawCommand::Progress { progress, .. } if (progress - 0.5).abs() < 1e-9));

        input.fixation_duration = 0.8;
        assert!(action.update(0.1, &input, &mut ctx));
        assert_eq!(
            action.slots().output("coordinate").and_then(SlotValue::as_vec2),
            Some(Vec2::new(800.0, 300.0))
        );
    }
}
