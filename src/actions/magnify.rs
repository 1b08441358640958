use crate::config::MagnificationConfig;
use crate::core::{GazeInputState, Vec2};
use crate::engine::{Action, ActionContext, ActionSlots, PageCommand, SlotValue, ViewParameters};
use anyhow::{anyhow, Result};
use gazeflow_macros::ActionMeta;
use serde_json::Value;
use std::f64::consts::PI;
use tracing::{debug, error};

/// Two-stage coordinate selection. A first dwell zooms the page around the
/// gaze point, a second dwell on the magnified page commits the coordinate.
///
/// Only a fixation that began after activation can anchor the zoom, so the
/// dwell that started the pipeline is not reused.
#[derive(ActionMeta, Debug, Clone)]
#[action_meta(name = "Magnify", category = "Coordinate")]
pub struct MagnifyAction {
    #[output(kind = "vec2")]
    _coordinate: (),

    /// Page-space scale at full magnification
    #[param(default = "0.5", min = 0.05, max = 1.0)]
    pub zoom: f64,

    #[param(default = "0.4", min = 0.0)]
    pub animation_s: f64,

    #[param(default = "0.5", min = 0.0)]
    pub fixation_s: f64,

    #[param(default = "true")]
    pub dimming: bool,

    #[param(default = "0.5", min = 0.0)]
    pub dimming_s: f64,

    #[param(default = "0.3", min = 0.0, max = 1.0)]
    pub dimming_value: f64,

    slots: ActionSlots,
    magnify: bool,
    /// Animation progress, 0..1
    magnification: f64,
    /// Zoom anchor relative to the web view
    center: Vec2,
    /// Dead time after the anchor is captured
    fixation_wait: f64,
    dimming_elapsed: f64,
    /// Seconds since activation
    elapsed: f64,
}

impl Default for MagnifyAction {
    fn default() -> Self {
        Self::from_config(&MagnificationConfig::default())
    }
}

impl MagnifyAction {
    pub fn from_config(config: &MagnificationConfig) -> Self {
        Self {
            _coordinate: (),
            zoom: config.zoom,
            animation_s: config.animation_s,
            fixation_s: config.fixation_s,
            dimming: config.dimming,
            dimming_s: config.dimming_s,
            dimming_value: config.dimming_value,
            slots: ActionSlots::declare(&Self::metadata()),
            magnify: false,
            magnification: 0.0,
            center: Vec2::splat(0.5),
            fixation_wait: 0.0,
            dimming_elapsed: 0.0,
            elapsed: 0.0,
        }
    }

    pub fn is_magnified(&self) -> bool {
        self.magnification >= 1.0
    }

    fn ease(&self) -> f64 {
        1.0 - ((PI * self.magnification).cos() + 1.0) / 2.0
    }

    fn view_parameters(&self) -> ViewParameters {
        let ease = self.ease();
        let dim = if self.dimming && self.dimming_s > 0.0 {
            self.dimming_value * (self.dimming_elapsed / self.dimming_s)
        } else if self.dimming {
            self.dimming_value
        } else {
            0.0
        };
        ViewParameters {
            zoom: ease * self.zoom + (1.0 - ease),
            zoom_position: self.center,
            center_offset: (self.center - Vec2::splat(0.5)) * ease,
            dim,
        }
    }

    /// Web view relative coordinate to page pixels, mirroring how the
    /// web view renders the magnified page
    fn page_coordinate(&self, relative: Vec2, params: &ViewParameters, resolution: Vec2) -> Vec2 {
        let mut c = relative + params.center_offset;
        c -= params.zoom_position;
        c = c * params.zoom;
        c += params.zoom_position;
        c.scale(resolution)
    }
}

impl Action for MagnifyAction {
    fn id(&self) -> &str {
        "magnify"
    }

    fn slots(&self) -> &ActionSlots {
        &self.slots
    }

    fn slots_mut(&mut self) -> &mut ActionSlots {
        &mut self.slots
    }

    fn configure(&mut self, params: &Value) -> Result<()> {
        if let Some(zoom) = params.get("zoom").and_then(|v| v.as_f64()) {
            if !(zoom > 0.0 && zoom <= 1.0) {
                return Err(anyhow!("zoom must be in (0, 1], got {}", zoom));
            }
            self.zoom = zoom;
        }
        if let Some(v) = params.get("animation_s").and_then(|v| v.as_f64()) {
            self.animation_s = v.max(0.0);
        }
        if let Some(v) = params.get("fixation_s").and_then(|v| v.as_f64()) {
            self.fixation_s = v.max(0.0);
        }
        if let Some(v) = params.get("dimming").and_then(|v| v.as_bool()) {
            self.dimming = v;
        }
        if let Some(v) = params.get("dimming_s").and_then(|v| v.as_f64()) {
            self.dimming_s = v.max(0.0);
        }
        if let Some(v) = params.get("dimming_value").and_then(|v| v.as_f64()) {
            self.dimming_value = v.clamp(0.0, 1.0);
        }
        Ok(())
    }

    fn update(&mut self, dt: f64, input: &GazeInputState, ctx: &mut ActionContext) -> bool {
        self.elapsed += dt;
        if self.magnify && self.magnification < 1.0 {
            self.magnification = if self.animation_s > 0.0 {
                (self.magnification + dt / self.animation_s).min(1.0)
            } else {
                1.0
            };
        }

        if self.fixation_wait > 0.0 {
            self.fixation_wait = (self.fixation_wait - dt).max(0.0);
        }

        let params = self.view_parameters();
        // Gaze arrives drift corrected from the estimator
        let gaze = ctx.view.window_to_webview_relative(input.gaze());

        let qualified = !input.gaze_upon_gui
            && (input.instant_interaction
                || (!input.gaze_emulated
                    && self.fixation_wait <= 0.0
                    && input.fixation_duration >= self.fixation_s));

        // Fixation must not predate this action, within one frame
        let fresh = input.instant_interaction || input.fixation_duration <= self.elapsed + dt;

        let mut finished = false;
        if qualified {
            if self.magnification >= 1.0 {
                let page = self.page_coordinate(gaze, &params, ctx.view.resolution);
                match self.slots.set_output("coordinate", SlotValue::Vec2(page)) {
                    Ok(()) => {
                        debug!(x = page.x, y = page.y, "Magnified coordinate committed");
                        finished = true;
                    }
                    Err(e) => error!(error = %e, "Failed to set magnify output"),
                }
            } else if self.magnification <= 0.0 && fresh {
                self.center = gaze;
                self.magnify = true;
                self.fixation_wait = self.fixation_s;
                debug!(x = gaze.x, y = gaze.y, "Magnification anchored");
            }
        }

        if self.dimming_elapsed < self.dimming_s {
            self.dimming_elapsed = (self.dimming_elapsed + dt).min(self.dimming_s);
        }

        ctx.emit(PageCommand::SetView(self.view_parameters()));
        finished
    }

    fn deactivate(&mut self, ctx: &mut ActionContext) {
        ctx.emit(PageCommand::ResetView);
    }

    fn suspend(&mut self, ctx: &mut ActionContext) {
        ctx.emit(PageCommand::ResetView);
    }

    fn resume(&mut self, ctx: &mut ActionContext) {
        ctx.emit(PageCommand::SetView(self.view_parameters()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PageView;
    use crate::estimator::DriftGrid;

    fn fixating(x: f64, y: f64, duration: f64) -> GazeInputState {
        GazeInputState {
            gaze_x: x,
            gaze_y: y,
            fixation_duration: duration,
            gaze_emulated: false,
            gaze_age: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_first_dwell_anchors_second_commits() {
        let view = PageView::fullscreen(1000.0, 1000.0);
        let drift = DriftGrid::default();
        let mut commands = Vec::new();
        let mut ctx = ActionContext::new(&view, &drift, &mut commands);
        let mut action = MagnifyAction::default();
        action.activate(&mut ctx);

        // Fixation starts with the action, not long enough yet
        for duration in [0.0, 0.2, 0.4] {
            assert!(!action.update(0.2, &fixating(750.0, 250.0, duration), &mut ctx));
        }
        assert!(!action.magnify);

        assert!(!action.update(0.2, &fixating(750.0, 250.0, 0.6), &mut ctx));
        assert!(action.magnify);
        assert_eq!(action.center, Vec2::new(0.75, 0.25));

        // Same dwell episode cannot commit during the dead time
        for _ in 0..5 {
            assert!(!action.update(0.1, &fixating(750.0, 250.0, 1.0), &mut ctx));
        }
        assert!(action.is_magnified());

        // Looking at the anchor on the magnified page commits the anchor
        assert!(action.update(0.1, &fixating(500.0, 500.0, 1.0), &mut ctx));
        let out = action.slots().output("coordinate").and_then(SlotValue::as_vec2).unwrap();
        assert!((out.x - 750.0).abs() < 1e-9);
        assert!((out.y - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_fixation_from_before_activation_does_not_anchor() {
        let view = PageView::fullscreen(1000.0, 1000.0);
        let drift = DriftGrid::default();
        let mut commands = Vec::new();
        let mut ctx = ActionContext::new(&view, &drift, &mut commands);
        let mut action = MagnifyAction::default();
        action.activate(&mut ctx);

        // Ongoing fixation that was already 1 s old on activation
        for i in 1..=20 {
            let duration = 1.0 + 0.1 * i as f64;
            assert!(!action.update(0.1, &fixating(500.0, 320.0, duration), &mut ctx));
        }
        assert!(!action.magnify);

        // Saccade, then a new fixation long enough
        action.update(0.1, &fixating(500.0, 600.0, 0.0), &mut ctx);
        assert!(!action.magnify);
        action.update(0.6, &fixating(500.0, 600.0, 0.6), &mut ctx);
        assert!(action.magnify);
        assert_eq!(action.center, Vec2::new(0.5, 0.6));
    }

    #[test]
    fn test_emulated_gaze_needs_instant_interaction() {
        let view = PageView::fullscreen(1000.0, 1000.0);
        let drift = DriftGrid::default();
        let mut commands = Vec::new();
        let mut ctx = ActionContext::new(&view, &drift, &mut commands);
        let mut action = MagnifyAction::default();

        let mut input = fixating(500.0, 500.0, 5.0);
        input.gaze_emulated = true;
        action.update(0.1, &input, &mut ctx);
        assert!(!action.magnify);

        input.instant_interaction = true;
        action.update(0.1, &input, &mut ctx);
        assert!(action.magnify);
    }

    #[test]
    fn test_deactivate_resets_view() {
        let view = PageView::default();
        let drift = DriftGrid::default();
        let mut commands = Vec::new();
        let mut ctx = ActionContext::new(&view, &drift, &mut commands);
        let mut action = MagnifyAction::default();
        action.update(0.1, &fixating(100.0, 100.0, 1.0), &mut ctx);
        action.deactivate(&mut ctx);
        assert_eq!(ctx.commands().last(), Some(&PageCommand::ResetView));
    }

    #[test]
    fn test_configure_rejects_bad_zoom() {
        let mut action = MagnifyAction::default();
        assert!(action.configure(&serde_json::json!({"zoom": 2.0})).is_err());
        action.configure(&serde_json::json!({"zoom": 0.25})).unwrap();
        assert_eq!(action.zoom, 0.25);
    }
}
