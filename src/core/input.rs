use super::geometry::{Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Per-frame snapshot handed to triggers and pipelines.
///
/// Gaze coordinates are window pixels. `gaze_upon_gui` is the only field
/// downstream code is expected to mutate, to mark the input as consumed by
/// an overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazeInputState {
    pub gaze_x: f64,
    pub gaze_y: f64,
    /// Seconds the estimate stayed within the dispersion threshold
    pub fixation_duration: f64,
    /// Pointer coordinates substituted for gaze
    pub gaze_emulated: bool,
    /// Seconds since the last valid sample, infinite before the first one
    pub gaze_age: f64,
    pub window_focused: bool,
    /// One-shot request to bypass dwell thresholds
    pub instant_interaction: bool,
    pub gaze_upon_gui: bool,
}

impl GazeInputState {
    pub fn gaze(&self) -> Vec2 {
        Vec2::new(self.gaze_x, self.gaze_y)
    }

    /// Input that downstream consumers may react to
    pub fn usable(&self, max_age: f64) -> bool {
        self.window_focused
            && !self.gaze_upon_gui
            && (self.gaze_emulated || self.gaze_age <= max_age)
    }

    pub fn mark_consumed(&mut self) {
        self.gaze_upon_gui = true;
    }
}

impl Default for GazeInputState {
    fn default() -> Self {
        Self {
            gaze_x: 0.0,
            gaze_y: 0.0,
            fixation_duration: 0.0,
            gaze_emulated: true,
            gaze_age: f64::INFINITY,
            window_focused: true,
            instant_interaction: false,
            gaze_upon_gui: false,
        }
    }
}

/// What the host window reports for one frame tick
#[derive(Debug, Clone, PartialEq)]
pub struct FrameContext {
    /// Seconds since the previous tick
    pub dt: f64,
    pub window_focused: bool,
    /// Pointer position in window pixels
    pub pointer: Vec2,
    /// Window rectangle in screen pixels
    pub window: Rect,
    /// Physical screen size in pixels
    pub screen_size: Vec2,
    pub instant_interaction: bool,
}

impl FrameContext {
    pub fn new(dt: f64, window: Rect) -> Self {
        Self {
            dt,
            window_focused: true,
            pointer: Vec2::ZERO,
            screen_size: window.size(),
            window,
            instant_interaction: false,
        }
    }

    pub fn with_pointer(mut self, pointer: Vec2) -> Self {
        self.pointer = pointer;
        self
    }

    pub fn with_focus(mut self, focused: bool) -> Self {
        self.window_focused = focused;
        self
    }

    pub fn with_instant_interaction(mut self, instant: bool) -> Self {
        self.instant_interaction = instant;
        self
    }

    pub fn with_screen_size(mut self, screen_size: Vec2) -> Self {
        self.screen_size = screen_size;
        self
    }
}

impl Default for FrameContext {
    fn default() -> Self {
        Self::new(1.0 / 60.0, Rect::new(0.0, 0.0, 1280.0, 720.0))
    }
}
