use crate::config::PointerOverrideConfig;
use crate::core::Vec2;

#[derive(Debug, Clone, Copy)]
struct InitWindow {
    distance: f64,
    elapsed: f64,
}

/// Lets the pointer take over from a streaming tracker.
///
/// Moving the pointer at least `init_distance` pixels within `init_window`
/// seconds activates the override; it ends after the pointer has rested
/// for `stop_after` seconds.
#[derive(Debug, Clone)]
pub struct PointerOverride {
    enabled: bool,
    init_distance: f64,
    init_window: f64,
    stop_after: f64,

    last_pointer: Option<Vec2>,
    init: Option<InitWindow>,
    active: bool,
    idle: f64,
}

impl PointerOverride {
    pub fn new(config: &PointerOverrideConfig) -> Self {
        Self {
            enabled: config.enabled,
            init_distance: config.init_distance_px,
            init_window: config.init_window_s,
            stop_after: config.stop_after_s,
            last_pointer: None,
            init: None,
            active: false,
            idle: 0.0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Feed this frame's pointer position; returns whether the override is active
    pub fn update(&mut self, dt: f64, pointer: Vec2) -> bool {
        if !self.enabled {
            return false;
        }

        let step = self.last_pointer.map_or(0.0, |last| last.distance(pointer));
        self.last_pointer = Some(pointer);

        if self.active {
            if step > 0.0 {
                self.idle = 0.0;
            } else {
                self.idle += dt;
                if self.idle >= self.stop_after {
                    self.active = false;
                }
            }
            return self.active;
        }

        if step > 0.0 {
            let window = self.init.get_or_insert(InitWindow {
                distance: 0.0,
                elapsed: 0.0,
            });
            window.distance += step;
        }

        if let Some(window) = &mut self.init {
            window.elapsed += dt;
            if window.distance >= self.init_distance {
                self.active = true;
                self.idle = 0.0;
                self.init = None;
            } else if window.elapsed > self.init_window {
                self.init = None;
            }
        }

        self.active
    }

    pub fn reset(&mut self) {
        self.init = None;
        self.active = false;
        self.idle = 0.0;
    }
}
