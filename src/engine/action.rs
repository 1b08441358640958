use super::slots::ActionSlots;
use crate::core::{GazeInputState, PageView, Rect, Vec2};
use crate::estimator::DriftGrid;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Web view presentation requested by an action
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewParameters {
    /// Page-space scale, 1.0 is unmagnified
    pub zoom: f64,
    /// Zoom anchor, relative to the web view
    pub zoom_position: Vec2,
    /// Shift of the magnified page, relative to the web view
    pub center_offset: Vec2,
    /// 0 = no dimming
    pub dim: f64,
}

impl Default for ViewParameters {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            zoom_position: Vec2::splat(0.5),
            center_offset: Vec2::ZERO,
            dim: 0.0,
        }
    }
}

/// Side effect for the browser engine, dispatched as plain data.
/// Page coordinates are page pixels relative to the viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum PageCommand {
    SetView(ViewParameters),
    ResetView,
    Click { page: Vec2 },
    BeginTextSelection { page: Vec2 },
    EndTextSelection { page: Vec2 },
    /// Page pixels to scroll by
    Scroll { delta: Vec2 },
}

/// Visual feedback for the overlay layer, in window pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum DrawCommand {
    /// Dwell progress ring, `progress` in 0..1
    Progress { at: Vec2, progress: f64 },
    Marker { at: Vec2 },
    Highlight { rect: Rect },
}

/// What an action may read and where its side effects go during one call
pub struct ActionContext<'a> {
    pub view: &'a PageView,
    pub drift: &'a DriftGrid,
    commands: &'a mut Vec<PageCommand>,
}

impl<'a> ActionContext<'a> {
    pub fn new(view: &'a PageView, drift: &'a DriftGrid, commands: &'a mut Vec<PageCommand>) -> Self {
        Self {
            view,
            drift,
            commands,
        }
    }

    pub fn emit(&mut self, command: PageCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[PageCommand] {
        &self.commands[..]
    }
}

/// Lifecycle of one action instance inside a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActionState {
    #[default]
    Inactive,
    Active,
    Finished,
    Aborted,
}

impl ActionState {
    pub fn can_transition_to(&self, target: ActionState) -> bool {
        use ActionState::*;
        matches!(
            (self, target),
            (Inactive, Active) | (Active, Finished) | (Active, Aborted)
        )
    }
}

/// Single-purpose interaction step.
///
/// `activate` and `deactivate` run exactly once per instance, on entry and
/// exit. `deactivate` must undo any transient visual state the action
/// introduced. `abort` runs before `deactivate` when the owning pipeline is
/// cancelled. `suspend` and `resume` bracket periods where the pipeline is
/// paused without being torn down.
pub trait Action: Send {
    /// Catalogue id, e.g. "magnify"
    fn id(&self) -> &str;

    fn slots(&self) -> &ActionSlots;

    fn slots_mut(&mut self) -> &mut ActionSlots;

    /// Apply parameters from a pipeline description
    fn configure(&mut self, _params: &Value) -> Result<()> {
        Ok(())
    }

    fn activate(&mut self, _ctx: &mut ActionContext) {}

    /// Returns true when finished. Output slots must be set by then.
    fn update(&mut self, dt: f64, input: &GazeInputState, ctx: &mut ActionContext) -> bool;

    fn draw(&self, _out: &mut Vec<DrawCommand>) {}

    fn deactivate(&mut self, _ctx: &mut ActionContext) {}

    fn abort(&mut self, _ctx: &mut ActionContext) {}

    fn suspend(&mut self, _ctx: &mut ActionContext) {}

    fn resume(&mut self, _ctx: &mut ActionContext) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_state_transitions() {
        use ActionState::*;
        assert!(Inactive.can_transition_to(Active));
        assert!(Active.can_transition_to(Finished));
        assert!(Active.can_transition_to(Aborted));
        assert!(!Inactive.can_transition_to(Finished));
        assert!(!Finished.can_transition_to(Active));
        assert!(!Aborted.can_transition_to(Active));
    }

    #[test]
    fn test_page_command_serializes_as_plain_data() {
        let json = serde_json::to_value(PageCommand::Click {
            page: Vec2::new(10.0, 20.0),
        })
        .unwrap();
        assert_eq!(json["command"], "click");
        assert_eq!(json["page"]["x"], 10.0);
    }
}
