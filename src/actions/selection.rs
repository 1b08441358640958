use crate::core::GazeInputState;
use crate::engine::{Action, ActionContext, ActionSlots, PageCommand};
use gazeflow_macros::ActionMeta;
use tracing::warn;

/// Start a text selection at the page coordinate on its input
#[derive(ActionMeta, Debug, Clone)]
#[action_meta(name = "Selection Start", category = "Interaction")]
pub struct SelectionStartAction {
    #[input(kind = "vec2")]
    _coordinate: (),

    slots: ActionSlots,
}

impl Default for SelectionStartAction {
    fn default() -> Self {
        Self {
            _coordinate: (),
            slots: ActionSlots::declare(&Self::metadata()),
        }
    }
}

impl Action for SelectionStartAction {
    fn id(&self) -> &str {
        "selection_start"
    }

    fn slots(&self) -> &ActionSlots {
        &self.slots
    }

    fn slots_mut(&mut self) -> &mut ActionSlots {
        &mut self.slots
    }

    fn update(&mut self, _dt: f64, _input: &GazeInputState, ctx: &mut ActionContext) -> bool {
        match self.slots.input_vec2("coordinate") {
            Some(page) => ctx.emit(PageCommand::BeginTextSelection { page }),
            None => warn!("Selection start without coordinate, skipping"),
        }
        true
    }
}

/// Finish a text selection at the page coordinate on its input
#[derive(ActionMeta, Debug, Clone)]
#[action_meta(name = "Selection End", category = "Interaction")]
pub struct SelectionEndAction {
    #[input(kind = "vec2")]
    _coordinate: (),

    slots: ActionSlots,
}

impl Default for SelectionEndAction {
    fn default() -> Self {
        Self {
            _coordinate: (),
            slots: ActionSlots::declare(&Self::metadata()),
        }
    }
}

impl Action for SelectionEndAction {
    fn id(&self) -> &str {
        "selection_end"
    }

    fn slots(&self) -> &ActionSlots {
        &self.slots
    }

    fn slots_mut(&mut self) -> &mut ActionSlots {
        &mut self.slots
    }

    fn update(&mut self, _dt: f64, _input: &GazeInputState, ctx: &mut ActionContext) -> bool {
        match self.slots.input_vec2("coordinate") {
            Some(page) => ctx.emit(PageCommand::EndTextSelection { page }),
            None => warn!("Selection end without coordinate, skipping"),
        }
        true
    }
}
