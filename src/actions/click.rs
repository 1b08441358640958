use crate::core::GazeInputState;
use crate::engine::{Action, ActionContext, ActionSlots, PageCommand};
use gazeflow_macros::ActionMeta;
use tracing::{debug, warn};

/// Click at the page coordinate received on its input
#[derive(ActionMeta, Debug, Clone)]
#[action_meta(name = "Left Click", category = "Interaction")]
pub struct LeftClickAction {
    #[input(kind = "vec2")]
    _coordinate: (),

    slots: ActionSlots,
}

impl Default for LeftClickAction {
    fn default() -> Self {
        Self {
            _coordinate: (),
            slots: ActionSlots::declare(&Self::metadata()),
        }
    }
}

impl Action for LeftClickAction {
    fn id(&self) -> &str {
        "left_click"
    }

    fn slots(&self) -> &ActionSlots {
        &self.slots
    }

    fn slots_mut(&mut self) -> &mut ActionSlots {
        &mut self.slots
    }

    fn update(&mut self, _dt: f64, _input: &GazeInputState, ctx: &mut ActionContext) -> bool {
        match self.slots.input_vec2("coordinate") {
            Some(page) => {
                debug!(x = page.x, y = page.y, "Click");
                ctx.emit(PageCommand::Click { page });
            }
            None => warn!("Click without coordinate, skipping"),
        }
        true
    }
}
