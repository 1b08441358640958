pub mod action;
pub mod connector;
pub mod host;
pub mod pipeline;
pub mod slots;
pub mod state;

pub use action::{Action, ActionContext, ActionState, DrawCommand, PageCommand, ViewParameters};
pub use connector::ActionConnector;
pub use host::{PipelineHost, PipelineId};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use slots::{ActionSlots, Slot, SlotDirection, SlotError, SlotKind, SlotValue};
pub use state::PipelineState;
