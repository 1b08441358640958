pub mod click;
pub mod coordinate;
pub mod magnify;
pub mod presets;
pub mod scroll;
pub mod selection;

pub use click::LeftClickAction;
pub use coordinate::DwellCoordinateAction;
pub use magnify::MagnifyAction;
pub use presets::PipelineKind;
pub use scroll::GazeScrollAction;
pub use selection::{SelectionEndAction, SelectionStartAction};
