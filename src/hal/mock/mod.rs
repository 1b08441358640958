pub mod replay;
pub mod simulated;

pub use replay::{load_recording, Recording, ReplaySource};
pub use simulated::{ScriptedFixation, SimulatedFeed, SimulatedSource};
