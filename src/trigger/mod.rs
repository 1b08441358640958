pub mod collection;
pub mod dom;

pub use collection::{TriggerCollection, TriggerVisual};
pub use dom::{DomTarget, DomTrigger};
