pub mod policy;

pub use policy::{ReconnectPolicy, ReconnectSchedule};
