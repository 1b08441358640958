pub mod clock;
pub mod geometry;
pub mod input;
pub mod sample;
pub mod view;

pub use clock::{Clock, ManualClock, SystemClock};
pub use geometry::{Rect, Vec2};
pub use input::{FrameContext, GazeInputState};
pub use sample::{CoordinateSystem, RawSample};
pub use view::PageView;
