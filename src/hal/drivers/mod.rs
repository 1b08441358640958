pub mod open_gaze;

pub use open_gaze::OpenGazeSource;
