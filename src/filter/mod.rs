pub mod kernel;
pub mod weighted;

pub use kernel::FilterKernel;
pub use weighted::WeightedAverageFilter;

use crate::core::{RawSample, Vec2};
use crate::estimator::DriftGrid;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One filter application: drift-corrected gaze in window pixels and how
/// long it has held still
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixationEstimate {
    pub gaze_x: f64,
    pub gaze_y: f64,
    /// Seconds
    pub fixation_duration: f64,
    pub sample_rate: u32,
}

impl FixationEstimate {
    pub fn gaze(&self) -> Vec2 {
        Vec2::new(self.gaze_x, self.gaze_y)
    }
}

/// Strategy turning the recent sample history into one estimate per frame
pub trait Filter: Send {
    /// `samples` is the history in arrival order, already in window pixels.
    /// Returns the previous estimate unchanged when no sample is eligible,
    /// and None before the first estimate.
    fn apply(
        &mut self,
        samples: &[RawSample],
        now: Duration,
        drift: &DriftGrid,
    ) -> Option<FixationEstimate>;

    /// Forget all state, e.g. after the source reconnects
    fn reset(&mut self);

    fn set_sample_rate(&mut self, _hz: u32) {}
}
