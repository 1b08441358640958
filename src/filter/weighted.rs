use super::{Filter, FilterKernel, FixationEstimate};
use crate::config::FilterConfig;
use crate::core::{RawSample, Vec2};
use crate::estimator::DriftGrid;
use std::time::Duration;
use tracing::trace;

/// Weighted average over a sliding time window.
///
/// Fixation duration counts from the first estimate of the current
/// fixation; an estimate farther than the dispersion threshold from that
/// anchor starts a new one.
///
/// With outlier removal on, the newest sample is withheld when it lands
/// farther than the threshold from the previous estimate, and judged once
/// its successor arrives: kept if the successor agrees with it, dropped
/// otherwise. Output therefore trails input by one sample whenever the gaze
/// jumps.
#[derive(Debug, Clone)]
pub struct WeightedAverageFilter {
    kernel: FilterKernel,
    window: Duration,
    outlier_removal: bool,
    outlier_threshold: f64,
    dispersion: f64,
    sample_rate: u32,

    previous: Option<FixationEstimate>,
    /// Previous weighted position before drift correction
    previous_raw: Option<Vec2>,
    pending: Option<RawSample>,
    rejected: Vec<Duration>,
    last_checked: Option<Duration>,
    fixation_start: Option<Duration>,
    fixation_anchor: Vec2,
}

impl WeightedAverageFilter {
    pub fn new(kernel: FilterKernel, window: Duration, outlier_removal: bool) -> Self {
        Self {
            kernel,
            window,
            outlier_removal,
            outlier_threshold: 80.0,
            dispersion: 45.0,
            sample_rate: 60,
            previous: None,
            previous_raw: None,
            pending: None,
            rejected: Vec::new(),
            last_checked: None,
            fixation_start: None,
            fixation_anchor: Vec2::ZERO,
        }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(
            config.kernel,
            Duration::from_millis(config.window_ms),
            config.outlier_removal,
        )
        .with_outlier_threshold(config.outlier_threshold_px)
        .with_dispersion(config.dispersion_px)
    }

    pub fn with_outlier_threshold(mut self, px: f64) -> Self {
        self.outlier_threshold = px;
        self
    }

    pub fn with_dispersion(mut self, px: f64) -> Self {
        self.dispersion = px;
        self
    }

    pub fn kernel(&self) -> FilterKernel {
        self.kernel
    }

    /// Sample currently withheld for confirmation
    pub fn pending(&self) -> Option<&RawSample> {
        self.pending.as_ref()
    }

    fn is_excluded(&self, sample: &RawSample) -> bool {
        self.pending.map_or(false, |p| p.timestamp == sample.timestamp)
            || self.rejected.contains(&sample.timestamp)
    }

    fn screen_outliers(&mut self, samples: &[RawSample]) {
        // Judge the held sample against its successor
        if let Some(held) = self.pending {
            if let Some(next) = samples.iter().find(|s| s.timestamp > held.timestamp) {
                let distance = pos(&held).distance(pos(next));
                if distance > self.outlier_threshold {
                    trace!(distance, "outlier discarded");
                    self.rejected.push(held.timestamp);
                }
                self.pending = None;
            }
        }

        let Some(newest) = samples.last() else {
            return;
        };
        if self.last_checked.map_or(false, |t| newest.timestamp <= t) {
            return;
        }
        self.last_checked = Some(newest.timestamp);

        // Samples are uncorrected, so compare in the same space
        if let Some(previous) = self.previous_raw {
            if pos(newest).distance(previous) > self.outlier_threshold {
                self.pending = Some(*newest);
            }
        }

        if let Some(oldest) = samples.first() {
            let oldest = oldest.timestamp;
            self.rejected.retain(|t| *t >= oldest);
        }
    }

    /// Oldest timestamp of the run of samples, counted back from the newest,
    /// that stays within the dispersion of `center`
    fn run_start(&self, samples: &[&RawSample], center: Vec2) -> Option<Duration> {
        let mut start = None;
        for sample in samples.iter().rev() {
            if pos(sample).distance(center) > self.dispersion {
                break;
            }
            start = Some(sample.timestamp);
        }
        start
    }
}

fn pos(sample: &RawSample) -> Vec2 {
    Vec2::new(sample.x, sample.y)
}

impl Filter for WeightedAverageFilter {
    fn apply(
        &mut self,
        samples: &[RawSample],
        now: Duration,
        drift: &DriftGrid,
    ) -> Option<FixationEstimate> {
        let valid: Vec<RawSample> = samples.iter().filter(|s| s.valid).copied().collect();
        if self.outlier_removal {
            self.screen_outliers(&valid);
        }

        let candidates: Vec<&RawSample> = valid.iter().filter(|s| !self.is_excluded(s)).collect();

        let window: Vec<&RawSample> = candidates
            .iter()
            .copied()
            .filter(|s| now.saturating_sub(s.timestamp) <= self.window)
            .collect();

        let Some(newest) = window.last() else {
            return self.previous.clone();
        };

        let weights = self.kernel.weights(window.len());
        let mut raw = Vec2::ZERO;
        for (rank, sample) in window.iter().rev().enumerate() {
            raw += pos(sample) * weights[rank];
        }

        let corrected = drift.apply(raw);

        let start = match self.fixation_start {
            Some(start) if corrected.distance(self.fixation_anchor) <= self.dispersion => start,
            Some(_) => {
                trace!("dispersion exceeded, fixation restarts");
                self.fixation_anchor = corrected;
                newest.timestamp
            }
            None => {
                self.fixation_anchor = corrected;
                self.run_start(&candidates, raw).unwrap_or(newest.timestamp)
            }
        };
        self.fixation_start = Some(start);

        let estimate = FixationEstimate {
            gaze_x: corrected.x,
            gaze_y: corrected.y,
            fixation_duration: newest.timestamp.saturating_sub(start).as_secs_f64(),
            sample_rate: self.sample_rate,
        };
        self.previous = Some(estimate.clone());
        self.previous_raw = Some(raw);
        Some(estimate)
    }

    fn reset(&mut self) {
        self.previous = None;
        self.previous_raw = None;
        self.pending = None;
        self.rejected.clear();
        self.last_checked = None;
        self.fixation_start = None;
        self.fixation_anchor = Vec2::ZERO;
    }

    fn set_sample_rate(&mut self, hz: u32) {
        self.sample_rate = hz;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn s(x: f64, y: f64, t: u64) -> RawSample {
        RawSample::pixels(x, y, ms(t))
    }

    #[test]
    fn test_uniform_estimate_is_mean() {
        let mut filter = WeightedAverageFilter::new(FilterKernel::Uniform, ms(100), false);
        let samples = vec![s(0.0, 0.0, 0), s(10.0, 20.0, 10), s(20.0, 40.0, 20)];
        let est = filter.apply(&samples, ms(20), &DriftGrid::default()).unwrap();
        assert!((est.gaze_x - 10.0).abs() < 1e-9);
        assert!((est.gaze_y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_samples_outside_window_ignored() {
        let mut filter = WeightedAverageFilter::new(FilterKernel::Uniform, ms(50), false);
        let samples = vec![s(1000.0, 1000.0, 0), s(10.0, 10.0, 100), s(20.0, 20.0, 110)];
        let est = filter.apply(&samples, ms(120), &DriftGrid::default()).unwrap();
        assert!((est.gaze_x - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_kernel_favours_newest() {
        let mut filter = WeightedAverageFilter::new(FilterKernel::Linear, ms(100), false);
        let samples = vec![s(0.0, 0.0, 0), s(30.0, 0.0, 10)];
        let est = filter.apply(&samples, ms(10), &DriftGrid::default()).unwrap();
        // weights 2/3 newest, 1/3 oldest
        assert!((est.gaze_x - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_samples_skipped() {
        let mut filter = WeightedAverageFilter::new(FilterKernel::Uniform, ms(100), false);
        let samples = vec![s(50.0, 50.0, 0), RawSample::invalid(ms(10))];
        let est = filter.apply(&samples, ms(10), &DriftGrid::default()).unwrap();
        assert_eq!(est.gaze(), Vec2::new(50.0, 50.0));
    }

    #[test]
    fn test_reset_forgets_estimate() {
        let mut filter = WeightedAverageFilter::new(FilterKernel::Uniform, ms(100), true);
        filter.apply(&[s(1.0, 1.0, 0)], ms(0), &DriftGrid::default());
        filter.reset();
        assert!(filter.apply(&[], ms(500), &DriftGrid::default()).is_none());
    }
}
