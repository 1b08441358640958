use serde::{Deserialize, Serialize};

/// Weighting scheme over a filter window, indexed by recency rank
/// (0 = newest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKernel {
    Uniform,
    /// Weight falls linearly with age
    #[default]
    Linear,
    /// Half-bell over the window, sigma = n / 3
    Gaussian,
}

impl FilterKernel {
    /// Unnormalised, non-negative weight of the sample at rank `i` in a
    /// window of `n`
    pub fn raw_weight(&self, i: usize, n: usize) -> f64 {
        match self {
            FilterKernel::Uniform => 1.0,
            FilterKernel::Linear => n.saturating_sub(i) as f64,
            FilterKernel::Gaussian => {
                let sigma = (n as f64 / 3.0).max(1.0);
                let i = i as f64;
                (-(i * i) / (2.0 * sigma * sigma)).exp()
            }
        }
    }

    /// Weights for ranks 0..n, summing to 1. Empty for n == 0.
    pub fn weights(&self, n: usize) -> Vec<f64> {
        if n == 0 {
            return Vec::new();
        }
        let raw: Vec<f64> = (0..n).map(|i| self.raw_weight(i, n).max(0.0)).collect();
        let sum: f64 = raw.iter().sum();
        if sum <= f64::EPSILON || !sum.is_finite() {
            return vec![1.0 / n as f64; n];
        }
        raw.into_iter().map(|w| w / sum).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KERNELS: [FilterKernel; 3] = [FilterKernel::Uniform, FilterKernel::Linear, FilterKernel::Gaussian];

    #[test]
    fn test_weights_sum_to_one() {
        for kernel in KERNELS {
            for n in 1..50 {
                let sum: f64 = kernel.weights(n).iter().sum();
                assert!((sum - 1.0).abs() < 1e-9, "{:?} n={} sum={}", kernel, n, sum);
            }
        }
    }

    #[test]
    fn test_empty_window_has_no_weights() {
        for kernel in KERNELS {
            assert!(kernel.weights(0).is_empty());
        }
    }

    #[test]
    fn test_recent_samples_weigh_more() {
        for kernel in [FilterKernel::Linear, FilterKernel::Gaussian] {
            let w = kernel.weights(10);
            assert!(w.windows(2).all(|pair| pair[0] >= pair[1]));
            assert!(w[0] > w[9]);
        }
    }

    #[test]
    fn test_uniform_is_flat() {
        let w = FilterKernel::Uniform.weights(4);
        assert_eq!(w, vec![0.25; 4]);
    }
}
