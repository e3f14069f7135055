//! Bootstrap Resampling
//!
//! Draws `iterations` resamples of size n with replacement, computes each
//! resample's mean, and reports the empirical percentile interval at the
//! requested confidence plus bias and the standard error of the bootstrap
//! mean distribution.
//!
//! This is CPU-bound synchronous work with no intermediate yielding: a large
//! run blocks its thread for the full duration. Results are randomized and
//! therefore not cached by default; thread a `seed` through for determinism.

use crate::error::StatsError;
use crate::precision::validate_sample;
use crate::{DEFAULT_BOOTSTRAP_ITERATIONS, DEFAULT_CONFIDENCE_LEVEL};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Bootstrap configuration
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Number of resamples to draw
    pub iterations: usize,
    /// Confidence level for the percentile interval (e.g. 0.95)
    pub confidence_level: f64,
    /// Seed for reproducible resampling; `None` uses thread-local entropy
    pub seed: Option<u64>,
    /// Spread resampling across a rayon pool. Off by default to match the
    /// single-threaded execution model; seeded runs always stay serial so
    /// the draw order is deterministic.
    pub parallel: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_BOOTSTRAP_ITERATIONS,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            seed: None,
            parallel: false,
        }
    }
}

/// Empirical percentile interval over the bootstrap means
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileInterval {
    /// Lower bound
    pub lower: f64,
    /// Upper bound
    pub upper: f64,
    /// Confidence level the bounds correspond to
    pub confidence_level: f64,
}

/// Result of one bootstrap run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapResult {
    /// Number of resamples drawn
    pub iteration_count: usize,
    /// Means of every resample, sorted ascending
    pub resampled_means: Vec<f64>,
    /// Empirical percentile interval
    pub percentile_interval: PercentileInterval,
    /// Average bootstrap mean minus the original sample mean
    pub bias: f64,
    /// Standard error of the bootstrap mean distribution
    pub standard_error: f64,
}

/// Run the bootstrap for the mean of `samples`
pub fn compute_bootstrap(
    samples: &[f64],
    config: &BootstrapConfig,
) -> Result<BootstrapResult, StatsError> {
    validate_sample(samples)?;
    if config.confidence_level <= 0.0 || config.confidence_level >= 1.0 {
        return Err(StatsError::InvalidConfidenceLevel(config.confidence_level));
    }

    let iterations = config.iterations.max(1);
    let original_mean = samples.iter().sum::<f64>() / samples.len() as f64;

    let mut means = match config.seed {
        Some(seed) => resample_means_seeded(samples, iterations, seed),
        None if config.parallel => resample_means_parallel(samples, iterations),
        None => resample_means_serial(samples, iterations),
    };
    means.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let boot_mean = means.iter().sum::<f64>() / means.len() as f64;
    let standard_error = (means
        .iter()
        .map(|m| (m - boot_mean).powi(2))
        .sum::<f64>()
        / means.len() as f64)
        .sqrt();

    let alpha = (1.0 - config.confidence_level) / 2.0;
    let m = means.len();
    let lower_idx = ((alpha * m as f64).floor() as usize).min(m - 1);
    let upper_idx = (((1.0 - alpha) * m as f64).floor() as usize).min(m - 1);

    Ok(BootstrapResult {
        iteration_count: iterations,
        percentile_interval: PercentileInterval {
            lower: means[lower_idx],
            upper: means[upper_idx],
            confidence_level: config.confidence_level,
        },
        bias: boot_mean - original_mean,
        standard_error,
        resampled_means: means,
    })
}

fn resample_mean<R: Rng>(samples: &[f64], rng: &mut R) -> f64 {
    let mut sum = 0.0;
    for _ in 0..samples.len() {
        // slice is non-empty by validation, choose cannot fail
        sum += samples.choose(rng).copied().unwrap_or(0.0);
    }
    sum / samples.len() as f64
}

fn resample_means_serial(samples: &[f64], iterations: usize) -> Vec<f64> {
    let mut rng = thread_rng();
    (0..iterations).map(|_| resample_mean(samples, &mut rng)).collect()
}

fn resample_means_seeded(samples: &[f64], iterations: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..iterations).map(|_| resample_mean(samples, &mut rng)).collect()
}

fn resample_means_parallel(samples: &[f64], iterations: usize) -> Vec<f64> {
    (0..iterations)
        .into_par_iter()
        .map_init(thread_rng, |rng, _| resample_mean(samples, rng))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_brackets_mean() {
        let samples: Vec<f64> = (0..100).map(|x| x as f64).collect();
        let config = BootstrapConfig {
            iterations: 2_000,
            ..Default::default()
        };
        let result = compute_bootstrap(&samples, &config).unwrap();

        assert_eq!(result.iteration_count, 2_000);
        assert_eq!(result.resampled_means.len(), 2_000);
        assert!(result.percentile_interval.lower < 49.5);
        assert!(result.percentile_interval.upper > 49.5);
        assert!(result.bias.abs() < 2.0);
        assert!(result.standard_error > 0.0);
    }

    #[test]
    fn test_means_are_sorted() {
        let config = BootstrapConfig {
            iterations: 500,
            ..Default::default()
        };
        let result = compute_bootstrap(&[3.0, 1.0, 4.0, 1.0, 5.0, 9.0], &config).unwrap();
        assert!(result
            .resampled_means
            .windows(2)
            .all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_seed_is_deterministic() {
        let samples = vec![2.0, 4.0, 6.0, 8.0, 10.0];
        let config = BootstrapConfig {
            iterations: 200,
            seed: Some(1234),
            ..Default::default()
        };
        let a = compute_bootstrap(&samples, &config).unwrap();
        let b = compute_bootstrap(&samples, &config).unwrap();
        assert_eq!(a.resampled_means, b.resampled_means);
        assert_eq!(a.percentile_interval, b.percentile_interval);
    }

    #[test]
    fn test_constant_sample_collapses() {
        let config = BootstrapConfig {
            iterations: 100,
            ..Default::default()
        };
        let result = compute_bootstrap(&[5.0; 10], &config).unwrap();
        assert_eq!(result.percentile_interval.lower, 5.0);
        assert_eq!(result.percentile_interval.upper, 5.0);
        assert_eq!(result.standard_error, 0.0);
        assert_eq!(result.bias, 0.0);
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(
            compute_bootstrap(&[], &BootstrapConfig::default()).err(),
            Some(StatsError::EmptyDataset)
        );
        let bad = BootstrapConfig {
            confidence_level: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            compute_bootstrap(&[1.0, 2.0], &bad),
            Err(StatsError::InvalidConfidenceLevel(_))
        ));
    }

    #[test]
    fn test_parallel_path_produces_full_distribution() {
        let samples: Vec<f64> = (0..50).map(|x| x as f64).collect();
        let config = BootstrapConfig {
            iterations: 300,
            parallel: true,
            ..Default::default()
        };
        let result = compute_bootstrap(&samples, &config).unwrap();
        assert_eq!(result.resampled_means.len(), 300);
    }
}
