//! Streaming Estimation
//!
//! Single-pass mean/variance for large datasets using Welford's online
//! update rule, which avoids the catastrophic cancellation of naively
//! summing squares. Trades arbitrary precision for one-pass memory and time
//! behavior; the orchestrator never selects it when high precision is
//! explicitly requested.

use crate::error::StatsError;
use serde::{Deserialize, Serialize};

/// Result of a single streaming pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingResult {
    /// Number of observations consumed
    pub count: usize,
    /// Running mean
    pub mean: f64,
    /// Sample variance (divisor n − 1; 0 when n = 1)
    pub variance: f64,
    /// `sqrt(variance)`
    pub std_dev: f64,
    /// Smallest observation
    pub min: f64,
    /// Largest observation
    pub max: f64,
    /// `max - min`
    pub range: f64,
}

impl StreamingResult {
    /// Coefficient of variation in percent; 0 when the mean is 0
    pub fn coefficient_of_variation_pct(&self) -> f64 {
        if self.mean == 0.0 {
            0.0
        } else {
            self.std_dev / self.mean * 100.0
        }
    }

    /// Whether relative variability stays within `threshold_pct` percent
    pub fn is_stable(&self, threshold_pct: f64) -> bool {
        self.coefficient_of_variation_pct().abs() <= threshold_pct
    }
}

/// Online Welford accumulator
///
/// ```
/// use veristat_stats::StreamingEstimator;
///
/// let mut est = StreamingEstimator::new();
/// for x in [1.0, 2.0, 3.0, 4.0, 5.0] {
///     est.push(x).unwrap();
/// }
/// let result = est.result().unwrap();
/// assert!((result.mean - 3.0).abs() < 1e-12);
/// assert!((result.variance - 2.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StreamingEstimator {
    count: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl StreamingEstimator {
    /// Create an empty estimator
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Consume one observation
    pub fn push(&mut self, value: f64) -> Result<(), StatsError> {
        if !value.is_finite() {
            return Err(StatsError::NonFiniteValue {
                index: self.count,
                value,
            });
        }

        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;

        self.min = self.min.min(value);
        self.max = self.max.max(value);
        Ok(())
    }

    /// Number of observations consumed so far
    pub fn count(&self) -> usize {
        self.count
    }

    /// Finalize into a [`StreamingResult`]; errors on an empty stream
    pub fn result(&self) -> Result<StreamingResult, StatsError> {
        if self.count == 0 {
            return Err(StatsError::EmptyDataset);
        }

        let variance = if self.count > 1 {
            self.m2 / (self.count - 1) as f64
        } else {
            0.0
        };

        Ok(StreamingResult {
            count: self.count,
            mean: self.mean,
            variance,
            std_dev: variance.sqrt(),
            min: self.min,
            max: self.max,
            range: self.max - self.min,
        })
    }

    /// One-shot convenience over a full slice
    pub fn from_slice(values: &[f64]) -> Result<StreamingResult, StatsError> {
        let mut estimator = Self::new();
        for &value in values {
            estimator.push(value)?;
        }
        estimator.result()
    }
}
