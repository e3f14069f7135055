//! Unified calculation results.

use bigdecimal::ToPrimitive;
use serde::{Deserialize, Serialize};
use veristat_stats::{StatisticsResult, StreamingResult};

/// Which computation path the orchestrator ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChosenAlgorithm {
    /// Full decimal pipeline with ≥ 50 significant digits
    ArbitraryPrecision,
    /// Single-pass Welford estimation
    Streaming,
    /// Two-pass f64 pipeline
    TwoPass,
}

/// A result from either computation family
///
/// Streaming results carry only the summary subset; the approximation
/// accessors paper over the difference for ranking and quality scoring,
/// where f64 resolution is sufficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineResult {
    /// Complete descriptive statistics
    Full(StatisticsResult),
    /// Streaming summary
    Streaming(StreamingResult),
}

impl EngineResult {
    /// Number of observations
    pub fn count(&self) -> usize {
        match self {
            Self::Full(result) => result.count,
            Self::Streaming(result) => result.count,
        }
    }

    /// Mean as f64; lossy for full results
    pub fn mean_approx(&self) -> f64 {
        match self {
            Self::Full(result) => result.mean.to_f64().unwrap_or(0.0),
            Self::Streaming(result) => result.mean,
        }
    }

    /// Standard deviation as f64; lossy for full results
    pub fn std_dev_approx(&self) -> f64 {
        match self {
            Self::Full(result) => result.std_dev.to_f64().unwrap_or(0.0),
            Self::Streaming(result) => result.std_dev,
        }
    }

    /// Coefficient of variation in percent; 0 when the mean is 0
    pub fn coefficient_of_variation_pct(&self) -> f64 {
        match self {
            Self::Full(result) => result.coefficient_of_variation.to_f64().unwrap_or(0.0),
            Self::Streaming(result) => result.coefficient_of_variation_pct(),
        }
    }

    /// Fraction of observations flagged as outliers; 0 for streaming results
    pub fn outlier_fraction(&self) -> f64 {
        match self {
            Self::Full(result) => {
                let flagged = result.outliers.mild.len() + result.outliers.extreme.len();
                flagged as f64 / result.count as f64
            }
            Self::Streaming(_) => 0.0,
        }
    }

    /// The full result, if this is one
    pub fn as_full(&self) -> Option<&StatisticsResult> {
        match self {
            Self::Full(result) => Some(result),
            Self::Streaming(_) => None,
        }
    }

    /// The streaming result, if this is one
    pub fn as_streaming(&self) -> Option<&StreamingResult> {
        match self {
            Self::Streaming(result) => Some(result),
            Self::Full(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veristat_stats::StreamingEstimator;

    #[test]
    fn test_streaming_accessors() {
        let result = EngineResult::Streaming(
            StreamingEstimator::from_slice(&[2.0, 4.0, 6.0]).unwrap(),
        );
        assert_eq!(result.count(), 3);
        assert!((result.mean_approx() - 4.0).abs() < 1e-12);
        assert_eq!(result.outlier_fraction(), 0.0);
        assert!(result.as_full().is_none());
        assert!(result.as_streaming().is_some());
    }

    #[test]
    fn test_streaming_cv_guards_zero_mean() {
        let result = EngineResult::Streaming(
            StreamingEstimator::from_slice(&[-1.0, 1.0]).unwrap(),
        );
        assert_eq!(result.coefficient_of_variation_pct(), 0.0);
    }
}
