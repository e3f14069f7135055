#![warn(missing_docs)]
//! Veristat Statistical Engine
//!
//! Provides the numeric core of the calculator:
//! - Arbitrary-precision descriptive statistics (mean through excess kurtosis)
//!   computed against an explicit [`PrecisionContext`]
//! - A plain two-pass f64 path for ordinary inputs
//! - Single-pass Welford estimation for large datasets
//! - Bootstrap resampling with empirical percentile intervals
//! - Simplified hypothesis tests (one-sample t, normality screen)

mod bootstrap;
mod error;
mod inference;
mod precision;
mod quantile;
mod streaming;
mod two_pass;

pub use bootstrap::{compute_bootstrap, BootstrapConfig, BootstrapResult, PercentileInterval};
pub use error::StatsError;
pub use inference::{check_normality, one_sample_t_test, NormalityCheck, TTestResult};
pub use precision::{
    validate_sample, ConfidenceInterval, OutlierIndices, PrecisionContext, PrecisionEngine,
    Quartiles, StatisticsResult,
};
pub use quantile::{quantile_sorted, quantile_sorted_decimal};
pub use streaming::{StreamingEstimator, StreamingResult};
pub use two_pass::compute_two_pass;

/// Minimum significant digits carried by the arbitrary-precision path
pub const MIN_PRECISION_DIGITS: u64 = 50;

/// Default number of bootstrap resamples
pub const DEFAULT_BOOTSTRAP_ITERATIONS: usize = 1_000;

/// Default confidence level (95%)
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;
