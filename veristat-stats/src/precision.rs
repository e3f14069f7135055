//! Arbitrary-Precision Descriptive Statistics
//!
//! Converts the input sample to decimals carrying at least 50 significant
//! digits and computes the full descriptive set deterministically. All
//! rounding happens against an explicit [`PrecisionContext`] threaded into
//! every operation, so concurrent callers with different precision needs
//! cannot interfere with one another.
//!
//! The 95% confidence interval uses `mean ± t · SE` with a small fixed
//! t-table keyed by degrees of freedom and the large-sample normal critical
//! value (1.96) beyond the table's range. This is an intentional
//! approximation, not a full inverse-CDF computation.

use crate::error::StatsError;
use crate::quantile::quantile_sorted_decimal;
use bigdecimal::{BigDecimal, FromPrimitive, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Two-sided 95% t critical values for df = 1..=30; beyond that 1.96 is used
const T_TABLE_95: [f64; 30] = [
    12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228, 2.201, 2.179, 2.160,
    2.145, 2.131, 2.120, 2.110, 2.101, 2.093, 2.086, 2.080, 2.074, 2.069, 2.064, 2.060, 2.056,
    2.052, 2.048, 2.045, 2.042,
];

/// Large-sample normal critical value used past the t-table
const Z_95: f64 = 1.96;

/// Explicit precision context threaded into every decimal operation
///
/// Replaces any process-global arithmetic configuration: each engine carries
/// its own context and rounds division and root results to `digits`
/// significant digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecisionContext {
    digits: u64,
}

impl PrecisionContext {
    /// Create a context; `digits` below the engine minimum are raised to it
    pub fn new(digits: u64) -> Self {
        Self {
            digits: digits.max(crate::MIN_PRECISION_DIGITS),
        }
    }

    /// Significant digits carried by this context
    pub fn digits(&self) -> u64 {
        self.digits
    }

    /// Round a decimal to this context's significant digits
    pub fn round(&self, value: BigDecimal) -> BigDecimal {
        value.with_prec(self.digits)
    }

    /// Divide, rounding the quotient to this context's digits
    pub fn div(&self, numerator: &BigDecimal, denominator: &BigDecimal) -> BigDecimal {
        if denominator.is_zero() {
            return BigDecimal::zero();
        }
        self.round(numerator / denominator)
    }

    /// Square root, rounded to this context's digits; zero for negative input
    pub fn sqrt(&self, value: &BigDecimal) -> BigDecimal {
        match value.sqrt() {
            Some(root) => self.round(root),
            None => BigDecimal::zero(),
        }
    }
}

impl Default for PrecisionContext {
    fn default() -> Self {
        Self::new(crate::MIN_PRECISION_DIGITS)
    }
}

/// Quartiles and the interquartile range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quartiles {
    /// First quartile (p = 0.25)
    pub q1: BigDecimal,
    /// Second quartile (median)
    pub q2: BigDecimal,
    /// Third quartile (p = 0.75)
    pub q3: BigDecimal,
    /// `q3 - q1`, always ≥ 0
    pub iqr: BigDecimal,
}

/// Indices of Tukey-fence outliers
///
/// "Mild" lies outside the 1.5·IQR fences but inside the 3·IQR fences;
/// "extreme" lies outside the 3·IQR fences. The sets are disjoint by
/// construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutlierIndices {
    /// Indices outside `[q1 - 1.5·IQR, q3 + 1.5·IQR]` but inside the 3·IQR fences
    pub mild: Vec<usize>,
    /// Indices outside `[q1 - 3·IQR, q3 + 3·IQR]`
    pub extreme: Vec<usize>,
}

/// Confidence interval bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Lower bound
    pub lower: BigDecimal,
    /// Upper bound
    pub upper: BigDecimal,
    /// Confidence level, e.g. 0.95
    pub level: f64,
}

/// Complete descriptive statistics for one dataset
///
/// Constructed all-or-nothing: a result is never partially populated, and
/// once built it is immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsResult {
    /// Number of observations
    pub count: usize,
    /// Sum of all observations
    pub sum: BigDecimal,
    /// Arithmetic mean
    pub mean: BigDecimal,
    /// Sample variance (divisor n − 1; defined as 0 when n = 1)
    pub variance: BigDecimal,
    /// `sqrt(variance)`
    pub std_dev: BigDecimal,
    /// `std_dev / sqrt(n)`
    pub std_error: BigDecimal,
    /// Smallest observation
    pub min: BigDecimal,
    /// Largest observation
    pub max: BigDecimal,
    /// `max - min`
    pub range: BigDecimal,
    /// Second quartile
    pub median: BigDecimal,
    /// Most frequent values; empty when no value repeats
    pub mode: Vec<BigDecimal>,
    /// Quartiles with interquartile range
    pub quartiles: Quartiles,
    /// Population third standardized moment
    pub skewness: BigDecimal,
    /// Population fourth standardized moment minus 3
    pub excess_kurtosis: BigDecimal,
    /// `std_dev / mean · 100`; 0 when the mean is 0
    pub coefficient_of_variation: BigDecimal,
    /// Per-element standardized scores, in input order
    pub z_scores: Vec<BigDecimal>,
    /// Tukey-fence outlier indices
    pub outliers: OutlierIndices,
    /// 95% confidence interval for the mean
    pub confidence_interval_95: ConfidenceInterval,
}

impl StatisticsResult {
    /// Whether relative variability stays within `threshold_pct` percent
    pub fn is_stable(&self, threshold_pct: f64) -> bool {
        self.coefficient_of_variation
            .to_f64()
            .map_or(false, |cv| cv.abs() <= threshold_pct)
    }
}

/// Reject empty samples and non-finite elements
///
/// Cleaning happens upstream; the engine fails the entire computation on the
/// first invalid value rather than silently dropping it.
pub fn validate_sample(values: &[f64]) -> Result<(), StatsError> {
    if values.is_empty() {
        return Err(StatsError::EmptyDataset);
    }
    for (index, &value) in values.iter().enumerate() {
        if !value.is_finite() {
            return Err(StatsError::NonFiniteValue { index, value });
        }
    }
    Ok(())
}

/// Lift a validated finite f64 into a decimal
///
/// `from_f64` only fails on NaN/∞, which validation has already excluded.
pub(crate) fn dec(value: f64) -> BigDecimal {
    BigDecimal::from_f64(value).unwrap_or_else(BigDecimal::zero)
}

/// t (or z) critical value for a two-sided 95% interval
pub(crate) fn critical_value_95(degrees_of_freedom: usize) -> f64 {
    if degrees_of_freedom == 0 {
        // n = 1: SE is zero and the interval collapses regardless
        return Z_95;
    }
    T_TABLE_95
        .get(degrees_of_freedom - 1)
        .copied()
        .unwrap_or(Z_95)
}

/// Arbitrary-precision statistics engine over a fixed dataset
///
/// Validation happens at construction; `compute` is then infallible and
/// memoized in a write-once cell, so repeat calls return the same result.
pub struct PrecisionEngine {
    values: Vec<f64>,
    context: PrecisionContext,
    result: OnceLock<StatisticsResult>,
}

impl PrecisionEngine {
    /// Build an engine over `values`, validating the sample up front
    pub fn new(values: Vec<f64>, context: PrecisionContext) -> Result<Self, StatsError> {
        validate_sample(&values)?;
        Ok(Self {
            values,
            context,
            result: OnceLock::new(),
        })
    }

    /// The precision context this engine computes under
    pub fn context(&self) -> PrecisionContext {
        self.context
    }

    /// Compute (or return the memoized) descriptive statistics
    pub fn compute(&self) -> &StatisticsResult {
        self.result.get_or_init(|| self.compute_uncached())
    }

    /// Consume the engine, yielding an owned result
    pub fn into_result(self) -> StatisticsResult {
        self.compute();
        // get_or_init above guarantees the cell is populated
        self.result.into_inner().unwrap_or_else(|| unreachable!())
    }

    fn compute_uncached(&self) -> StatisticsResult {
        let ctx = &self.context;
        let n = self.values.len();
        let n_dec = BigDecimal::from(n as u64);

        let decimals: Vec<BigDecimal> = self.values.iter().map(|&v| dec(v)).collect();
        let mut sorted = decimals.clone();
        sorted.sort_unstable();

        let sum: BigDecimal = decimals.iter().fold(BigDecimal::zero(), |acc, v| acc + v);
        let mean = ctx.div(&sum, &n_dec);

        let deviations: Vec<BigDecimal> = decimals.iter().map(|v| v - &mean).collect();
        let sq_sum: BigDecimal = deviations
            .iter()
            .fold(BigDecimal::zero(), |acc, d| acc + d * d);

        let variance = if n > 1 {
            ctx.div(&sq_sum, &BigDecimal::from((n - 1) as u64))
        } else {
            BigDecimal::zero()
        };
        let std_dev = ctx.sqrt(&variance);
        let sqrt_n = ctx.sqrt(&n_dec);
        let std_error = ctx.div(&std_dev, &sqrt_n);

        let min = sorted[0].clone();
        let max = sorted[n - 1].clone();
        let range = ctx.round(&max - &min);

        let q1 = quantile_sorted_decimal(&sorted, 0.25, ctx);
        let q2 = quantile_sorted_decimal(&sorted, 0.5, ctx);
        let q3 = quantile_sorted_decimal(&sorted, 0.75, ctx);
        let iqr = ctx.round(&q3 - &q1);

        let mode = mode_of_sorted(&sorted);
        let (skewness, excess_kurtosis) = shape_moments(&deviations, &n_dec, ctx);

        let coefficient_of_variation = if mean.is_zero() {
            BigDecimal::zero()
        } else {
            ctx.round(ctx.div(&std_dev, &mean) * BigDecimal::from(100u32))
        };

        let z_scores: Vec<BigDecimal> = if std_dev.is_zero() {
            vec![BigDecimal::zero(); n]
        } else {
            deviations.iter().map(|d| ctx.div(d, &std_dev)).collect()
        };

        let outliers = tukey_outliers(&decimals, &q1, &q3, &iqr);

        let t = dec(critical_value_95(n - 1));
        let margin = ctx.round(&t * &std_error);
        let confidence_interval_95 = ConfidenceInterval {
            lower: ctx.round(&mean - &margin),
            upper: ctx.round(&mean + &margin),
            level: 0.95,
        };

        StatisticsResult {
            count: n,
            sum,
            mean,
            variance,
            std_dev,
            std_error,
            min,
            max,
            range,
            median: q2.clone(),
            mode,
            quartiles: Quartiles { q1, q2, q3, iqr },
            skewness,
            excess_kurtosis,
            coefficient_of_variation,
            z_scores,
            outliers,
            confidence_interval_95,
        }
    }
}

/// Most frequent values over a sorted slice; empty when nothing repeats
fn mode_of_sorted(sorted: &[BigDecimal]) -> Vec<BigDecimal> {
    let mut best = 1usize;
    let mut modes: Vec<BigDecimal> = Vec::new();
    let mut run_start = 0usize;

    for i in 1..=sorted.len() {
        if i == sorted.len() || sorted[i] != sorted[run_start] {
            let run = i - run_start;
            if run > best {
                best = run;
                modes.clear();
                modes.push(sorted[run_start].clone());
            } else if run == best && run > 1 {
                modes.push(sorted[run_start].clone());
            }
            run_start = i;
        }
    }
    modes
}

/// Population skewness and excess kurtosis from raw deviations
fn shape_moments(
    deviations: &[BigDecimal],
    n_dec: &BigDecimal,
    ctx: &PrecisionContext,
) -> (BigDecimal, BigDecimal) {
    let sq_sum: BigDecimal = deviations
        .iter()
        .fold(BigDecimal::zero(), |acc, d| acc + d * d);
    let m2 = ctx.div(&sq_sum, n_dec);
    let sigma_p = ctx.sqrt(&m2);

    if sigma_p.is_zero() {
        return (BigDecimal::zero(), BigDecimal::zero());
    }

    let cube_sum: BigDecimal = deviations
        .iter()
        .fold(BigDecimal::zero(), |acc, d| acc + d * d * d);
    let quad_sum: BigDecimal = deviations
        .iter()
        .fold(BigDecimal::zero(), |acc, d| acc + d * d * d * d);

    let m3 = ctx.div(&cube_sum, n_dec);
    let m4 = ctx.div(&quad_sum, n_dec);

    let sigma2 = &sigma_p * &sigma_p;
    let sigma3 = &sigma2 * &sigma_p;
    let sigma4 = &sigma2 * &sigma2;

    let skewness = ctx.div(&m3, &sigma3);
    let excess_kurtosis = ctx.round(ctx.div(&m4, &sigma4) - BigDecimal::from(3u32));
    (skewness, excess_kurtosis)
}

/// Classify indices against the 1.5·IQR and 3·IQR Tukey fences
fn tukey_outliers(
    values: &[BigDecimal],
    q1: &BigDecimal,
    q3: &BigDecimal,
    iqr: &BigDecimal,
) -> OutlierIndices {
    let mild_span = dec(1.5) * iqr;
    let extreme_span = BigDecimal::from(3u32) * iqr;

    let mild_low = q1 - &mild_span;
    let mild_high = q3 + &mild_span;
    let extreme_low = q1 - &extreme_span;
    let extreme_high = q3 + &extreme_span;

    let mut outliers = OutlierIndices::default();
    for (index, value) in values.iter().enumerate() {
        if *value < extreme_low || *value > extreme_high {
            outliers.extreme.push(index);
        } else if *value < mild_low || *value > mild_high {
            outliers.mild.push(index);
        }
    }
    outliers
}
