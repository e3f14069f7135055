//! Hypothesis Tests
//!
//! One-sample t-test and a Shapiro–Wilk-style normality screen. Both are
//! simplified approximations of the true procedures (rational-polynomial
//! normal quantile/CDF, coarse t CDF) and should be read as best-effort
//! diagnostics, not publication-grade inference.

use crate::error::StatsError;
use crate::precision::validate_sample;
use serde::{Deserialize, Serialize};

/// Result of a one-sample t-test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TTestResult {
    /// t statistic
    pub t_statistic: f64,
    /// Degrees of freedom (n − 1)
    pub degrees_of_freedom: f64,
    /// Two-tailed p-value (approximate)
    pub p_value: f64,
    /// Whether the null hypothesis is rejected at `alpha`
    pub reject_null: bool,
    /// Significance level used
    pub alpha: f64,
}

/// Result of the normality screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalityCheck {
    /// Correlation-based W-like statistic in [0, 1]
    pub w_statistic: f64,
    /// Crude p-value estimate derived from the W statistic
    pub p_value_estimate: f64,
    /// Convenience verdict: `w_statistic > 0.95`
    pub looks_normal: bool,
}

/// One-sample t-test of H0: mean = `hypothesized_mean`
///
/// A zero-variance sample yields t = 0 with p = 1 when the sample mean
/// equals the hypothesized mean, and p = 0 otherwise.
pub fn one_sample_t_test(
    samples: &[f64],
    hypothesized_mean: f64,
    alpha: f64,
) -> Result<TTestResult, StatsError> {
    validate_sample(samples)?;
    if alpha <= 0.0 || alpha >= 1.0 {
        return Err(StatsError::InvalidConfidenceLevel(alpha));
    }

    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = if samples.len() > 1 {
        samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)
    } else {
        0.0
    };
    let se = (variance / n).sqrt();
    let df = (n - 1.0).max(1.0);

    let (t, p_value) = if se == 0.0 {
        if (mean - hypothesized_mean).abs() < f64::EPSILON {
            (0.0, 1.0)
        } else {
            (f64::MAX, 0.0)
        }
    } else {
        let t = (mean - hypothesized_mean) / se;
        let p = (2.0 * (1.0 - t_cdf(t.abs(), df))).clamp(0.0, 1.0);
        (t, p)
    };

    Ok(TTestResult {
        t_statistic: t,
        degrees_of_freedom: df,
        p_value,
        reject_null: p_value < alpha,
        alpha,
    })
}

/// Shapiro–Wilk-style normality screen
///
/// Correlates the sorted sample against Blom-score normal order statistics;
/// W is the squared correlation. The p-value estimate is a linear rescaling
/// of W, not a real null distribution lookup.
pub fn check_normality(samples: &[f64]) -> Result<NormalityCheck, StatsError> {
    validate_sample(samples)?;
    let n = samples.len();
    if n < 3 {
        // Too few points to say anything; report a neutral verdict
        return Ok(NormalityCheck {
            w_statistic: 1.0,
            p_value_estimate: 1.0,
            looks_normal: true,
        });
    }

    let mut sorted = samples.to_vec();
    sorted.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    // Blom plotting positions
    let scores: Vec<f64> = (0..n)
        .map(|i| normal_quantile((i as f64 + 1.0 - 0.375) / (n as f64 + 0.25)))
        .collect();

    let w_statistic = match pearson_correlation(&sorted, &scores) {
        Some(r) => (r * r).clamp(0.0, 1.0),
        // Zero-variance sample: degenerate but not evidence against normality
        None => 1.0,
    };

    let p_value_estimate = ((w_statistic - 0.90) / 0.10).clamp(0.0, 1.0);

    Ok(NormalityCheck {
        w_statistic,
        p_value_estimate,
        looks_normal: w_statistic > 0.95,
    })
}

/// Pearson correlation; `None` when either side has zero variance
fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Approximate t-distribution CDF; normal approximation for large df
fn t_cdf(t: f64, df: f64) -> f64 {
    if df > 30.0 {
        return normal_cdf(t);
    }
    let x = df / (df + t * t);
    0.5 + 0.5 * (1.0 - x.powf(df / 2.0)).copysign(t)
}

/// Standard normal quantile (Abramowitz & Stegun 26.2.23)
fn normal_quantile(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let p = p.clamp(1e-10, 1.0 - 1e-10);
    let sign = if p < 0.5 { -1.0 } else { 1.0 };
    let p = if p < 0.5 { p } else { 1.0 - p };

    let t = (-2.0 * p.ln()).sqrt();
    let c0 = 2.515517;
    let c1 = 0.802853;
    let c2 = 0.010328;
    let d1 = 1.432788;
    let d2 = 0.189269;
    let d3 = 0.001308;

    sign * (t - (c0 + c1 * t + c2 * t * t) / (1.0 + d1 * t + d2 * t * t + d3 * t * t * t))
}

/// Standard normal CDF via the A&S 7.1.26 erf approximation
fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x >= 0.0 { 1.0 } else { -1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_t_test_rejects_distant_mean() {
        let samples = vec![10.0, 11.0, 9.5, 10.5, 10.2, 9.8, 10.1, 10.4];
        let result = one_sample_t_test(&samples, 0.0, 0.05).unwrap();
        assert!(result.reject_null);
        assert!(result.p_value < 0.01);
        assert!(result.t_statistic > 0.0);
    }

    #[test]
    fn test_t_test_accepts_true_mean() {
        let samples = vec![9.0, 10.0, 11.0, 10.0, 9.5, 10.5];
        let result = one_sample_t_test(&samples, 10.0, 0.05).unwrap();
        assert!(!result.reject_null);
        assert!(result.p_value > 0.5);
    }

    #[test]
    fn test_t_test_zero_variance() {
        let exact = one_sample_t_test(&[4.0; 5], 4.0, 0.05).unwrap();
        assert!(!exact.reject_null);
        assert_eq!(exact.p_value, 1.0);

        let off = one_sample_t_test(&[4.0; 5], 5.0, 0.05).unwrap();
        assert!(off.reject_null);
        assert_eq!(off.p_value, 0.0);
    }

    #[test]
    fn test_normality_on_symmetric_sample() {
        // Evenly spread values correlate strongly with normal scores
        let samples: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let check = check_normality(&samples).unwrap();
        assert!(check.w_statistic > 0.9);
    }

    #[test]
    fn test_normality_flags_heavy_outlier() {
        let mut samples: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        samples.push(1e6);
        let check = check_normality(&samples).unwrap();
        assert!(check.w_statistic < 0.95);
        assert!(!check.looks_normal);
    }

    #[test]
    fn test_normality_tiny_sample_neutral() {
        let check = check_normality(&[1.0, 2.0]).unwrap();
        assert!(check.looks_normal);
        assert_eq!(check.p_value_estimate, 1.0);
    }

    #[test]
    fn test_normal_helpers() {
        assert!((normal_quantile(0.5)).abs() < 0.01);
        assert!((normal_quantile(0.975) - 1.96).abs() < 0.01);
        assert!((normal_cdf(0.0) - 0.5).abs() < 0.01);
        assert!((normal_cdf(1.96) - 0.975).abs() < 0.01);
    }

    #[test]
    fn test_invalid_alpha() {
        assert!(matches!(
            one_sample_t_test(&[1.0, 2.0], 0.0, 0.0),
            Err(StatsError::InvalidConfidenceLevel(_))
        ));
    }
}
