//! Plain Two-Pass Calculation
//!
//! The default path for ordinary inputs: one pass for sum/mean, a second for
//! squared deviations, all in f64. Produces the same [`StatisticsResult`]
//! shape as the precision engine (values lifted into decimals at the end) so
//! downstream consumers never branch on the algorithm.

use crate::error::StatsError;
use crate::precision::{
    critical_value_95, dec, validate_sample, ConfidenceInterval, OutlierIndices, Quartiles,
    StatisticsResult,
};
use crate::quantile::quantile_sorted;

/// Compute descriptive statistics with plain f64 arithmetic
pub fn compute_two_pass(values: &[f64]) -> Result<StatisticsResult, StatsError> {
    validate_sample(values)?;

    let n = values.len();
    let n_f = n as f64;

    // First pass: sum and mean
    let sum: f64 = values.iter().sum();
    let mean = sum / n_f;

    // Second pass: squared deviations
    let sq_sum: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    let variance = if n > 1 { sq_sum / (n_f - 1.0) } else { 0.0 };
    let std_dev = variance.sqrt();
    let std_error = std_dev / n_f.sqrt();

    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let min = sorted[0];
    let max = sorted[n - 1];
    let q1 = quantile_sorted(&sorted, 0.25);
    let q2 = quantile_sorted(&sorted, 0.5);
    let q3 = quantile_sorted(&sorted, 0.75);
    let iqr = q3 - q1;

    let (skewness, excess_kurtosis) = shape_moments(values, mean, n_f);

    let coefficient_of_variation = if mean == 0.0 {
        0.0
    } else {
        (std_dev / mean) * 100.0
    };

    let z_scores: Vec<f64> = if std_dev == 0.0 {
        vec![0.0; n]
    } else {
        values.iter().map(|v| (v - mean) / std_dev).collect()
    };

    let outliers = tukey_outliers(values, q1, q3, iqr);

    let margin = critical_value_95(n - 1) * std_error;

    Ok(StatisticsResult {
        count: n,
        sum: dec(sum),
        mean: dec(mean),
        variance: dec(variance),
        std_dev: dec(std_dev),
        std_error: dec(std_error),
        min: dec(min),
        max: dec(max),
        range: dec(max - min),
        median: dec(q2),
        mode: mode_of_sorted(&sorted),
        quartiles: Quartiles {
            q1: dec(q1),
            q2: dec(q2),
            q3: dec(q3),
            iqr: dec(iqr),
        },
        skewness: dec(skewness),
        excess_kurtosis: dec(excess_kurtosis),
        coefficient_of_variation: dec(coefficient_of_variation),
        z_scores: z_scores.into_iter().map(dec).collect(),
        outliers,
        confidence_interval_95: ConfidenceInterval {
            lower: dec(mean - margin),
            upper: dec(mean + margin),
            level: 0.95,
        },
    })
}

/// Population skewness and excess kurtosis in f64
fn shape_moments(values: &[f64], mean: f64, n_f: f64) -> (f64, f64) {
    let m2: f64 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n_f;
    let sigma_p = m2.sqrt();
    if sigma_p == 0.0 {
        return (0.0, 0.0);
    }

    let m3: f64 = values.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / n_f;
    let m4: f64 = values.iter().map(|v| (v - mean).powi(4)).sum::<f64>() / n_f;

    (m3 / sigma_p.powi(3), m4 / sigma_p.powi(4) - 3.0)
}

/// Tukey fences over f64 values
fn tukey_outliers(values: &[f64], q1: f64, q3: f64, iqr: f64) -> OutlierIndices {
    let mild_low = q1 - 1.5 * iqr;
    let mild_high = q3 + 1.5 * iqr;
    let extreme_low = q1 - 3.0 * iqr;
    let extreme_high = q3 + 3.0 * iqr;

    let mut outliers = OutlierIndices::default();
    for (index, &value) in values.iter().enumerate() {
        if value < extreme_low || value > extreme_high {
            outliers.extreme.push(index);
        } else if value < mild_low || value > mild_high {
            outliers.mild.push(index);
        }
    }
    outliers
}

/// Most frequent values over a sorted f64 slice; empty when nothing repeats
fn mode_of_sorted(sorted: &[f64]) -> Vec<bigdecimal::BigDecimal> {
    let mut best = 1usize;
    let mut modes: Vec<f64> = Vec::new();
    let mut run_start = 0usize;

    for i in 1..=sorted.len() {
        if i == sorted.len() || sorted[i] != sorted[run_start] {
            let run = i - run_start;
            if run > best {
                best = run;
                modes.clear();
                modes.push(sorted[run_start]);
            } else if run == best && run > 1 {
                modes.push(sorted[run_start]);
            }
            run_start = i;
        }
    }
    modes.into_iter().map(dec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::precision::{PrecisionContext, PrecisionEngine};
    use bigdecimal::ToPrimitive;

    fn approx(d: &bigdecimal::BigDecimal) -> f64 {
        d.to_f64().unwrap()
    }

    #[test]
    fn test_worked_example() {
        let result = compute_two_pass(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!((approx(&result.mean) - 3.0).abs() < 1e-12);
        assert!((approx(&result.sum) - 15.0).abs() < 1e-12);
        assert!((approx(&result.variance) - 2.5).abs() < 1e-12);
        assert!((approx(&result.quartiles.q1) - 2.0).abs() < 1e-12);
        assert!((approx(&result.quartiles.q3) - 4.0).abs() < 1e-12);
        assert!(result.outliers.mild.is_empty());
        assert!(result.outliers.extreme.is_empty());
    }

    #[test]
    fn test_agrees_with_precision_engine() {
        let values = vec![3.25, -1.5, 0.0, 8.75, 2.0, 2.0, 4.5];
        let fast = compute_two_pass(&values).unwrap();
        let precise = PrecisionEngine::new(values, PrecisionContext::default())
            .unwrap()
            .into_result();

        for (a, b) in [
            (&fast.mean, &precise.mean),
            (&fast.variance, &precise.variance),
            (&fast.std_dev, &precise.std_dev),
            (&fast.median, &precise.median),
            (&fast.skewness, &precise.skewness),
            (&fast.excess_kurtosis, &precise.excess_kurtosis),
        ] {
            assert!((approx(a) - approx(b)).abs() < 1e-9);
        }
        assert_eq!(fast.outliers, precise.outliers);
        assert_eq!(fast.mode.len(), precise.mode.len());
    }

    #[test]
    fn test_extreme_outlier_example() {
        let result = compute_two_pass(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert!((approx(&result.mean) - 22.0).abs() < 1e-12);
        assert_eq!(result.outliers.extreme, vec![4]);
        assert!(result.outliers.mild.is_empty());
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(compute_two_pass(&[]).err(), Some(StatsError::EmptyDataset));
    }
}
