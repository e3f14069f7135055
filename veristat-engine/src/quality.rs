//! Result quality scoring.
//!
//! A coarse 0–100 score with human-readable recommendations. The deductions
//! and thresholds are heuristics tuned for exploratory use, not a formal
//! reliability measure.

use crate::result::EngineResult;
use serde::{Deserialize, Serialize};

/// Sample sizes below this are considered small
const ADEQUATE_SAMPLE_SIZE: usize = 30;

/// Coefficient-of-variation magnitude (percent) above which the mean is
/// flagged as unrepresentative
const HIGH_CV_PCT: f64 = 50.0;

/// Outlier fraction above which the dataset is flagged
const HIGH_OUTLIER_FRACTION: f64 = 0.05;

/// Coarse accuracy verdict derived from the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccuracyLevel {
    /// Score ≥ 75
    High,
    /// Score < 75
    Moderate,
}

/// Quality assessment attached to every enriched result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// 0–100, starts at 100 and loses points per heuristic
    pub score: u8,
    /// Verdict derived from the score
    pub accuracy: AccuracyLevel,
    /// Whether the sample meets the minimum recommended size
    pub sample_size_adequate: bool,
    /// One plain-language note per triggered heuristic
    pub recommendations: Vec<String>,
}

impl QualityAssessment {
    /// Score a result
    ///
    /// Deductions: 20 for a small sample, 25 for high relative variability,
    /// 15 for a heavy outlier share. Streaming results never trigger the
    /// outlier deduction since they carry no outlier information.
    pub fn evaluate(result: &EngineResult) -> Self {
        let mut score: i32 = 100;
        let mut recommendations = Vec::new();

        let count = result.count();
        let sample_size_adequate = count >= ADEQUATE_SAMPLE_SIZE;
        if !sample_size_adequate {
            score -= 20;
            recommendations.push(format!(
                "Sample has {count} observations; at least {ADEQUATE_SAMPLE_SIZE} are recommended for stable estimates"
            ));
        }

        let cv = result.coefficient_of_variation_pct();
        if cv.abs() > HIGH_CV_PCT {
            score -= 25;
            recommendations.push(format!(
                "High relative variability (CV {cv:.1}%); the mean may not represent the data well"
            ));
        }

        let outlier_fraction = result.outlier_fraction();
        if outlier_fraction > HIGH_OUTLIER_FRACTION {
            score -= 15;
            recommendations.push(format!(
                "{:.1}% of observations are outliers; inspect them before trusting moment-based statistics",
                outlier_fraction * 100.0
            ));
        }

        let score = score.clamp(0, 100) as u8;
        Self {
            score,
            accuracy: if score >= 75 {
                AccuracyLevel::High
            } else {
                AccuracyLevel::Moderate
            },
            sample_size_adequate,
            recommendations,
        }
    }
}
