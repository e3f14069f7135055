//! Dataset signatures and cache keys.
//!
//! Cache keys hash only a bounded prefix of the data, so distinct datasets
//! can collide. Every cached value therefore carries a [`DataSignature`]
//! that is re-derived and compared on each hit; a mismatch is treated as a
//! miss and the stale entry is dropped. The profile signature is itself
//! lossy (two datasets can share length, extremes, mean, and median), which
//! is accepted: the signature narrows collisions, it does not eliminate
//! them.

use crate::options::CalculationOptions;
use fxhash::FxHasher;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use veristat_stats::quantile_sorted;

/// Datasets up to this length are fingerprinted by their literal values
const LITERAL_LIMIT: usize = 10;

/// How many leading elements feed the cache-key hash
const KEY_SAMPLE_LEN: usize = 100;

/// Content fingerprint stored alongside every cached result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataSignature {
    /// Exact joined values, used for small datasets
    Literal(String),
    /// Summary profile, used for larger datasets
    Profile {
        /// Number of observations
        length: usize,
        /// Smallest observation
        min: f64,
        /// Largest observation
        max: f64,
        /// Arithmetic mean
        mean: f64,
        /// Median
        median: f64,
    },
}

impl DataSignature {
    /// Derive the signature for `values`
    pub fn of(values: &[f64]) -> Self {
        if values.len() <= LITERAL_LIMIT {
            let joined = values
                .iter()
                .map(|value| value.to_string())
                .collect::<Vec<_>>()
                .join(",");
            return Self::Literal(joined);
        }

        let mut sorted = values.to_vec();
        sorted.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        Self::Profile {
            length: values.len(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean: values.iter().sum::<f64>() / values.len() as f64,
            median: quantile_sorted(&sorted, 0.5),
        }
    }
}

/// Derive the cache key for a calculation
///
/// Hashes the dataset length, the first [`KEY_SAMPLE_LEN`] elements, and the
/// requested precision. An explicit override in the options wins.
pub fn cache_key(values: &[f64], options: &CalculationOptions) -> String {
    if let Some(key) = &options.cache_key_override {
        return key.clone();
    }

    let mut hasher = FxHasher::default();
    values.len().hash(&mut hasher);
    for value in values.iter().take(KEY_SAMPLE_LEN) {
        value.to_bits().hash(&mut hasher);
    }
    options.precision_digits.hash(&mut hasher);
    format!("stat-{:016x}", hasher.finish())
}
