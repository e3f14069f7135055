//! Error taxonomy for the statistical engine.
//!
//! Validation errors surface synchronously at the point of use; a single
//! invalid value fails the whole computation rather than being dropped.
//! Cleaning of raw input is the responsibility of the parsing layer upstream.

use thiserror::Error;

/// Errors produced by the statistical engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    /// Zero-length input after cleaning
    #[error("Dataset is empty")]
    EmptyDataset,

    /// A NaN or infinite value reached the engine
    #[error("Non-finite value {value} at index {index}")]
    NonFiniteValue {
        /// Position of the offending element
        index: usize,
        /// The offending value (NaN or ±∞)
        value: f64,
    },

    /// Confidence level outside the open interval (0, 1)
    #[error("Invalid confidence level: {0} (must be between 0 and 1)")]
    InvalidConfidenceLevel(f64),
}
