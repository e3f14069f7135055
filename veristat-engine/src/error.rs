//! Engine error type.

use thiserror::Error;
use veristat_stats::StatsError;

/// Errors surfaced by the calculation engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// The caller supplied options outside their accepted ranges
    #[error("Invalid calculation options: {0}")]
    InvalidOptions(String),

    /// A statistical computation rejected the input
    #[error(transparent)]
    Stats(#[from] StatsError),
}
