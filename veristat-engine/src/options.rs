//! Per-calculation options.

use crate::error::EngineError;
use std::time::Duration;
use veristat_cache::Priority;

/// Most precision digits a caller may request for display output
pub const MAX_PRECISION_DIGITS: u8 = 20;

/// Display precision used when the caller does not specify one
pub const DEFAULT_PRECISION_DIGITS: u8 = 6;

/// Options for a single calculation
///
/// `precision_digits` is the requested output precision and steers algorithm
/// selection; internal decimal arithmetic always carries at least the engine
/// minimum regardless of this value.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationOptions {
    /// Requested output precision, 0 to [`MAX_PRECISION_DIGITS`]
    pub precision_digits: u8,
    /// Whether to consult and populate the result cache
    pub use_cache: bool,
    /// Explicit cache key; replaces the content-derived key when set
    pub cache_key_override: Option<String>,
    /// Per-entry TTL; `None` uses the cache default
    pub ttl_override: Option<Duration>,
    /// Eviction priority for the cached result
    pub priority_hint: Priority,
}

impl Default for CalculationOptions {
    fn default() -> Self {
        Self {
            precision_digits: DEFAULT_PRECISION_DIGITS,
            use_cache: true,
            cache_key_override: None,
            ttl_override: None,
            priority_hint: Priority::Normal,
        }
    }
}

impl CalculationOptions {
    /// Check every field against its accepted range
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.precision_digits > MAX_PRECISION_DIGITS {
            return Err(EngineError::InvalidOptions(format!(
                "precision_digits {} exceeds maximum {}",
                self.precision_digits, MAX_PRECISION_DIGITS
            )));
        }
        if let Some(key) = &self.cache_key_override {
            if key.is_empty() {
                return Err(EngineError::InvalidOptions(
                    "cache_key_override must not be empty".into(),
                ));
            }
        }
        Ok(())
    }
}
