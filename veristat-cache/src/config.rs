//! Cache configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Capacity and lifetime policy for a [`crate::ResultCache`]
///
/// Immutable after construction except via `reconfigure`, which also
/// restarts the background cleanup cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum total estimated size of all entries, in bytes
    pub max_bytes: usize,
    /// Maximum number of entries
    pub max_entries: usize,
    /// Default time-to-live for entries without a per-entry override
    pub time_to_live: Duration,
    /// Interval between proactive expiry sweeps
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: 8 * 1024 * 1024,
            max_entries: 256,
            time_to_live: Duration::from_secs(300),
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

impl CacheConfig {
    /// A small configuration convenient for tests and short-lived scopes
    pub fn small() -> Self {
        Self {
            max_bytes: 64 * 1024,
            max_entries: 16,
            time_to_live: Duration::from_secs(30),
            cleanup_interval: Duration::from_secs(5),
        }
    }
}
