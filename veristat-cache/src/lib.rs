#![warn(missing_docs)]
//! Veristat Result Cache
//!
//! A generic key→value memoizing store that sits in front of every
//! calculation path:
//! - Time-to-live expiry, checked lazily on read and proactively by a
//!   periodic cleanup task
//! - Capacity enforced on two axes at once (entry count and estimated bytes)
//!   with least-recently-used eviction
//! - Hit/miss telemetry plus a rolling access-duration average fed by an
//!   external timing hook
//!
//! Known correctness gap, accepted by design: [`ResultCache::get_or_compute`]
//! is not mutually exclusive. The internal lock is released while the compute
//! closure runs, so two concurrent misses for the same key both compute
//! ("thundering herd"). The cache tolerates duplicate computation rather than
//! guaranteeing at-most-one-concurrent-compute-per-key.

mod config;
mod entry;
mod store;

pub use config::CacheConfig;
pub use entry::{CacheEntry, Priority};
pub use store::{CacheStats, ResultCache};
