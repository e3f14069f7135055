#![warn(missing_docs)]
//! Veristat
//!
//! A statistics calculation engine with adaptive algorithm selection and
//! result caching. The workspace splits into three layers, re-exported here:
//!
//! - [`stats`]: the numeric core (arbitrary-precision descriptives, two-pass
//!   f64, streaming Welford, bootstrap, hypothesis tests)
//! - [`cache`]: the TTL + LRU result cache with telemetry
//! - [`engine`]: orchestration, quality scoring, formatting, and batch
//!   coordination
//!
//! ```
//! use veristat::prelude::*;
//!
//! let orchestrator = CalculationOrchestrator::with_default_cache();
//!
//! let first = orchestrator.compute_summary(&[1.0, 2.0, 3.0]).unwrap();
//! assert!(!first.cache_hit);
//! assert!((first.result.mean_approx() - 2.0).abs() < 1e-9);
//!
//! let second = orchestrator.compute_summary(&[1.0, 2.0, 3.0]).unwrap();
//! assert!(second.cache_hit);
//! assert_eq!(second.result, first.result);
//! ```

pub use veristat_cache as cache;
pub use veristat_engine as engine;
pub use veristat_stats as stats;

/// Common imports for typical use
pub mod prelude {
    pub use veristat_cache::{CacheConfig, CacheStats, Priority, ResultCache};
    pub use veristat_engine::{
        format_results, AccuracyLevel, BatchCoordinator, BatchOutcome, CalculationOptions,
        CalculationOrchestrator, ChosenAlgorithm, Dataset, EngineError, EngineResult,
        EnrichedResult, QualityAssessment,
    };
    pub use veristat_stats::{
        compute_bootstrap, compute_two_pass, BootstrapConfig, PrecisionContext, PrecisionEngine,
        StatsError, StatisticsResult, StreamingEstimator, StreamingResult,
    };
}
