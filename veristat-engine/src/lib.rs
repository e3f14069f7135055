#![warn(missing_docs)]
//! Veristat Calculation Engine
//!
//! Orchestrates the statistical calculators behind one front door:
//! - Algorithm selection from dataset size and requested precision
//!   (arbitrary precision, streaming, or two-pass)
//! - Result caching with collision-guarding content signatures
//! - Timing, quality scoring, and display formatting
//! - Batch and streamed multi-dataset processing with failure isolation

mod batch;
mod error;
mod format;
mod options;
mod orchestrator;
mod quality;
mod result;
mod signature;

pub use batch::{
    BatchComparison, BatchCoordinator, BatchItem, BatchOutcome, BatchSummary, Dataset,
    DatasetFailure, DatasetStat, PairwiseSimilarity,
};
pub use error::EngineError;
pub use format::format_results;
pub use options::{CalculationOptions, DEFAULT_PRECISION_DIGITS, MAX_PRECISION_DIGITS};
pub use orchestrator::{CachedComputation, CalculationOrchestrator, EnrichedResult};
pub use quality::{AccuracyLevel, QualityAssessment};
pub use result::{ChosenAlgorithm, EngineResult};
pub use signature::DataSignature;
