//! Calculation orchestration.
//!
//! Picks a computation path per request, fronts every path with the shared
//! result cache, and wraps the outcome with timing, provenance, and a
//! quality assessment. Cache instances are injected, never global: two
//! orchestrators only share results when handed the same cache.

use crate::error::EngineError;
use crate::options::CalculationOptions;
use crate::quality::QualityAssessment;
use crate::result::{ChosenAlgorithm, EngineResult};
use crate::signature::{cache_key, DataSignature};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use veristat_cache::ResultCache;
use veristat_stats::{
    compute_two_pass, validate_sample, PrecisionContext, PrecisionEngine, StreamingEstimator,
};

/// Dataset sizes past this prefer the streaming path at low precision
const STREAMING_THRESHOLD: usize = 10_000;

/// Requested digits at or below this are cheap enough for streaming
const STREAMING_MAX_DIGITS: u8 = 4;

/// Requested digits above this force the arbitrary-precision path
const PRECISION_TRIGGER_DIGITS: u8 = 6;

/// What the cache actually stores: the result plus the content fingerprint
/// that guards against key collisions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedComputation {
    /// The computed result
    pub result: EngineResult,
    /// Fingerprint of the dataset the result was computed from
    pub signature: DataSignature,
    /// The path that produced the result
    pub algorithm: ChosenAlgorithm,
}

/// A calculation result with execution metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedResult {
    /// The statistics themselves
    pub result: EngineResult,
    /// Which path produced (or originally produced) the result
    pub algorithm: ChosenAlgorithm,
    /// Whether the result came from the cache
    pub cache_hit: bool,
    /// Wall time of this call, compute and cache traffic included
    pub elapsed: Duration,
    /// Number of observations in the input
    pub dataset_size: usize,
    /// Heuristic quality assessment
    pub quality: QualityAssessment,
}

/// Routes each calculation to a computation path through the shared cache
pub struct CalculationOrchestrator {
    cache: Arc<ResultCache<String, CachedComputation>>,
}

impl CalculationOrchestrator {
    /// Create an orchestrator over an injected cache
    pub fn new(cache: Arc<ResultCache<String, CachedComputation>>) -> Self {
        Self { cache }
    }

    /// Create an orchestrator with its own default-configured cache
    pub fn with_default_cache() -> Self {
        Self::new(Arc::new(ResultCache::with_default_config()))
    }

    /// The cache this orchestrator reads and writes
    pub fn cache(&self) -> &Arc<ResultCache<String, CachedComputation>> {
        &self.cache
    }

    /// Pick a computation path from dataset size and requested precision
    ///
    /// High precision always wins; streaming needs both a large dataset and
    /// a modest precision request; everything else takes the two-pass path.
    pub fn select_algorithm(dataset_len: usize, options: &CalculationOptions) -> ChosenAlgorithm {
        if options.precision_digits > PRECISION_TRIGGER_DIGITS {
            ChosenAlgorithm::ArbitraryPrecision
        } else if dataset_len > STREAMING_THRESHOLD
            && options.precision_digits <= STREAMING_MAX_DIGITS
        {
            ChosenAlgorithm::Streaming
        } else {
            ChosenAlgorithm::TwoPass
        }
    }

    /// Run one calculation end to end
    pub fn calculate(
        &self,
        values: &[f64],
        options: &CalculationOptions,
    ) -> Result<EnrichedResult, EngineError> {
        options.validate()?;
        validate_sample(values)?;

        let algorithm = Self::select_algorithm(values.len(), options);
        let started = Instant::now();

        if !options.use_cache {
            let result = run_algorithm(values, algorithm)?;
            return Ok(self.enrich(result, algorithm, false, started.elapsed(), values.len()));
        }

        let key = cache_key(values, options);
        let signature = DataSignature::of(values);

        if let Some(cached) = self.cache.get(&key) {
            if cached.signature == signature {
                let elapsed = started.elapsed();
                self.cache.record_access_duration(elapsed);
                debug!(%key, elapsed_us = elapsed.as_micros() as u64, "cache hit");
                // Report the path that produced the cached value, not the one
                // selection would pick for this call
                return Ok(self.enrich(
                    cached.result,
                    cached.algorithm,
                    true,
                    elapsed,
                    values.len(),
                ));
            }
            warn!(%key, "cache key collision: signature mismatch, recomputing");
            self.cache.remove(&key);
        }

        let result = run_algorithm(values, algorithm)?;
        let elapsed = started.elapsed();
        self.cache.insert_with(
            key,
            CachedComputation {
                result: result.clone(),
                signature,
                algorithm,
            },
            elapsed,
            options.ttl_override,
            options.priority_hint,
        );
        Ok(self.enrich(result, algorithm, false, elapsed, values.len()))
    }

    /// Full calculation under default options
    pub fn compute_summary(&self, values: &[f64]) -> Result<EnrichedResult, EngineError> {
        self.calculate(values, &CalculationOptions::default())
    }

    fn enrich(
        &self,
        result: EngineResult,
        algorithm: ChosenAlgorithm,
        cache_hit: bool,
        elapsed: Duration,
        dataset_size: usize,
    ) -> EnrichedResult {
        let quality = QualityAssessment::evaluate(&result);
        EnrichedResult {
            result,
            algorithm,
            cache_hit,
            elapsed,
            dataset_size,
            quality,
        }
    }
}

fn run_algorithm(
    values: &[f64],
    algorithm: ChosenAlgorithm,
) -> Result<EngineResult, EngineError> {
    let result = match algorithm {
        ChosenAlgorithm::ArbitraryPrecision => {
            let engine = PrecisionEngine::new(values.to_vec(), PrecisionContext::default())?;
            EngineResult::Full(engine.into_result())
        }
        ChosenAlgorithm::Streaming => {
            EngineResult::Streaming(StreamingEstimator::from_slice(values)?)
        }
        ChosenAlgorithm::TwoPass => EngineResult::Full(compute_two_pass(values)?),
    };
    Ok(result)
}
