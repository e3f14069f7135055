//! Batch and stream processing.
//!
//! Runs one calculation per dataset with hard failure isolation: a bad
//! dataset produces a failure record and never aborts its batch. Streamed
//! input is processed in bounded waves of concurrent tasks, preserving
//! arrival order in the output.

use crate::error::EngineError;
use crate::options::CalculationOptions;
use crate::orchestrator::{CalculationOrchestrator, EnrichedResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Concurrent in-flight calculations per stream wave
const DEFAULT_STREAM_CONCURRENCY: usize = 4;

/// Floor for pairwise center-distance normalization
const SIMILARITY_EPSILON: f64 = 1e-12;

/// One named dataset in a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Caller-assigned identifier
    pub id: String,
    /// Human-readable name used in summaries
    pub name: String,
    /// The observations
    pub values: Vec<f64>,
}

/// A successful per-dataset calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    /// Dataset identifier
    pub id: String,
    /// Dataset name
    pub name: String,
    /// The enriched calculation result
    pub result: EnrichedResult,
}

/// A failed per-dataset calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetFailure {
    /// Dataset identifier
    pub id: String,
    /// Dataset name
    pub name: String,
    /// Rendered error message
    pub error: String,
}

/// Outcome of a whole batch: successes and failures side by side
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Successful calculations, in input order
    pub results: Vec<BatchItem>,
    /// Failed datasets, in input order
    pub failures: Vec<DatasetFailure>,
}

impl BatchOutcome {
    /// Number of datasets that succeeded
    pub fn succeeded(&self) -> usize {
        self.results.len()
    }

    /// Number of datasets that failed
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// A named scalar pulled out of a batch for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStat {
    /// Dataset name
    pub name: String,
    /// The statistic's value
    pub value: f64,
}

/// Cross-dataset aggregate summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of datasets summarized
    pub dataset_count: usize,
    /// Total observations across all datasets
    pub total_observations: usize,
    /// Unweighted average of the dataset means
    pub average_mean: f64,
    /// Dataset with the largest mean
    pub highest_mean: DatasetStat,
    /// Dataset with the smallest mean
    pub lowest_mean: DatasetStat,
    /// Dataset with the smallest |coefficient of variation|
    pub most_consistent: DatasetStat,
    /// Dataset with the largest |coefficient of variation|
    pub least_consistent: DatasetStat,
}

/// Similarity score between two datasets
///
/// Derived from mean and standard deviation only. This deliberately ignores
/// distribution shape: two very different distributions with matching first
/// two moments score as identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseSimilarity {
    /// First dataset name
    pub first: String,
    /// Second dataset name
    pub second: String,
    /// Score in [0, 1]; 1 means matching center and spread
    pub score: f64,
}

/// Ranking plus pairwise similarity across a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchComparison {
    /// Datasets by mean, descending
    pub ranking: Vec<DatasetStat>,
    /// Similarity for every unordered pair, in ranking-independent input order
    pub pairwise: Vec<PairwiseSimilarity>,
}

/// Fans calculations out over many datasets through one shared orchestrator
pub struct BatchCoordinator {
    orchestrator: Arc<CalculationOrchestrator>,
    concurrency: usize,
}

impl BatchCoordinator {
    /// Create a coordinator over an orchestrator
    pub fn new(orchestrator: Arc<CalculationOrchestrator>) -> Self {
        Self {
            orchestrator,
            concurrency: DEFAULT_STREAM_CONCURRENCY,
        }
    }

    /// Cap the number of concurrently processed streamed datasets
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    /// Process every dataset, isolating failures
    pub fn process_batch(
        &self,
        datasets: &[Dataset],
        options: &CalculationOptions,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for dataset in datasets {
            match self.orchestrator.calculate(&dataset.values, options) {
                Ok(result) => outcome.results.push(BatchItem {
                    id: dataset.id.clone(),
                    name: dataset.name.clone(),
                    result,
                }),
                Err(error) => {
                    warn!(id = %dataset.id, name = %dataset.name, %error, "dataset failed");
                    outcome.failures.push(DatasetFailure {
                        id: dataset.id.clone(),
                        name: dataset.name.clone(),
                        error: error.to_string(),
                    });
                }
            }
        }
        info!(
            succeeded = outcome.succeeded(),
            failed = outcome.failed(),
            "batch complete"
        );
        outcome
    }

    /// Process datasets as they arrive on a channel
    ///
    /// Consumes waves of up to the configured concurrency, runs each wave's
    /// datasets as parallel tasks, and appends outcomes in arrival order.
    pub async fn process_stream(
        &self,
        mut datasets: mpsc::Receiver<Dataset>,
        options: &CalculationOptions,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let mut closed = false;

        while !closed {
            let mut wave = Vec::with_capacity(self.concurrency);
            while wave.len() < self.concurrency {
                match datasets.recv().await {
                    Some(dataset) => wave.push(dataset),
                    None => {
                        closed = true;
                        break;
                    }
                }
            }
            if wave.is_empty() {
                break;
            }

            let mut tasks = JoinSet::new();
            for (index, dataset) in wave.into_iter().enumerate() {
                let orchestrator = Arc::clone(&self.orchestrator);
                let options = options.clone();
                tasks.spawn(async move {
                    let result = orchestrator.calculate(&dataset.values, &options);
                    (index, dataset, result)
                });
            }

            let mut completed: Vec<(usize, Dataset, Result<EnrichedResult, EngineError>)> =
                Vec::with_capacity(tasks.len());
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(entry) => completed.push(entry),
                    // Only reachable if a calculation task panicked; the
                    // dataset is gone with it, so all we can do is log.
                    Err(error) => warn!(%error, "stream task aborted"),
                }
            }
            completed.sort_by_key(|(index, _, _)| *index);

            for (_, dataset, result) in completed {
                match result {
                    Ok(result) => outcome.results.push(BatchItem {
                        id: dataset.id,
                        name: dataset.name,
                        result,
                    }),
                    Err(error) => {
                        warn!(id = %dataset.id, %error, "streamed dataset failed");
                        outcome.failures.push(DatasetFailure {
                            id: dataset.id,
                            name: dataset.name,
                            error: error.to_string(),
                        });
                    }
                }
            }
        }
        outcome
    }

    /// Aggregate summary over successful batch items; `None` when empty
    pub fn summarize(items: &[BatchItem]) -> Option<BatchSummary> {
        let first = items.first()?;

        let stat = |item: &BatchItem, value: f64| DatasetStat {
            name: item.name.clone(),
            value,
        };
        let mut highest = stat(first, first.result.result.mean_approx());
        let mut lowest = highest.clone();
        let mut most_consistent = stat(
            first,
            first.result.result.coefficient_of_variation_pct().abs(),
        );
        let mut least_consistent = most_consistent.clone();

        let mut mean_sum = 0.0;
        let mut total_observations = 0;
        for item in items {
            let mean = item.result.result.mean_approx();
            let cv = item.result.result.coefficient_of_variation_pct().abs();
            mean_sum += mean;
            total_observations += item.result.dataset_size;

            if mean > highest.value {
                highest = stat(item, mean);
            }
            if mean < lowest.value {
                lowest = stat(item, mean);
            }
            if cv < most_consistent.value {
                most_consistent = stat(item, cv);
            }
            if cv > least_consistent.value {
                least_consistent = stat(item, cv);
            }
        }

        Some(BatchSummary {
            dataset_count: items.len(),
            total_observations,
            average_mean: mean_sum / items.len() as f64,
            highest_mean: highest,
            lowest_mean: lowest,
            most_consistent,
            least_consistent,
        })
    }

    /// Ranking and pairwise similarity; `None` below two items
    pub fn compare(items: &[BatchItem]) -> Option<BatchComparison> {
        if items.len() < 2 {
            return None;
        }

        let mut ranking: Vec<DatasetStat> = items
            .iter()
            .map(|item| DatasetStat {
                name: item.name.clone(),
                value: item.result.result.mean_approx(),
            })
            .collect();
        ranking.sort_by(|a, b| {
            b.value
                .partial_cmp(&a.value)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut pairwise = Vec::with_capacity(items.len() * (items.len() - 1) / 2);
        for (i, a) in items.iter().enumerate() {
            for b in &items[i + 1..] {
                pairwise.push(PairwiseSimilarity {
                    first: a.name.clone(),
                    second: b.name.clone(),
                    score: similarity(
                        a.result.result.mean_approx(),
                        a.result.result.std_dev_approx(),
                        b.result.result.mean_approx(),
                        b.result.result.std_dev_approx(),
                    ),
                });
            }
        }

        Some(BatchComparison { ranking, pairwise })
    }
}

/// Two-moment similarity: spread ratio times normalized center closeness
fn similarity(mean_a: f64, std_a: f64, mean_b: f64, std_b: f64) -> f64 {
    let spread = if std_a == 0.0 && std_b == 0.0 {
        1.0
    } else {
        std_a.min(std_b) / std_a.max(std_b).max(SIMILARITY_EPSILON)
    };
    let scale = (mean_a.abs() + mean_b.abs()).max(SIMILARITY_EPSILON);
    let center = 1.0 - (mean_a - mean_b).abs() / scale;
    (spread * center).clamp(0.0, 1.0)
}
