//! End-to-end tests across the whole stack.

use std::sync::Arc;
use std::time::Duration;
use veristat::prelude::*;
use veristat_engine::CachedComputation;

fn small_cache_orchestrator(max_entries: usize) -> CalculationOrchestrator {
    let config = CacheConfig {
        max_entries,
        ..CacheConfig::small()
    };
    CalculationOrchestrator::new(Arc::new(ResultCache::new(config)))
}

#[test]
fn test_variance_invariants_hold_across_paths() {
    let values = [-3.0, 1.5, 0.0, 8.25, 2.0, 2.0, -1.0];

    let orchestrator = CalculationOrchestrator::with_default_cache();
    let full = orchestrator.compute_summary(&values).unwrap();
    let full = full.result.as_full().unwrap().clone();
    let variance = bigdecimal_to_f64(&full.variance);
    let std_dev = bigdecimal_to_f64(&full.std_dev);
    assert!(variance >= 0.0);
    assert!((std_dev - variance.sqrt()).abs() < 1e-9);

    let streaming = StreamingEstimator::from_slice(&values).unwrap();
    assert!(streaming.variance >= 0.0);
    assert!((streaming.std_dev - streaming.variance.sqrt()).abs() < 1e-12);
    assert!((streaming.variance - variance).abs() < 1e-9);
}

#[test]
fn test_single_observation_collapses() {
    let orchestrator = CalculationOrchestrator::with_default_cache();
    let result = orchestrator.compute_summary(&[42.0]).unwrap();
    let full = result.result.as_full().unwrap();
    assert!(bigdecimal_to_f64(&full.variance) == 0.0);
    assert_eq!(full.confidence_interval_95.lower, full.mean);
    assert_eq!(full.confidence_interval_95.upper, full.mean);
}

#[test]
fn test_quartiles_ordered_and_outliers_disjoint() {
    let orchestrator = CalculationOrchestrator::with_default_cache();
    let result = orchestrator
        .compute_summary(&[1.0, 2.0, 3.0, 4.0, 100.0])
        .unwrap();
    let full = result.result.as_full().unwrap();

    assert!(full.min <= full.quartiles.q1);
    assert!(full.quartiles.q1 <= full.quartiles.q2);
    assert!(full.quartiles.q2 <= full.quartiles.q3);
    assert!(full.quartiles.q3 <= full.max);

    assert!(full.outliers.extreme.contains(&4));
    for index in &full.outliers.extreme {
        assert!(!full.outliers.mild.contains(index));
    }
}

#[test]
fn test_worked_example_five_points() {
    let orchestrator = CalculationOrchestrator::with_default_cache();
    let result = orchestrator
        .compute_summary(&[1.0, 2.0, 3.0, 4.0, 5.0])
        .unwrap();
    let full = result.result.as_full().unwrap();

    assert!((bigdecimal_to_f64(&full.mean) - 3.0).abs() < 1e-9);
    assert!((bigdecimal_to_f64(&full.variance) - 2.5).abs() < 1e-9);
    assert!((bigdecimal_to_f64(&full.quartiles.q1) - 2.0).abs() < 1e-9);
    assert!((bigdecimal_to_f64(&full.quartiles.q3) - 4.0).abs() < 1e-9);
    assert!((bigdecimal_to_f64(&full.quartiles.iqr) - 2.0).abs() < 1e-9);

    let rendered = format_results(&result.result, 2);
    assert_eq!(rendered["mean"], "3.00");
    assert_eq!(rendered["count"], "5");
}

#[test]
fn test_repeated_calculation_is_idempotent_and_cached() {
    let orchestrator = small_cache_orchestrator(16);
    let values = [1.0, 2.0, 3.0];

    let first = orchestrator.compute_summary(&values).unwrap();
    assert!(!first.cache_hit);
    assert!((first.result.mean_approx() - 2.0).abs() < 1e-9);

    let second = orchestrator.compute_summary(&values).unwrap();
    assert!(second.cache_hit);
    assert_eq!(second.result, first.result);

    let stats = orchestrator.cache().stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[test]
fn test_cache_entry_cap_holds_under_churn() {
    let orchestrator = small_cache_orchestrator(4);
    for offset in 0..50 {
        let values: Vec<f64> = (0..5).map(|x| (x + offset) as f64).collect();
        orchestrator.compute_summary(&values).unwrap();
        assert!(orchestrator.cache().len() <= 4);
    }
}

#[test]
fn test_cached_entries_expire() {
    let orchestrator = small_cache_orchestrator(16);
    let options = CalculationOptions {
        ttl_override: Some(Duration::from_millis(10)),
        ..Default::default()
    };
    let values = [5.0, 6.0, 7.0];

    orchestrator.calculate(&values, &options).unwrap();
    std::thread::sleep(Duration::from_millis(30));
    let again = orchestrator.calculate(&values, &options).unwrap();
    assert!(!again.cache_hit);
}

#[test]
fn test_streaming_selected_for_large_low_precision_input() {
    let orchestrator = CalculationOrchestrator::with_default_cache();
    let values: Vec<f64> = (0..20_000).map(|x| (x % 100) as f64).collect();
    let options = CalculationOptions {
        precision_digits: 3,
        ..Default::default()
    };
    let result = orchestrator.calculate(&values, &options).unwrap();
    assert_eq!(result.algorithm, ChosenAlgorithm::Streaming);
    assert!(result.result.as_streaming().is_some());
    assert!((result.result.mean_approx() - 49.5).abs() < 1e-9);
}

#[test]
fn test_batch_isolates_the_single_failure() {
    let coordinator = BatchCoordinator::new(Arc::new(small_cache_orchestrator(16)));
    let mut datasets: Vec<Dataset> = (0..5)
        .map(|i| Dataset {
            id: format!("d{i}"),
            name: format!("dataset {i}"),
            values: vec![i as f64, i as f64 + 1.0, i as f64 + 2.0],
        })
        .collect();
    datasets[2].values = vec![f64::NAN];

    let outcome = coordinator.process_batch(&datasets, &CalculationOptions::default());
    assert_eq!(outcome.succeeded(), 4);
    assert_eq!(outcome.failed(), 1);
    assert_eq!(outcome.failures[0].id, "d2");
    assert!(outcome.failures[0].error.contains("Non-finite"));
}

#[test]
fn test_quality_reflects_sample_size() {
    let orchestrator = CalculationOrchestrator::with_default_cache();

    let small = orchestrator.compute_summary(&[1.0, 2.0, 3.0]).unwrap();
    assert!(!small.quality.sample_size_adequate);
    assert!(small.quality.score < 100);

    let values: Vec<f64> = (0..100).map(|x| 10.0 + (x % 5) as f64).collect();
    let large = orchestrator.compute_summary(&values).unwrap();
    assert!(large.quality.sample_size_adequate);
    assert_eq!(large.quality.accuracy, AccuracyLevel::High);
}

#[test]
fn test_bootstrap_brackets_the_sample_mean() {
    let values: Vec<f64> = (0..60).map(|x| x as f64).collect();
    let config = BootstrapConfig {
        iterations: 1_000,
        seed: Some(7),
        ..Default::default()
    };
    let result = compute_bootstrap(&values, &config).unwrap();
    assert!(result.percentile_interval.lower < 29.5);
    assert!(result.percentile_interval.upper > 29.5);
}

#[tokio::test]
async fn test_streamed_datasets_flow_through() {
    let coordinator = BatchCoordinator::new(Arc::new(small_cache_orchestrator(16)));
    let (tx, rx) = tokio::sync::mpsc::channel(4);

    tokio::spawn(async move {
        for i in 0..6 {
            let dataset = Dataset {
                id: format!("s{i}"),
                name: format!("stream {i}"),
                values: vec![1.0, 2.0, 3.0, i as f64],
            };
            if tx.send(dataset).await.is_err() {
                break;
            }
        }
    });

    let outcome = coordinator
        .process_stream(rx, &CalculationOptions::default())
        .await;
    assert_eq!(outcome.succeeded(), 6);
    assert_eq!(outcome.failed(), 0);
    assert_eq!(outcome.results[0].id, "s0");
    assert_eq!(outcome.results[5].id, "s5");
}

#[tokio::test]
async fn test_background_cleanup_prunes_engine_cache() {
    let config = CacheConfig {
        cleanup_interval: Duration::from_millis(20),
        ..CacheConfig::small()
    };
    let cache: Arc<ResultCache<String, CachedComputation>> = Arc::new(ResultCache::new(config));
    cache.start_cleanup();

    let orchestrator = CalculationOrchestrator::new(Arc::clone(&cache));
    let options = CalculationOptions {
        ttl_override: Some(Duration::from_millis(5)),
        ..Default::default()
    };
    orchestrator.calculate(&[1.0, 2.0, 3.0], &options).unwrap();
    assert_eq!(cache.len(), 1);

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(cache.is_empty());
    cache.stop_cleanup();
}

fn bigdecimal_to_f64(value: &bigdecimal::BigDecimal) -> f64 {
    use bigdecimal::ToPrimitive;
    value.to_f64().unwrap()
}
