//! Display formatting.
//!
//! Flattens a result into an ordered name → string map rounded to a fixed
//! number of decimal places. Output formatting is the only place requested
//! display precision truncates values; stored results keep full precision.

use crate::result::EngineResult;
use bigdecimal::{BigDecimal, RoundingMode};
use std::collections::BTreeMap;
use veristat_stats::{StatisticsResult, StreamingResult};

/// Render every statistic to `decimal_places`, keyed by field name
pub fn format_results(result: &EngineResult, decimal_places: u8) -> BTreeMap<String, String> {
    match result {
        EngineResult::Full(full) => format_full(full, decimal_places),
        EngineResult::Streaming(streaming) => format_streaming(streaming, decimal_places),
    }
}

fn format_full(result: &StatisticsResult, places: u8) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    let mut put = |key: &str, value: &BigDecimal| {
        map.insert(key.to_string(), fmt_decimal(value, places));
    };

    put("sum", &result.sum);
    put("mean", &result.mean);
    put("median", &result.median);
    put("variance", &result.variance);
    put("std_dev", &result.std_dev);
    put("std_error", &result.std_error);
    put("min", &result.min);
    put("max", &result.max);
    put("range", &result.range);
    put("q1", &result.quartiles.q1);
    put("q3", &result.quartiles.q3);
    put("iqr", &result.quartiles.iqr);
    put("skewness", &result.skewness);
    put("excess_kurtosis", &result.excess_kurtosis);
    put("coefficient_of_variation", &result.coefficient_of_variation);
    put("ci_95_lower", &result.confidence_interval_95.lower);
    put("ci_95_upper", &result.confidence_interval_95.upper);

    map.insert("count".into(), result.count.to_string());
    map.insert(
        "mode".into(),
        if result.mode.is_empty() {
            "none".into()
        } else {
            fmt_decimal_list(&result.mode, places)
        },
    );
    map.insert("z_scores".into(), fmt_decimal_list(&result.z_scores, places));
    map
}

fn format_streaming(result: &StreamingResult, places: u8) -> BTreeMap<String, String> {
    let places = places as usize;
    let mut map = BTreeMap::new();
    map.insert("count".into(), result.count.to_string());
    map.insert("mean".into(), format!("{:.places$}", result.mean));
    map.insert("variance".into(), format!("{:.places$}", result.variance));
    map.insert("std_dev".into(), format!("{:.places$}", result.std_dev));
    map.insert("min".into(), format!("{:.places$}", result.min));
    map.insert("max".into(), format!("{:.places$}", result.max));
    map.insert("range".into(), format!("{:.places$}", result.range));
    map.insert(
        "coefficient_of_variation".into(),
        format!("{:.places$}", result.coefficient_of_variation_pct()),
    );
    map
}

fn fmt_decimal(value: &BigDecimal, places: u8) -> String {
    value
        .with_scale_round(places as i64, RoundingMode::HalfUp)
        .to_string()
}

fn fmt_decimal_list(values: &[BigDecimal], places: u8) -> String {
    values
        .iter()
        .map(|value| fmt_decimal(value, places))
        .collect::<Vec<_>>()
        .join(", ")
}
