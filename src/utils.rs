//! Utility functions for common operations

use chrono::{DateTime, SecondsFormat, Utc};

use crate::types::MetricValue;

/// Format a point in time as an ISO-8601 string
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Get the current time as an ISO-8601 string
pub fn current_iso_timestamp() -> String {
    iso_timestamp(Utc::now())
}

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[MetricValue]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Slope of the ordinary-least-squares line through `(index, value)` pairs
///
/// Returns 0 when fewer than two values are given.
pub fn ols_slope(values: &[MetricValue]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let n = values.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n;

    let numerator: f64 = values
        .iter()
        .enumerate()
        .map(|(x, y)| (x as f64 - x_mean) * (y - y_mean))
        .sum();

    let denominator: f64 = (0..values.len())
        .map(|x| (x as f64 - x_mean).powi(2))
        .sum();

    if denominator != 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
