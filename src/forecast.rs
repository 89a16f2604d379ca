//! # Forecast Engine
//!
//! Short-horizon projection of a single metric from a handful of recent
//! samples. The model is deliberately simple: the mean of a recent window
//! gives the level, the ordinary-least-squares slope over the whole sequence
//! gives the per-step trend, and each step's confidence decays linearly with
//! its distance into the horizon.
//!
//! ```text
//! value(i)      = clamp(recent_avg + trend * i, 0, 100)
//! confidence(i) = max(0.5, 1 - (i / horizon) * 0.5)
//! ```
//!
//! When no history is supplied, the engine falls back to a per-target
//! baseline with uniform jitter so callers still receive a full horizon.
//!
//! ## Usage
//!
//! ```rust
//! use infra_pilot::forecast::ForecastEngine;
//! use infra_pilot::types::{ForecastTarget, MetricSample};
//!
//! let engine = ForecastEngine::default();
//! let samples: Vec<MetricSample> = [10.0, 20.0, 30.0, 40.0, 50.0]
//!     .into_iter()
//!     .map(MetricSample::new)
//!     .collect();
//!
//! let forecast = engine.predict(&samples, &ForecastTarget::Cpu, 3).unwrap();
//! assert_eq!(forecast.predictions.len(), 3);
//! ```

use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PilotError, PilotResult};
use crate::types::{Forecast, ForecastTarget, MetricSample, MetricValue, Prediction};
use crate::utils::{iso_timestamp, mean, ols_slope, round_to};

/// Overall confidence reported when the forecast has no history behind it
pub const BASELINE_CONFIDENCE: f64 = 0.85;

/// Configuration for the forecast engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Number of trailing samples averaged for the level
    pub window_size: usize,

    /// Absolute slope above which a rising/declining advisory is emitted
    pub trend_threshold: f64,

    /// Predicted value above which a scale-up warning is emitted
    pub peak_threshold: f64,

    /// Floor for per-step confidence
    pub min_confidence: f64,

    /// Largest accepted horizon (in minutes)
    pub max_horizon_minutes: i64,

    /// Jitter range applied to the baseline when no history is available
    pub baseline_jitter: (f64, f64),
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            window_size: 5,
            trend_threshold: 2.0,
            peak_threshold: 80.0,
            min_confidence: 0.5,
            max_horizon_minutes: 1440,
            baseline_jitter: (-5.0, 10.0),
        }
    }
}

impl ForecastConfig {
    /// Create a new config builder
    pub fn builder() -> ForecastConfigBuilder {
        ForecastConfigBuilder::default()
    }
}

/// Builder for ForecastConfig
#[derive(Default)]
pub struct ForecastConfigBuilder {
    window_size: Option<usize>,
    trend_threshold: Option<f64>,
    peak_threshold: Option<f64>,
    min_confidence: Option<f64>,
    max_horizon_minutes: Option<i64>,
}

impl ForecastConfigBuilder {
    /// Set the averaging window
    pub fn window_size(mut self, size: usize) -> Self {
        self.window_size = Some(size.max(1));
        self
    }

    /// Set the trend advisory threshold
    pub fn trend_threshold(mut self, threshold: f64) -> Self {
        self.trend_threshold = Some(threshold.abs());
        self
    }

    /// Set the peak warning threshold
    pub fn peak_threshold(mut self, threshold: f64) -> Self {
        self.peak_threshold = Some(threshold);
        self
    }

    /// Set the confidence floor
    pub fn min_confidence(mut self, floor: f64) -> Self {
        self.min_confidence = Some(floor.clamp(0.0, 1.0));
        self
    }

    /// Set the largest accepted horizon
    pub fn max_horizon_minutes(mut self, minutes: i64) -> Self {
        self.max_horizon_minutes = Some(minutes);
        self
    }

    /// Build the configuration
    pub fn build(self) -> ForecastConfig {
        let default = ForecastConfig::default();
        ForecastConfig {
            window_size: self.window_size.unwrap_or(default.window_size),
            trend_threshold: self.trend_threshold.unwrap_or(default.trend_threshold),
            peak_threshold: self.peak_threshold.unwrap_or(default.peak_threshold),
            min_confidence: self.min_confidence.unwrap_or(default.min_confidence),
            max_horizon_minutes: self.max_horizon_minutes.unwrap_or(default.max_horizon_minutes),
            baseline_jitter: default.baseline_jitter,
        }
    }
}

/// Moving-average-plus-trend forecaster
#[derive(Debug, Clone, Default)]
pub struct ForecastEngine {
    config: ForecastConfig,
}

impl ForecastEngine {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Forecast `horizon` one-minute steps for `target`
    pub fn predict(
        &self,
        samples: &[MetricSample],
        target: &ForecastTarget,
        horizon: i64,
    ) -> PilotResult<Forecast> {
        self.predict_with_rng(samples, target, horizon, &mut rand::thread_rng())
    }

    /// Same as [`predict`](Self::predict) with a caller-supplied random source
    ///
    /// Randomness is only consumed when `samples` is empty.
    pub fn predict_with_rng<R: Rng + ?Sized>(
        &self,
        samples: &[MetricSample],
        target: &ForecastTarget,
        horizon: i64,
        rng: &mut R,
    ) -> PilotResult<Forecast> {
        let steps = self.validate_horizon(horizon)?;

        if samples.is_empty() {
            return Ok(self.baseline_forecast(target, steps, rng));
        }

        let values: Vec<MetricValue> = samples.iter().map(|s| s.value).collect();
        let window = self.config.window_size.min(values.len());
        let recent_avg = mean(&values[values.len() - window..]);
        let trend = ols_slope(&values);

        debug!(
            metric = %target,
            samples = values.len(),
            recent_avg,
            trend,
            horizon = steps,
            "forecasting from history"
        );

        let now = Utc::now();
        let predictions: Vec<Prediction> = (0..steps)
            .map(|i| {
                let projected = recent_avg + trend * i as f64;
                Prediction {
                    timestamp: iso_timestamp(now + ChronoDuration::minutes(i as i64)),
                    value: round_to(clamp_percent(projected), 2),
                    confidence: self.step_confidence(i, steps),
                }
            })
            .collect();

        let confidence = round_to(
            mean(&predictions.iter().map(|p| p.confidence).collect::<Vec<_>>()),
            2,
        );
        let recommendations = self.advise(&predictions, target, trend);

        Ok(Forecast {
            predictions,
            confidence,
            recommendations,
        })
    }

    fn validate_horizon(&self, horizon: i64) -> PilotResult<usize> {
        if horizon <= 0 {
            return Err(PilotError::invalid_horizon(
                horizon,
                "horizon must be a positive number of minutes",
            ));
        }
        if horizon > self.config.max_horizon_minutes {
            return Err(PilotError::invalid_horizon(
                horizon,
                format!(
                    "horizon may not exceed {} minutes",
                    self.config.max_horizon_minutes
                ),
            ));
        }
        Ok(horizon as usize)
    }

    /// Linearly decaying confidence for step `step` of `horizon`
    fn step_confidence(&self, step: usize, horizon: usize) -> f64 {
        let decayed = 1.0 - (step as f64 / horizon as f64) * 0.5;
        decayed.max(self.config.min_confidence).min(1.0)
    }

    fn baseline_forecast<R: Rng + ?Sized>(
        &self,
        target: &ForecastTarget,
        steps: usize,
        rng: &mut R,
    ) -> Forecast {
        let base = target.baseline();
        let (a, b) = self.config.baseline_jitter;
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let now = Utc::now();

        debug!(metric = %target, base, horizon = steps, "no history, using baseline");

        let predictions = (0..steps)
            .map(|i| {
                let value = base + rng.gen_range(low..=high);
                Prediction {
                    timestamp: iso_timestamp(now + ChronoDuration::minutes(i as i64)),
                    value: round_to(clamp_percent(value), 2),
                    confidence: self.step_confidence(i, steps),
                }
            })
            .collect();

        Forecast {
            predictions,
            confidence: BASELINE_CONFIDENCE,
            recommendations: vec![
                "Monitor resource usage".to_string(),
                "Consider scaling if trend continues".to_string(),
            ],
        }
    }

    /// Turn predictions and trend into human-readable advisories
    fn advise(&self, predictions: &[Prediction], target: &ForecastTarget, trend: f64) -> Vec<String> {
        let mut recommendations = Vec::new();
        let label = target.as_str().to_uppercase();

        let peak = predictions
            .iter()
            .map(|p| p.value)
            .fold(f64::NEG_INFINITY, f64::max);

        if peak > self.config.peak_threshold {
            recommendations.push(format!(
                "⚠️ {} expected to reach {:.0}% - consider scaling up",
                label, peak
            ));
        }

        if trend > self.config.trend_threshold {
            recommendations.push(format!(
                "📈 Rising {} trend detected - proactive scaling recommended",
                target
            ));
        } else if trend < -self.config.trend_threshold {
            recommendations.push(format!(
                "📉 Declining {} trend - consider scaling down to save costs",
                target
            ));
        }

        if recommendations.is_empty() {
            recommendations.push(format!("✅ {} levels stable - no action needed", label));
        }

        recommendations
    }
}

/// Clamp a projected value into [0, 100]
///
/// Sums over huge samples overflow to infinity and the trend becomes NaN;
/// NaN is pinned to the upper bound so the output stays numeric.
fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        100.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn samples(values: &[f64]) -> Vec<MetricSample> {
        values.iter().copied().map(MetricSample::new).collect()
    }

    #[test]
    fn test_rising_series_extrapolates_trend() {
        let engine = ForecastEngine::default();
        let forecast = engine
            .predict(&samples(&[10.0, 20.0, 30.0, 40.0, 50.0]), &ForecastTarget::Cpu, 3)
            .unwrap();

        let values: Vec<f64> = forecast.predictions.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![30.0, 40.0, 50.0]);
        assert!(forecast
            .recommendations
            .iter()
            .any(|r| r.contains("Rising cpu trend")));
        assert!(!forecast.recommendations.iter().any(|r| r.contains("stable")));
    }

    #[test]
    fn test_values_are_clamped() {
        let engine = ForecastEngine::default();
        let forecast = engine
            .predict(&samples(&[60.0, 70.0, 80.0, 90.0, 100.0]), &ForecastTarget::Cpu, 10)
            .unwrap();

        assert!(forecast.predictions.iter().all(|p| (0.0..=100.0).contains(&p.value)));
        assert_eq!(forecast.predictions.last().unwrap().value, 100.0);
        assert!(forecast.recommendations[0].starts_with("⚠️ CPU expected to reach 100%"));
        assert_eq!(forecast.recommendations.len(), 2);

        let falling = engine
            .predict(&samples(&[40.0, 30.0, 20.0, 10.0, 0.0]), &ForecastTarget::Memory, 10)
            .unwrap();
        assert!(falling.predictions.iter().all(|p| p.value >= 0.0));
        assert_eq!(falling.predictions.last().unwrap().value, 0.0);
        assert_eq!(
            falling.recommendations,
            vec!["📉 Declining memory trend - consider scaling down to save costs".to_string()]
        );
    }

    #[test]
    fn test_confidence_decays_within_bounds() {
        let engine = ForecastEngine::default();
        let forecast = engine
            .predict(&samples(&[50.0, 52.0, 49.0]), &ForecastTarget::Cpu, 30)
            .unwrap();

        assert_eq!(forecast.predictions[0].confidence, 1.0);
        for pair in forecast.predictions.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
        assert!(forecast
            .predictions
            .iter()
            .all(|p| (0.5..=1.0).contains(&p.confidence)));
        // mean of 1 - i/60 for i in 0..30
        assert_eq!(forecast.confidence, 0.76);
    }

    #[test]
    fn test_stable_series() {
        let engine = ForecastEngine::default();
        let forecast = engine
            .predict(&samples(&[50.0, 51.0, 50.0, 49.0, 50.0]), &ForecastTarget::Memory, 5)
            .unwrap();
        assert_eq!(
            forecast.recommendations,
            vec!["✅ MEMORY levels stable - no action needed".to_string()]
        );
    }

    #[test]
    fn test_single_sample_has_no_trend() {
        let engine = ForecastEngine::default();
        let forecast = engine
            .predict(&samples(&[42.0]), &ForecastTarget::Cpu, 4)
            .unwrap();
        assert!(forecast.predictions.iter().all(|p| p.value == 42.0));
    }

    #[test]
    fn test_window_uses_last_samples_only() {
        let engine = ForecastEngine::default();
        // Level comes from the last five values, trend from all seven.
        let forecast = engine
            .predict(
                &samples(&[0.0, 0.0, 10.0, 10.0, 10.0, 10.0, 10.0]),
                &ForecastTarget::Cpu,
                1,
            )
            .unwrap();
        assert_eq!(forecast.predictions[0].value, 10.0);
    }

    #[test]
    fn test_timestamps_advance_by_minute() {
        let engine = ForecastEngine::default();
        let forecast = engine
            .predict(&samples(&[10.0, 20.0]), &ForecastTarget::Cpu, 3)
            .unwrap();

        let times: Vec<DateTime<chrono::FixedOffset>> = forecast
            .predictions
            .iter()
            .map(|p| DateTime::parse_from_rfc3339(&p.timestamp).unwrap())
            .collect();
        assert_eq!((times[1] - times[0]).num_minutes(), 1);
        assert_eq!((times[2] - times[0]).num_minutes(), 2);
    }

    #[test]
    fn test_empty_history_uses_baseline() {
        let engine = ForecastEngine::default();
        let mut rng = StdRng::seed_from_u64(7);
        let forecast = engine
            .predict_with_rng(&[], &ForecastTarget::Cpu, 5, &mut rng)
            .unwrap();

        assert_eq!(forecast.predictions.len(), 5);
        assert_eq!(forecast.confidence, BASELINE_CONFIDENCE);
        assert_eq!(forecast.recommendations.len(), 2);
        assert!(forecast
            .predictions
            .iter()
            .all(|p| (40.0..=55.0).contains(&p.value)));
    }

    #[test]
    fn test_empty_history_traffic_is_clamped() {
        let engine = ForecastEngine::default();
        let forecast = engine.predict(&[], &ForecastTarget::Traffic, 3).unwrap();
        assert!(forecast.predictions.iter().all(|p| p.value == 100.0));
    }

    #[test]
    fn test_empty_history_unknown_target() {
        let engine = ForecastEngine::default();
        let target = ForecastTarget::from("disk");
        let forecast = engine.predict(&[], &target, 20).unwrap();
        assert!(forecast
            .predictions
            .iter()
            .all(|p| (45.0..=60.0).contains(&p.value)));
    }

    #[test]
    fn test_non_positive_horizon_rejected() {
        let engine = ForecastEngine::default();
        for horizon in [0, -1, -30] {
            let err = engine
                .predict(&samples(&[1.0]), &ForecastTarget::Cpu, horizon)
                .unwrap_err();
            assert!(matches!(err, PilotError::InvalidHorizon { .. }));
            assert!(err.is_validation());
        }
        assert!(engine.predict(&[], &ForecastTarget::Cpu, 0).is_err());
    }

    #[test]
    fn test_horizon_above_limit_rejected() {
        let engine = ForecastEngine::new(ForecastConfig::builder().max_horizon_minutes(60).build());
        assert!(engine.predict(&[], &ForecastTarget::Cpu, 60).is_ok());
        assert!(engine.predict(&[], &ForecastTarget::Cpu, 61).is_err());
    }

    #[test]
    fn test_history_forecast_is_repeatable() {
        let engine = ForecastEngine::default();
        let input = samples(&[12.0, 18.0, 25.0, 31.0]);
        let a = engine.predict(&input, &ForecastTarget::Cpu, 15).unwrap();
        let b = engine.predict(&input, &ForecastTarget::Cpu, 15).unwrap();

        let values = |f: &Forecast| f.predictions.iter().map(|p| (p.value, p.confidence)).collect::<Vec<_>>();
        assert_eq!(values(&a), values(&b));
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.recommendations, b.recommendations);
    }

    #[test]
    fn test_overflowing_history_stays_in_range() {
        let engine = ForecastEngine::default();
        let forecast = engine
            .predict(
                &samples(&[0.0, 1e308, 1e308, 1e308, 1e308, 1e308]),
                &ForecastTarget::Cpu,
                3,
            )
            .unwrap();

        for p in &forecast.predictions {
            assert_eq!(p.value, 100.0);
        }
        let json = serde_json::to_value(&forecast).unwrap();
        assert!(json["predictions"][0]["value"].is_number());
        assert_eq!(
            forecast.recommendations,
            vec!["⚠️ CPU expected to reach 100% - consider scaling up".to_string()]
        );
    }

    #[test]
    fn test_clamp_percent_handles_non_finite() {
        assert_eq!(clamp_percent(f64::NAN), 100.0);
        assert_eq!(clamp_percent(f64::INFINITY), 100.0);
        assert_eq!(clamp_percent(f64::NEG_INFINITY), 0.0);
        assert_eq!(clamp_percent(42.5), 42.5);
    }

    #[test]
    fn test_config_builder() {
        let config = ForecastConfig::builder()
            .window_size(0)
            .trend_threshold(-3.0)
            .peak_threshold(90.0)
            .min_confidence(1.5)
            .build();
        assert_eq!(config.window_size, 1);
        assert_eq!(config.trend_threshold, 3.0);
        assert_eq!(config.peak_threshold, 90.0);
        assert_eq!(config.min_confidence, 1.0);
        assert_eq!(config.max_horizon_minutes, 1440);
    }
}
