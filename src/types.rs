// src/types.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PilotError, PilotResult};

/// A metric value (CPU %, memory %, pod count, request rate, ...)
pub type MetricValue = f64;

/// One historical observation submitted for forecasting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Observed value; treated as 0 when the client leaves it out
    #[serde(default)]
    pub value: MetricValue,
    /// Client-supplied timestamp, carried through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
}

impl MetricSample {
    pub fn new(value: MetricValue) -> Self {
        Self {
            value,
            timestamp: None,
        }
    }
}

/// The metric a forecast is produced for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ForecastTarget {
    Cpu,
    Memory,
    Traffic,
    /// Any other metric name, kept verbatim
    Other(String),
}

impl ForecastTarget {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::Traffic => "traffic",
            Self::Other(name) => name,
        }
    }

    /// Value assumed when no history is available
    pub fn baseline(&self) -> MetricValue {
        match self {
            Self::Cpu => 45.0,
            Self::Memory => 60.0,
            Self::Traffic => 1000.0,
            Self::Other(_) => 50.0,
        }
    }
}

impl From<String> for ForecastTarget {
    fn from(name: String) -> Self {
        match name.as_str() {
            "cpu" => Self::Cpu,
            "memory" => Self::Memory,
            "traffic" => Self::Traffic,
            _ => Self::Other(name),
        }
    }
}

impl From<&str> for ForecastTarget {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<ForecastTarget> for String {
    fn from(target: ForecastTarget) -> Self {
        target.as_str().to_string()
    }
}

impl std::fmt::Display for ForecastTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single forecast step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// ISO-8601 time this step is for
    pub timestamp: String,
    /// Predicted value, clamped to [0, 100]
    pub value: MetricValue,
    /// Confidence level (0.5 to 1.0), decays with distance into the horizon
    pub confidence: f64,
}

/// Result of a forecast call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub predictions: Vec<Prediction>,
    /// Mean of the per-step confidences
    pub confidence: f64,
    /// Human-readable advisories derived from the predictions
    pub recommendations: Vec<String>,
}

/// Category of an infrastructure recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    /// Add capacity
    Scale,
    /// Remove or right-size capacity
    Optimize,
    /// Improve fault tolerance
    Availability,
}

/// An advisory produced from current utilization metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub target: String,
    pub action: String,
    pub confidence: f64,
    pub reasoning: String,
    pub impact: String,
}

/// Category of a detected anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    CpuSpike,
    MemoryPressure,
}

/// Severity label attached to every anomaly the advisor emits
pub const SEVERITY_HIGH: &str = "high";

/// A threshold breach in the current metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub severity: String,
    pub message: String,
    /// ISO-8601 detection time
    pub timestamp: String,
}

/// Current utilization snapshot read from a free-form metrics mapping
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UtilizationMetrics {
    #[serde(default)]
    pub cpu_usage: MetricValue,
    #[serde(default)]
    pub memory_usage: MetricValue,
    #[serde(default)]
    pub pod_count: MetricValue,
}

impl UtilizationMetrics {
    /// Read the known fields from a JSON object, defaulting absent ones to 0
    ///
    /// Unknown keys are ignored. A known key holding anything other than a
    /// number (or null) is rejected.
    pub fn from_map(map: &Map<String, Value>) -> PilotResult<Self> {
        Ok(Self {
            cpu_usage: numeric_field(map, "cpu_usage")?,
            memory_usage: numeric_field(map, "memory_usage")?,
            pod_count: numeric_field(map, "pod_count")?,
        })
    }
}

fn numeric_field(map: &Map<String, Value>, key: &str) -> PilotResult<MetricValue> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(0.0),
        Some(value) => value.as_f64().ok_or_else(|| {
            PilotError::invalid_metric(format!("'{}' must be a number, got {}", key, value))
        }),
    }
}

/// Reply returned by the chat responder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub code: Option<String>,
    pub language: Option<String>,
}

impl ChatReply {
    /// A plain text reply with no code attached
    pub fn text<S: Into<String>>(response: S) -> Self {
        Self {
            response: response.into(),
            code: None,
            language: None,
        }
    }

    /// A reply carrying a code snippet in the given language
    pub fn with_code<S: Into<String>>(response: S, code: S, language: S) -> Self {
        Self {
            response: response.into(),
            code: Some(code.into()),
            language: Some(language.into()),
        }
    }
}
