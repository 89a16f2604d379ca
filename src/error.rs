// src/error.rs

/// Result type used throughout the infra-pilot library
pub type PilotResult<T> = Result<T, PilotError>;

/// All possible errors that can occur in the infra-pilot library
#[derive(thiserror::Error, Debug)]
pub enum PilotError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Forecast horizon outside the accepted range
    #[error("Invalid forecast horizon {horizon}: {message}")]
    InvalidHorizon { horizon: i64, message: String },

    /// Invalid or missing metrics
    #[error("Invalid metric data: {message}")]
    InvalidMetric { message: String },

    /// Completion backend unreachable, timed out or returned garbage
    #[error("Completion backend '{backend}' failed: {message}")]
    Backend { backend: String, message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// IO-related errors
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Generic error for unexpected situations
    #[error("Unexpected error: {message}")]
    Unexpected { message: String },
}

/// Helper methods for creating common errors
impl PilotError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn invalid_horizon<S: Into<String>>(horizon: i64, message: S) -> Self {
        Self::InvalidHorizon {
            horizon,
            message: message.into(),
        }
    }

    pub fn invalid_metric<S: Into<String>>(message: S) -> Self {
        Self::InvalidMetric {
            message: message.into(),
        }
    }

    pub fn backend<S: Into<String>>(backend: S, message: S) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn unexpected<S: Into<String>>(message: S) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Whether the error was caused by the caller's input rather than the service
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidHorizon { .. } | Self::InvalidMetric { .. }
        )
    }
}

/// Convert from HTTP client errors
impl From<reqwest::Error> for PilotError {
    fn from(error: reqwest::Error) -> Self {
        let backend = error
            .url()
            .map(|url| url.host_str().unwrap_or("unknown").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let message = if error.is_timeout() {
            format!("request timed out: {}", error)
        } else {
            error.to_string()
        };
        Self::Backend { backend, message }
    }
}

#[cfg(feature = "config-toml")]
impl From<toml::de::Error> for PilotError {
    fn from(error: toml::de::Error) -> Self {
        Self::Config {
            message: format!("Invalid TOML: {}", error),
        }
    }
}
