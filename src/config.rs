// src/config.rs

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::advisor::AdvisorThresholds;
use crate::error::{PilotError, PilotResult};
use crate::forecast::ForecastConfig;

/// Origins allowed to call the API from a browser unless overridden
pub const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "http://localhost:8080",
    "http://localhost:5173",
    "http://localhost:8000",
];

/// Settings for the completion backend used by freeform chat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Whether to use a backend at all
    pub enabled: bool,
    /// Base URL of the Ollama server
    pub base_url: String,
    /// Model identifier passed with every generate call
    pub model: String,
    /// Timeout for the availability probe
    pub probe_timeout_secs: u64,
    /// Timeout for a single generate call
    pub generate_timeout_secs: u64,
    /// Re-probe availability before every freeform request
    pub recheck_each_request: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            probe_timeout_secs: 2,
            generate_timeout_secs: 30,
            recheck_each_request: false,
        }
    }
}

/// Main configuration for the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Address to bind the listener to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Origins allowed by CORS
    pub cors_origins: Vec<String>,
    pub backend: BackendConfig,
    pub forecast: ForecastConfig,
    pub thresholds: AdvisorThresholds,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
            backend: BackendConfig::default(),
            forecast: ForecastConfig::default(),
            thresholds: AdvisorThresholds::default(),
        }
    }
}

impl ServiceConfig {
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::new()
    }

    /// Build a configuration from the process environment
    pub fn from_env() -> PilotResult<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup (normally the environment) on top of `self`
    pub fn with_overrides<F>(mut self, lookup: F) -> PilotResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.port = parse_value("PORT", &port)?;
        }
        if let Some(origins) = lookup("CORS_ALLOWED_ORIGINS") {
            self.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(url) = lookup("OLLAMA_URL") {
            self.backend.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup("MODEL_NAME") {
            self.backend.model = model;
        }
        if let Some(enabled) = lookup("CHAT_BACKEND_ENABLED") {
            self.backend.enabled = parse_bool("CHAT_BACKEND_ENABLED", &enabled)?;
        }
        if let Some(secs) = lookup("CHAT_PROBE_TIMEOUT_SECS") {
            self.backend.probe_timeout_secs = parse_value("CHAT_PROBE_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = lookup("CHAT_GENERATE_TIMEOUT_SECS") {
            self.backend.generate_timeout_secs =
                parse_value("CHAT_GENERATE_TIMEOUT_SECS", &secs)?;
        }
        if let Some(recheck) = lookup("CHAT_RECHECK_BACKEND") {
            self.backend.recheck_each_request = parse_bool("CHAT_RECHECK_BACKEND", &recheck)?;
        }
        Ok(self)
    }

    /// Parse a configuration from TOML text; missing keys keep their defaults
    #[cfg(feature = "config-toml")]
    pub fn from_toml_str(text: &str) -> PilotResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a TOML configuration file
    #[cfg(feature = "config-toml")]
    pub fn from_toml_file<P: AsRef<std::path::Path>>(path: P) -> PilotResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Socket address string the server should bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> PilotResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| PilotError::config(format!("{} has invalid value '{}': {}", key, raw, e)))
}

fn parse_bool(key: &str, raw: &str) -> PilotResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(PilotError::config(format!(
            "{} has invalid boolean '{}'",
            key, raw
        ))),
    }
}

/// Builder for creating service configurations easily
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl Default for ServiceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ServiceConfig::default(),
        }
    }

    pub fn host(mut self, host: &str) -> Self {
        self.config.host = host.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn cors_origin(mut self, origin: &str) -> Self {
        self.config.cors_origins.push(origin.to_string());
        self
    }

    pub fn backend(mut self, backend: BackendConfig) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn backend_url(mut self, url: &str) -> Self {
        self.config.backend.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(mut self, model: &str) -> Self {
        self.config.backend.model = model.to_string();
        self
    }

    pub fn disable_backend(mut self) -> Self {
        self.config.backend.enabled = false;
        self
    }

    pub fn forecast(mut self, forecast: ForecastConfig) -> Self {
        self.config.forecast = forecast;
        self
    }

    pub fn thresholds(mut self, thresholds: AdvisorThresholds) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    pub fn build(self) -> ServiceConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.port, 8001);
        assert_eq!(config.backend.base_url, "http://localhost:11434");
        assert_eq!(config.backend.model, "llama3");
        assert_eq!(config.backend.probe_timeout_secs, 2);
        assert_eq!(config.backend.generate_timeout_secs, 30);
        assert_eq!(config.cors_origins.len(), 3);
        assert_eq!(config.bind_addr(), "0.0.0.0:8001");
    }

    #[test]
    fn test_env_overrides() {
        let config = ServiceConfig::default()
            .with_overrides(lookup_from(&[
                ("PORT", "9000"),
                ("OLLAMA_URL", "http://ollama:11434/"),
                ("MODEL_NAME", "mistral"),
                ("CHAT_RECHECK_BACKEND", "yes"),
                ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
            ]))
            .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.backend.base_url, "http://ollama:11434");
        assert_eq!(config.backend.model, "mistral");
        assert!(config.backend.recheck_each_request);
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let err = ServiceConfig::default()
            .with_overrides(lookup_from(&[("PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, PilotError::Config { .. }));
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_invalid_bool_is_config_error() {
        let err = ServiceConfig::default()
            .with_overrides(lookup_from(&[("CHAT_BACKEND_ENABLED", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, PilotError::Config { .. }));
    }

    #[test]
    fn test_builder() {
        let config = ServiceConfig::builder()
            .host("127.0.0.1")
            .port(3000)
            .backend_url("http://gpu-box:11434/")
            .model("codellama")
            .cors_origin("https://console.example")
            .disable_backend()
            .build();
        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
        assert_eq!(config.backend.base_url, "http://gpu-box:11434");
        assert_eq!(config.backend.model, "codellama");
        assert!(!config.backend.enabled);
        assert_eq!(config.cors_origins.len(), 4);
    }

    #[cfg(feature = "config-toml")]
    #[test]
    fn test_toml_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "port = 8100\n\n[backend]\nmodel = \"phi3\"\n\n[forecast]\nmax_horizon_minutes = 60"
        )
        .unwrap();

        let config = ServiceConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.port, 8100);
        assert_eq!(config.backend.model, "phi3");
        assert_eq!(config.backend.base_url, "http://localhost:11434");
        assert_eq!(config.forecast.max_horizon_minutes, 60);
        assert_eq!(config.forecast.window_size, 5);
    }

    #[cfg(feature = "config-toml")]
    #[test]
    fn test_bad_toml_is_config_error() {
        let err = ServiceConfig::from_toml_str("port = \"not a number\"").unwrap_err();
        assert!(matches!(err, PilotError::Config { .. }));
    }
}
