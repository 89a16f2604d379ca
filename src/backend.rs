// src/backend.rs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::BackendConfig;
use crate::error::{PilotError, PilotResult};

/// Trait for text-generation services used by freeform chat
///
/// Implement this to plug a local or remote LLM into the chat responder.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Check whether the backend is reachable
    ///
    /// # Returns
    /// * `true` - The backend answered its health endpoint successfully
    /// * `false` - Unreachable, timed out, or answered with an error status
    async fn probe(&self) -> bool;

    /// Generate a completion for `prompt`
    ///
    /// # Arguments
    /// * `prompt` - Full prompt text, including any system instruction
    ///
    /// # Returns
    /// * `Ok(text)` - Generated text (may be empty)
    /// * `Err(error)` - Transport failure, timeout, error status or bad payload
    async fn generate(&self, prompt: &str) -> PilotResult<String>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Ollama server accessed over its HTTP API
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    probe_timeout: Duration,
    generate_timeout: Duration,
}

impl OllamaBackend {
    /// Create a client for the server described by `config`
    pub fn new(config: &BackendConfig) -> PilotResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| PilotError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
            generate_timeout: Duration::from_secs(config.generate_timeout_secs),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionBackend for OllamaBackend {
    async fn probe(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).timeout(self.probe_timeout).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(model = %self.model, url = %self.base_url, "Ollama health check passed");
                true
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "Ollama health check failed");
                false
            }
            Err(e) => {
                warn!(error = %e, url = %self.base_url, "Ollama unreachable");
                false
            }
        }
    }

    async fn generate(&self, prompt: &str) -> PilotResult<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .timeout(self.generate_timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PilotError::backend(
                "ollama".to_string(),
                format!("returned {}: {}", status, body),
            ));
        }

        let body: GenerateResponse = response.json().await?;
        Ok(body.response)
    }
}
