//! # infra-pilot - Infrastructure Assistant & Forecasting Service
//!
//! infra-pilot serves two groups of HTTP endpoints from one process: a
//! keyword-routed chat assistant that answers infrastructure requests with
//! ready-made Terraform, Kubernetes and kubectl snippets (delegating anything
//! else to a local Ollama model when one is reachable), and a metrics service
//! that forecasts utilization, recommends scaling changes and flags anomalies
//! with simple statistical heuristics.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          HTTP Router                             │
//! │   /health   /api/chat   /api/predict   /api/recommendations ...  │
//! ├─────────────────────┬───────────────────┬────────────────────────┤
//! │   Chat Responder    │  Forecast Engine  │        Advisor         │
//! │                     │                   │                        │
//! │ • Ordered keyword   │ • Window average  │ • Scale / optimize     │
//! │   rules             │ • OLS trend       │ • Availability         │
//! │ • Code templates    │ • Confidence      │ • CPU / memory         │
//! │ • Canned fallback   │   decay           │   anomalies            │
//! └──────────┬──────────┴───────────────────┴────────────────────────┘
//!            │
//!  ┌─────────▼──────────┐
//!  │ CompletionBackend  │  probed once at startup,
//!  │  (Ollama over HTTP)│  failures fall back silently
//!  └────────────────────┘
//! ```
//!
//! Every request is computed from its own payload. Nothing is persisted and
//! nothing is shared between requests apart from the backend availability
//! flag.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use infra_pilot::{build_router, AppState, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServiceConfig::from_env()?;
//!     let state = AppState::initialize(&config).await?;
//!     let router = build_router(state, &config.cors_origins)?;
//!
//!     let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```
//!
//! The services can also be used directly:
//!
//! ```rust
//! use infra_pilot::{Advisor, UtilizationMetrics};
//!
//! let advisor = Advisor::default();
//! let recs = advisor.recommend(&UtilizationMetrics {
//!     cpu_usage: 90.0,
//!     memory_usage: 50.0,
//!     pod_count: 5.0,
//! });
//! assert_eq!(recs.len(), 1);
//! ```

pub mod error;
pub mod utils;
pub mod types;
pub mod config;
pub mod forecast;
pub mod advisor;
pub mod backend;
pub mod chat;
pub mod server;

// Re-export common types for convenience
pub use types::{
    Anomaly, AnomalyKind, ChatReply, Forecast, ForecastTarget, MetricSample, MetricValue,
    Prediction, Recommendation, RecommendationKind, UtilizationMetrics,
};

pub use error::{PilotError, PilotResult};

pub use config::{BackendConfig, ServiceConfig, ServiceConfigBuilder};

pub use forecast::{ForecastConfig, ForecastConfigBuilder, ForecastEngine};

pub use advisor::{Advisor, AdvisorThresholds};

pub use backend::{CompletionBackend, OllamaBackend};

pub use chat::{ChatResponder, Intent};

pub use server::{build_router, ApiError, AppState};
