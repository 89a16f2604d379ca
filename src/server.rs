//! HTTP surface for the assistant and the forecasting service.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/health` | Liveness plus chat backend availability |
//! | POST | `/api/chat` | Answer a chat message |
//! | POST | `/api/predict` | Forecast a metric from recent samples |
//! | POST | `/api/recommendations` | Threshold advisories for current metrics |
//! | POST | `/api/anomalies` | Critical threshold breaches for current metrics |

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::advisor::Advisor;
use crate::backend::OllamaBackend;
use crate::chat::ChatResponder;
use crate::config::ServiceConfig;
use crate::error::{PilotError, PilotResult};
use crate::forecast::ForecastEngine;
use crate::types::{
    Anomaly, ChatReply, Forecast, ForecastTarget, MetricSample, Recommendation,
    UtilizationMetrics,
};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatResponder>,
    pub forecast: Arc<ForecastEngine>,
    pub advisor: Arc<Advisor>,
}

impl AppState {
    pub fn new(chat: ChatResponder, forecast: ForecastEngine, advisor: Advisor) -> Self {
        Self {
            chat: Arc::new(chat),
            forecast: Arc::new(forecast),
            advisor: Arc::new(advisor),
        }
    }

    /// Build every service from configuration, probing the chat backend once
    pub async fn initialize(config: &ServiceConfig) -> PilotResult<Self> {
        let chat = if config.backend.enabled {
            let backend = OllamaBackend::new(&config.backend)?;
            info!(url = %backend.base_url(), model = %backend.model(), "probing completion backend");
            ChatResponder::connect(Arc::new(backend), config.backend.recheck_each_request).await
        } else {
            info!("completion backend disabled");
            ChatResponder::without_backend()
        };

        Ok(Self::new(
            chat,
            ForecastEngine::new(config.forecast.clone()),
            Advisor::new(config.thresholds.clone()),
        ))
    }
}

/// Error returned from handlers; the message is the only detail exposed.
#[derive(Debug)]
pub struct ApiError(pub PilotError);

impl From<PilotError> for ApiError {
    fn from(error: PilotError) -> Self {
        Self(error)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            error!(error = %self.0, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (
            status,
            Json(ErrorBody {
                detail: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// Build the complete API router.
pub fn build_router(state: AppState, cors_origins: &[String]) -> PilotResult<Router> {
    Ok(Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/predict", post(predict))
        .route("/api/recommendations", post(recommendations))
        .route("/api/anomalies", post(anomalies))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors_layer(cors_origins)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

fn panic_response(payload: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "handler panicked".to_string()
    };
    ApiError(PilotError::unexpected(detail)).into_response()
}

fn cors_layer(origins: &[String]) -> PilotResult<CorsLayer> {
    // Credentials cannot be combined with a wildcard origin.
    if origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let parsed = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o)
                .map_err(|_| PilotError::config(format!("Invalid CORS origin '{}'", o)))
        })
        .collect::<PilotResult<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

// ── Health ─────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub chat_service: bool,
    pub prediction_service: bool,
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        chat_service: state.chat.is_available(),
        prediction_service: true,
    })
}

// ── Chat ───────────────────────────────────────────────────────

/// Chat request body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub context: Option<String>,
}

/// POST /api/chat
async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Json<ChatReply> {
    let preview: String = req.message.chars().take(50).collect();
    info!(message = %preview, "processing chat message");

    let context = req.context.unwrap_or_default();
    Json(state.chat.respond(&req.message, &context).await)
}

// ── Forecasting ────────────────────────────────────────────────

fn default_horizon() -> i64 {
    30
}

/// Prediction request body.
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub metrics: Vec<MetricSample>,
    pub target: ForecastTarget,
    #[serde(default = "default_horizon")]
    pub horizon: i64,
}

/// POST /api/predict
async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<Forecast>, ApiError> {
    info!(metric = %req.target, samples = req.metrics.len(), horizon = req.horizon, "generating predictions");

    let forecast = state.forecast.predict(&req.metrics, &req.target, req.horizon)?;
    Ok(Json(forecast))
}

// ── Recommendations & anomalies ────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnomaliesResponse {
    pub anomalies: Vec<Anomaly>,
}

/// POST /api/recommendations
async fn recommendations(
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<RecommendationsResponse>, ApiError> {
    info!("generating recommendations");

    let metrics = UtilizationMetrics::from_map(&body)?;
    Ok(Json(RecommendationsResponse {
        recommendations: state.advisor.recommend(&metrics),
    }))
}

/// POST /api/anomalies
async fn anomalies(
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<AnomaliesResponse>, ApiError> {
    info!("detecting anomalies");

    let metrics = UtilizationMetrics::from_map(&body)?;
    Ok(Json(AnomaliesResponse {
        anomalies: state.advisor.detect_anomalies(&metrics),
    }))
}
