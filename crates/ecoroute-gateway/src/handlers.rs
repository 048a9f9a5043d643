// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.
//!
//! Every handler is a pass-through to the routing engine, the request
//! ledger, or the carbon reader. Engine errors map to status codes in
//! [`ApiError`].

use std::future::Future;
use std::time::Duration;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use ecoroute_core::{
    CarbonReader, CarbonReading, EcorouteError, HealthStatus, PluginAdapter, ReadingSource,
};
use ecoroute_ledger::{LedgerMetrics, SelectionRecord};
use ecoroute_router::{AUTO_MODEL, EngineHealth, Selection};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::server::GatewayState;

/// Request body for POST /api/ask.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub text: String,
    /// Token budget; the configured default when absent.
    #[serde(default)]
    pub max_length: Option<u32>,
    /// Explicit model id, or `"auto"` for policy routing.
    #[serde(default)]
    pub model: Option<String>,
    /// Grid zone for the carbon lookup.
    #[serde(default)]
    pub zone: Option<String>,
}

/// Response body for POST /api/ask.
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub response: String,
    /// Model that produced `response`.
    pub model: String,
    /// Model chosen by selection; differs from `model` after a fallback.
    pub selected_model: String,
    pub fell_back: bool,
    pub carbon_intensity: f64,
    pub carbon_status: ReadingSource,
    pub selection: Selection,
}

/// Request body for POST /router/select-model.
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub text: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub requests: Vec<SelectionRecord>,
}

/// Response body for GET /api/carbon-intensity.
#[derive(Debug, Serialize)]
pub struct CarbonIntensityResponse {
    pub carbon_intensity: f64,
    pub status: ReadingSource,
    pub online: bool,
    pub zone: Option<String>,
    pub is_estimated: Option<bool>,
    pub last_update: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CarbonHealth {
    pub healthy: bool,
    pub status: HealthStatus,
}

/// Response body for GET /api/health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` when the baseline is resident and the carbon reader is healthy.
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub timestamp: DateTime<Utc>,
    pub engine: EngineHealth,
    pub backend: HealthStatus,
    pub carbon: CarbonHealth,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An error with the status code it is reported under.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn timeout(what: &str, after: Duration) -> Self {
        Self::new(
            StatusCode::GATEWAY_TIMEOUT,
            format!("{what} timed out after {}s", after.as_secs()),
        )
    }
}

impl From<EcorouteError> for ApiError {
    fn from(err: EcorouteError) -> Self {
        let status = match &err {
            EcorouteError::ModelNotFound { .. } => StatusCode::BAD_REQUEST,
            EcorouteError::BaselineUnavailable { .. } | EcorouteError::Carbon { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            EcorouteError::Generation { .. } | EcorouteError::Backend { .. } => {
                StatusCode::BAD_GATEWAY
            }
            EcorouteError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            EcorouteError::Config(_) | EcorouteError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.message, "request failed");
        }
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

async fn bounded<T>(
    what: &str,
    limit: Duration,
    fut: impl Future<Output = Result<T, EcorouteError>>,
) -> Result<T, ApiError> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(_) => {
            warn!(what, limit_secs = limit.as_secs(), "request timed out");
            Err(ApiError::timeout(what, limit))
        }
    }
}

async fn read_carbon(state: &GatewayState, zone: Option<&str>) -> Result<CarbonReading, ApiError> {
    Ok(state.carbon.get_intensity(zone).await?)
}

/// POST /api/ask
///
/// Reads carbon intensity, selects a model, and generates an answer. The
/// selection and generation phases have separate time limits.
pub async fn post_ask(
    State(state): State<GatewayState>,
    Json(body): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let reading = read_carbon(&state, body.zone.as_deref()).await?;
    let model = body.model.as_deref().unwrap_or(AUTO_MODEL);

    let selection = state
        .engine
        .select_within(
            &body.text,
            &reading,
            Some(model),
            state.settings.select_timeout,
        )
        .await?;

    info!(
        model_id = %selection.model_id,
        manual = model != AUTO_MODEL,
        "answering query"
    );

    let max_tokens = body.max_length.unwrap_or(state.settings.default_max_tokens);
    let generation = bounded(
        "generation",
        state.settings.generate_timeout,
        state
            .engine
            .generate(&selection.model_id, &body.text, max_tokens),
    )
    .await?;

    Ok(Json(AskResponse {
        response: generation.text,
        model: generation.model_id,
        selected_model: selection.model_id.clone(),
        fell_back: generation.fell_back,
        carbon_intensity: reading.value,
        carbon_status: reading.source,
        selection,
    }))
}

/// POST /router/select-model
pub async fn post_select_model(
    State(state): State<GatewayState>,
    Json(body): Json<SelectRequest>,
) -> Result<Json<Selection>, ApiError> {
    let reading = read_carbon(&state, body.zone.as_deref()).await?;
    let selection = state
        .engine
        .select_within(
            &body.text,
            &reading,
            body.model.as_deref(),
            state.settings.select_timeout,
        )
        .await?;
    Ok(Json(selection))
}

/// GET /router/request-history?limit=N
pub async fn get_request_history(
    State(state): State<GatewayState>,
    Query(params): Query<HistoryParams>,
) -> Json<HistoryResponse> {
    let limit = params.limit.unwrap_or(state.settings.default_history_limit);
    Json(HistoryResponse {
        requests: state.engine.ledger().history(limit),
    })
}

/// GET /router/performance-metrics
pub async fn get_performance_metrics(State(state): State<GatewayState>) -> Json<LedgerMetrics> {
    Json(state.engine.ledger().metrics())
}

/// GET /api/carbon-intensity
///
/// 503 when the reader is unhealthy or could only supply the default value.
pub async fn get_carbon_intensity(
    State(state): State<GatewayState>,
) -> Result<Json<CarbonIntensityResponse>, ApiError> {
    let reading = read_carbon(&state, None).await?;

    if !state.carbon.is_healthy().await {
        return Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "carbon intensity service is unhealthy",
        ));
    }
    if reading.source == ReadingSource::Error {
        return Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            format!(
                "error fetching carbon intensity: {}",
                reading.error.as_deref().unwrap_or("unknown error")
            ),
        ));
    }

    Ok(Json(CarbonIntensityResponse {
        carbon_intensity: reading.value,
        status: reading.source,
        online: true,
        zone: reading.zone,
        is_estimated: reading.is_estimated,
        last_update: reading.as_of,
    }))
}

/// GET /api/health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let engine = state.engine.health();
    let carbon_healthy = state.carbon.is_healthy().await;
    let carbon_status = state
        .carbon
        .health_check()
        .await
        .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()));
    let backend = state
        .engine
        .lifecycle()
        .backend()
        .health_check()
        .await
        .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()));

    let status = if engine.baseline_ready && carbon_healthy {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        timestamp: Utc::now(),
        engine,
        backend,
        carbon: CarbonHealth {
            healthy: carbon_healthy,
            status: carbon_status,
        },
    })
}

/// GET /metrics
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics not enabled").into_response(),
    }
}
