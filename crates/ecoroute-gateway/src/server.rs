// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Router,
    routing::{get, post},
};
use ecoroute_config::EcorouteConfig;
use ecoroute_core::{CarbonReader, EcorouteError};
use ecoroute_router::RoutingEngine;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Per-request limits taken from configuration.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub select_timeout: Duration,
    pub generate_timeout: Duration,
    pub default_max_tokens: u32,
    pub default_history_limit: usize,
}

impl From<&EcorouteConfig> for GatewaySettings {
    fn from(config: &EcorouteConfig) -> Self {
        Self {
            select_timeout: config.server.select_timeout(),
            generate_timeout: config.server.generate_timeout(),
            default_max_tokens: config.server.default_max_tokens,
            default_history_limit: config.ledger.default_history_limit,
        }
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub engine: Arc<RoutingEngine>,
    pub carbon: Arc<dyn CarbonReader>,
    pub settings: GatewaySettings,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

impl GatewayState {
    pub fn new(
        engine: Arc<RoutingEngine>,
        carbon: Arc<dyn CarbonReader>,
        settings: GatewaySettings,
    ) -> Self {
        Self {
            engine,
            carbon,
            settings,
            start_time: Instant::now(),
            prometheus_render: None,
        }
    }

    pub fn with_prometheus(mut self, render: Arc<dyn Fn() -> String + Send + Sync>) -> Self {
        self.prometheus_render = Some(render);
        self
    }
}

/// All gateway routes with middleware applied.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/api/ask", post(handlers::post_ask))
        .route("/api/carbon-intensity", get(handlers::get_carbon_intensity))
        .route("/api/health", get(handlers::get_health))
        .route("/router/select-model", post(handlers::post_select_model))
        .route("/router/request-history", get(handlers::get_request_history))
        .route(
            "/router/performance-metrics",
            get(handlers::get_performance_metrics),
        )
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn start_server(
    addr: &str,
    state: GatewayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), EcorouteError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| EcorouteError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| EcorouteError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
