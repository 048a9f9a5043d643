// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Construction of the adapters and engine shared by `serve` and `route`.

use std::sync::Arc;

use ecoroute_config::EcorouteConfig;
use ecoroute_core::{EcorouteError, ModelBackend, PluginAdapter};
use ecoroute_ollama::OllamaBackend;
use ecoroute_router::RoutingEngine;
use tracing::{info, warn};

pub fn build_backend(config: &EcorouteConfig) -> Result<Arc<dyn ModelBackend>, EcorouteError> {
    Ok(Arc::new(OllamaBackend::new(&config.ollama)?))
}

/// Start the engine, loading the baseline model within the startup timeout.
pub async fn start_engine(
    config: &EcorouteConfig,
    backend: Arc<dyn ModelBackend>,
) -> Result<RoutingEngine, EcorouteError> {
    match backend.health_check().await {
        Ok(status) => info!(backend = backend.name(), ?status, "model backend health"),
        Err(e) => warn!(backend = backend.name(), error = %e, "model backend health check failed"),
    }

    info!(
        baseline = %config.routing.baseline_model,
        timeout_secs = config.routing.startup_timeout_secs,
        "loading baseline model"
    );
    RoutingEngine::start(config, backend).await
}
