// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ecoroute serve`: the long-running HTTP gateway.

use std::sync::Arc;

use ecoroute_config::EcorouteConfig;
use ecoroute_core::{EcorouteError, PluginAdapter};
use ecoroute_gateway::{GatewaySettings, GatewayState};
use tracing::{info, warn};

use crate::bootstrap;
use crate::shutdown;

type RenderFn = Arc<dyn Fn() -> String + Send + Sync>;

pub async fn run_serve(config: EcorouteConfig) -> Result<(), EcorouteError> {
    init_tracing(&config.server.log_level);
    info!(version = env!("CARGO_PKG_VERSION"), "starting ecoroute");

    // Installed before the engine starts so the baseline load is counted.
    let render = install_metrics();

    let backend = bootstrap::build_backend(&config)?;
    let carbon = ecoroute_carbon::build_reader(&config.carbon)?;
    let engine = Arc::new(bootstrap::start_engine(&config, backend.clone()).await?);

    let mut state = GatewayState::new(engine, carbon.clone(), GatewaySettings::from(&config));
    if let Some(render) = render {
        state = state.with_prometheus(render);
    }

    let cancel = shutdown::install_signal_handler();
    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    ecoroute_gateway::start_server(&addr, state, cancel.cancelled_owned()).await?;

    for (name, result) in [
        (backend.name().to_string(), backend.shutdown().await),
        (carbon.name().to_string(), carbon.shutdown().await),
    ] {
        if let Err(e) = result {
            warn!(adapter = %name, error = %e, "adapter shutdown failed");
        }
    }
    info!("ecoroute stopped");
    Ok(())
}

#[cfg(feature = "prometheus")]
fn install_metrics() -> Option<RenderFn> {
    match ecoroute_prometheus::PrometheusAdapter::new() {
        Ok(adapter) => Some(Arc::new(move || adapter.render())),
        Err(e) => {
            warn!(error = %e, "metrics disabled");
            None
        }
    }
}

#[cfg(not(feature = "prometheus"))]
fn install_metrics() -> Option<RenderFn> {
    None
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` takes precedence. Output goes to stderr so `route` can print
/// JSON on stdout.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ecoroute={log_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
