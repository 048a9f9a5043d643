// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ecoroute route`: make one routing decision and print it.

use std::sync::Arc;

use ecoroute_carbon::FixedCarbonReader;
use ecoroute_config::EcorouteConfig;
use ecoroute_core::{CarbonReader, EcorouteError};

use crate::bootstrap;
use crate::serve::init_tracing;

pub async fn run_route(
    config: EcorouteConfig,
    query: &str,
    intensity: Option<f64>,
    model: Option<&str>,
    zone: Option<&str>,
) -> Result<(), EcorouteError> {
    init_tracing(&config.server.log_level);

    let carbon: Arc<dyn CarbonReader> = match intensity {
        Some(value) => Arc::new(FixedCarbonReader::new(value)),
        None => ecoroute_carbon::build_reader(&config.carbon)?,
    };
    let reading = carbon.get_intensity(zone).await?;

    let backend = bootstrap::build_backend(&config)?;
    let engine = bootstrap::start_engine(&config, backend).await?;
    let selection = engine.select(query, &reading, model).await?;

    let json = serde_json::to_string_pretty(&selection)
        .map_err(|e| EcorouteError::Internal(format!("failed to serialize selection: {e}")))?;
    println!("{json}");
    Ok(())
}
