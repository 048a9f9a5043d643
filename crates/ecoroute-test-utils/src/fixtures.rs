// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration fixtures.

use ecoroute_config::model::{CarbonProvider, EcorouteConfig, ModelEntry};
use ecoroute_core::Capability;

/// Default configuration with the mock carbon provider and the built-in
/// tinyllama / gpt2 / codellama catalog.
pub fn test_config() -> EcorouteConfig {
    let mut config = EcorouteConfig::default();
    config.carbon.provider = CarbonProvider::Mock;
    config
}

/// `test_config` with an extra catalog entry appended after the defaults.
pub fn test_config_with(extra: ModelEntry) -> EcorouteConfig {
    let mut config = test_config();
    config.models.push(extra);
    config
}

/// A small catalog entry for tests that need a model outside the defaults.
pub fn model_entry(id: &str, capabilities: &[Capability], energy: f64) -> ModelEntry {
    ModelEntry {
        id: id.to_string(),
        capabilities: capabilities.to_vec(),
        energy_per_1k_tokens: energy,
        max_context: 2048,
        performance_score: 0.8,
    }
}
