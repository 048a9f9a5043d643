// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as ordered tier thresholds, catalog membership of the baseline model,
//! and score ranges.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::EcorouteConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &EcorouteConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let addr = config.server.bind_address.trim();
    if addr.is_empty() {
        fail("server.bind_address must not be empty".to_string());
    } else {
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "server.bind_address `{addr}` is not a valid IP address or hostname"
            ));
        }
    }

    if config.server.select_timeout_secs == 0 {
        fail("server.select_timeout_secs must be greater than 0".to_string());
    }
    if config.server.generate_timeout_secs == 0 {
        fail("server.generate_timeout_secs must be greater than 0".to_string());
    }
    if config.server.default_max_tokens == 0 {
        fail("server.default_max_tokens must be greater than 0".to_string());
    }

    let routing = &config.routing;
    for (key, value) in [
        ("code_load_timeout_secs", routing.code_load_timeout_secs),
        ("complex_load_timeout_secs", routing.complex_load_timeout_secs),
        ("startup_timeout_secs", routing.startup_timeout_secs),
    ] {
        if value == 0 {
            fail(format!("routing.{key} must be greater than 0"));
        }
    }
    if !(0.0..=1.0).contains(&routing.performance_threshold) {
        fail(format!(
            "routing.performance_threshold must be within [0, 1], got {}",
            routing.performance_threshold
        ));
    }

    let carbon = &config.carbon;
    if !(carbon.low_threshold >= 0.0 && carbon.low_threshold < carbon.medium_threshold) {
        fail(format!(
            "carbon thresholds must satisfy 0 <= low_threshold < medium_threshold, got {} and {}",
            carbon.low_threshold, carbon.medium_threshold
        ));
    }
    if carbon.default_intensity < 0.0 {
        fail(format!(
            "carbon.default_intensity must be non-negative, got {}",
            carbon.default_intensity
        ));
    }
    if carbon.zone.trim().is_empty() {
        fail("carbon.zone must not be empty".to_string());
    }
    if carbon.request_timeout_secs == 0 {
        fail("carbon.request_timeout_secs must be greater than 0".to_string());
    }
    if carbon.stale_secs < carbon.cache_secs {
        fail(format!(
            "carbon.stale_secs ({}) must be at least carbon.cache_secs ({})",
            carbon.stale_secs, carbon.cache_secs
        ));
    }

    if config.ledger.default_history_limit == 0 {
        fail("ledger.default_history_limit must be greater than 0".to_string());
    }

    let mut seen_ids = HashSet::new();
    for (i, model) in config.models.iter().enumerate() {
        if model.id.trim().is_empty() {
            fail(format!("models[{i}].id must not be empty"));
        } else if !seen_ids.insert(model.id.as_str()) {
            fail(format!("duplicate model id `{}` in [[models]] array", model.id));
        }
        if model.energy_per_1k_tokens < 0.0 {
            fail(format!(
                "models[{i}].energy_per_1k_tokens must be non-negative, got {}",
                model.energy_per_1k_tokens
            ));
        }
        if !(0.0..=1.0).contains(&model.performance_score) {
            fail(format!(
                "models[{i}].performance_score must be within [0, 1], got {}",
                model.performance_score
            ));
        }
        if model.capabilities.is_empty() {
            fail(format!("models[{i}].capabilities must not be empty"));
        }
    }

    for (key, id) in [
        ("baseline_model", &routing.baseline_model),
        ("code_model", &routing.code_model),
    ] {
        if !seen_ids.contains(id.as_str()) {
            fail(format!(
                "routing.{key} `{id}` is not declared in [[models]]"
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
