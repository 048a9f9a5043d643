// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scriptable model backend for deterministic testing.
//!
//! `MockBackend` implements `ModelBackend` without any inference server.
//! Loads and generations can be delayed or made to fail per model id, and
//! every call is counted so tests can assert how often the router hit the
//! backend.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use ecoroute_core::traits::adapter::PluginAdapter;
use ecoroute_core::traits::backend::ModelBackend;
use ecoroute_core::types::{AdapterType, HealthStatus};
use ecoroute_core::EcorouteError;

#[derive(Debug, Default)]
struct Script {
    load_latency: HashMap<String, Duration>,
    generate_latency: HashMap<String, Duration>,
    failing_loads: HashSet<String>,
    failing_generations: HashSet<String>,
    load_calls: HashMap<String, usize>,
    generate_calls: HashMap<String, usize>,
    loaded: HashSet<String>,
}

/// A model backend whose behaviour is configured by the test.
///
/// Latencies use `tokio::time::sleep`, so tests running with a paused clock
/// advance through them instantly.
#[derive(Debug, Default)]
pub struct MockBackend {
    script: Mutex<Script>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_script<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut script)
    }

    /// Make every `load(model_id)` take `latency` before completing.
    pub fn set_load_latency(&self, model_id: &str, latency: Duration) {
        self.with_script(|s| s.load_latency.insert(model_id.to_string(), latency));
    }

    /// Make every `generate(model_id, ..)` take `latency` before completing.
    pub fn set_generate_latency(&self, model_id: &str, latency: Duration) {
        self.with_script(|s| s.generate_latency.insert(model_id.to_string(), latency));
    }

    /// Make `load(model_id)` fail after its latency.
    pub fn fail_load(&self, model_id: &str) {
        self.with_script(|s| s.failing_loads.insert(model_id.to_string()));
    }

    /// Make `generate(model_id, ..)` fail after its latency.
    pub fn fail_generate(&self, model_id: &str) {
        self.with_script(|s| s.failing_generations.insert(model_id.to_string()));
    }

    /// Let a previously failing model load succeed again.
    pub fn heal_load(&self, model_id: &str) {
        self.with_script(|s| s.failing_loads.remove(model_id));
    }

    /// Number of `load` calls issued for `model_id`, including failed and abandoned ones.
    pub fn load_count(&self, model_id: &str) -> usize {
        self.with_script(|s| s.load_calls.get(model_id).copied().unwrap_or(0))
    }

    /// Number of `load` calls across all models.
    pub fn total_loads(&self) -> usize {
        self.with_script(|s| s.load_calls.values().sum())
    }

    pub fn generate_count(&self, model_id: &str) -> usize {
        self.with_script(|s| s.generate_calls.get(model_id).copied().unwrap_or(0))
    }

    /// Whether a load for `model_id` has completed successfully.
    pub fn is_loaded(&self, model_id: &str) -> bool {
        self.with_script(|s| s.loaded.contains(model_id))
    }
}

#[async_trait]
impl PluginAdapter for MockBackend {
    fn name(&self) -> &str {
        "mock-backend"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Backend
    }

    async fn health_check(&self) -> Result<HealthStatus, EcorouteError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), EcorouteError> {
        Ok(())
    }
}

#[async_trait]
impl ModelBackend for MockBackend {
    async fn load(&self, model_id: &str) -> Result<(), EcorouteError> {
        let latency = self.with_script(|s| {
            *s.load_calls.entry(model_id.to_string()).or_default() += 1;
            s.load_latency.get(model_id).copied()
        });
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        self.with_script(|s| {
            if s.failing_loads.contains(model_id) {
                Err(EcorouteError::backend(format!(
                    "model `{model_id}` failed to load"
                )))
            } else {
                s.loaded.insert(model_id.to_string());
                Ok(())
            }
        })
    }

    async fn generate(
        &self,
        model_id: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, EcorouteError> {
        let latency = self.with_script(|s| {
            *s.generate_calls.entry(model_id.to_string()).or_default() += 1;
            s.generate_latency.get(model_id).copied()
        });
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.with_script(|s| s.failing_generations.contains(model_id)) {
            return Err(EcorouteError::backend(format!(
                "generation on `{model_id}` failed"
            )));
        }
        tracing::trace!(model_id, max_tokens, "mock generation");
        Ok(format!("[{model_id}] {prompt}"))
    }
}
