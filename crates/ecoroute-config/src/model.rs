// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Ecoroute router.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;
use std::time::Duration;

use ecoroute_core::Capability;
use serde::{Deserialize, Serialize};

/// Top-level Ecoroute configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EcorouteConfig {
    /// HTTP server and request budget settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Selection policy settings.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Carbon-intensity provider settings.
    #[serde(default)]
    pub carbon: CarbonConfig,

    /// Request ledger settings.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Ollama backend settings.
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Model catalog, in declaration order.
    #[serde(default = "default_models")]
    pub models: Vec<ModelEntry>,
}

impl Default for EcorouteConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            routing: RoutingConfig::default(),
            carbon: CarbonConfig::default(),
            ledger: LedgerConfig::default(),
            ollama: OllamaConfig::default(),
            models: default_models(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Upper bound on a whole selection, including model loads.
    #[serde(default = "default_select_timeout_secs")]
    pub select_timeout_secs: u64,

    /// Upper bound on a single generation call.
    #[serde(default = "default_generate_timeout_secs")]
    pub generate_timeout_secs: u64,

    /// Token budget used when a request does not specify one.
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            log_level: default_log_level(),
            select_timeout_secs: default_select_timeout_secs(),
            generate_timeout_secs: default_generate_timeout_secs(),
            default_max_tokens: default_max_tokens(),
        }
    }
}

impl ServerConfig {
    pub fn select_timeout(&self) -> Duration {
        Duration::from_secs(self.select_timeout_secs)
    }

    pub fn generate_timeout(&self) -> Duration {
        Duration::from_secs(self.generate_timeout_secs)
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_select_timeout_secs() -> u64 {
    10
}

fn default_generate_timeout_secs() -> u64 {
    90
}

fn default_max_tokens() -> u32 {
    512
}

/// Selection policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Model loaded at startup and used as the final fallback.
    #[serde(default = "default_baseline_model")]
    pub baseline_model: String,

    /// Model tried first for code queries.
    #[serde(default = "default_code_model")]
    pub code_model: String,

    #[serde(default = "default_code_load_timeout_secs")]
    pub code_load_timeout_secs: u64,

    #[serde(default = "default_complex_load_timeout_secs")]
    pub complex_load_timeout_secs: u64,

    /// Budget for the eager baseline load at process start.
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,

    /// Minimum performance score an optimization strategy must keep.
    #[serde(default = "default_performance_threshold")]
    pub performance_threshold: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            baseline_model: default_baseline_model(),
            code_model: default_code_model(),
            code_load_timeout_secs: default_code_load_timeout_secs(),
            complex_load_timeout_secs: default_complex_load_timeout_secs(),
            startup_timeout_secs: default_startup_timeout_secs(),
            performance_threshold: default_performance_threshold(),
        }
    }
}

impl RoutingConfig {
    pub fn code_load_timeout(&self) -> Duration {
        Duration::from_secs(self.code_load_timeout_secs)
    }

    pub fn complex_load_timeout(&self) -> Duration {
        Duration::from_secs(self.complex_load_timeout_secs)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }
}

fn default_baseline_model() -> String {
    "tinyllama".to_string()
}

fn default_code_model() -> String {
    "codellama".to_string()
}

fn default_code_load_timeout_secs() -> u64 {
    60
}

fn default_complex_load_timeout_secs() -> u64 {
    30
}

fn default_startup_timeout_secs() -> u64 {
    120
}

fn default_performance_threshold() -> f64 {
    0.7
}

/// Which carbon-intensity provider to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CarbonProvider {
    /// Electricity Maps live API.
    #[default]
    ElectricityMaps,
    /// Synthetic daily pattern, for development without an API key.
    Mock,
}

/// Carbon-intensity provider and tier configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CarbonConfig {
    #[serde(default)]
    pub provider: CarbonProvider,

    /// Electricity Maps API token. `None` makes the live reader unhealthy.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Grid zone queried when callers do not name one.
    #[serde(default = "default_zone")]
    pub zone: String,

    /// Age below which a cached reading is served without refetching.
    #[serde(default = "default_cache_secs")]
    pub cache_secs: u64,

    /// Age below which a cached reading may stand in for a failed fetch.
    #[serde(default = "default_stale_secs")]
    pub stale_secs: u64,

    /// Value reported when no live or cached reading is available.
    #[serde(default = "default_intensity")]
    pub default_intensity: f64,

    /// Consecutive upstream failures after which the reader reports unhealthy.
    #[serde(default = "default_max_errors")]
    pub max_errors: u32,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Readings strictly below this are the low tier.
    #[serde(default = "default_low_threshold")]
    pub low_threshold: f64,

    /// Readings strictly below this (and not low) are the medium tier.
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: f64,
}

impl Default for CarbonConfig {
    fn default() -> Self {
        Self {
            provider: CarbonProvider::default(),
            api_key: None,
            api_base_url: default_api_base_url(),
            zone: default_zone(),
            cache_secs: default_cache_secs(),
            stale_secs: default_stale_secs(),
            default_intensity: default_intensity(),
            max_errors: default_max_errors(),
            request_timeout_secs: default_request_timeout_secs(),
            low_threshold: default_low_threshold(),
            medium_threshold: default_medium_threshold(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.electricitymap.org/v3".to_string()
}

fn default_zone() -> String {
    "IN-NO".to_string()
}

fn default_cache_secs() -> u64 {
    300
}

fn default_stale_secs() -> u64 {
    3600
}

fn default_intensity() -> f64 {
    300.0
}

fn default_max_errors() -> u32 {
    3
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_low_threshold() -> f64 {
    100.0
}

fn default_medium_threshold() -> f64 {
    300.0
}

/// Request ledger configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// Records retained before the oldest are dropped. `0` disables the cap.
    #[serde(default = "default_max_records")]
    pub max_records: usize,

    /// History length returned when a caller does not pass a limit.
    #[serde(default = "default_history_limit")]
    pub default_history_limit: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_records: default_max_records(),
            default_history_limit: default_history_limit(),
        }
    }
}

fn default_max_records() -> usize {
    10_000
}

fn default_history_limit() -> usize {
    100
}

/// Ollama backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Passed through to Ollama; `-1` keeps loaded models resident.
    #[serde(default = "default_keep_alive")]
    pub keep_alive: String,

    /// Catalog id to Ollama model tag. Ids without an entry are used as-is.
    #[serde(default = "default_model_tags")]
    pub model_tags: BTreeMap<String, String>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            keep_alive: default_keep_alive(),
            model_tags: default_model_tags(),
        }
    }
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_keep_alive() -> String {
    "-1".to_string()
}

fn default_model_tags() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("tinyllama".to_string(), "tinyllama:1.1b".to_string()),
        ("gpt2".to_string(), "gpt2".to_string()),
        ("codellama".to_string(), "codellama:7b-instruct".to_string()),
    ])
}

/// One `[[models]]` catalog entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelEntry {
    pub id: String,

    pub capabilities: Vec<Capability>,

    /// Energy drawn per thousand generated tokens, in kWh.
    pub energy_per_1k_tokens: f64,

    /// Maximum context window in tokens.
    pub max_context: u32,

    /// Relative answer quality in `[0, 1]`.
    #[serde(default = "default_performance_score")]
    pub performance_score: f64,
}

fn default_performance_score() -> f64 {
    0.8
}

fn default_models() -> Vec<ModelEntry> {
    vec![
        ModelEntry {
            id: "tinyllama".to_string(),
            capabilities: vec![
                Capability::General,
                Capability::Qa,
                Capability::Classification,
            ],
            energy_per_1k_tokens: 0.001,
            max_context: 2048,
            performance_score: 0.75,
        },
        ModelEntry {
            id: "gpt2".to_string(),
            capabilities: vec![Capability::General, Capability::Qa, Capability::Analysis],
            energy_per_1k_tokens: 0.01,
            max_context: 1024,
            performance_score: 0.8,
        },
        ModelEntry {
            id: "codellama".to_string(),
            capabilities: vec![
                Capability::Code,
                Capability::Analysis,
                Capability::Technical,
            ],
            energy_per_1k_tokens: 0.02,
            max_context: 4096,
            performance_score: 0.9,
        },
    ]
}
