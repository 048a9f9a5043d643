// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./ecoroute.toml` > `~/.config/ecoroute/ecoroute.toml` >
//! `/etc/ecoroute/ecoroute.toml` with environment variable overrides via `ECOROUTE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::EcorouteConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/ecoroute/ecoroute.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "ecoroute.toml";

/// Top-level sections that environment variables may address.
const ENV_SECTIONS: &[&str] = &["server", "routing", "carbon", "ledger", "ollama"];

/// Path of the per-user config file, if a config dir exists on this platform.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ecoroute").join(LOCAL_CONFIG_FILE))
}

/// Build the layered Figment without extracting it.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/ecoroute/ecoroute.toml`
/// 3. `~/.config/ecoroute/ecoroute.toml`
/// 4. `./ecoroute.toml`
/// 5. `ECOROUTE_*` environment variables
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(EcorouteConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<EcorouteConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from an inline TOML string over the defaults (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<EcorouteConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EcorouteConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<EcorouteConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EcorouteConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Map `ECOROUTE_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `ECOROUTE_CARBON_API_KEY` maps to `carbon.api_key`, not `carbon.api.key`.
fn env_provider() -> Env {
    Env::prefixed("ECOROUTE_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    ENV_SECTIONS
        .iter()
        .find_map(|section| {
            key.strip_prefix(section)
                .and_then(|rest| rest.strip_prefix('_'))
                .map(|rest| format!("{section}.{rest}"))
        })
        .unwrap_or_else(|| key.to_string())
}
