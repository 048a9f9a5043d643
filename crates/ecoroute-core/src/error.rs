// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Ecoroute router.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across adapter traits and the routing engine.
#[derive(Debug, Error)]
pub enum EcorouteError {
    /// Configuration errors (invalid TOML, missing catalog entries, bad thresholds).
    #[error("configuration error: {0}")]
    Config(String),

    /// Model backend errors (load failure, generation failure, unreachable server).
    #[error("backend error: {message}")]
    Backend {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Carbon-intensity reader errors (HTTP failure, malformed payload).
    #[error("carbon reader error: {message}")]
    Carbon {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The requested model id is not present in the catalog.
    #[error("model not found in catalog: {model_id}")]
    ModelNotFound { model_id: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// The baseline model is not resident, so no selection can be made.
    ///
    /// This is the only selection failure that reaches callers: every other
    /// candidate failure falls back to the baseline.
    #[error("baseline model `{model_id}` is not resident; no candidates left")]
    BaselineUnavailable { model_id: String },

    /// Generation failed on the chosen model and on the baseline retry.
    #[error("generation failed on `{model_id}`: {message}")]
    Generation { model_id: String, message: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EcorouteError {
    /// Shorthand for a backend error without an underlying source.
    pub fn backend(message: impl Into<String>) -> Self {
        EcorouteError::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a carbon reader error without an underlying source.
    pub fn carbon(message: impl Into<String>) -> Self {
        EcorouteError::Carbon {
            message: message.into(),
            source: None,
        }
    }
}
