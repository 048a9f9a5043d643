// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama `/api/generate` request and response types.

use serde::{Deserialize, Serialize};

/// A request to `POST /api/generate`.
///
/// An empty `prompt` with no options only loads the model.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,

    pub prompt: String,

    pub stream: bool,

    /// Skip Ollama's own prompt template; prompts are pre-formatted.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub raw: bool,

    /// How long the model stays loaded after the request, e.g. `"5m"` or `"-1"`.
    pub keep_alive: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,
}

/// Sampling options.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateOptions {
    /// Maximum tokens to generate.
    pub num_predict: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub repeat_penalty: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

impl GenerateOptions {
    pub fn with_max_tokens(num_predict: u32) -> Self {
        Self {
            num_predict,
            temperature: 0.7,
            top_p: 0.95,
            repeat_penalty: 1.1,
            stop: Vec::new(),
        }
    }
}

/// Non-streaming response from `/api/generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub model: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    /// Set to `"load"` when the request only loaded the model.
    #[serde(default)]
    pub done_reason: Option<String>,
}

/// Error body returned by Ollama on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
