// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for a local Ollama server.

use std::time::Duration;

use ecoroute_core::EcorouteError;
use reqwest::StatusCode;
use tracing::debug;

use crate::types::{ErrorResponse, GenerateRequest, GenerateResponse};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin wrapper over `/api/generate` and `/api/tags`.
///
/// No request timeout is set: loads can take minutes and callers bound
/// every call with their own deadline.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Result<Self, EcorouteError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| EcorouteError::Backend {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a non-streaming generate request.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, EcorouteError> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| EcorouteError::Backend {
                message: format!("Ollama request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, model = %request.model, "Ollama response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for(status, &request.model, &body));
        }

        response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| EcorouteError::Backend {
                message: format!("failed to parse Ollama response: {e}"),
                source: Some(Box::new(e)),
            })
    }

    /// Whether the server answers `GET /api/tags`.
    pub async fn ping(&self) -> Result<(), EcorouteError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| EcorouteError::Backend {
                message: format!("Ollama server unreachable: {e}"),
                source: Some(Box::new(e)),
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(EcorouteError::backend(format!(
                "Ollama server returned {}",
                response.status()
            )))
        }
    }
}

fn error_for(status: StatusCode, model: &str, body: &str) -> EcorouteError {
    let detail = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.to_string());

    if status == StatusCode::NOT_FOUND || detail.contains("not found") {
        return EcorouteError::backend(format!(
            "model `{model}` not found on Ollama server (try `ollama pull {model}`): {detail}"
        ));
    }
    EcorouteError::backend(format!("Ollama returned {status}: {detail}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_status_names_model() {
        let err = error_for(
            StatusCode::NOT_FOUND,
            "codellama:7b-instruct",
            r#"{"error":"model 'codellama:7b-instruct' not found"}"#,
        );
        let msg = err.to_string();
        assert!(msg.contains("ollama pull codellama:7b-instruct"), "got: {msg}");
    }

    #[test]
    fn not_found_text_with_other_status() {
        let err = error_for(StatusCode::BAD_REQUEST, "gpt2", r#"{"error":"model not found"}"#);
        assert!(err.to_string().contains("`gpt2` not found"));
    }

    #[test]
    fn other_errors_keep_status_and_detail() {
        let err = error_for(StatusCode::INTERNAL_SERVER_ERROR, "gpt2", "out of memory");
        let msg = err.to_string();
        assert!(msg.contains("500"), "got: {msg}");
        assert!(msg.contains("out of memory"));
    }
}
