// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama model backend for Ecoroute.
//!
//! Implements [`ModelBackend`] against a local Ollama server. Catalog ids
//! are mapped to Ollama tags through `[ollama] model_tags`; ids without a
//! mapping are sent unchanged.

pub mod client;
pub mod prompt;
pub mod types;

use std::collections::BTreeMap;

use async_trait::async_trait;
use ecoroute_config::OllamaConfig;
use ecoroute_core::{AdapterType, EcorouteError, HealthStatus, ModelBackend, PluginAdapter};
use tracing::{debug, info};

use crate::client::OllamaClient;
use crate::prompt::PromptTemplate;
use crate::types::{GenerateOptions, GenerateRequest};

pub struct OllamaBackend {
    client: OllamaClient,
    keep_alive: String,
    model_tags: BTreeMap<String, String>,
}

impl OllamaBackend {
    pub fn new(config: &OllamaConfig) -> Result<Self, EcorouteError> {
        let client = OllamaClient::new(&config.base_url)?;
        info!(base_url = %config.base_url, "Ollama backend initialized");
        Ok(Self {
            client,
            keep_alive: config.keep_alive.clone(),
            model_tags: config.model_tags.clone(),
        })
    }

    /// Ollama tag for a catalog id.
    pub fn tag_for<'a>(&'a self, model_id: &'a str) -> &'a str {
        self.model_tags
            .get(model_id)
            .map(String::as_str)
            .unwrap_or(model_id)
    }
}

#[async_trait]
impl PluginAdapter for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Backend
    }

    async fn health_check(&self) -> Result<HealthStatus, EcorouteError> {
        match self.client.ping().await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), EcorouteError> {
        debug!("Ollama backend shutting down");
        Ok(())
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    async fn load(&self, model_id: &str) -> Result<(), EcorouteError> {
        let tag = self.tag_for(model_id);
        debug!(model_id, tag, "asking Ollama to load model");
        let request = GenerateRequest {
            model: tag.to_string(),
            prompt: String::new(),
            stream: false,
            raw: false,
            keep_alive: self.keep_alive.clone(),
            options: None,
        };
        self.client.generate(&request).await?;
        Ok(())
    }

    async fn generate(
        &self,
        model_id: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, EcorouteError> {
        let template = PromptTemplate::for_model(model_id);
        let request = GenerateRequest {
            model: self.tag_for(model_id).to_string(),
            prompt: template.render(prompt),
            stream: false,
            raw: true,
            keep_alive: self.keep_alive.clone(),
            options: Some(GenerateOptions {
                stop: template.stop_sequences(),
                ..GenerateOptions::with_max_tokens(max_tokens)
            }),
        };
        let response = self.client.generate(&request).await?;
        Ok(response.response.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> OllamaBackend {
        OllamaBackend::new(&OllamaConfig {
            base_url: server.uri(),
            ..OllamaConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn tags_map_catalog_ids() {
        let backend = OllamaBackend::new(&OllamaConfig::default()).unwrap();
        assert_eq!(backend.tag_for("tinyllama"), "tinyllama:1.1b");
        assert_eq!(backend.tag_for("codellama"), "codellama:7b-instruct");
        assert_eq!(backend.tag_for("mistral"), "mistral");
    }

    #[tokio::test]
    async fn load_sends_empty_prompt_with_keep_alive() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({
                "model": "tinyllama:1.1b",
                "prompt": "",
                "keep_alive": "-1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "tinyllama:1.1b",
                "response": "",
                "done": true,
                "done_reason": "load"
            })))
            .expect(1)
            .mount(&server)
            .await;

        backend(&server).load("tinyllama").await.unwrap();
    }

    #[tokio::test]
    async fn generate_formats_prompt_and_trims_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt2",
                "prompt": "Question: capital of France?\nAnswer:",
                "raw": true,
                "stream": false,
                "options": {"num_predict": 32}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "gpt2",
                "response": "  Paris\n",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = backend(&server)
            .generate("gpt2", "capital of France?", 32)
            .await
            .unwrap();
        assert_eq!(text, "Paris");
    }

    #[tokio::test]
    async fn missing_model_is_backend_error_naming_it() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": "model 'codellama:7b-instruct' not found, try pulling it first"
            })))
            .mount(&server)
            .await;

        let err = backend(&server).load("codellama").await.unwrap_err();
        assert!(matches!(err, EcorouteError::Backend { .. }));
        assert!(err.to_string().contains("codellama:7b-instruct"));
    }

    #[tokio::test]
    async fn health_check_reflects_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"models": []})))
            .mount(&server)
            .await;

        assert_eq!(
            backend(&server).health_check().await.unwrap(),
            HealthStatus::Healthy
        );

        let down = OllamaBackend::new(&OllamaConfig {
            base_url: "http://127.0.0.1:1".into(),
            ..OllamaConfig::default()
        })
        .unwrap();
        assert!(matches!(
            down.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }
}
