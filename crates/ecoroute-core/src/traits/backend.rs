// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model backend trait for inference runtimes (Ollama, llama.cpp servers, etc.).

use async_trait::async_trait;

use crate::error::EcorouteError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for an inference runtime hosting catalog models.
///
/// Backends are opaque to the router: it never inspects weights or
/// tokenizers, it only asks for a model to become resident and for text.
#[async_trait]
pub trait ModelBackend: PluginAdapter {
    /// Makes `model_id` resident and ready to serve `generate` calls.
    ///
    /// May be slow. Callers bound it with their own timeout and may drop
    /// the returned future part-way.
    async fn load(&self, model_id: &str) -> Result<(), EcorouteError>;

    /// Generates a completion for `prompt` on an already loaded model.
    async fn generate(
        &self,
        model_id: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, EcorouteError>;
}
