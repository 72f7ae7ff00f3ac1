//! # LLM Module
//!
//! Text generation behind the [`LanguageModel`] trait. The production adapter
//! talks to a local Ollama server through rig's Ollama provider.

use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::ollama;
use thiserror::Error;
use tracing::debug;

/// Errors raised by a language model adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("Completion request failed: {0}")]
    Completion(String),
}

/// A prompt-in, text-out language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for a single prompt.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Model identifier for logging
    fn name(&self) -> &str;
}

/// Ollama-backed language model.
pub struct OllamaModel {
    client: ollama::Client,
    model: String,
    temperature: f64,
}

impl OllamaModel {
    /// Create an adapter for `model` served from `host`.
    ///
    /// rig's Ollama client reads its base URL from `OLLAMA_API_BASE_URL`, so
    /// the host is exported there before the client is built.
    pub fn new(host: &str, model: impl Into<String>, temperature: f32) -> Self {
        std::env::set_var("OLLAMA_API_BASE_URL", host);
        let client = ollama::Client::from_env();
        let model = model.into();

        debug!(host = %host, model = %model, "Created Ollama client");

        Self {
            client,
            model,
            temperature: f64::from(temperature),
        }
    }
}

#[async_trait]
impl LanguageModel for OllamaModel {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let agent = self
            .client
            .agent(&self.model)
            .temperature(self.temperature)
            .build();

        agent
            .prompt(prompt)
            .await
            .map_err(|e| LlmError::Completion(format!("Ollama completion failed: {}", e)))
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stubs::StubLanguageModel;

    #[tokio::test]
    async fn test_stub_model_through_trait_object() {
        let model: Box<dyn LanguageModel> =
            Box::new(StubLanguageModel::with_responses(["first", "second"]));

        assert_eq!(model.generate("a").await.unwrap(), "first");
        assert_eq!(model.generate("b").await.unwrap(), "second");
        assert_eq!(model.name(), "stub");
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::Completion("connection refused".to_string());
        assert_eq!(err.to_string(), "Completion request failed: connection refused");
    }
}
