pub mod ollama;
pub mod openai;

use crate::config::UpstreamConfig;
use crate::error::ProviderError;
use crate::types::{CompletionRequest, Provider as ProviderType};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Anything that accepts a completion request and returns generated text
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Check if provider is reachable / configured
    async fn health(&self) -> Result<bool>;

    /// Text completion, returns the first candidate
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}

/// Build the process-wide upstream provider, once, before serving
pub fn from_config(config: &UpstreamConfig) -> Result<Arc<dyn Provider>> {
    let client = http_client(config.timeout_secs)?;

    let provider: Arc<dyn Provider> = match config.provider {
        ProviderType::OpenAI => Arc::new(openai::OpenAIProvider::from_config(config, client)?),
        ProviderType::Ollama => Arc::new(ollama::OllamaProvider::from_config(config, client)),
    };

    Ok(provider)
}

fn http_client(timeout_secs: Option<u64>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().context("Failed to build upstream HTTP client")
}

/// Turn a non-success upstream body into an error detail.
/// JSON bodies of the form `{"error": {...}}` yield the inner object.
pub(crate) fn error_detail(body: &str) -> serde_json::Value {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(mut value) => match value.get_mut("error") {
            Some(inner) => inner.take(),
            None => value,
        },
        Err(_) => serde_json::Value::String(body.to_string()),
    }
}
