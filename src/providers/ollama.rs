use crate::config::UpstreamConfig;
use crate::error::ProviderError;
use crate::providers::{Provider, error_detail};
use crate::types::CompletionRequest;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Local Ollama server via `/api/generate`
pub struct OllamaProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl OllamaProvider {
    pub fn new(client: reqwest::Client, endpoint: String) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &UpstreamConfig, client: reqwest::Client) -> Self {
        let endpoint = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        Self::new(client, endpoint)
    }
}

// Ollama API types
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    num_predict: i32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl<'a> From<&'a CompletionRequest> for GenerateRequest<'a> {
    fn from(request: &'a CompletionRequest) -> Self {
        Self {
            model: &request.model,
            prompt: &request.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
                top_p: request.top_p,
                num_predict: request.max_tokens,
                frequency_penalty: request.frequency_penalty,
                presence_penalty: request.presence_penalty,
            },
        }
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn health(&self) -> Result<bool> {
        let res = self
            .client
            .get(format!("{}/api/tags", self.endpoint))
            .send()
            .await;

        Ok(res.is_ok_and(|r| r.status().is_success()))
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let res = self
            .client
            .post(format!("{}/api/generate", self.endpoint))
            .json(&GenerateRequest::from(request))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let error_text = res.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                detail: error_detail(&error_text),
            });
        }

        let body = res.text().await?;
        let generated: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        Ok(generated.response)
    }
}
