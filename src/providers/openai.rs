use crate::config::UpstreamConfig;
use crate::error::ProviderError;
use crate::providers::{Provider, error_detail};
use crate::types::CompletionRequest;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI legacy text-completions endpoint (`/v1/completions`)
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAIProvider {
    pub fn new(client: reqwest::Client, api_key: String, base_url: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    pub fn from_config(config: &UpstreamConfig, client: reqwest::Client) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| anyhow::anyhow!("OpenAI API key not configured"))?;

        Ok(Self::new(client, api_key, config.base_url.clone()))
    }
}

// OpenAI API types
#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    text: String,
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn health(&self) -> Result<bool> {
        Ok(!self.api_key.is_empty())
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let res = self
            .client
            .post(format!("{}/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
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
        let completion: CompletionResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or_else(|| ProviderError::Malformed("no choices in response".to_string()))
    }
}
