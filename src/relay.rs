//! Turns one prompt into one upstream completion call.

use crate::config::Config;
use crate::error::RelayError;
use crate::providers::Provider;
use crate::types::CompletionRequest;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Generation parameters, fixed for every request
pub const TEMPERATURE: f32 = 0.0;
pub const MAX_TOKENS: i32 = 3500;
pub const TOP_P: f32 = 1.0;
pub const FREQUENCY_PENALTY: f32 = 0.5;
pub const PRESENCE_PENALTY: f32 = 0.0;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-instruct";

pub struct Relay {
    provider: Arc<dyn Provider>,
    model: String,
    max_prompt_chars: usize,
}

impl Relay {
    pub fn new(provider: Arc<dyn Provider>, model: String, max_prompt_chars: usize) -> Self {
        Self {
            provider,
            model,
            max_prompt_chars,
        }
    }

    pub fn from_config(config: &Config, provider: Arc<dyn Provider>) -> Self {
        let model = config
            .upstream
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Self::new(provider, model, config.limits.max_prompt_chars)
    }

    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Reject prompts that are blank or exceed the configured bound
    pub fn validate(&self, prompt: &str) -> Result<(), RelayError> {
        if prompt.trim().is_empty() {
            return Err(RelayError::InvalidInput("prompt must not be empty".to_string()));
        }

        let chars = prompt.chars().count();
        if chars > self.max_prompt_chars {
            return Err(RelayError::InvalidInput(format!(
                "prompt is {} characters, limit is {}",
                chars, self.max_prompt_chars
            )));
        }

        Ok(())
    }

    /// The upstream payload for a prompt; always terminated by a single period
    pub fn build_completion_request(&self, prompt: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            prompt: format!("{}.", prompt),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            top_p: TOP_P,
            frequency_penalty: FREQUENCY_PENALTY,
            presence_penalty: PRESENCE_PENALTY,
        }
    }

    /// Validate, call the upstream once and return the first completion
    pub async fn relay(&self, prompt: &str) -> Result<String, RelayError> {
        if let Err(e) = self.validate(prompt) {
            warn!("Rejected prompt: {}", e);
            return Err(e);
        }

        let request = self.build_completion_request(prompt);
        debug!(
            provider = self.provider.name(),
            model = %self.model,
            "Forwarding prompt upstream"
        );

        match self.provider.complete(&request).await {
            Ok(text) => Ok(text),
            Err(e) => {
                error!(provider = self.provider.name(), "Failed to send the prompt: {}", e);
                Err(e.into())
            }
        }
    }
}
