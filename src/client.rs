use crate::error::ClientError;
use crate::transcript::PromptSender;
use crate::types::{PromptRequest, RelayResponse};
use async_trait::async_trait;
use serde_json::Value;

/// HTTP client for `POST /api/prompt`
pub struct RelayClient {
    http: reqwest::Client,
    url: String,
}

impl RelayClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PromptSender for RelayClient {
    async fn send_prompt(&self, prompt: &str) -> Result<String, ClientError> {
        let res = self
            .http
            .post(&self.url)
            .json(&PromptRequest {
                prompt: prompt.to_string(),
            })
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let response: RelayResponse = serde_json::from_str(&body)
            .map_err(|_| ClientError::Decode(format!("HTTP {}: {}", status, body)))?;

        match response {
            RelayResponse {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            RelayResponse { success: true, .. } => {
                Err(ClientError::Decode("success without data".to_string()))
            }
            RelayResponse { error, .. } => Err(ClientError::Relay(
                error.unwrap_or_else(|| Value::String(format!("HTTP {}", status))),
            )),
        }
    }
}

/// Human-readable form of a relay error detail
pub fn describe_detail(detail: &Value) -> String {
    match detail {
        Value::String(message) => message.clone(),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| detail.to_string()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_describe_string_detail() {
        assert_eq!(describe_detail(&json!("Failed to send the prompt")), "Failed to send the prompt");
    }

    #[test]
    fn test_describe_object_detail_prefers_message() {
        let detail = json!({ "message": "Incorrect API key provided", "code": "invalid_api_key" });
        assert_eq!(describe_detail(&detail), "Incorrect API key provided");

        let detail = json!({ "code": 42 });
        assert_eq!(describe_detail(&detail), r#"{"code":42}"#);
    }
}
