//! Error types shared by the relay, the providers and the chat client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use thiserror::Error;

use crate::types::RelayResponse;

/// Message returned when the upstream gave no usable detail
pub const GENERIC_UPSTREAM_ERROR: &str = "Failed to send the prompt";

/// Failures talking to an upstream text-generation service
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The upstream answered with a non-success status
    #[error("upstream API error ({status}): {detail}")]
    Api { status: u16, detail: Value },

    #[error("upstream transport error: {0}")]
    Transport(String),

    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Detail worth forwarding to the caller, if the upstream supplied one
    pub fn detail(&self) -> Option<&Value> {
        match self {
            ProviderError::Api { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ProviderError::Malformed(e.to_string())
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

/// Errors surfaced by `POST /api/prompt`
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Upstream(#[from] ProviderError),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let detail = match &self {
            RelayError::InvalidInput(_) => Value::String(self.to_string()),
            RelayError::Upstream(e) => e
                .detail()
                .cloned()
                .unwrap_or_else(|| Value::String(GENERIC_UPSTREAM_ERROR.to_string())),
        };

        (StatusCode::BAD_REQUEST, Json(RelayResponse::err(detail))).into_response()
    }
}

/// Failures of one round trip from the chat client to the relay
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not reach the relay: {0}")]
    Transport(String),

    /// The relay answered `success: false`
    #[error("relay error: {0}")]
    Relay(Value),

    #[error("unexpected relay response: {0}")]
    Decode(String),
}

/// Rejected transitions of a chat session
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a message is already being sent")]
    Busy,

    #[error("nothing to send")]
    EmptyDraft,
}
