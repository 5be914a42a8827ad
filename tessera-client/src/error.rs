//! API error types and server error-body handling.

use reqwest::StatusCode;
use thiserror::Error;

/// Maximum length of a raw body carried into an error message.
const MAX_BODY_LEN: usize = 500;

/// Errors surfaced by the API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level failure: DNS, connect, timeout, or a broken body.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The session is no longer valid and has been torn down.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Any non-success status other than 401.
    #[error("server returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    /// The response body did not match the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A request body failed to serialize.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Credential storage failed underneath the client.
    #[error("storage error: {0}")]
    Storage(#[from] tessera_core::StoreError),

    /// The client configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    /// Build an error for a non-success response, extracting the
    /// server-provided message from the body.
    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        let message = error_message(body, status.canonical_reason().unwrap_or("request failed"));
        if status == StatusCode::UNAUTHORIZED {
            ApiError::Unauthorized { message }
        } else {
            ApiError::Status { status, message }
        }
    }
}

/// Extract a human-readable message from a server error body.
///
/// The backend sends Laravel-style bodies: `{"message": "...", "errors":
/// {"field": ["msg", ...]}}`. Preference order is the first field-level
/// validation message, then the top-level message, then the (truncated)
/// raw body, then the fallback.
pub(crate) fn error_message(body: &str, fallback: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(errors) = value.get("errors").and_then(|e| e.as_object()) {
            for messages in errors.values() {
                if let Some(first) = messages
                    .as_array()
                    .and_then(|m| m.first())
                    .and_then(|m| m.as_str())
                {
                    return first.to_string();
                }
            }
        }
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            if !message.is_empty() {
                return message.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        truncate_body(trimmed)
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_BODY_LEN {
        return body.to_string();
    }
    let mut end = MAX_BODY_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
