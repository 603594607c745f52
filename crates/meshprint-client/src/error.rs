//! Error types for the client.

use meshprint_core::CoreError;
use thiserror::Error;

/// Errors that can occur when talking to the external services.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Caller input failed validation; no request was sent.
    #[error("invalid input: {0}")]
    Validation(#[from] CoreError),

    /// Missing or rejected credential.
    #[error("credential rejected: {0}")]
    Auth(String),

    /// Non-2xx response from an external service.
    #[error("upstream error (HTTP {status}): {message}")]
    Upstream { status: u16, message: String },

    /// Network-level failure with no response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A 2xx response was missing a required field.
    #[error("response missing required field: {0}")]
    MissingField(&'static str),
}

/// Convert a non-2xx response into an [`ClientError::Upstream`], extracting
/// the service's error message when the body carries one.
///
/// Both upstream shapes are handled: the generation service reports
/// `{"message": ...}`, the relay and upload service report `{"error": ...}`.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| format!("service error: {}", status));

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(ClientError::Auth(message));
    }

    Err(ClientError::Upstream {
        status: status.as_u16(),
        message,
    })
}
