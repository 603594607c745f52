//! API error mapping.
//!
//! Every failure surfaces to the caller as `{"error": string}` with an
//! HTTP status mirroring the upstream failure, or 500 for unexpected
//! local faults.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use meshprint_core::CoreError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Relay API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required credential header was absent. Checked before any
    /// upstream call.
    #[error("missing required header: {0}")]
    MissingCredential(&'static str),

    /// Caller input failed validation. Never reaches upstream.
    #[error("{0}")]
    Validation(String),

    /// Upstream returned a non-2xx; its status is mirrored.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// Unexpected local fault.
    #[error("{0}")]
    Internal(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MissingCredential(_) => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Internal(message) => {
                error!(error = %message, "Internal relay error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_is_mirrored() {
        let resp = ApiError::Upstream {
            status: 429,
            message: "rate limited".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_missing_credential_is_401() {
        let resp = ApiError::MissingCredential("x-api-key").into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_unmappable_upstream_status_falls_back_to_502() {
        let resp = ApiError::Upstream {
            status: 42,
            message: "odd".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }
}
