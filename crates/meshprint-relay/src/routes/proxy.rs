//! CORS-bypass proxy for binary model fetches.
//!
//! Fetches a cross-origin resource server-side and streams the raw bytes
//! back with the origin's content type and a long-lived cache directive.
//! No transformation, no validation of the payload, no body caching here.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Content type assumed when the origin does not declare one.
pub const DEFAULT_MODEL_CONTENT_TYPE: &str = "model/gltf-binary";

/// Generated content never changes once produced, so downstream caches may
/// hold it for a year.
const CACHE_CONTROL_VALUE: &str = "public, max-age=31536000";

/// Query parameters for the proxy endpoint.
#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    pub url: Option<String>,
}

/// Proxy fetch endpoint.
pub async fn fetch_model(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProxyParams>,
) -> Result<impl IntoResponse + std::fmt::Debug, ApiError> {
    let url = params
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::Validation("url query parameter is required".into()))?;

    debug!(url = %url, "Proxying model fetch");

    let response = state
        .http
        .get(&url)
        .send()
        .await
        .map_err(|e| ApiError::Internal(format!("failed to fetch model: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Upstream {
            status: status.as_u16(),
            message: format!("failed to fetch model: {status}"),
        });
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_MODEL_CONTENT_TYPE)
        .to_owned();

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::Internal(format!("failed to read model body: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, CACHE_CONTROL_VALUE.to_owned()),
        ],
        bytes.to_vec(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::http::StatusCode;

    fn state() -> Arc<AppState> {
        AppState::new(Config::default())
    }

    #[tokio::test]
    async fn test_missing_url_is_400() {
        let err = fetch_model(State(state()), Query(ProxyParams { url: None }))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_url_is_400() {
        let err = fetch_model(
            State(state()),
            Query(ProxyParams {
                url: Some(String::new()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unreachable_origin_is_internal_error() {
        // Scenario D: transport-level failure with no upstream status.
        let err = fetch_model(
            State(state()),
            Query(ProxyParams {
                url: Some("http://127.0.0.1:1/model.glb".into()),
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Internal(_)));
    }
}
