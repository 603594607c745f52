//! HTTP routes.

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::AppState;

pub mod generation;
pub mod proxy;
pub mod upload;

/// Header carrying the generation service credential.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the upload service credential.
pub const PUBLISHABLE_KEY_HEADER: &str = "x-publishable-api-key";

/// Create the relay router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/generation/text", post(generation::create_text))
        .route("/api/generation/image", post(generation::create_image))
        .route(
            "/api/generation/multi-image",
            post(generation::create_multi_image),
        )
        .route("/api/generation/tasks/:task_id", get(generation::get_task))
        .route("/api/uploads", post(upload::initialize))
        .route("/api/uploads/:id", patch(upload::update_status))
        .route("/api/proxy", get(proxy::fetch_model))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Extract a required credential header, rejecting before any upstream
/// call when it is absent or empty.
pub(crate) fn require_header(headers: &HeaderMap, name: &'static str) -> Result<String, ApiError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .ok_or(ApiError::MissingCredential(name))
}

/// Convert a non-2xx upstream response into an [`ApiError`] mirroring its
/// status, extracting the service's message when the body carries one.
pub(crate) async fn upstream_error(response: reqwest::Response, context: &str) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| format!("{context} error: {status}"));

    ApiError::Upstream { status, message }
}
