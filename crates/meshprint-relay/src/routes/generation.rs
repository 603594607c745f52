//! Generation service routes: task creation and status.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use meshprint_core::{ArtStyle, CreationRequest, GenerationTask, ImageInputSet};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::error::ApiError;
use crate::routes::{require_header, upstream_error, API_KEY_HEADER};
use crate::state::AppState;

/// Request body for text-to-model creation.
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub prompt: String,
    #[serde(default)]
    pub art_style: ArtStyle,
}

/// Request body for single-image creation.
#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub image_url: String,
}

/// Request body for multi-image creation.
#[derive(Debug, Deserialize)]
pub struct MultiImageRequest {
    pub image_urls: ImageInputSet,
}

/// Response body for all creation routes.
#[derive(Debug, Serialize)]
pub struct CreateTaskResponse {
    pub task_id: String,
}

/// Create envelope returned by the generation service.
#[derive(Debug, Deserialize)]
struct CreateResult {
    result: String,
}

/// Text-to-model creation endpoint.
pub async fn create_text(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TextRequest>,
) -> Result<Json<CreateTaskResponse>, ApiError> {
    let key = require_header(&headers, API_KEY_HEADER)?;
    create_task(
        &state,
        &key,
        CreationRequest::TextToModel {
            prompt: body.prompt,
            art_style: body.art_style,
        },
    )
    .await
}

/// Single-image creation endpoint.
pub async fn create_image(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ImageRequest>,
) -> Result<Json<CreateTaskResponse>, ApiError> {
    let key = require_header(&headers, API_KEY_HEADER)?;
    create_task(
        &state,
        &key,
        CreationRequest::ImageToModel {
            image_url: body.image_url,
        },
    )
    .await
}

/// Multi-image creation endpoint. Rejects 0 or more than 4 images before
/// any upstream call.
pub async fn create_multi_image(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<MultiImageRequest>,
) -> Result<Json<CreateTaskResponse>, ApiError> {
    let key = require_header(&headers, API_KEY_HEADER)?;
    create_task(
        &state,
        &key,
        CreationRequest::MultiImageToModel {
            image_urls: body.image_urls,
        },
    )
    .await
}

/// Task status endpoint. Returns the full task snapshot.
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<GenerationTask>, ApiError> {
    let key = require_header(&headers, API_KEY_HEADER)?;
    if task_id.is_empty() {
        return Err(ApiError::Validation("task ID is required".into()));
    }

    let url = format!(
        "{}/openapi/v1/image-to-3d/{}",
        state.config.generation_base_url, task_id
    );
    let response = state
        .http
        .get(&url)
        .bearer_auth(&key)
        .send()
        .await
        .map_err(|e| ApiError::Internal(format!("failed to reach generation service: {e}")))?;

    if !response.status().is_success() {
        return Err(upstream_error(response, "generation service").await);
    }

    let task: GenerationTask = response
        .json()
        .await
        .map_err(|e| ApiError::Internal(format!("invalid status response: {e}")))?;
    Ok(Json(task))
}

/// Validate and forward a creation request, dispatching on its variant to
/// pick the upstream route and payload.
async fn create_task(
    state: &AppState,
    key: &str,
    request: CreationRequest,
) -> Result<Json<CreateTaskResponse>, ApiError> {
    request.validate()?;

    let (path, payload) = match &request {
        CreationRequest::TextToModel { prompt, art_style } => (
            "/openapi/v2/text-to-3d",
            json!({
                "mode": "preview",
                "prompt": prompt,
                "art_style": art_style,
                "should_remesh": true,
            }),
        ),
        CreationRequest::ImageToModel { image_url } => (
            "/openapi/v1/image-to-3d",
            json!({
                "image_url": image_url,
                "enable_pbr": true,
                "should_remesh": true,
                "should_texture": true,
            }),
        ),
        CreationRequest::MultiImageToModel { image_urls } => (
            "/openapi/v1/multi-image-to-3d",
            json!({
                "image_urls": image_urls,
                "enable_pbr": true,
                "should_remesh": true,
                "should_texture": true,
            }),
        ),
    };

    let url = format!("{}{}", state.config.generation_base_url, path);
    let response = state
        .http
        .post(&url)
        .bearer_auth(key)
        .json(&payload)
        .send()
        .await
        .map_err(|e| ApiError::Internal(format!("failed to reach generation service: {e}")))?;

    if !response.status().is_success() {
        return Err(upstream_error(response, "generation service").await);
    }

    let body: CreateResult = response
        .json()
        .await
        .map_err(|e| ApiError::Internal(format!("invalid create response: {e}")))?;

    info!(task_id = %body.result, "Created generation task");
    Ok(Json(CreateTaskResponse {
        task_id: body.result,
    }))
}
