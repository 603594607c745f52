//! Upload service routes: initialize and status update.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use meshprint_core::{FileType, PartFile, UploadStatus};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::error::ApiError;
use crate::routes::{require_header, upstream_error, PUBLISHABLE_KEY_HEADER};
use crate::state::AppState;

/// Request body for upload initialization.
#[derive(Debug, Deserialize, Serialize)]
pub struct InitializeRequest {
    pub file_type: FileType,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Request body for the status update (finalize) call.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: UploadStatus,
}

/// Upload initialization endpoint. Forwards the metadata to the upload
/// service and returns its record, including the signed write URL.
pub async fn initialize(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<InitializeRequest>,
) -> Result<Json<PartFile>, ApiError> {
    let key = require_header(&headers, PUBLISHABLE_KEY_HEADER)?;
    if body.file_name.is_empty() {
        return Err(ApiError::Validation("file name is required".into()));
    }

    let url = format!("{}/api/v1/part-files", state.config.upload_base_url);
    let response = state
        .http
        .post(&url)
        .header(PUBLISHABLE_KEY_HEADER, &key)
        .json(&body)
        .send()
        .await
        .map_err(|e| ApiError::Internal(format!("failed to reach upload service: {e}")))?;

    if !response.status().is_success() {
        return Err(upstream_error(response, "upload service").await);
    }

    let record: PartFile = response
        .json()
        .await
        .map_err(|e| ApiError::Internal(format!("invalid initialize response: {e}")))?;

    info!(id = %record.id, file_name = %record.file_name, "Upload initialized");
    Ok(Json(record))
}

/// Status update endpoint. Forwards the PATCH to the upload service and
/// returns its full record, including the redirect URL when present.
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<PartFile>, ApiError> {
    let key = require_header(&headers, PUBLISHABLE_KEY_HEADER)?;
    if id.is_empty() {
        return Err(ApiError::Validation("upload ID is required".into()));
    }

    let url = format!("{}/api/v1/part-files/{}", state.config.upload_base_url, id);
    let response = state
        .http
        .patch(&url)
        .header(PUBLISHABLE_KEY_HEADER, &key)
        .json(&json!({ "status": body.status }))
        .send()
        .await
        .map_err(|e| ApiError::Internal(format!("failed to reach upload service: {e}")))?;

    if !response.status().is_success() {
        return Err(upstream_error(response, "upload service").await);
    }

    let record: PartFile = response
        .json()
        .await
        .map_err(|e| ApiError::Internal(format!("invalid update response: {e}")))?;

    info!(id = %record.id, status = ?record.status, "Upload status updated");
    Ok(Json(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    fn state() -> Arc<AppState> {
        AppState::new(Config::default())
    }

    #[tokio::test]
    async fn test_initialize_without_key_is_401() {
        let err = initialize(
            State(state()),
            HeaderMap::new(),
            Json(InitializeRequest {
                file_type: FileType::Stl,
                file_name: "part.stl".into(),
                metadata: None,
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_update_status_without_key_is_401() {
        let err = update_status(
            State(state()),
            Path("pf-1".into()),
            HeaderMap::new(),
            Json(UpdateStatusRequest {
                status: UploadStatus::Uploaded,
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
