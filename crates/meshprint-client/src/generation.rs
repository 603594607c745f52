//! HTTP client for the generation service.

use async_trait::async_trait;
use meshprint_core::{ApiKey, CreationRequest, GenerationTask, TaskId};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{check_status, ClientError};

/// Source of task status snapshots.
///
/// Seam between the poller and the generation service so the polling loop
/// can be driven by an in-memory fake in tests.
#[async_trait]
pub trait StatusSource: Send + Sync + 'static {
    /// Fetch the current full snapshot for a task.
    async fn fetch_status(&self, id: &TaskId, key: &ApiKey) -> Result<GenerationTask, ClientError>;
}

/// Create response envelope from the generation service.
#[derive(Debug, Deserialize)]
struct CreateResponse {
    result: String,
}

/// HTTP client for the generation service.
pub struct GenerationClient {
    inner: reqwest::Client,
    base_url: String,
}

impl GenerationClient {
    /// Create a new generation client against the given base URL.
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Submit a creation request and return the new task id.
    ///
    /// The request is validated before anything is sent; a validation
    /// failure never reaches the network.
    pub async fn create(
        &self,
        request: &CreationRequest,
        key: &ApiKey,
    ) -> Result<TaskId, ClientError> {
        request.validate()?;

        let (path, payload) = match request {
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

        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Creating generation task");

        let response = self
            .inner
            .post(&url)
            .bearer_auth(key.as_str())
            .json(&payload)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: CreateResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Serialization(e.to_string()))?;

        Ok(TaskId::new(body.result))
    }
}

#[async_trait]
impl StatusSource for GenerationClient {
    async fn fetch_status(&self, id: &TaskId, key: &ApiKey) -> Result<GenerationTask, ClientError> {
        let url = format!("{}/openapi/v1/image-to-3d/{}", self.base_url, id);
        debug!(url = %url, "Fetching task status");

        let response = self.inner.get(&url).bearer_auth(key.as_str()).send().await?;
        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::Serialization(e.to_string()))
    }
}
