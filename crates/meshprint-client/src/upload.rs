//! HTTP client for the upload service handshake.

use async_trait::async_trait;
use meshprint_core::{FileType, PartFile, PublishableKey, UploadId, UploadStatus};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::error::{check_status, ClientError};

/// Header carrying the upload service credential.
pub const PUBLISHABLE_KEY_HEADER: &str = "x-publishable-api-key";

/// Metadata sent with the initialize call.
#[derive(Debug, Clone, Serialize)]
pub struct InitializeUpload {
    pub file_type: FileType,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// The three handshake calls against the upload service.
///
/// Seam between the orchestrator and the network so step ordering can be
/// verified with an in-memory fake.
#[async_trait]
pub trait UploadApi: Send + Sync {
    /// Step 1: create the upload record, returning its id and signed URL.
    async fn initialize(
        &self,
        request: &InitializeUpload,
        key: &PublishableKey,
    ) -> Result<PartFile, ClientError>;

    /// Step 2: PUT the whole file to the signed URL, exactly once.
    async fn transfer(&self, signed_url: &str, bytes: Vec<u8>) -> Result<(), ClientError>;

    /// Step 3: mark the record UPLOADED, returning the full record with
    /// the redirect URL when the service issues one.
    async fn finalize(
        &self,
        id: &UploadId,
        key: &PublishableKey,
    ) -> Result<PartFile, ClientError>;
}

/// HTTP client for the upload service.
pub struct UploadClient {
    inner: reqwest::Client,
    base_url: String,
}

impl UploadClient {
    /// Create a new upload client against the given base URL.
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl UploadApi for UploadClient {
    async fn initialize(
        &self,
        request: &InitializeUpload,
        key: &PublishableKey,
    ) -> Result<PartFile, ClientError> {
        let url = format!("{}/api/v1/part-files", self.base_url);
        debug!(url = %url, file_name = %request.file_name, "Initializing upload");

        let response = self
            .inner
            .post(&url)
            .header(PUBLISHABLE_KEY_HEADER, key.as_str())
            .json(request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let record: PartFile = response
            .json()
            .await
            .map_err(|e| ClientError::Serialization(e.to_string()))?;

        if record.signed_url.is_none() {
            return Err(ClientError::MissingField("signed_url"));
        }
        Ok(record)
    }

    async fn transfer(&self, signed_url: &str, bytes: Vec<u8>) -> Result<(), ClientError> {
        debug!(size = bytes.len(), "Transferring file to signed URL");

        let response = self
            .inner
            .put(signed_url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn finalize(
        &self,
        id: &UploadId,
        key: &PublishableKey,
    ) -> Result<PartFile, ClientError> {
        let url = format!("{}/api/v1/part-files/{}", self.base_url, id);
        debug!(url = %url, "Finalizing upload");

        let response = self
            .inner
            .patch(&url)
            .header(PUBLISHABLE_KEY_HEADER, key.as_str())
            .json(&json!({ "status": UploadStatus::Uploaded }))
            .send()
            .await?;
        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::Serialization(e.to_string()))
    }
}
