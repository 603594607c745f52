//! Binary fetch through the proxy relay.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{check_status, ClientError};

/// Content type assumed when the origin does not declare one.
pub const DEFAULT_MODEL_CONTENT_TYPE: &str = "model/gltf-binary";

/// Fetches raw model bytes on behalf of the orchestrator.
#[async_trait]
pub trait ModelFetcher: Send + Sync {
    /// Fetch the resource, returning its bytes and content type.
    async fn fetch(&self, url: &str) -> Result<(Vec<u8>, String), ClientError>;
}

/// Fetches model bytes through the relay's proxy endpoint, for callers in
/// a browser-style context where the origin is not directly reachable.
pub struct RelayClient {
    inner: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    /// Create a new relay client against the given relay base URL.
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

async fn read_model(response: reqwest::Response) -> Result<(Vec<u8>, String), ClientError> {
    let response = check_status(response).await?;
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_MODEL_CONTENT_TYPE)
        .to_owned();
    let bytes = response.bytes().await?.to_vec();
    Ok((bytes, content_type))
}

#[async_trait]
impl ModelFetcher for RelayClient {
    async fn fetch(&self, url: &str) -> Result<(Vec<u8>, String), ClientError> {
        let proxy_url = format!("{}/api/proxy", self.base_url);
        debug!(url = %url, "Fetching model via relay");

        let response = self
            .inner
            .get(&proxy_url)
            .query(&[("url", url)])
            .send()
            .await?;
        read_model(response).await
    }
}

/// Fetches model bytes straight from the origin. Suitable for server-side
/// callers such as the CLI, which have no cross-origin restriction.
pub struct DirectFetcher {
    inner: reqwest::Client,
}

impl DirectFetcher {
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }
}

impl Default for DirectFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelFetcher for DirectFetcher {
    async fn fetch(&self, url: &str) -> Result<(Vec<u8>, String), ClientError> {
        debug!(url = %url, "Fetching model directly");
        let response = self.inner.get(url).send().await?;
        read_model(response).await
    }
}
