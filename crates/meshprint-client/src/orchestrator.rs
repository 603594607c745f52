//! Upload orchestrator.
//!
//! Runs the three-step signed-URL handshake in strict order: initialize,
//! transfer, finalize. A failing step aborts the remaining steps with no
//! compensating action; an unused record simply expires at the service.
//! A remote source is fetched before any upload-service call, so a fetch
//! failure never creates an orphan record.

use std::sync::Arc;

use chrono::Utc;
use meshprint_core::{FileType, PartFile, PublishableKey};
use serde_json::json;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::ClientError;
use crate::relay::ModelFetcher;
use crate::upload::{InitializeUpload, UploadApi};

/// Where the bytes to upload come from.
#[derive(Debug, Clone)]
pub enum UploadSource {
    /// A local file already read into memory.
    File { file_name: String, bytes: Vec<u8> },
    /// A generated model to fetch by URL before the handshake.
    Remote { url: String, file_name: String },
}

/// Observable progress milestones of one upload attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadPhase {
    #[default]
    Idle,
    Fetching,
    Initializing,
    Transferring,
    Finalizing,
    Done,
}

/// Upload failures, one variant per step.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Fetching the remote source failed; no upload record was created.
    #[error("failed to fetch source model: {0}")]
    Fetch(#[source] ClientError),

    /// The initialize call failed or returned an unusable record.
    #[error("failed to initialize upload: {0}")]
    Initialize(#[source] ClientError),

    /// The binary PUT to the signed URL failed. Finalize is not attempted.
    #[error("file transfer failed: {0}")]
    Transfer(#[source] ClientError),

    /// The finalize call failed after a successful transfer.
    #[error("failed to finalize upload: {0}")]
    Finalize(#[source] ClientError),

    /// Caller input was invalid; nothing was sent.
    #[error("invalid input: {0}")]
    Validation(#[from] meshprint_core::CoreError),
}

/// Drives one upload handshake at a time against the upload service.
pub struct Orchestrator {
    api: Arc<dyn UploadApi>,
    fetcher: Arc<dyn ModelFetcher>,
    progress: watch::Sender<UploadPhase>,
}

impl Orchestrator {
    /// Create a new orchestrator over the given service seams.
    pub fn new(api: Arc<dyn UploadApi>, fetcher: Arc<dyn ModelFetcher>) -> Self {
        let (progress, _) = watch::channel(UploadPhase::Idle);
        Self {
            api,
            fetcher,
            progress,
        }
    }

    /// Subscribe to progress milestones.
    pub fn progress(&self) -> watch::Receiver<UploadPhase> {
        self.progress.subscribe()
    }

    fn set_phase(&self, phase: UploadPhase) {
        debug!(?phase, "Upload phase");
        self.progress.send_replace(phase);
    }

    /// Run the full handshake and return the finalized record. The
    /// signed URL from initialize is consumed exactly once; a fresh
    /// initialize is required per attempt.
    pub async fn upload(
        &self,
        source: UploadSource,
        key: &PublishableKey,
    ) -> Result<PartFile, UploadError> {
        let (file_name, bytes) = match source {
            UploadSource::File { file_name, bytes } => (file_name, bytes),
            UploadSource::Remote { url, file_name } => {
                self.set_phase(UploadPhase::Fetching);
                let (bytes, _content_type) =
                    self.fetcher.fetch(&url).await.map_err(UploadError::Fetch)?;
                (file_name, bytes)
            }
        };

        let file_type = FileType::from_file_name(&file_name)?;

        self.set_phase(UploadPhase::Initializing);
        let request = InitializeUpload {
            file_type,
            file_name: file_name.clone(),
            metadata: Some(json!({
                "source": "meshprint",
                "timestamp": Utc::now().to_rfc3339(),
            })),
        };
        let record = self
            .api
            .initialize(&request, key)
            .await
            .map_err(UploadError::Initialize)?;
        let signed_url = record
            .signed_url
            .clone()
            .ok_or(UploadError::Initialize(ClientError::MissingField(
                "signed_url",
            )))?;

        self.set_phase(UploadPhase::Transferring);
        self.api
            .transfer(&signed_url, bytes)
            .await
            .map_err(UploadError::Transfer)?;

        self.set_phase(UploadPhase::Finalizing);
        let finalized = self
            .api
            .finalize(&record.id, key)
            .await
            .map_err(UploadError::Finalize)?;

        self.set_phase(UploadPhase::Done);
        info!(
            id = %finalized.id,
            file_name = %file_name,
            redirect_url = ?finalized.redirect_url,
            "Upload complete"
        );
        Ok(finalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use meshprint_core::{UploadId, UploadStatus};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    fn pending_record(signed_url: Option<&str>) -> PartFile {
        PartFile {
            id: UploadId::new("pf-1"),
            status: UploadStatus::Pending,
            file_type: FileType::Obj,
            file_name: "model.obj".into(),
            signed_url: signed_url.map(str::to_owned),
            redirect_url: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[derive(Default)]
    struct FakeApi {
        fail_initialize: bool,
        fail_transfer: bool,
        omit_signed_url: bool,
        initialize_calls: AtomicU32,
        transfer_calls: AtomicU32,
        finalize_calls: AtomicU32,
        transferred: Mutex<Option<(String, usize)>>,
    }

    #[async_trait]
    impl UploadApi for FakeApi {
        async fn initialize(
            &self,
            _request: &InitializeUpload,
            _key: &PublishableKey,
        ) -> Result<PartFile, ClientError> {
            self.initialize_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_initialize {
                return Err(ClientError::Upstream {
                    status: 400,
                    message: "bad metadata".into(),
                });
            }
            if self.omit_signed_url {
                return Ok(pending_record(None));
            }
            Ok(pending_record(Some("https://storage/put/pf-1")))
        }

        async fn transfer(&self, signed_url: &str, bytes: Vec<u8>) -> Result<(), ClientError> {
            self.transfer_calls.fetch_add(1, Ordering::SeqCst);
            *self.transferred.lock().unwrap() = Some((signed_url.to_owned(), bytes.len()));
            if self.fail_transfer {
                return Err(ClientError::Upstream {
                    status: 500,
                    message: "storage unavailable".into(),
                });
            }
            Ok(())
        }

        async fn finalize(
            &self,
            _id: &UploadId,
            _key: &PublishableKey,
        ) -> Result<PartFile, ClientError> {
            self.finalize_calls.fetch_add(1, Ordering::SeqCst);
            let mut record = pending_record(None);
            record.status = UploadStatus::Uploaded;
            record.redirect_url = Some("https://print.example/order/pf-1".into());
            Ok(record)
        }
    }

    struct FakeFetcher {
        fail: bool,
        calls: AtomicU32,
    }

    #[async_trait]
    impl ModelFetcher for FakeFetcher {
        async fn fetch(&self, _url: &str) -> Result<(Vec<u8>, String), ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ClientError::Upstream {
                    status: 404,
                    message: "gone".into(),
                });
            }
            Ok((vec![1, 2, 3], "model/obj".into()))
        }
    }

    fn orchestrator(api: Arc<FakeApi>, fetcher: Arc<FakeFetcher>) -> Orchestrator {
        Orchestrator::new(api, fetcher)
    }

    fn local_source(bytes: Vec<u8>) -> UploadSource {
        UploadSource::File {
            file_name: "model.obj".into(),
            bytes,
        }
    }

    #[tokio::test]
    async fn test_full_handshake_returns_redirect_url() {
        let api = Arc::new(FakeApi::default());
        let orch = orchestrator(api.clone(), Arc::new(FakeFetcher { fail: false, calls: AtomicU32::new(0) }));

        let record = orch
            .upload(local_source(vec![0u8; 64]), &PublishableKey::new("pk"))
            .await
            .unwrap();

        assert_eq!(record.status, UploadStatus::Uploaded);
        assert_eq!(
            record.redirect_url.as_deref(),
            Some("https://print.example/order/pf-1")
        );
        assert_eq!(api.initialize_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.transfer_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.finalize_calls.load(Ordering::SeqCst), 1);
        assert_eq!(*orch.progress().borrow(), UploadPhase::Done);

        // Whole file went to the signed URL from initialize.
        let (url, size) = api.transferred.lock().unwrap().clone().unwrap();
        assert_eq!(url, "https://storage/put/pf-1");
        assert_eq!(size, 64);
    }

    #[tokio::test]
    async fn test_transfer_failure_skips_finalize() {
        // Scenario C: initialize succeeds, the PUT returns 500.
        let api = Arc::new(FakeApi {
            fail_transfer: true,
            ..FakeApi::default()
        });
        let orch = orchestrator(api.clone(), Arc::new(FakeFetcher { fail: false, calls: AtomicU32::new(0) }));

        let err = orch
            .upload(
                local_source(vec![0u8; 10 * 1024 * 1024]),
                &PublishableKey::new("pk"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Transfer(_)));
        assert_eq!(api.finalize_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_initialize_failure_skips_transfer() {
        let api = Arc::new(FakeApi {
            fail_initialize: true,
            ..FakeApi::default()
        });
        let orch = orchestrator(api.clone(), Arc::new(FakeFetcher { fail: false, calls: AtomicU32::new(0) }));

        let err = orch
            .upload(local_source(vec![1]), &PublishableKey::new("pk"))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Initialize(_)));
        assert_eq!(api.transfer_calls.load(Ordering::SeqCst), 0);
        assert_eq!(api.finalize_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_initialize_without_signed_url_is_rejected() {
        let api = Arc::new(FakeApi {
            omit_signed_url: true,
            ..FakeApi::default()
        });
        let orch = orchestrator(api.clone(), Arc::new(FakeFetcher { fail: false, calls: AtomicU32::new(0) }));

        let err = orch
            .upload(local_source(vec![1]), &PublishableKey::new("pk"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            UploadError::Initialize(ClientError::MissingField("signed_url"))
        ));
        assert_eq!(api.transfer_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_creates_no_record() {
        let api = Arc::new(FakeApi::default());
        let fetcher = Arc::new(FakeFetcher {
            fail: true,
            calls: AtomicU32::new(0),
        });
        let orch = orchestrator(api.clone(), fetcher.clone());

        let err = orch
            .upload(
                UploadSource::Remote {
                    url: "https://cdn.example/m.obj".into(),
                    file_name: "m.obj".into(),
                },
                &PublishableKey::new("pk"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Fetch(_)));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.initialize_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsupported_extension_rejected_before_any_call() {
        let api = Arc::new(FakeApi::default());
        let orch = orchestrator(api.clone(), Arc::new(FakeFetcher { fail: false, calls: AtomicU32::new(0) }));

        let err = orch
            .upload(
                UploadSource::File {
                    file_name: "scene.gltf".into(),
                    bytes: vec![1],
                },
                &PublishableKey::new("pk"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Validation(_)));
        assert_eq!(api.initialize_calls.load(Ordering::SeqCst), 0);
    }
}
