//! Client library for MeshPrint.
//!
//! Provides HTTP clients for the generation and upload services, the task
//! poller, the signed-URL upload orchestrator, and the request-scoped
//! session that owns both.

pub mod error;
pub mod generation;
pub mod orchestrator;
pub mod poller;
pub mod relay;
pub mod session;
pub mod upload;

pub use error::ClientError;
pub use generation::{GenerationClient, StatusSource};
pub use orchestrator::{Orchestrator, UploadError, UploadPhase, UploadSource};
pub use poller::{PollConfig, PollError, PollHandle, Poller};
pub use relay::{DirectFetcher, ModelFetcher, RelayClient};
pub use session::Session;
pub use upload::{InitializeUpload, UploadApi, UploadClient};
