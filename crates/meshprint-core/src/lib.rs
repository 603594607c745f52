//! MeshPrint Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Runtime specifics
//!
//! All types here represent the core business domain of MeshPrint:
//! generation tasks tracked at an external generative-3D service, and
//! upload records tracked at an external print-ordering service.

pub mod credentials;
pub mod error;
pub mod ids;
pub mod request;
pub mod task;
pub mod upload;

// Re-export commonly used types
pub use credentials::{ApiKey, PublishableKey};
pub use error::CoreError;
pub use ids::{TaskId, UploadId};
pub use request::{ArtStyle, CreationRequest, ImageInputSet, MAX_IMAGES, MAX_PROMPT_LEN};
pub use task::{GenerationTask, ModelUrls, TaskError, TaskStatus, TextureSet};
pub use upload::{FileType, PartFile, UploadStatus};
