//! Generation task types.
//!
//! A [`GenerationTask`] is a snapshot of a task tracked by the external
//! generation service. Snapshots are only ever replaced in full by
//! re-fetching status — never merged or mutated locally — and are immutable
//! once the status is terminal.

use crate::TaskId;
use serde::{Deserialize, Serialize};

/// Status of a generation task at the external service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Task created but not yet started.
    #[default]
    Pending,
    /// Task actively generating.
    InProgress,
    /// Task completed successfully; result URLs are available.
    Succeeded,
    /// Task failed; the accompanying error message is authoritative.
    Failed,
    /// Task was cancelled at the service.
    Canceled,
}

impl TaskStatus {
    /// Returns true if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }

    /// Returns true if the task is still active (not terminal).
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

/// Result URLs by output format, all optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelUrls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fbx: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obj: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usdz: Option<String>,
}

impl ModelUrls {
    /// Returns true if no format URL is present.
    pub fn is_empty(&self) -> bool {
        self.glb.is_none()
            && self.fbx.is_none()
            && self.obj.is_none()
            && self.mtl.is_none()
            && self.usdz.is_none()
    }
}

/// Texture map URLs for one material set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metallic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roughness: Option<String>,
}

/// Error detail attached to a failed task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskError {
    /// Human-readable failure message from the generation service,
    /// surfaced to the user verbatim.
    #[serde(default)]
    pub message: String,
}

/// Full snapshot of a generation task as returned by the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationTask {
    /// Task identifier.
    pub id: TaskId,

    /// Current status.
    #[serde(default)]
    pub status: TaskStatus,

    /// Generation progress, 0 to 100.
    #[serde(default)]
    pub progress: u8,

    /// Number of queued tasks ahead of this one.
    #[serde(default)]
    pub preceding_tasks: u32,

    /// Result URLs by format, populated on success.
    #[serde(default)]
    pub model_urls: ModelUrls,

    /// Preview thumbnail, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    /// Texture map URLs, populated on textured success.
    #[serde(default)]
    pub texture_urls: Vec<TextureSet>,

    /// Failure detail, present when status is FAILED.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_error: Option<TaskError>,

    /// Creation time (epoch milliseconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,

    /// Start time (epoch milliseconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,

    /// Finish time (epoch milliseconds), present once terminal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<i64>,
}

impl GenerationTask {
    /// Create a pending snapshot for a freshly created task.
    pub fn pending(id: TaskId) -> Self {
        Self {
            id,
            status: TaskStatus::Pending,
            progress: 0,
            preceding_tasks: 0,
            model_urls: ModelUrls::default(),
            thumbnail_url: None,
            texture_urls: Vec::new(),
            task_error: None,
            created_at: None,
            started_at: None,
            finished_at: None,
        }
    }

    /// Check if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// The failure message, if the task failed.
    pub fn error_message(&self) -> Option<&str> {
        self.task_error.as_ref().map(|e| e.message.as_str())
    }
}
