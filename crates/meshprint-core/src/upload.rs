//! Upload record types.
//!
//! A [`PartFile`] is the upload service's record of one printable part.
//! It is created by the initialize call (carrying a single-use signed
//! write URL) and transitions PENDING -> UPLOADED via the finalize call
//! once the byte transfer has succeeded. FAILED is terminal; recovery is
//! a fresh handshake, never a resume.

use crate::{CoreError, UploadId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Status of an upload record at the upload service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadStatus {
    /// Record created, bytes not yet confirmed.
    #[default]
    Pending,
    /// Byte transfer confirmed via finalize.
    Uploaded,
    /// Upload failed; the record cannot be reused.
    Failed,
}

/// Accepted mesh file types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileType {
    Stl,
    Obj,
}

impl FileType {
    /// Derive the file type from a file name extension.
    pub fn from_file_name(name: &str) -> Result<Self, CoreError> {
        match Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("stl") => Ok(Self::Stl),
            Some("obj") => Ok(Self::Obj),
            _ => Err(CoreError::UnsupportedFileType(name.to_owned())),
        }
    }
}

/// Upload service record for one part file.
///
/// `signed_url` is only present between initialize and its first use;
/// `redirect_url` only after a successful finalize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartFile {
    /// Record identifier assigned by the upload service.
    pub id: UploadId,

    /// Current record status.
    pub status: UploadStatus,

    /// Mesh format of the part.
    pub file_type: FileType,

    /// Original file name.
    pub file_name: String,

    /// Single-use, time-limited write URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_url: Option<String>,

    /// Print-ordering URL, returned by finalize on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,

    /// Record creation time, as issued by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Last record update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_name() {
        assert_eq!(FileType::from_file_name("part.stl").unwrap(), FileType::Stl);
        assert_eq!(FileType::from_file_name("Model.OBJ").unwrap(), FileType::Obj);
        assert!(FileType::from_file_name("scene.gltf").is_err());
        assert!(FileType::from_file_name("noextension").is_err());
    }

    #[test]
    fn test_upload_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&UploadStatus::Uploaded).unwrap(),
            "\"UPLOADED\""
        );
    }

    #[test]
    fn test_part_file_decodes_initialize_response() {
        let record: PartFile = serde_json::from_str(
            r#"{"id":"pf-1","status":"PENDING","file_type":"OBJ","file_name":"m.obj",
                "signed_url":"https://storage/put","created_at":"2026-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(record.status, UploadStatus::Pending);
        assert!(record.signed_url.is_some());
        assert!(record.redirect_url.is_none());

        // The service sends ISO 8601 strings; they parse to real instants.
        let created = record.created_at.unwrap();
        assert_eq!(created.to_rfc3339(), "2026-01-01T00:00:00+00:00");
    }
}
