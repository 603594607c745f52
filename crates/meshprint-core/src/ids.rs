//! Identifier newtypes.
//!
//! Both id kinds are minted by external services and treated as opaque
//! strings here; there is no local constructor that invents one. The
//! newtypes exist so a task id can never be handed to an upload call or
//! vice versa.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a generation task, assigned by the generation service
/// when a creation request is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    /// Wrap an id received from the generation service.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identifier of an upload record, assigned by the upload service in the
/// initialize response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadId(String);

impl UploadId {
    /// Wrap an id received from the upload service.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UploadId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UploadId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_wire_format() {
        let id = TaskId::new("t-123");
        assert_eq!(format!("{}", id), "t-123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"t-123\"");
    }

    #[test]
    fn test_upload_id_round_trips_service_value() {
        let id: UploadId = serde_json::from_str("\"pf-42\"").unwrap();
        assert_eq!(id.as_str(), "pf-42");
        assert_eq!(id.into_inner(), "pf-42");
    }
}
