//! Core domain errors.

use thiserror::Error;

/// Core domain errors for MeshPrint.
///
/// These cover caller-input validation only; failures of this kind never
/// reach the network.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Required input was missing or empty.
    #[error("{0} is required")]
    MissingInput(&'static str),

    /// Prompt exceeded the maximum length.
    #[error("prompt exceeds {max} characters (got {got})")]
    PromptTooLong { max: usize, got: usize },

    /// Multi-image request carried more images than allowed.
    #[error("at most {max} images allowed (got {got})")]
    TooManyImages { max: usize, got: usize },

    /// File name did not carry a recognized mesh extension.
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
}
