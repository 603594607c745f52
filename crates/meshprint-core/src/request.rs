//! Creation request variants and image input handling.

use crate::CoreError;
use serde::{Deserialize, Serialize};

/// Maximum prompt length accepted by the generation service.
pub const MAX_PROMPT_LEN: usize = 600;

/// Maximum number of images per multi-image request.
pub const MAX_IMAGES: usize = 4;

/// Art style for text-to-model generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtStyle {
    #[default]
    Realistic,
    Sculpture,
}

/// Ordered sequence of image payload URLs for a multi-image request.
///
/// Order is preserved and meaningful for display. Conversion from a raw
/// vector is verbatim so that an oversized submission can be rejected by
/// [`CreationRequest::validate`]; [`ImageInputSet::clamped`] is the
/// picker-style constructor that instead retains the first [`MAX_IMAGES`]
/// entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageInputSet(Vec<String>);

impl ImageInputSet {
    /// Build a set keeping at most the first [`MAX_IMAGES`] URLs in
    /// submission order, dropping the rest.
    pub fn clamped(urls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(urls.into_iter().take(MAX_IMAGES).map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for ImageInputSet {
    fn from(urls: Vec<String>) -> Self {
        Self(urls)
    }
}

/// A generation request, one variant per input mode.
///
/// Dispatch is by exhaustive match on the variant; each carries exactly
/// the payload its mode requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CreationRequest {
    /// Generate a model from a text prompt.
    TextToModel {
        prompt: String,
        #[serde(default)]
        art_style: ArtStyle,
    },
    /// Generate a model from a single reference image.
    ImageToModel { image_url: String },
    /// Generate a model from one to four reference images.
    MultiImageToModel { image_urls: ImageInputSet },
}

impl CreationRequest {
    /// Validate caller input. A request that fails validation must never
    /// reach the network.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::TextToModel { prompt, .. } => {
                if prompt.trim().is_empty() {
                    return Err(CoreError::MissingInput("prompt"));
                }
                if prompt.chars().count() > MAX_PROMPT_LEN {
                    return Err(CoreError::PromptTooLong {
                        max: MAX_PROMPT_LEN,
                        got: prompt.chars().count(),
                    });
                }
                Ok(())
            }
            Self::ImageToModel { image_url } => {
                if image_url.is_empty() {
                    return Err(CoreError::MissingInput("image URL"));
                }
                Ok(())
            }
            Self::MultiImageToModel { image_urls } => {
                if image_urls.is_empty() {
                    return Err(CoreError::MissingInput("at least one image URL"));
                }
                if image_urls.len() > MAX_IMAGES {
                    return Err(CoreError::TooManyImages {
                        max: MAX_IMAGES,
                        got: image_urls.len(),
                    });
                }
                Ok(())
            }
        }
    }
}
