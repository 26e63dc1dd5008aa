//! Image host abstraction trait

use crate::ImageHostBackend;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Image host operation errors
#[derive(Debug, Error)]
pub enum ImageHostError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid public id: {0}")]
    InvalidPublicId(String),

    #[error("Image host rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for image host operations
pub type ImageHostResult<T> = Result<T, ImageHostError>;

/// Options for a single upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Remote path to publish under, without extension.
    pub public_id: String,
}

/// What the host reports back after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedImage {
    pub public_id: String,
    pub secure_url: String,
    /// Name of the uploaded file without its extension.
    pub original_filename: String,
}

/// Image hosting abstraction
///
/// Implementations read the file at `local_path` and publish it under
/// `options.public_id`. The local file is left in place; removing it is the
/// caller's job.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(
        &self,
        local_path: &Path,
        options: &UploadOptions,
    ) -> ImageHostResult<UploadedImage>;

    /// Get the image host backend type
    fn backend_type(&self) -> ImageHostBackend;
}

/// Reject public ids that could escape the host's namespace.
pub(crate) fn validate_public_id(public_id: &str) -> ImageHostResult<()> {
    if public_id.is_empty()
        || public_id.starts_with('/')
        || public_id.split('/').any(|segment| segment == "..")
    {
        return Err(ImageHostError::InvalidPublicId(public_id.to_string()));
    }
    Ok(())
}

/// File name without extension, as reported in `original_filename`.
pub(crate) fn original_filename(local_path: &Path) -> ImageHostResult<String> {
    local_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ImageHostError::UploadFailed(format!(
                "Local path has no usable file name: {}",
                local_path.display()
            ))
        })
}
