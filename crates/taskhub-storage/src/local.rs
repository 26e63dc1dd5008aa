use crate::traits::{
    original_filename, validate_public_id, ImageHost, ImageHostError, ImageHostResult,
    UploadOptions, UploadedImage,
};
use crate::ImageHostBackend;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem image host
///
/// Publishes by copying the staged file to `{base_path}/{public_id}{.ext}` and
/// reports a URL under `base_url`. Intended for development and tests.
#[derive(Clone, Debug)]
pub struct LocalImageHost {
    base_path: PathBuf,
    base_url: String,
}

impl LocalImageHost {
    /// Create a new LocalImageHost instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory published images are copied into (e.g., "storages/public")
    /// * `base_url` - Base URL the directory is served under (e.g., "http://localhost:4000/static")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> ImageHostResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            ImageHostError::ConfigError(format!(
                "Failed to create image directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalImageHost {
            base_path,
            base_url,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Relative key for a public id, keeping the staged file's extension.
    fn key_for(public_id: &str, local_path: &Path) -> String {
        match local_path.extension().and_then(|e| e.to_str()) {
            Some(ext) if !ext.is_empty() => format!("{}.{}", public_id, ext),
            _ => public_id.to_string(),
        }
    }

    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

#[async_trait]
impl ImageHost for LocalImageHost {
    #[tracing::instrument(skip(self), fields(image_host = "local"))]
    async fn upload(
        &self,
        local_path: &Path,
        options: &UploadOptions,
    ) -> ImageHostResult<UploadedImage> {
        validate_public_id(&options.public_id)?;
        let original_filename = original_filename(local_path)?;

        let key = Self::key_for(&options.public_id, local_path);
        let target = self.base_path.join(&key);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        let start = std::time::Instant::now();
        let size = fs::copy(local_path, &target).await.map_err(|e| {
            ImageHostError::UploadFailed(format!(
                "Failed to copy {} to {}: {}",
                local_path.display(),
                target.display(),
                e
            ))
        })?;

        tracing::debug!(
            public_id = %options.public_id,
            size_bytes = size,
            duration_ms = start.elapsed().as_millis() as u64,
            "Image published to local host"
        );

        Ok(UploadedImage {
            public_id: options.public_id.clone(),
            secure_url: self.generate_url(&key),
            original_filename,
        })
    }

    fn backend_type(&self) -> ImageHostBackend {
        ImageHostBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_upload_copies_file_and_echoes_original_filename() {
        let staging = tempdir().unwrap();
        let public = tempdir().unwrap();
        let staged = staging.path().join("ava_alice.png");
        fs::write(&staged, b"\x89PNG fake").await.unwrap();

        let host = LocalImageHost::new(public.path(), "http://localhost:4000/static/".to_string())
            .await
            .unwrap();
        let uploaded = host
            .upload(
                &staged,
                &UploadOptions {
                    public_id: "main/users/ava_alice".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(uploaded.public_id, "main/users/ava_alice");
        assert_eq!(uploaded.original_filename, "ava_alice");
        assert_eq!(
            uploaded.secure_url,
            "http://localhost:4000/static/main/users/ava_alice.png"
        );
        assert!(public.path().join("main/users/ava_alice.png").exists());
        // The staged file is left for the caller to remove.
        assert!(staged.exists());
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let staging = tempdir().unwrap();
        let public = tempdir().unwrap();
        let staged = staging.path().join("ava_bob.jpg");
        fs::write(&staged, b"jpeg").await.unwrap();

        let host = LocalImageHost::new(public.path(), "http://localhost/static".to_string())
            .await
            .unwrap();
        let result = host
            .upload(
                &staged,
                &UploadOptions {
                    public_id: "../outside".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(ImageHostError::InvalidPublicId(_))));
    }

    #[tokio::test]
    async fn test_missing_source_file_is_upload_failure() {
        let public = tempdir().unwrap();
        let host = LocalImageHost::new(public.path(), "http://localhost/static".to_string())
            .await
            .unwrap();
        let result = host
            .upload(
                Path::new("/nonexistent/ava_ghost.png"),
                &UploadOptions {
                    public_id: "main/ava_ghost".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(ImageHostError::UploadFailed(_))));
    }
}
