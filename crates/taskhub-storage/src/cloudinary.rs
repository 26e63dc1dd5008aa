use crate::traits::{
    original_filename, validate_public_id, ImageHost, ImageHostError, ImageHostResult,
    UploadOptions, UploadedImage,
};
use crate::ImageHostBackend;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";
const UPLOAD_TIMEOUT_SECS: u64 = 60;

/// Cloudinary image host using signed uploads.
#[derive(Clone)]
pub struct CloudinaryImageHost {
    client: reqwest::Client,
    api_base: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl std::fmt::Debug for CloudinaryImageHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryImageHost")
            .field("api_base", &self.api_base)
            .field("cloud_name", &self.cloud_name)
            .finish_non_exhaustive()
    }
}

impl CloudinaryImageHost {
    pub fn new(cloud_name: String, api_key: String, api_secret: String) -> ImageHostResult<Self> {
        Self::with_api_base(DEFAULT_API_BASE.to_string(), cloud_name, api_key, api_secret)
    }

    /// Point the host at a different API root (e.g. a local stub server).
    pub fn with_api_base(
        api_base: String,
        cloud_name: String,
        api_key: String,
        api_secret: String,
    ) -> ImageHostResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .build()
            .map_err(|e| ImageHostError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base,
            cloud_name,
            api_key,
            api_secret,
        })
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/{}/image/upload",
            self.api_base.trim_end_matches('/'),
            self.cloud_name
        )
    }

    /// SHA-256 over the sorted `key=value` pairs joined by `&`, followed by the secret.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted = params.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl ImageHost for CloudinaryImageHost {
    #[tracing::instrument(skip(self), fields(image_host = "cloudinary", cloud_name = %self.cloud_name))]
    async fn upload(
        &self,
        local_path: &Path,
        options: &UploadOptions,
    ) -> ImageHostResult<UploadedImage> {
        validate_public_id(&options.public_id)?;
        // Cloudinary derives original_filename from the part's file name.
        let stem = original_filename(local_path)?;
        let file_name = match local_path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}.{}", stem, ext),
            None => stem,
        };

        let data = tokio::fs::read(local_path).await?;
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[
            ("public_id", options.public_id.as_str()),
            ("timestamp", timestamp.as_str()),
        ]);

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(data).file_name(file_name),
            )
            .text("api_key", self.api_key.clone())
            .text("public_id", options.public_id.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let start = std::time::Instant::now();
        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ImageHostError::UploadFailed(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ImageHostError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let uploaded: UploadedImage = response
            .json()
            .await
            .map_err(|e| ImageHostError::UploadFailed(format!("Failed to parse response: {}", e)))?;

        tracing::info!(
            public_id = %uploaded.public_id,
            duration_ms = start.elapsed().as_millis() as u64,
            "Image published to Cloudinary"
        );

        Ok(uploaded)
    }

    fn backend_type(&self) -> ImageHostBackend {
        ImageHostBackend::Cloudinary
    }
}
