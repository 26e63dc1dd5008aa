#[cfg(feature = "host-cloudinary")]
use crate::CloudinaryImageHost;
#[cfg(feature = "host-local")]
use crate::LocalImageHost;
use crate::{ImageHost, ImageHostBackend, ImageHostError, ImageHostResult};
use std::sync::Arc;
use taskhub_core::Config;

/// Create an image host based on configuration
pub async fn create_image_host(config: &Config) -> ImageHostResult<Arc<dyn ImageHost>> {
    match config.image_host() {
        #[cfg(feature = "host-cloudinary")]
        ImageHostBackend::Cloudinary => {
            let cloud_name = config.cloudinary_cloud_name().map(String::from).ok_or_else(|| {
                ImageHostError::ConfigError("CLOUDINARY_CLOUD_NAME not configured".to_string())
            })?;
            let api_key = config.cloudinary_api_key().map(String::from).ok_or_else(|| {
                ImageHostError::ConfigError("CLOUDINARY_API_KEY not configured".to_string())
            })?;
            let api_secret = config.cloudinary_api_secret().map(String::from).ok_or_else(|| {
                ImageHostError::ConfigError("CLOUDINARY_API_SECRET not configured".to_string())
            })?;

            let host = CloudinaryImageHost::new(cloud_name, api_key, api_secret)?;
            Ok(Arc::new(host))
        }

        #[cfg(not(feature = "host-cloudinary"))]
        ImageHostBackend::Cloudinary => Err(ImageHostError::ConfigError(
            "Cloudinary image host not available (host-cloudinary feature not enabled)".to_string(),
        )),

        #[cfg(feature = "host-local")]
        ImageHostBackend::Local => {
            let host = LocalImageHost::new(
                config.local_image_path(),
                config.local_image_base_url().to_string(),
            )
            .await?;
            Ok(Arc::new(host))
        }

        #[cfg(not(feature = "host-local"))]
        ImageHostBackend::Local => Err(ImageHostError::ConfigError(
            "Local image host not available (host-local feature not enabled)".to_string(),
        )),
    }
}
