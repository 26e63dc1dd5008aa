use anyhow::{Context, Result};
use std::sync::Arc;
use taskhub_core::Config;
use taskhub_storage::{create_image_host, ImageHost};

pub async fn setup_image_host(config: &Config) -> Result<Arc<dyn ImageHost>> {
    let host = create_image_host(config)
        .await
        .context("Failed to initialize image host")?;
    tracing::info!(backend = ?host.backend_type(), "Image host ready");
    Ok(host)
}
