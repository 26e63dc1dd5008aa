//! Configuration validation
//!
//! Checks that need more than the config's own `validate()`, run once at
//! startup before anything is bound or connected.

use anyhow::{Context, Result};
use std::path::Path;
use taskhub_core::{Config, ImageHostBackend};

pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.is_production() {
        if config.cors_origins().iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS configured to allow all origins (*) in production. \
                Set specific allowed origins via CORS_ORIGINS."
            ));
        }
        if config.image_host() == ImageHostBackend::Local {
            tracing::warn!("Local image host selected in production; avatars are served from disk");
        }
    }

    if config.db_max_connections() == 0 {
        return Err(anyhow::anyhow!("Database max connections cannot be 0"));
    }
    if config.db_timeout_seconds() == 0 {
        return Err(anyhow::anyhow!("Database timeout cannot be 0"));
    }
    if config.http_concurrency_limit() == 0 {
        return Err(anyhow::anyhow!("HTTP concurrency limit cannot be 0"));
    }

    let staging = Path::new(config.avatar_staging_dir());
    if staging.is_file() {
        return Err(anyhow::anyhow!(
            "AVATAR_STAGING_DIR points at a file: {}",
            staging.display()
        ));
    }
    std::fs::create_dir_all(staging)
        .with_context(|| format!("Failed to create avatar staging dir {}", staging.display()))?;

    Ok(())
}
