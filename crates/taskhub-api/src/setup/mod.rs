//! Application setup and initialization

pub mod database;
pub mod image_host;
pub mod routes;
pub mod server;
pub mod validation;

use crate::state::{AppState, DbState};
use anyhow::{Context, Result};
use std::sync::Arc;
use taskhub_core::Config;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.is_production())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;
    let image_host = image_host::setup_image_host(&config).await?;

    let state = Arc::new(AppState::new(&config, DbState::postgres(pool), image_host));
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
