//! Route-level middleware: field validation and the project existence check.

pub mod project;
pub mod validate;

pub use project::load_project;
pub use validate::validate_fields;

use axum::extract::{FromRequestParts, RawPathParams};
use axum::http::request::Parts;
use taskhub_core::AppError;

use crate::error::HttpAppError;

/// Raw path parameters of the matched route, in declaration order.
pub(crate) async fn raw_path_params(
    parts: &mut Parts,
) -> Result<Vec<(String, String)>, HttpAppError> {
    let params = RawPathParams::from_request_parts(parts, &()).await.map_err(|rejection| {
        HttpAppError(AppError::Internal(format!(
            "Path parameters unavailable: {}",
            rejection.body_text()
        )))
    })?;
    Ok(params
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect())
}
