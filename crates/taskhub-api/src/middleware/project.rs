//! Existence check for routes under `/projects/{id}`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use taskhub_core::{AppError, EntityId};

use super::raw_path_params;
use crate::error::HttpAppError;
use crate::state::AppState;

pub const INVALID_PROJECT_ID_MESSAGE: &str = "Invalid project id value!";

/// Resolve the `id` path parameter to a [`Project`] and attach it to the
/// request extensions. Malformed ids are rejected before any store access.
///
/// [`Project`]: taskhub_core::models::Project
pub async fn load_project(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    match attach_project(&state, request).await {
        Ok(request) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}

#[tracing::instrument(skip_all)]
async fn attach_project(state: &AppState, request: Request) -> Result<Request, HttpAppError> {
    let (mut parts, body) = request.into_parts();
    let raw_id = raw_path_params(&mut parts)
        .await?
        .into_iter()
        .find_map(|(name, value)| (name == "id").then_some(value))
        .unwrap_or_default();

    let project_id = EntityId::parse(&raw_id)
        .map_err(|_| AppError::InvalidInput(INVALID_PROJECT_ID_MESSAGE.to_string()))?;

    let project = state
        .db
        .projects
        .find_by_id(project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Cannot find project with id {}!", project_id)))?;

    tracing::debug!(project_id = %project.id, "Project loaded");
    parts.extensions.insert(project);
    Ok(Request::from_parts(parts, body))
}
