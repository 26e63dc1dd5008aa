use axum::{extract::State, Extension, Json};
use std::sync::Arc;
use taskhub_core::models::Project;

use super::tasks::ensure_member;
use crate::auth::AuthContext;
use crate::error::HttpAppError;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Project attached by the existence check, visible to members only.
#[tracing::instrument(skip(state, auth, project), fields(project_id = %project.id))]
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Extension(project): Extension<Project>,
) -> Result<Json<ApiResponse<Project>>, HttpAppError> {
    ensure_member(&state, project.id, auth.user_id).await?;
    Ok(Json(ApiResponse::success(
        format!("Get project with id {} successfully!", project.id),
        project,
    )))
}
