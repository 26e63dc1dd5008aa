//! Profile endpoints and avatar upload.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use taskhub_core::models::{User, UserPatch};
use taskhub_core::{AppError, EntityId};
use taskhub_db::USERNAME_TAKEN_MESSAGE;

use super::NO_UPDATE_MESSAGE;
use crate::auth::AuthContext;
use crate::error::{HttpAppError, OptionalJson};
use crate::response::ApiResponse;
use crate::services::avatar::{
    accept_avatar, ensure_stageable_username, AvatarOutcome, AvatarPipeline, MISSING_FILE_MESSAGE,
};
use crate::state::AppState;

fn parse_user_id(raw: &str) -> Result<EntityId, AppError> {
    EntityId::parse(raw).map_err(|_| AppError::InvalidInput("Invalid user id value!".to_string()))
}

async fn find_user(state: &AppState, id: EntityId) -> Result<User, AppError> {
    state
        .db
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Cannot find this user with id {}!", id)))
}

#[tracing::instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<User>>, HttpAppError> {
    let user = find_user(&state, auth.user_id).await?;
    Ok(Json(ApiResponse::success(
        "Get your profile's information successfully!",
        user,
    )))
}

#[tracing::instrument(skip(state))]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<User>>, HttpAppError> {
    let id = parse_user_id(&raw_id)?;
    let user = find_user(&state, id).await?;
    Ok(Json(ApiResponse::success(
        format!("Get user's information by id {} successfully!", id),
        user,
    )))
}

/// The id is checked before the body is looked at.
#[tracing::instrument(skip(state, body))]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    body: Result<OptionalJson<UserPatch>, HttpAppError>,
) -> Result<Json<ApiResponse<User>>, HttpAppError> {
    let id = parse_user_id(&raw_id)?;
    let OptionalJson(patch) = body?;
    if patch.is_empty() {
        return Err(AppError::InvalidInput(NO_UPDATE_MESSAGE.to_string()).into());
    }

    // The unique index is authoritative; this only gives the common case a clear message.
    if let Some(username) = patch.username.as_deref() {
        if state
            .db
            .users
            .find_by_username_excluding(id, username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(USERNAME_TAKEN_MESSAGE.to_string()).into());
        }
    }

    let user = state
        .db
        .users
        .update_by_id(id, &patch)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Cannot find user with id {}!", id)))?;

    tracing::info!(user_id = %id, "User profile updated");
    Ok(Json(ApiResponse::success(
        format!("Update user's information by id {} successfully!", id),
        user,
    )))
}

#[derive(Debug, Serialize)]
pub struct AvatarUploadResponse {
    pub outcome: AvatarOutcome,
}

/// The avatar is named after, and linked to, the authenticated caller.
/// `{id}` only has to be well formed.
#[tracing::instrument(skip(state, auth, multipart), fields(username = %auth.username))]
pub async fn upload_avatar(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(raw_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<AvatarUploadResponse>>, HttpAppError> {
    parse_user_id(&raw_id)?;
    ensure_stageable_username(&auth.username)?;

    let multipart = multipart.map_err(|rejection| {
        tracing::debug!(rejection = %rejection.body_text(), "Request is not a multipart form");
        AppError::UploadRejected(MISSING_FILE_MESSAGE.to_string())
    })?;
    let image = accept_avatar(multipart, state.avatar.max_file_size).await?;

    let pipeline = AvatarPipeline::new(
        state.db.users.as_ref(),
        state.image_host.as_ref(),
        &state.avatar.staging_dir,
    );
    let outcome = pipeline.run(&auth, image).await?;

    Ok(Json(ApiResponse::success(
        "Avatar uploaded!",
        AvatarUploadResponse { outcome },
    )))
}
