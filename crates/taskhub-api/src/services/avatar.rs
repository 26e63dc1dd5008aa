//! Avatar upload pipeline
//!
//! filter -> stage -> publish -> correlate -> clean up.
//!
//! The staged file is named after the authenticated username
//! (`ava_{username}{.ext}`). The image host echoes that name back as
//! `original_filename`, and the username recovered from it decides which
//! profile the published image is linked to. Publishing and linking failures
//! do not fail the request; they are reported through [`AvatarOutcome`].

use axum::extract::Multipart;
use bytes::Bytes;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use taskhub_core::models::Avatar;
use taskhub_core::AppError;
use taskhub_db::UserStore;
use taskhub_storage::{ImageHost, UploadOptions};

use crate::auth::AuthContext;
use crate::utils::upload::{
    file_extension, is_image_mime_type, is_safe_file_stem, multipart_error, read_field_limited,
};

pub const AVATAR_FIELD: &str = "avatar";
pub const STAGED_FILE_PREFIX: &str = "ava_";
const PUBLIC_ID_ROOT: &str = "main";

pub const MISSING_FILE_MESSAGE: &str = "Please select an image to upload!";
pub const NOT_AN_IMAGE_MESSAGE: &str = "Only images are allowed!";
const MULTIPLE_FILES_MESSAGE: &str = "Only one image can be uploaded at a time!";
pub const UNUSABLE_USERNAME_MESSAGE: &str =
    "Username can only contain letters, digits, '-' and '_' to upload an avatar!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AvatarOutcome {
    /// Published and recorded on the matching user.
    Linked,
    /// Published, but the echoed filename matched no user.
    Unmatched,
    /// The image host refused or failed the upload.
    PublishFailed,
    /// Published, but recording it on the user failed.
    LinkFailed,
}

/// An image that passed the filter and has not touched the disk yet.
#[derive(Debug)]
pub struct AcceptedImage {
    pub original_filename: Option<String>,
    pub data: Bytes,
}

/// Pull the `avatar` field out of the form, rejecting anything that is not
/// a single image within `max_size`. Nothing is written to disk here.
pub async fn accept_avatar(
    mut multipart: Multipart,
    max_size: usize,
) -> Result<AcceptedImage, AppError> {
    let mut accepted: Option<AcceptedImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_size))?
    {
        if field.name() != Some(AVATAR_FIELD) {
            continue;
        }
        if accepted.is_some() {
            return Err(AppError::UploadRejected(MULTIPLE_FILES_MESSAGE.to_string()));
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if !is_image_mime_type(&content_type) {
            tracing::debug!(content_type = %content_type, "Rejected non-image avatar");
            return Err(AppError::UploadRejected(NOT_AN_IMAGE_MESSAGE.to_string()));
        }

        let original_filename = field.file_name().map(str::to_string);
        let data = read_field_limited(field, max_size).await?;
        accepted = Some(AcceptedImage {
            original_filename,
            data,
        });
    }

    accepted.ok_or_else(|| AppError::UploadRejected(MISSING_FILE_MESSAGE.to_string()))
}

/// The username must survive the round trip through the image host's
/// `original_filename` unchanged, so it is used verbatim or not at all.
pub fn ensure_stageable_username(username: &str) -> Result<(), AppError> {
    if is_safe_file_stem(username) {
        Ok(())
    } else {
        Err(AppError::InvalidInput(UNUSABLE_USERNAME_MESSAGE.to_string()))
    }
}

/// `ava_{username}{.ext}`, a single path segment that maps back to exactly
/// one username.
pub fn staged_file_name(username: &str, original_filename: Option<&str>) -> Result<String, AppError> {
    ensure_stageable_username(username)?;
    let stem = format!("{}{}", STAGED_FILE_PREFIX, username);
    Ok(match original_filename.and_then(file_extension) {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    })
}

/// `main/<staged path without extension>`, using `/` separators and only
/// the normal components of the path.
pub fn public_id_for(staged_path: &Path) -> String {
    let without_ext = staged_path.with_extension("");
    let segments: Vec<String> = without_ext
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    format!("{}/{}", PUBLIC_ID_ROOT, segments.join("/"))
}

/// Recover the username from the name the host echoed back.
pub fn username_from_original_filename(original_filename: &str) -> Option<&str> {
    original_filename
        .strip_prefix(STAGED_FILE_PREFIX)
        .filter(|username| !username.is_empty())
}

pub struct AvatarPipeline<'a> {
    users: &'a dyn UserStore,
    image_host: &'a dyn ImageHost,
    staging_dir: &'a Path,
}

impl<'a> AvatarPipeline<'a> {
    pub fn new(users: &'a dyn UserStore, image_host: &'a dyn ImageHost, staging_dir: &'a Path) -> Self {
        Self {
            users,
            image_host,
            staging_dir,
        }
    }

    /// Stage, publish and correlate one accepted image. Only staging errors
    /// fail the call; the staged file is removed before returning either way.
    #[tracing::instrument(skip(self, auth, image), fields(username = %auth.username))]
    pub async fn run(&self, auth: &AuthContext, image: AcceptedImage) -> Result<AvatarOutcome, AppError> {
        let staged = self.stage(auth, &image).await?;
        let outcome = self.publish_and_link(&staged).await;

        if let Err(e) = tokio::fs::remove_file(&staged).await {
            tracing::warn!(error = %e, path = %staged.display(), "Failed to remove staged avatar");
        }

        tracing::info!(?outcome, "Avatar upload processed");
        Ok(outcome)
    }

    async fn stage(&self, auth: &AuthContext, image: &AcceptedImage) -> Result<PathBuf, AppError> {
        let file_name = staged_file_name(&auth.username, image.original_filename.as_deref())?;
        tokio::fs::create_dir_all(self.staging_dir).await?;
        let staged = self.staging_dir.join(file_name);
        if let Err(e) = tokio::fs::write(&staged, &image.data).await {
            let _ = tokio::fs::remove_file(&staged).await;
            return Err(e.into());
        }
        tracing::debug!(path = %staged.display(), size_bytes = image.data.len(), "Avatar staged");
        Ok(staged)
    }

    async fn publish_and_link(&self, staged: &Path) -> AvatarOutcome {
        let options = UploadOptions {
            public_id: public_id_for(staged),
        };

        let uploaded = match self.image_host.upload(staged, &options).await {
            Ok(uploaded) => uploaded,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    backend = ?self.image_host.backend_type(),
                    public_id = %options.public_id,
                    "Avatar publish failed"
                );
                return AvatarOutcome::PublishFailed;
            }
        };

        let Some(username) = username_from_original_filename(&uploaded.original_filename) else {
            tracing::warn!(
                original_filename = %uploaded.original_filename,
                "Published avatar name does not carry a username"
            );
            return AvatarOutcome::Unmatched;
        };

        let avatar = Avatar {
            public_id: uploaded.public_id,
            url: uploaded.secure_url,
        };
        match self.users.update_avatar_by_username(username, &avatar).await {
            Ok(true) => AvatarOutcome::Linked,
            Ok(false) => {
                tracing::warn!(username, "No user matches the published avatar");
                AvatarOutcome::Unmatched
            }
            Err(e) => {
                tracing::error!(error = %e, username, "Failed to record avatar");
                AvatarOutcome::LinkFailed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_file_name_keeps_extension() {
        assert_eq!(staged_file_name("alice", Some("me.PNG")).unwrap(), "ava_alice.png");
        assert_eq!(staged_file_name("alice", Some("noext")).unwrap(), "ava_alice");
        assert_eq!(staged_file_name("alice", None).unwrap(), "ava_alice");
    }

    #[test]
    fn test_staged_file_name_rejects_unsafe_usernames() {
        for username in ["../../root", "jo.hn", "jo hn", ""] {
            assert!(
                matches!(staged_file_name(username, Some("x.jpg")), Err(AppError::InvalidInput(_))),
                "{username:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_staged_name_maps_back_to_username() {
        for username in ["alice", "jo_hn", "ava_bob", "x-1"] {
            let name = staged_file_name(username, Some("me.png")).unwrap();
            let stem = Path::new(&name).file_stem().unwrap().to_str().unwrap();
            assert_eq!(username_from_original_filename(stem), Some(username));
        }
    }

    #[test]
    fn test_public_id_from_relative_staging_path() {
        let id = public_id_for(Path::new("storages/users/ava_alice.png"));
        assert_eq!(id, "main/storages/users/ava_alice");
    }

    #[test]
    fn test_public_id_from_absolute_staging_path() {
        let id = public_id_for(Path::new("/var/tmp/./users/ava_bob.jpg"));
        assert_eq!(id, "main/var/tmp/users/ava_bob");
    }

    #[test]
    fn test_username_recovered_from_echoed_name() {
        assert_eq!(username_from_original_filename("ava_alice_b"), Some("alice_b"));
        assert_eq!(username_from_original_filename("avatar"), None);
        assert_eq!(username_from_original_filename("ava_"), None);
    }

    #[test]
    fn test_outcome_wire_names() {
        assert_eq!(serde_json::to_value(AvatarOutcome::PublishFailed).unwrap(), "publish_failed");
        assert_eq!(serde_json::to_value(AvatarOutcome::Linked).unwrap(), "linked");
    }
}
