use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use taskhub_core::models::{Avatar, User, UserPatch};
use taskhub_core::{AppError, EntityId};

use super::is_unique_violation;
use crate::traits::UserStore;

/// Message for a username held by another user.
pub const USERNAME_TAKEN_MESSAGE: &str = "This username has already been used!";

const USER_COLUMNS: &str =
    "id, username, email, full_name, bio, avatar_public_id, avatar_url, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: EntityId,
    username: String,
    email: String,
    full_name: Option<String>,
    bio: Option<String>,
    avatar_public_id: Option<String>,
    avatar_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let avatar = match (row.avatar_public_id, row.avatar_url) {
            (Some(public_id), Some(url)) => Some(Avatar { public_id, url }),
            _ => None,
        };
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            full_name: row.full_name,
            bio: row.bio,
            avatar,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for user profiles
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select", db.record_id = %id))]
    async fn find_by_id(&self, id: EntityId) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<Postgres, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    async fn find_by_username_excluding(
        &self,
        id: EntityId,
        username: &str,
    ) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<Postgres, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 AND id <> $2"
        ))
        .bind(username)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    #[tracing::instrument(skip(self, patch), fields(db.table = "users", db.operation = "update", db.record_id = %id))]
    async fn update_by_id(
        &self,
        id: EntityId,
        patch: &UserPatch,
    ) -> Result<Option<User>, AppError> {
        let result = sqlx::query_as::<Postgres, UserRow>(&format!(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                email = COALESCE($3, email),
                full_name = COALESCE($4, full_name),
                bio = COALESCE($5, bio),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.username.as_deref())
        .bind(patch.email.as_deref())
        .bind(patch.full_name.as_deref())
        .bind(patch.bio.as_deref())
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row.map(User::from)),
            Err(err) if is_unique_violation(&err) => {
                tracing::debug!(user_id = %id, "username update lost a uniqueness race");
                Err(AppError::Conflict(USERNAME_TAKEN_MESSAGE.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    #[tracing::instrument(skip(self, avatar), fields(db.table = "users", db.operation = "update"))]
    async fn update_avatar_by_username(
        &self,
        username: &str,
        avatar: &Avatar,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET avatar_public_id = $2, avatar_url = $3, updated_at = NOW()
            WHERE username = $1
            "#,
        )
        .bind(username)
        .bind(&avatar.public_id)
        .bind(&avatar.url)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
