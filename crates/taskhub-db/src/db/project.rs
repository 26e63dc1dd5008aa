use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use taskhub_core::models::Project;
use taskhub_core::{AppError, EntityId};

use crate::traits::ProjectStore;

/// Read-only access to projects and their membership
#[derive(Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectStore for ProjectRepository {
    #[tracing::instrument(skip(self), fields(db.table = "projects", db.operation = "select", db.record_id = %id))]
    async fn find_by_id(&self, id: EntityId) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<Postgres, Project>(
            "SELECT id, name, description, owner_id, created_at, updated_at FROM projects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    #[tracing::instrument(skip(self), fields(db.table = "project_members", db.operation = "select"))]
    async fn is_member(&self, project_id: EntityId, user_id: EntityId) -> Result<bool, AppError> {
        let is_member = sqlx::query_scalar::<Postgres, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1 AND owner_id = $2)
                OR EXISTS(SELECT 1 FROM project_members WHERE project_id = $1 AND user_id = $2)
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(is_member)
    }
}
