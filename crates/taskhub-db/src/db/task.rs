use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use taskhub_core::models::{NewTask, Page, Paginated, Task, TaskFilter, TaskPatch};
use taskhub_core::{AppError, EntityId};

use crate::traits::TaskStore;

const TASK_COLUMNS: &str = "id, project_id, title, content, status, start_date, end_date, estimate_time, assignee, created_at, updated_at";

// Every filter is a nullable bind; unset filters match all rows.
const FILTER_CLAUSE: &str = r#"
    project_id = $1
    AND ($2::uuid IS NULL OR assignee = $2)
    AND ($3::smallint IS NULL OR status = $3)
    AND ($4::text IS NULL OR title ILIKE '%' || $4 || '%')
"#;

struct FilterBinds {
    assignee: Option<EntityId>,
    status: Option<i16>,
    title: Option<String>,
}

impl From<&TaskFilter> for FilterBinds {
    fn from(filter: &TaskFilter) -> Self {
        let mut binds = FilterBinds {
            assignee: None,
            status: None,
            title: None,
        };
        match filter {
            TaskFilter::All => {}
            TaskFilter::Assignee(member) => binds.assignee = Some(*member),
            TaskFilter::Status(status) => binds.status = Some(status.code()),
            TaskFilter::Title(needle) => binds.title = Some(escape_like(needle)),
        }
        binds
    }
}

/// Escape LIKE metacharacters so the title filter is a plain substring match.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Repository for project tasks
#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for TaskRepository {
    #[tracing::instrument(skip(self, task), fields(db.table = "tasks", db.operation = "insert", project_id = %task.project_id))]
    async fn create(&self, task: NewTask) -> Result<Task, AppError> {
        let task = sqlx::query_as::<Postgres, Task>(&format!(
            r#"
            INSERT INTO tasks (project_id, title, content, status, start_date, end_date, estimate_time, assignee)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(task.project_id)
        .bind(&task.title)
        .bind(&task.content)
        .bind(task.status)
        .bind(task.start_date)
        .bind(task.end_date)
        .bind(task.estimate_time)
        .bind(task.assignee)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    #[tracing::instrument(skip(self), fields(db.table = "tasks", db.operation = "select", db.record_id = %id))]
    async fn find_by_id(&self, id: EntityId) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<Postgres, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    #[tracing::instrument(skip(self), fields(db.table = "tasks", db.operation = "select"))]
    async fn list(
        &self,
        project_id: EntityId,
        filter: &TaskFilter,
        page: Page,
    ) -> Result<Paginated<Task>, AppError> {
        let binds = FilterBinds::from(filter);

        let total = sqlx::query_scalar::<Postgres, i64>(&format!(
            "SELECT COUNT(*) FROM tasks WHERE {FILTER_CLAUSE}"
        ))
        .bind(project_id)
        .bind(binds.assignee)
        .bind(binds.status)
        .bind(binds.title.as_deref())
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<Postgres, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE {FILTER_CLAUSE} ORDER BY created_at DESC, id LIMIT $5 OFFSET $6"
        ))
        .bind(project_id)
        .bind(binds.assignee)
        .bind(binds.status)
        .bind(binds.title.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Paginated {
            items,
            page: page.number,
            page_size: page.size,
            total,
        })
    }

    #[tracing::instrument(skip(self, patch), fields(db.table = "tasks", db.operation = "update", db.record_id = %id))]
    async fn update_by_id(
        &self,
        id: EntityId,
        patch: &TaskPatch,
    ) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<Postgres, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                status = COALESCE($4, status),
                start_date = COALESCE($5, start_date),
                end_date = COALESCE($6, end_date),
                estimate_time = COALESCE($7, estimate_time),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.title.as_deref())
        .bind(patch.content.as_deref())
        .bind(patch.status)
        .bind(patch.start_date)
        .bind(patch.end_date)
        .bind(patch.estimate_time)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    #[tracing::instrument(skip(self), fields(db.table = "tasks", db.operation = "delete", db.record_id = %id))]
    async fn delete_by_id(&self, id: EntityId) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<Postgres, Task>(&format!(
            "DELETE FROM tasks WHERE id = $1 RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }
}
