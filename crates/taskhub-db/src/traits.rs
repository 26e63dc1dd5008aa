use async_trait::async_trait;
use taskhub_core::models::{
    Avatar, NewTask, Page, Paginated, Project, Task, TaskFilter, TaskPatch, User, UserPatch,
};
use taskhub_core::{AppError, EntityId};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: EntityId) -> Result<Option<User>, AppError>;

    /// A user other than `id` that already holds `username`.
    async fn find_by_username_excluding(
        &self,
        id: EntityId,
        username: &str,
    ) -> Result<Option<User>, AppError>;

    /// Apply a partial update. `None` when no user has that id.
    async fn update_by_id(&self, id: EntityId, patch: &UserPatch)
        -> Result<Option<User>, AppError>;

    /// Returns whether a user with that username existed and was updated.
    async fn update_avatar_by_username(
        &self,
        username: &str,
        avatar: &Avatar,
    ) -> Result<bool, AppError>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn find_by_id(&self, id: EntityId) -> Result<Option<Project>, AppError>;

    /// The owner counts as a member.
    async fn is_member(&self, project_id: EntityId, user_id: EntityId) -> Result<bool, AppError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create(&self, task: NewTask) -> Result<Task, AppError>;

    async fn find_by_id(&self, id: EntityId) -> Result<Option<Task>, AppError>;

    /// Newest first.
    async fn list(
        &self,
        project_id: EntityId,
        filter: &TaskFilter,
        page: Page,
    ) -> Result<Paginated<Task>, AppError>;

    async fn update_by_id(&self, id: EntityId, patch: &TaskPatch)
        -> Result<Option<Task>, AppError>;

    async fn delete_by_id(&self, id: EntityId) -> Result<Option<Task>, AppError>;
}
