//! In-memory store implementations for testing
//!
//! These stores let the HTTP layer be exercised without a database. They keep
//! the same constraints as the Postgres schema where handlers depend on them
//! (unique usernames, owner counts as member) and count calls so tests can
//! assert that a path never reached the store.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use taskhub_core::models::{
    Avatar, NewTask, Page, Paginated, Project, Task, TaskFilter, TaskPatch, User, UserPatch,
};
use taskhub_core::{AppError, EntityId};

use crate::db::USERNAME_TAKEN_MESSAGE;
use crate::traits::{ProjectStore, TaskStore, UserStore};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory user store
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<Mutex<HashMap<EntityId, User>>>,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: User) {
        lock(&self.users).insert(user.id, user);
    }

    pub fn get(&self, id: EntityId) -> Option<User> {
        lock(&self.users).get(&id).cloned()
    }

    /// Number of lookups served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of write operations attempted so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: EntityId) -> Result<Option<User>, AppError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.users).get(&id).cloned())
    }

    async fn find_by_username_excluding(
        &self,
        id: EntityId,
        username: &str,
    ) -> Result<Option<User>, AppError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.users)
            .values()
            .find(|u| u.username == username && u.id != id)
            .cloned())
    }

    async fn update_by_id(
        &self,
        id: EntityId,
        patch: &UserPatch,
    ) -> Result<Option<User>, AppError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut users = lock(&self.users);

        if let Some(username) = &patch.username {
            if users.values().any(|u| &u.username == username && u.id != id) {
                return Err(AppError::Conflict(USERNAME_TAKEN_MESSAGE.to_string()));
            }
        }

        Ok(users.get_mut(&id).map(|user| {
            patch.apply_to(user);
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn update_avatar_by_username(
        &self,
        username: &str,
        avatar: &Avatar,
    ) -> Result<bool, AppError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut users = lock(&self.users);
        match users.values_mut().find(|u| u.username == username) {
            Some(user) => {
                user.avatar = Some(avatar.clone());
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// In-memory project store
#[derive(Clone, Default)]
pub struct InMemoryProjectStore {
    projects: Arc<Mutex<HashMap<EntityId, Project>>>,
    members: Arc<Mutex<HashSet<(EntityId, EntityId)>>>,
    lookups: Arc<AtomicUsize>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_project(&self, project: Project) {
        lock(&self.projects).insert(project.id, project);
    }

    pub fn add_member(&self, project_id: EntityId, user_id: EntityId) {
        lock(&self.members).insert((project_id, user_id));
    }

    /// Number of `find_by_id` calls served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn find_by_id(&self, id: EntityId) -> Result<Option<Project>, AppError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.projects).get(&id).cloned())
    }

    async fn is_member(&self, project_id: EntityId, user_id: EntityId) -> Result<bool, AppError> {
        let is_owner = lock(&self.projects)
            .get(&project_id)
            .is_some_and(|p| p.owner_id == user_id);
        Ok(is_owner || lock(&self.members).contains(&(project_id, user_id)))
    }
}

/// In-memory task store
#[derive(Clone, Default)]
pub struct InMemoryTaskStore {
    tasks: Arc<Mutex<HashMap<EntityId, Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.tasks).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: EntityId) -> Option<Task> {
        lock(&self.tasks).get(&id).cloned()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, task: NewTask) -> Result<Task, AppError> {
        let now = Utc::now();
        let task = Task {
            id: EntityId::new(),
            project_id: task.project_id,
            title: task.title,
            content: task.content,
            status: task.status,
            start_date: task.start_date,
            end_date: task.end_date,
            estimate_time: task.estimate_time,
            assignee: task.assignee,
            created_at: now,
            updated_at: now,
        };
        lock(&self.tasks).insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<Task>, AppError> {
        Ok(lock(&self.tasks).get(&id).cloned())
    }

    async fn list(
        &self,
        project_id: EntityId,
        filter: &TaskFilter,
        page: Page,
    ) -> Result<Paginated<Task>, AppError> {
        let mut matching: Vec<Task> = lock(&self.tasks)
            .values()
            .filter(|t| t.project_id == project_id && filter.matches(t))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();

        Ok(Paginated {
            items,
            page: page.number,
            page_size: page.size,
            total,
        })
    }

    async fn update_by_id(
        &self,
        id: EntityId,
        patch: &TaskPatch,
    ) -> Result<Option<Task>, AppError> {
        Ok(lock(&self.tasks).get_mut(&id).map(|task| {
            patch.apply_to(task);
            task.updated_at = Utc::now();
            task.clone()
        }))
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<Option<Task>, AppError> {
        Ok(lock(&self.tasks).remove(&id))
    }
}
