//! Application state shared by every handler.
//!
//! Stores and the image host sit behind trait objects so the router can be
//! built on Postgres in production and on in-memory stores in tests.

use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::Arc;
use taskhub_core::Config;
use taskhub_db::{
    ProjectRepository, ProjectStore, TaskRepository, TaskStore, UserRepository, UserStore,
};
use taskhub_storage::ImageHost;

/// Persistence handles.
#[derive(Clone)]
pub struct DbState {
    /// Present when backed by Postgres; used by the readiness probe.
    pub pool: Option<PgPool>,
    pub users: Arc<dyn UserStore>,
    pub projects: Arc<dyn ProjectStore>,
    pub tasks: Arc<dyn TaskStore>,
}

impl DbState {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            projects: Arc::new(ProjectRepository::new(pool.clone())),
            tasks: Arc::new(TaskRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    pub fn from_stores(
        users: Arc<dyn UserStore>,
        projects: Arc<dyn ProjectStore>,
        tasks: Arc<dyn TaskStore>,
    ) -> Self {
        Self {
            pool: None,
            users,
            projects,
            tasks,
        }
    }
}

/// Avatar staging settings.
#[derive(Clone, Debug)]
pub struct AvatarConfig {
    pub staging_dir: PathBuf,
    pub max_file_size: usize,
}

pub struct AppState {
    pub db: DbState,
    pub image_host: Arc<dyn ImageHost>,
    pub avatar: AvatarConfig,
    pub tasks_page_size: u32,
}

impl AppState {
    pub fn new(config: &Config, db: DbState, image_host: Arc<dyn ImageHost>) -> Self {
        Self {
            db,
            image_host,
            avatar: AvatarConfig {
                staging_dir: PathBuf::from(config.avatar_staging_dir()),
                max_file_size: config.avatar_max_file_size_bytes(),
            },
            tasks_page_size: config.tasks_page_size(),
        }
    }
}
