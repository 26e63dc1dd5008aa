//! Shared test harness: the real router on in-memory stores and a local
//! image host rooted in a temp dir.

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use taskhub_api::auth::AccessClaims;
use taskhub_api::setup::routes::setup_routes;
use taskhub_api::state::{AppState, DbState};
use taskhub_core::models::{Project, User};
use taskhub_core::{Config, EntityId};
use taskhub_db::memory::{InMemoryProjectStore, InMemoryTaskStore, InMemoryUserStore};
use taskhub_storage::{
    ImageHost, ImageHostBackend, ImageHostError, ImageHostResult, LocalImageHost, UploadOptions,
    UploadedImage,
};
use tempfile::TempDir;

pub const SECRET: &str = "0123456789abcdef0123456789abcdef";
pub const PAGE_SIZE: u32 = 2;

pub struct TestApp {
    pub server: TestServer,
    pub users: InMemoryUserStore,
    pub projects: InMemoryProjectStore,
    pub tasks: InMemoryTaskStore,
    pub staging_dir: PathBuf,
    pub public_dir: PathBuf,
    _staging: TempDir,
    _public: TempDir,
}

/// Which image host the app publishes avatars through.
pub enum HostKind {
    Local,
    Failing,
    /// Succeeds but echoes a fixed `original_filename`.
    Echoing(&'static str),
}

fn test_config(staging_dir: &Path, public_dir: &Path) -> Config {
    let staging = staging_dir.to_string_lossy().to_string();
    let public = public_dir.to_string_lossy().to_string();
    Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://localhost/taskhub_test".to_string()),
        "ACCESS_TOKEN_SECRET" => Some(SECRET.to_string()),
        "AVATAR_STAGING_DIR" => Some(staging.clone()),
        "AVATAR_MAX_FILE_SIZE_MB" => Some("1".to_string()),
        "TASKS_PAGE_SIZE" => Some(PAGE_SIZE.to_string()),
        "LOCAL_IMAGE_PATH" => Some(public.clone()),
        "LOCAL_IMAGE_BASE_URL" => Some("http://localhost:4000/static".to_string()),
        _ => None,
    })
    .expect("Failed to build test config")
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(HostKind::Local).await
}

pub async fn spawn_app_with(kind: HostKind) -> TestApp {
    let staging = tempfile::tempdir().expect("Failed to create staging dir");
    let public = tempfile::tempdir().expect("Failed to create public dir");
    let staging_dir = staging.path().join("users");
    let public_dir = public.path().to_path_buf();
    let config = test_config(&staging_dir, &public_dir);

    let local = LocalImageHost::new(&public_dir, config.local_image_base_url().to_string())
        .await
        .expect("Failed to create local image host");
    let image_host: Arc<dyn ImageHost> = match kind {
        HostKind::Local => Arc::new(local),
        HostKind::Failing => Arc::new(FailingImageHost),
        HostKind::Echoing(name) => Arc::new(EchoingImageHost {
            inner: local,
            original_filename: name,
        }),
    };

    let users = InMemoryUserStore::new();
    let projects = InMemoryProjectStore::new();
    let tasks = InMemoryTaskStore::new();
    let db = DbState::from_stores(
        Arc::new(users.clone()),
        Arc::new(projects.clone()),
        Arc::new(tasks.clone()),
    );
    let state = Arc::new(AppState::new(&config, db, image_host));
    let router = setup_routes(&config, state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        users,
        projects,
        tasks,
        staging_dir,
        public_dir,
        _staging: staging,
        _public: public,
    }
}

impl TestApp {
    pub fn add_user(&self, username: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: EntityId::new(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            full_name: None,
            bio: None,
            avatar: None,
            created_at: now,
            updated_at: now,
        };
        self.users.add_user(user.clone());
        user
    }

    pub fn add_project(&self, owner: &User) -> Project {
        let now = Utc::now();
        let project = Project {
            id: EntityId::new(),
            name: "Apollo".to_string(),
            description: Some("Moon landing".to_string()),
            owner_id: owner.id,
            created_at: now,
            updated_at: now,
        };
        self.projects.add_project(project.clone());
        project
    }

    /// Files currently left in the staging directory.
    pub fn staged_files(&self) -> Vec<PathBuf> {
        files_under(&self.staging_dir)
    }

    /// Files published to the local image host.
    pub fn published_files(&self) -> Vec<PathBuf> {
        files_under(&self.public_dir)
    }
}

fn files_under(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .flat_map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                files_under(&path)
            } else {
                vec![path]
            }
        })
        .collect()
}

pub fn token_for(user: &User) -> String {
    let claims = AccessClaims {
        id: user.id.to_string(),
        username: user.username.clone(),
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

pub fn bearer(user: &User) -> String {
    format!("Bearer {}", token_for(user))
}

/// Minimal PNG signature plus padding; only the declared content type matters.
pub fn png_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    data.resize(len.max(data.len()), 0);
    data
}

struct FailingImageHost;

#[async_trait]
impl ImageHost for FailingImageHost {
    async fn upload(&self, _local_path: &Path, _options: &UploadOptions) -> ImageHostResult<UploadedImage> {
        Err(ImageHostError::Rejected {
            status: 401,
            body: "invalid api_key".to_string(),
        })
    }

    fn backend_type(&self) -> ImageHostBackend {
        ImageHostBackend::Cloudinary
    }
}

struct EchoingImageHost {
    inner: LocalImageHost,
    original_filename: &'static str,
}

#[async_trait]
impl ImageHost for EchoingImageHost {
    async fn upload(&self, local_path: &Path, options: &UploadOptions) -> ImageHostResult<UploadedImage> {
        let mut uploaded = self.inner.upload(local_path, options).await?;
        uploaded.original_filename = self.original_filename.to_string();
        Ok(uploaded)
    }

    fn backend_type(&self) -> ImageHostBackend {
        self.inner.backend_type()
    }
}
