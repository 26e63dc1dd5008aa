//! Postgres repositories
//!
//! One repository per table group. Each implements the matching store trait
//! from [`crate::traits`].

pub mod project;
pub mod task;
pub mod user;

pub use project::ProjectRepository;
pub use task::TaskRepository;
pub use user::{UserRepository, USERNAME_TAKEN_MESSAGE};

/// Postgres `unique_violation` (SQLSTATE 23505).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}
