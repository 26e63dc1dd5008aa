//! Persistence layer for Taskhub.
//!
//! Handlers only see the store traits in [`traits`]; the Postgres
//! repositories in [`db`] implement them for production and the in-memory
//! stores (feature `test-support`) implement them for tests.

pub mod db;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod traits;

pub use db::{
    is_unique_violation, ProjectRepository, TaskRepository, UserRepository,
    USERNAME_TAKEN_MESSAGE,
};
pub use traits::{ProjectStore, TaskStore, UserStore};
