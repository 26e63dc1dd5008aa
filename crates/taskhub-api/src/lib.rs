//! Taskhub API Library
//!
//! HTTP handlers, middleware, and application setup for the Taskhub service.

mod handlers;
mod services;
mod telemetry;
mod utils;

pub mod auth;
pub mod error;
pub mod middleware;
pub mod response;
pub mod setup;
pub mod state;

pub use error::HttpAppError;
pub use response::ApiResponse;
pub use services::avatar::AvatarOutcome;
pub use state::AppState;
