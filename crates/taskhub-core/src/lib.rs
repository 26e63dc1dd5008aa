//! Taskhub Core Library
//!
//! This crate provides the domain models, error types, configuration, and the
//! field validator shared by every Taskhub component.

pub mod config;
pub mod error;
pub mod ids;
pub mod image_host_types;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{BaseConfig, Config, ServiceConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use ids::{EntityId, InvalidEntityId};
pub use image_host_types::ImageHostBackend;
pub use validation::{FieldError, RequestFields, RuleSet, ValidationFailure};
