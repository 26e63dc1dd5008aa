pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;

/// Partial update with nothing to apply.
pub const NO_UPDATE_MESSAGE: &str = "No update information provided!";
