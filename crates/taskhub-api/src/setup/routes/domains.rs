//! Domain route groups (users, projects, tasks).
//!
//! Route layers run bottom-up: the rule set added last validates first, then
//! the project existence check, then the handler.

use crate::handlers::{projects, tasks, users};
use crate::middleware::{load_project, validate_fields};
use crate::state::AppState;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use std::sync::Arc;
use taskhub_core::validation::tasks::{
    ADD_TASK, GET_TASKS, GET_TASKS_BY_MEMBER, GET_TASKS_BY_STATUS, GET_TASKS_BY_TITLE,
    REMOVE_TASK, UPDATE_TASK,
};

pub fn user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/me", get(users::get_me))
        .route("/users/{id}", get(users::get_user).patch(users::update_user))
        .route("/users/{id}/avatar", post(users::upload_avatar))
}

pub fn project_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let project = || from_fn_with_state(state.clone(), load_project);

    Router::new()
        .route(
            "/projects/{id}",
            get(projects::get_project).route_layer(project()),
        )
        .route(
            "/projects/{id}/tasks",
            get(tasks::get_tasks)
                .route_layer(project())
                .route_layer(from_fn_with_state(&*GET_TASKS, validate_fields))
                .merge(
                    post(tasks::add_task)
                        .route_layer(project())
                        .route_layer(from_fn_with_state(&*ADD_TASK, validate_fields)),
                ),
        )
        .route(
            "/projects/{id}/tasks/member",
            get(tasks::get_tasks_by_member)
                .route_layer(project())
                .route_layer(from_fn_with_state(&*GET_TASKS_BY_MEMBER, validate_fields)),
        )
        .route(
            "/projects/{id}/tasks/status",
            get(tasks::get_tasks_by_status)
                .route_layer(project())
                .route_layer(from_fn_with_state(&*GET_TASKS_BY_STATUS, validate_fields)),
        )
        .route(
            "/projects/{id}/tasks/title",
            get(tasks::get_tasks_by_title)
                .route_layer(project())
                .route_layer(from_fn_with_state(&*GET_TASKS_BY_TITLE, validate_fields)),
        )
}

pub fn task_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/tasks/{id}",
        patch(tasks::update_task)
            .route_layer(from_fn_with_state(&*UPDATE_TASK, validate_fields))
            .merge(
                delete(tasks::remove_task)
                    .route_layer(from_fn_with_state(&*REMOVE_TASK, validate_fields)),
            ),
    )
}
