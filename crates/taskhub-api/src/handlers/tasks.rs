//! Task endpoints.
//!
//! Every route here sits behind its rule set; routes under `/projects/{id}`
//! also sit behind the project existence check, so the project arrives as an
//! extension. Only project members may read or change tasks.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskhub_core::models::task::de;
use taskhub_core::models::{
    NewTask, Page, Paginated, Project, Task, TaskFilter, TaskPatch, TaskStatus,
};
use taskhub_core::{AppError, EntityId};

use super::NO_UPDATE_MESSAGE;
use crate::auth::AuthContext;
use crate::error::{HttpAppError, OptionalJson, ValidatedJson, ValidatedQuery};
use crate::response::ApiResponse;
use crate::state::AppState;

pub const NOT_A_MEMBER_MESSAGE: &str = "You are not a member of this project!";
pub const ASIGNEE_NOT_A_MEMBER_MESSAGE: &str = "Asignee is not a member of this project!";
pub const DATE_ORDER_MESSAGE: &str = "End date must not be before start date!";

/// Task creation body, after validation and trimming.
#[derive(Debug, Deserialize)]
pub struct NewTaskBody {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(deserialize_with = "de::flexible_date")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "de::flexible_date")]
    pub end_date: NaiveDate,
    #[serde(deserialize_with = "de::flexible_f64")]
    pub estimate_time: f64,
    pub asignee: String,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct MemberQuery {
    pub member_id: String,
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: TaskStatus,
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct TitleQuery {
    pub title: String,
    pub page: u32,
}

#[derive(Debug, Serialize)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
}

impl From<Paginated<Task>> for TaskPage {
    fn from(page: Paginated<Task>) -> Self {
        Self {
            tasks: page.items,
            page: page.page,
            page_size: page.page_size,
            total: page.total,
        }
    }
}

pub(crate) async fn ensure_member(
    state: &AppState,
    project_id: EntityId,
    user_id: EntityId,
) -> Result<(), AppError> {
    if state.db.projects.is_member(project_id, user_id).await? {
        Ok(())
    } else {
        Err(AppError::Forbidden(NOT_A_MEMBER_MESSAGE.to_string()))
    }
}

fn ensure_date_order(start_date: NaiveDate, end_date: NaiveDate) -> Result<(), AppError> {
    if end_date < start_date {
        return Err(AppError::InvalidInput(DATE_ORDER_MESSAGE.to_string()));
    }
    Ok(())
}

fn parse_task_id(raw: &str) -> Result<EntityId, AppError> {
    EntityId::parse(raw).map_err(|_| AppError::InvalidInput("Invalid id param value!".to_string()))
}

/// Load a task the caller may change.
async fn find_owned_task(state: &AppState, id: EntityId, user_id: EntityId) -> Result<Task, AppError> {
    let task = state
        .db
        .tasks
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Cannot find task with id {}!", id)))?;
    ensure_member(state, task.project_id, user_id).await?;
    Ok(task)
}

#[tracing::instrument(skip(state, auth, project, body), fields(project_id = %project.id))]
pub async fn add_task(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Extension(project): Extension<Project>,
    ValidatedJson(body): ValidatedJson<NewTaskBody>,
) -> Result<(StatusCode, Json<ApiResponse<Task>>), HttpAppError> {
    ensure_member(&state, project.id, auth.user_id).await?;

    let assignee = EntityId::parse(&body.asignee)
        .map_err(|_| AppError::InvalidInput("Invalid asignee id value!".to_string()))?;
    if !state.db.projects.is_member(project.id, assignee).await? {
        return Err(AppError::InvalidInput(ASIGNEE_NOT_A_MEMBER_MESSAGE.to_string()).into());
    }
    ensure_date_order(body.start_date, body.end_date)?;

    let task = state
        .db
        .tasks
        .create(NewTask {
            project_id: project.id,
            title: body.title,
            content: body.content,
            status: body.status.unwrap_or(TaskStatus::Open),
            start_date: body.start_date,
            end_date: body.end_date,
            estimate_time: body.estimate_time,
            assignee,
        })
        .await?;

    tracing::info!(task_id = %task.id, "Task created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Create new task successfully!", task)),
    ))
}

async fn list_tasks(
    state: &AppState,
    auth: &AuthContext,
    project: &Project,
    filter: TaskFilter,
    page: u32,
) -> Result<Json<ApiResponse<TaskPage>>, HttpAppError> {
    ensure_member(state, project.id, auth.user_id).await?;

    let page = Page::new(page, state.tasks_page_size);
    let tasks = state.db.tasks.list(project.id, &filter, page).await?;

    Ok(Json(ApiResponse::success(
        format!("Get tasks of project with id {} successfully!", project.id),
        TaskPage::from(tasks),
    )))
}

#[tracing::instrument(skip(state, auth, project), fields(project_id = %project.id))]
pub async fn get_tasks(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Extension(project): Extension<Project>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> Result<Json<ApiResponse<TaskPage>>, HttpAppError> {
    list_tasks(&state, &auth, &project, TaskFilter::All, query.page).await
}

#[tracing::instrument(skip(state, auth, project), fields(project_id = %project.id))]
pub async fn get_tasks_by_member(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Extension(project): Extension<Project>,
    ValidatedQuery(query): ValidatedQuery<MemberQuery>,
) -> Result<Json<ApiResponse<TaskPage>>, HttpAppError> {
    let member_id = EntityId::parse(&query.member_id)
        .map_err(|_| AppError::InvalidInput("Invalid member id value!".to_string()))?;
    list_tasks(&state, &auth, &project, TaskFilter::Assignee(member_id), query.page).await
}

#[tracing::instrument(skip(state, auth, project), fields(project_id = %project.id))]
pub async fn get_tasks_by_status(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Extension(project): Extension<Project>,
    ValidatedQuery(query): ValidatedQuery<StatusQuery>,
) -> Result<Json<ApiResponse<TaskPage>>, HttpAppError> {
    list_tasks(&state, &auth, &project, TaskFilter::Status(query.status), query.page).await
}

#[tracing::instrument(skip(state, auth, project), fields(project_id = %project.id))]
pub async fn get_tasks_by_title(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Extension(project): Extension<Project>,
    ValidatedQuery(query): ValidatedQuery<TitleQuery>,
) -> Result<Json<ApiResponse<TaskPage>>, HttpAppError> {
    list_tasks(&state, &auth, &project, TaskFilter::Title(query.title), query.page).await
}

#[tracing::instrument(skip(state, auth, patch), fields(user_id = %auth.user_id))]
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(raw_id): Path<String>,
    OptionalJson(patch): OptionalJson<TaskPatch>,
) -> Result<Json<ApiResponse<Task>>, HttpAppError> {
    let id = parse_task_id(&raw_id)?;
    if patch.is_empty() {
        return Err(AppError::InvalidInput(NO_UPDATE_MESSAGE.to_string()).into());
    }

    let task = find_owned_task(&state, id, auth.user_id).await?;
    ensure_date_order(
        patch.start_date.unwrap_or(task.start_date),
        patch.end_date.unwrap_or(task.end_date),
    )?;

    let task = state
        .db
        .tasks
        .update_by_id(id, &patch)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Cannot find task with id {}!", id)))?;

    tracing::info!(task_id = %id, "Task updated");
    Ok(Json(ApiResponse::success(
        format!("Update task with id {} successfully!", id),
        task,
    )))
}

#[tracing::instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn remove_task(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<Task>>, HttpAppError> {
    let id = parse_task_id(&raw_id)?;
    find_owned_task(&state, id, auth.user_id).await?;

    let task = state
        .db
        .tasks
        .delete_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Cannot find task with id {}!", id)))?;

    tracing::info!(task_id = %id, "Task removed");
    Ok(Json(ApiResponse::success(
        format!("Remove task with id {} successfully!", id),
        task,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_task_body_accepts_string_numbers() {
        let body: NewTaskBody = serde_json::from_value(json!({
            "title": "Docs",
            "content": "Write them",
            "status": "2",
            "start_date": "2024/03/01",
            "end_date": "2024-03-02",
            "estimate_time": "7.5",
            "asignee": "3fa85f64-5717-4562-b3fc-2c963f66afa6"
        }))
        .unwrap();
        assert_eq!(body.status, Some(TaskStatus::InProgress));
        assert_eq!(body.estimate_time, 7.5);
        assert_eq!(body.start_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_date_order() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let next = day.succ_opt().unwrap();
        assert!(ensure_date_order(day, day).is_ok());
        assert!(ensure_date_order(day, next).is_ok());
        assert!(ensure_date_order(next, day).is_err());
    }
}
