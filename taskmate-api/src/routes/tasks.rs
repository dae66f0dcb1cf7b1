/// Task endpoints
///
/// - `GET    /v1/tasks` - The caller's tasks
/// - `POST   /v1/tasks` - Create a task
/// - `GET    /v1/tasks/:id` - One task
/// - `PUT    /v1/tasks/:id` - Replace title, description, due date, completion
/// - `DELETE /v1/tasks/:id` - Delete the task with its subtasks, recurrence and attachments

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use taskmate_shared::cascade::CascadeReport;
use taskmate_shared::models::task::{CreateTask, Task, UpdateTask};
use taskmate_shared::services::tasks;
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiJson, ApiResult},
    middleware::auth::CurrentPrincipal,
};

pub async fn list_tasks(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(tasks::list_tasks(state.store(), principal).await?))
}

pub async fn create_task(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    ApiJson(data): ApiJson<CreateTask>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = tasks::create_task(state.store(), principal, data).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    Ok(Json(tasks::get_task(state.store(), principal, task_id).await?))
}

pub async fn update_task(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(task_id): Path<Uuid>,
    ApiJson(data): ApiJson<UpdateTask>,
) -> ApiResult<Json<Task>> {
    Ok(Json(
        tasks::update_task(state.store(), principal, task_id, data).await?,
    ))
}

pub async fn delete_task(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<CascadeReport>> {
    Ok(Json(tasks::delete_task(state.store(), principal, task_id).await?))
}
