/// Subtask endpoints
///
/// - `GET    /v1/subtasks/:id`
/// - `GET    /v1/subtasks/task/:task_id` - All subtasks of a task
/// - `POST   /v1/subtasks` - Create (parent task named in the body)
/// - `PUT    /v1/subtasks/:id` - Replace
/// - `DELETE /v1/subtasks/:id`
/// - `PUT    /v1/subtasks/complete/:id`
/// - `PUT    /v1/subtasks/in-complete/:id`
///
/// Every one of them checks that the parent task belongs to the caller.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use taskmate_shared::models::subtask::{CreateSubtask, Subtask, UpdateSubtask};
use taskmate_shared::services::subtasks;
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiJson, ApiResult},
    middleware::auth::CurrentPrincipal,
};

pub async fn get_subtask(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(subtask_id): Path<Uuid>,
) -> ApiResult<Json<Subtask>> {
    Ok(Json(
        subtasks::get_subtask(state.store(), principal, subtask_id).await?,
    ))
}

pub async fn list_subtasks(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Subtask>>> {
    Ok(Json(
        subtasks::list_subtasks(state.store(), principal, task_id).await?,
    ))
}

pub async fn create_subtask(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    ApiJson(data): ApiJson<CreateSubtask>,
) -> ApiResult<(StatusCode, Json<Subtask>)> {
    let subtask = subtasks::create_subtask(state.store(), principal, data).await?;
    Ok((StatusCode::CREATED, Json(subtask)))
}

pub async fn update_subtask(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(subtask_id): Path<Uuid>,
    ApiJson(data): ApiJson<UpdateSubtask>,
) -> ApiResult<Json<Subtask>> {
    Ok(Json(
        subtasks::update_subtask(state.store(), principal, subtask_id, data).await?,
    ))
}

pub async fn complete_subtask(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(subtask_id): Path<Uuid>,
) -> ApiResult<Json<Subtask>> {
    Ok(Json(
        subtasks::complete_subtask(state.store(), principal, subtask_id).await?,
    ))
}

pub async fn reopen_subtask(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(subtask_id): Path<Uuid>,
) -> ApiResult<Json<Subtask>> {
    Ok(Json(
        subtasks::reopen_subtask(state.store(), principal, subtask_id).await?,
    ))
}

/// Returns the removed subtask
pub async fn delete_subtask(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(subtask_id): Path<Uuid>,
) -> ApiResult<Json<Subtask>> {
    Ok(Json(
        subtasks::delete_subtask(state.store(), principal, subtask_id).await?,
    ))
}
