/// Recurrence endpoints
///
/// A task has at most one recurrence.
///
/// - `GET    /v1/tasks/:id/recurrence`
/// - `PUT    /v1/tasks/:id/recurrence` - Create or replace
/// - `DELETE /v1/recurrences/:id`

use axum::{
    extract::{Path, State},
    Json,
};
use taskmate_shared::models::recurrence::{Recurrence, SetRecurrence};
use taskmate_shared::services::recurrences;
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiJson, ApiResult},
    middleware::auth::CurrentPrincipal,
};

pub async fn get_recurrence(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Recurrence>> {
    Ok(Json(
        recurrences::get_recurrence(state.store(), principal, task_id).await?,
    ))
}

/// Create or replace; an existing recurrence keeps its id
///
/// ```text
/// PUT /v1/tasks/:id/recurrence
///
/// { "frequency": "weekly", "repeat_interval": 2, "ends_at": null }
/// ```
pub async fn set_recurrence(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(task_id): Path<Uuid>,
    ApiJson(data): ApiJson<SetRecurrence>,
) -> ApiResult<Json<Recurrence>> {
    Ok(Json(
        recurrences::set_recurrence(state.store(), principal, task_id, data).await?,
    ))
}

pub async fn delete_recurrence(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(recurrence_id): Path<Uuid>,
) -> ApiResult<Json<Recurrence>> {
    Ok(Json(
        recurrences::delete_recurrence(state.store(), principal, recurrence_id).await?,
    ))
}
