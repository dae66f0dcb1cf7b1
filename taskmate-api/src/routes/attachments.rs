/// Attachment endpoints
///
/// Attachments are references (URL plus metadata); no file bytes pass
/// through the API.
///
/// - `GET    /v1/tasks/:id/attachments`
/// - `POST   /v1/tasks/:id/attachments`
/// - `GET    /v1/attachments/:id`
/// - `DELETE /v1/attachments/:id`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use taskmate_shared::models::attachment::{Attachment, CreateAttachment};
use taskmate_shared::services::attachments;
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiJson, ApiResult},
    middleware::auth::CurrentPrincipal,
};

pub async fn list_attachments(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Attachment>>> {
    Ok(Json(
        attachments::list_attachments(state.store(), principal, task_id).await?,
    ))
}

pub async fn create_attachment(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(task_id): Path<Uuid>,
    ApiJson(data): ApiJson<CreateAttachment>,
) -> ApiResult<(StatusCode, Json<Attachment>)> {
    let attachment =
        attachments::create_attachment(state.store(), principal, task_id, data).await?;
    Ok((StatusCode::CREATED, Json(attachment)))
}

pub async fn get_attachment(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(attachment_id): Path<Uuid>,
) -> ApiResult<Json<Attachment>> {
    Ok(Json(
        attachments::get_attachment(state.store(), principal, attachment_id).await?,
    ))
}

pub async fn delete_attachment(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(attachment_id): Path<Uuid>,
) -> ApiResult<Json<Attachment>> {
    Ok(Json(
        attachments::delete_attachment(state.store(), principal, attachment_id).await?,
    ))
}
