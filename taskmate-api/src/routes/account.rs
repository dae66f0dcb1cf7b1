/// Account endpoints
///
/// All of them act on the caller's own account.
///
/// - `GET    /v1/account` - Profile
/// - `PUT    /v1/account` - Edit non-blank profile fields
/// - `PUT    /v1/account/password` - Change password
/// - `DELETE /v1/account` - Delete the account and everything it owns

use axum::{extract::State, Json};
use taskmate_shared::cascade::CascadeReport;
use taskmate_shared::models::user::{EditUser, User};
use taskmate_shared::services::account::{self, ChangePassword};

use crate::{
    app::AppState,
    error::{ApiJson, ApiResult},
    middleware::auth::CurrentPrincipal,
};

pub async fn get_account(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> ApiResult<Json<User>> {
    Ok(Json(account::get_account(state.store(), principal).await?))
}

pub async fn edit_account(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    ApiJson(edit): ApiJson<EditUser>,
) -> ApiResult<Json<User>> {
    Ok(Json(account::edit_account(state.store(), principal, edit).await?))
}

/// Change password
///
/// ```text
/// PUT /v1/account/password
///
/// {
///   "old_password": "Analytical1",
///   "new_password": "Difference2",
///   "confirm_new_password": "Difference2"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: old password missing or wrong, new equals old,
///   confirmation mismatch, or weak new password
pub async fn change_password(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    ApiJson(request): ApiJson<ChangePassword>,
) -> ApiResult<Json<User>> {
    let user =
        account::change_password(state.store(), state.credentials(), principal, request).await?;
    Ok(Json(user))
}

/// Delete account, returning how many records of each kind were removed
pub async fn delete_account(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> ApiResult<Json<CascadeReport>> {
    let report = account::delete_account(state.store(), state.credentials(), principal).await?;
    Ok(Json(report))
}
