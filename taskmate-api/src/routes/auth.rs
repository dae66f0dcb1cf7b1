/// Authentication endpoints
///
/// - `POST /v1/auth/register` - Create an account and get an access token
/// - `POST /v1/auth/login` - Exchange username or email plus password for a token

use axum::{extract::State, http::StatusCode, Json};
use taskmate_shared::services::account::{self, Login, Registration, Session};

use crate::{
    app::AppState,
    error::{ApiJson, ApiResult},
};

/// Register a new account
///
/// ```text
/// POST /v1/auth/register
///
/// {
///   "first_name": "Ada",
///   "last_name": "Lovelace",
///   "username": "ada",
///   "email": "ada@example.com",
///   "phone_number": null,
///   "password": "Analytical1"
/// }
/// ```
///
/// Returns `201` with `{ "user": {...}, "access_token": "eyJ..." }`.
///
/// # Errors
///
/// - `400 Bad Request`: invalid field, weak password, or username/email taken
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<Registration>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    let session = account::register(state.store(), state.credentials(), req).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Log in
///
/// ```text
/// POST /v1/auth/login
///
/// { "login": "ada@example.com", "password": "Analytical1" }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: unknown login or wrong password
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<Login>,
) -> ApiResult<Json<Session>> {
    let session = account::login(state.store(), state.credentials(), req).await?;
    Ok(Json(session))
}
