/// Bearer-token authentication
///
/// [`resolve_principal`] runs on every `/v1` request. A request without an
/// `Authorization` header passes through anonymously and the operation
/// itself decides whether that is allowed; a header that does not resolve
/// to a principal is rejected with 401 right away.
///
/// Handlers read the outcome through the [`CurrentPrincipal`] extractor.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use taskmate_shared::auth::principal::Principal;

use crate::{app::AppState, error::ApiError};

/// Resolves the bearer token, if any, into a [`Principal`] extension
pub async fn resolve_principal(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = match req.headers().get(header::AUTHORIZATION) {
        None => return Ok(next.run(req).await),
        Some(value) => value
            .to_str()
            .map_err(|_| ApiError::Unauthorized("Malformed authorization header".to_string()))?
            .to_string(),
    };

    let principal = state
        .credentials
        .authenticate(Some(&authorization))
        .map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })?;

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// The caller's principal, or `None` for anonymous requests
#[derive(Debug, Clone, Copy)]
pub struct CurrentPrincipal(pub Option<Principal>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentPrincipal(parts.extensions.get::<Principal>().copied()))
    }
}
