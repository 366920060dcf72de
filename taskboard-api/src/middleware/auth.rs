/// Bearer-token authentication middleware
///
/// Validates the access token from the `Authorization` header, reloads the
/// user row from the database, and injects an [`Actor`] into the request
/// extensions for the handlers to extract.
///
/// Reloading the row on every request means a deleted user is locked out the
/// moment their row is gone, even while their token is still within its
/// lifetime, and that role changes take effect without waiting for a new
/// token.

use axum::{extract::Request, extract::State, middleware::Next, response::Response};
use taskboard_shared::auth::{
    jwt,
    middleware::{Actor, AuthError},
};
use taskboard_shared::models::user::User;

use crate::{app::AppState, error::ApiError};

/// JWT authentication middleware layer
///
/// Apply with `axum::middleware::from_fn_with_state` on every route group
/// that requires a logged-in caller.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Extract Authorization header
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    // Parse Bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    // Validate token signature, expiry and type
    let claims = jwt::validate_access_token(token, state.jwt_secret())
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    // The token only proves identity; role and existence come from the row
    let user = User::find_by_id(&state.db, claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or(AuthError::UnknownUser)?;

    req.extensions_mut().insert(Actor::from_user(&user));

    Ok(next.run(req).await)
}
