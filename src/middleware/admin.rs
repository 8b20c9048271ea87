//! Admin token middleware for the license management API.
//!
//! When `ADMIN_TOKEN` is configured, `/api/*` requires
//! `Authorization: Bearer <token>`. Only the SHA-256 digest of the token is
//! kept in memory and compared. Without a configured token the routes are open.

use crate::{error::AppError, state::AppState};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};

/// Hex encoded SHA-256 of `token`.
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Admin token middleware function.
///
/// # Headers
///
/// ```text
/// Authorization: Bearer <admin token>
/// ```
///
/// # Returns
///
/// - `Ok(Response)` when no token is configured or the bearer token matches
/// - `Err(AppError::InvalidAdminToken)` otherwise (401)
pub async fn admin_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.admin_token_digest.as_deref() else {
        return Ok(next.run(request).await);
    };

    let presented = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::InvalidAdminToken)?;

    if token_digest(presented) != expected {
        tracing::warn!(path = %request.uri().path(), "rejected admin request with wrong token");
        return Err(AppError::InvalidAdminToken);
    }

    Ok(next.run(request).await)
}
