//! Request guards: API key check and global rate limit.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use tracing::warn;

use super::{AppState, error::ApiError};

/// Require `Authorization: Bearer <key>` when an API key is configured.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .unwrap_or_default();

    if bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(next.run(request).await)
    } else {
        warn!(path = %request.uri().path(), "rejected request with bad API key");
        Err(ApiError::Unauthorized)
    }
}

/// Reject requests beyond the configured global rate.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state
        .limiter
        .as_ref()
        .is_some_and(|limiter| limiter.check().is_err())
    {
        return Err(ApiError::RateLimited);
    }
    Ok(next.run(request).await)
}
