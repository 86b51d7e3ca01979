//! Request guards: API key check and global rate limiting.

use super::AppState;
use super::error::ApiError;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

/// Header carrying the API key. `Authorization: Bearer <key>` also works.
pub const API_KEY_HEADER: &str = "x-api-key";

fn presented_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(value) = headers.get(API_KEY_HEADER) {
        return value.to_str().ok();
    }
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Constant-time key comparison.
fn key_matches(expected: &str, presented: &str) -> bool {
    bool::from(expected.as_bytes().ct_eq(presented.as_bytes()))
}

/// Rejects `/api` requests without the configured key. No-op when the
/// server runs without a key.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(expected) = state.api_key.as_deref() {
        let authorized = presented_key(request.headers())
            .map(|presented| key_matches(expected, presented))
            .unwrap_or(false);
        if !authorized {
            tracing::warn!(path = %request.uri().path(), "Rejected request without valid API key");
            return ApiError::unauthorized().into_response();
        }
    }
    next.run(request).await
}

/// Applies the process-wide request quota, if one is configured.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(limiter) = state.limiter.as_deref() {
        if limiter.check().is_err() {
            tracing::debug!(path = %request.uri().path(), "Rate limit exceeded");
            return ApiError::too_many_requests().into_response();
        }
    }
    next.run(request).await
}
