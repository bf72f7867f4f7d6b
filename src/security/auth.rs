//! Shared-secret authentication via the `x-api-key` header.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use constant_time_eq::constant_time_eq;

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Authorized,
    Unauthorized,
}

/// Compare the presented key with the configured secret in constant time.
///
/// Keys outside visible ASCII are refused before any comparison.
pub fn authorize(presented: Option<&HeaderValue>, secret: &str) -> Authorization {
    let Some(Ok(presented)) = presented.map(HeaderValue::to_str) else {
        return Authorization::Unauthorized;
    };

    if !secret.is_empty() && constant_time_eq(presented.as_bytes(), secret.as_bytes()) {
        Authorization::Authorized
    } else {
        Authorization::Unauthorized
    }
}

/// Middleware guarding `/collect` and `/logs`.
pub async fn api_key_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let presented = request.headers().get(API_KEY_HEADER);

    match authorize(presented, &state.config.auth.api_key) {
        Authorization::Authorized => next.run(request).await,
        Authorization::Unauthorized => {
            tracing::warn!(
                path = %request.uri().path(),
                key_present = presented.is_some(),
                "Rejected request with missing or invalid API key"
            );
            metrics::record_rejection("auth");
            ApiError::Unauthorized.into_response()
        }
    }
}
