//! Origin guard (CORS).
//!
//! Browser requests carrying an `Origin` header are admitted only from the
//! configured origin; any other origin is refused with 403 before the
//! request reaches rate limiting or authentication. Requests without
//! `Origin` (background workers, operator tooling) pass through untouched.
//!
//! CORS headers and preflight answers for the admitted origin come from
//! [`cors_layer`], which sits just inside the guard.

use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::CorsConfig;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::auth::API_KEY_HEADER;

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(600);

/// Result of comparing a request's `Origin` with the allowed origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginCheck {
    /// No `Origin` header.
    Absent,
    Allowed,
    Denied,
}

/// Byte-exact comparison; browsers send origins already serialized.
pub fn check_origin(headers: &HeaderMap, allowed: Option<&str>) -> OriginCheck {
    let Some(origin) = headers.get(header::ORIGIN) else {
        return OriginCheck::Absent;
    };

    match allowed {
        Some(allowed) if origin.as_bytes() == allowed.as_bytes() => OriginCheck::Allowed,
        _ => OriginCheck::Denied,
    }
}

/// CORS for the single allowed origin. Preflights are answered here and
/// never reach the rate limiter or authenticator.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)])
        .max_age(PREFLIGHT_MAX_AGE);

    match config
        .normalized_origin()
        .and_then(|origin| HeaderValue::from_str(origin).ok())
    {
        Some(origin) => layer.allow_origin(AllowOrigin::exact(origin)),
        None => layer,
    }
}

/// Middleware: first stage of the pipeline.
pub async fn origin_guard_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match check_origin(request.headers(), state.config.cors.normalized_origin()) {
        OriginCheck::Absent | OriginCheck::Allowed => next.run(request).await,
        OriginCheck::Denied => {
            tracing::warn!(
                origin = ?request.headers().get(header::ORIGIN),
                method = %request.method(),
                path = %request.uri().path(),
                "Request from disallowed origin"
            );
            metrics::record_rejection("origin");
            ApiError::Forbidden.into_response()
        }
    }
}
