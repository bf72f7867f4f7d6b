//! Route handlers.
//!
//! By the time `collect` or `recent_logs` runs, the origin guard, rate
//! limiter and authenticator have already admitted the request.

use std::sync::atomic::Ordering;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::http::request::request_id;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::ingest::{validate_payload, CookieRecord};
use crate::observability::metrics;
use crate::resilience::with_deadline;

pub const LIVENESS_TEXT: &str = "cookie-collector is running";

/// Body of a successful `POST /collect`.
#[derive(Debug, Serialize)]
pub struct CollectResponse {
    pub success: bool,
    pub count: usize,
    pub id: String,
}

pub async fn liveness() -> &'static str {
    LIVENESS_TEXT
}

/// `GET /health/ready`: 200 when the store answers a ping in time.
///
/// The first successful ping also finishes any store setup that could not
/// run at startup.
pub async fn readiness(State(state): State<AppState>) -> Response {
    match with_deadline(state.storage_timeout(), state.store.ping()).await {
        Ok(()) => {
            if !state.store_prepared.load(Ordering::Acquire) {
                match with_deadline(state.storage_timeout(), state.store.prepare()).await {
                    Ok(()) => state.store_prepared.store(true, Ordering::Release),
                    Err(e) => {
                        tracing::warn!(backend = state.store.backend_name(), error = %e, "Storage setup still pending")
                    }
                }
            }
            (StatusCode::OK, Json(json!({ "status": "ready" }))).into_response()
        }
        Err(e) => {
            tracing::warn!(backend = state.store.backend_name(), error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
                .into_response()
        }
    }
}

/// `POST /collect`: validate, then persist one record.
pub async fn collect(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<CollectResponse>, ApiError> {
    let request_id = request_id(&headers);

    let body = body.map_err(|rejection| {
        metrics::record_rejection("validation");
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            tracing::warn!(request_id = %request_id, "Rejected oversized payload");
            ApiError::PayloadTooLarge
        } else {
            tracing::warn!(request_id = %request_id, error = %rejection, "Failed to read request body");
            ApiError::InvalidPayload(crate::ingest::PayloadError::NotJson)
        }
    })?;

    let record = validate_payload(&body).map_err(|reason| {
        tracing::warn!(request_id = %request_id, reason = %reason, "Rejected invalid payload");
        metrics::record_rejection("validation");
        ApiError::InvalidPayload(reason)
    })?;

    let count = record.cookie_count();
    let site = record.site_identifier.clone();

    let id = with_deadline(state.storage_timeout(), state.store.insert(record))
        .await
        .map_err(|e| {
            tracing::error!(
                request_id = %request_id,
                backend = state.store.backend_name(),
                error = %e,
                "Failed to store cookie record"
            );
            metrics::record_storage_error("insert");
            ApiError::Storage(e)
        })?;

    tracing::info!(request_id = %request_id, site = %site, cookies = count, id = %id, "Stored cookie record");
    metrics::record_stored(count);

    Ok(Json(CollectResponse {
        success: true,
        count,
        id: id.0,
    }))
}

/// `GET /logs`: most recent records, newest first.
pub async fn recent_logs(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<CookieRecord>>, ApiError> {
    let limit = state.config.storage.recent_limit;

    let records = with_deadline(state.storage_timeout(), state.store.recent(limit))
        .await
        .map_err(|e| {
            tracing::error!(
                request_id = %request_id(&headers),
                backend = state.store.backend_name(),
                error = %e,
                "Failed to read recent records"
            );
            metrics::record_storage_error("recent");
            ApiError::Storage(e)
        })?;

    Ok(Json(records))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
