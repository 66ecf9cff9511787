use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::Value;

use super::{FetchError, SyncError};

impl IntoResponse for SyncError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match &self {
            SyncError::Fetch(FetchError::Status { .. } | FetchError::Http(_)) => (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "Upstream service error.",
            ),
            SyncError::Fetch(_) => (
                StatusCode::BAD_GATEWAY,
                "BAD_UPSTREAM_PAYLOAD",
                "Failed to read upstream catalog data.",
            ),
            SyncError::MalformedRecord { .. } => (
                StatusCode::BAD_GATEWAY,
                "MALFORMED_RECORD",
                "Upstream catalog contains a malformed record.",
            ),
            SyncError::CursorMoved { .. } => (
                StatusCode::CONFLICT,
                "SYNC_CONFLICT",
                "Another sync pass advanced the catalog version.",
            ),
            SyncError::Config(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SYNC_DISABLED",
                "Synchronization is not configured.",
            ),
            SyncError::Apply { .. }
            | SyncError::Database(_)
            | SyncError::Actor(_)
            | SyncError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal server error occurred.",
            ),
        };
        let details = match &self {
            SyncError::MalformedRecord { entity, reason } => {
                Some(serde_json::json!({ "entity": entity, "reason": reason }))
            }
            _ => None,
        };
        let body = ApiErrorObject {
            code: code.to_string(),
            message: message.to_string(),
            details,
        };
        (status, Json(ApiErrorBody { inner: body })).into_response()
    }
}

/// Standardized API error response payload.
#[derive(Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}
