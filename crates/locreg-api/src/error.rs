//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use locreg_core::StoreError;
use serde::Serialize;

/// JSON body returned for 5xx responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `StoreError` that implements `IntoResponse`.
///
/// Unknown locations become a plain-text 404 with the body
/// `Unknown location: {name}`; anything else is a 500 carrying `ErrorBody`.
#[derive(Debug)]
pub struct ApiError(pub StoreError);

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            StoreError::UnknownLocation(name) => {
                (StatusCode::NOT_FOUND, format!("Unknown location: {name}")).into_response()
            }
            err @ StoreError::CorruptState(_) => {
                tracing::error!(error = %err, "persisted state is corrupt");
                internal("corrupt_state", &err)
            }
            err @ StoreError::StorageUnavailable(_) => {
                tracing::error!(error = %err, "storage backend unavailable");
                internal("storage_unavailable", &err)
            }
        }
    }
}

fn internal(code: &'static str, err: &StoreError) -> Response {
    let body = ErrorBody {
        error: code,
        message: err.to_string(),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
