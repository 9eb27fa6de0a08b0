//! Registration endpoints.
//!
//! The path's location segment is authoritative: a `locationName` or `id`
//! supplied in a POST body is ignored, and both are assigned by the server.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Deserialize;

use locreg_core::{Location, Registration};

use crate::error::ApiError;
use crate::state::AppState;

/// POST body. Extra fields (`locationName`, `id`) are accepted and ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewRegistration {
    contact_details: String,
}

/// GET /locations/{location}/registrations
async fn list_registrations(
    State(state): State<AppState>,
    Path(location): Path<String>,
) -> Result<Json<Location>, ApiError> {
    let name = location.parse()?;
    let manager = state.repository.read().await?;
    Ok(Json(manager.location(name).clone()))
}

/// POST /locations/{location}/registrations
async fn create_registration(
    State(state): State<AppState>,
    Path(location): Path<String>,
    Json(body): Json<NewRegistration>,
) -> Result<Json<Registration>, ApiError> {
    let created = state
        .repository
        .create_registration(&location, &body.contact_details)
        .await?;
    tracing::info!(location, id = created.id, "created registration");
    Ok(Json(created))
}

/// DELETE /locations/{location}/registrations/{registrationId}
async fn delete_registration(
    State(state): State<AppState>,
    Path((location, registration_id)): Path<(String, i64)>,
) -> Result<StatusCode, ApiError> {
    state
        .repository
        .delete_registration(&location, registration_id)
        .await?;
    tracing::info!(location, id = registration_id, "deleted registration");
    Ok(StatusCode::NO_CONTENT)
}

/// Returns the registrations router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/locations/{location}/registrations",
            get(list_registrations).post(create_registration),
        )
        .route(
            "/locations/{location}/registrations/{registration_id}",
            delete(delete_registration),
        )
}
