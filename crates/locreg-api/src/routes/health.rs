//! Health check endpoint.

use axum::{Router, routing::get};

use crate::state::AppState;

/// GET /checkhealth
async fn check_health() -> &'static str {
    "alive"
}

/// Returns the health check router.
pub fn router() -> Router<AppState> {
    Router::new().route("/checkhealth", get(check_health))
}
