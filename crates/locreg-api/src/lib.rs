//! Locreg API — HTTP layer over the registration repository.
//!
//! Thin by design: routing, request/response shapes, and error mapping. All
//! storage semantics live behind [`locreg_core::RegistrationRepository`].

pub mod error;
pub mod routes;
pub mod state;

use axum::Router;

use crate::state::AppState;

/// Builds the application router. Middleware (tracing, CORS) is layered on
/// by `main`; tests call this directly.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::registrations::router())
        .with_state(state)
}
