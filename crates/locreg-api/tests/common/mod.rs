//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use locreg_api::state::AppState;
use locreg_core::RegistrationRepository;
use locreg_test_support::InMemoryRepository;

/// Build the app router over an in-memory repository.
pub fn build_test_app() -> Router {
    build_app_with(Arc::new(InMemoryRepository::new()))
}

/// Build the app router over a specific repository.
pub fn build_app_with(repository: Arc<dyn RegistrationRepository>) -> Router {
    locreg_api::app(AppState::new(repository))
}

/// Send a GET request and return the status and raw body text.
pub async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Send a POST request with a JSON body and return the status and body text.
pub async fn post_json(app: Router, uri: &str, body: &serde_json::Value) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    send(app, request).await
}

/// Send a DELETE request and return the status and body text.
pub async fn delete(app: Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body_bytes.to_vec()).unwrap())
}
