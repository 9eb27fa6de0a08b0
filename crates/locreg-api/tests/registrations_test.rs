//! Integration tests for the registration endpoints.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;

use locreg_core::RegistrationRepository as _;
use locreg_store::FileRepository;
use locreg_test_support::FailingRepository;

#[tokio::test]
async fn test_get_known_location_returns_the_location_object() {
    let app = common::build_test_app();

    let (status, body) = common::get(app, "/locations/bergen/registrations").await;

    assert_eq!(status, StatusCode::OK);
    let location: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(location["locationName"], "bergen");
    assert_eq!(location["latitude"], 60.3911838);
    assert_eq!(location["longitude"], 5.3255599);
    assert!(location["registrations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_unknown_location_returns_404_with_plain_body() {
    let app = common::build_test_app();

    let (status, body) = common::get(app, "/locations/narvik/registrations").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Unknown location: narvik");
}

#[tokio::test]
async fn test_post_creates_a_registration_with_server_assigned_fields() {
    let app = common::build_test_app();

    let (status, body) = common::post_json(
        app,
        "/locations/oslo/registrations",
        &json!({"contactDetails": "a@x.no"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let registration: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(registration["contactDetails"], "a@x.no");
    assert_eq!(registration["locationName"], "oslo");
    assert_eq!(registration["id"], 0);
}

#[tokio::test]
async fn test_post_ignores_client_supplied_id_and_location_name() {
    let app = common::build_test_app();

    let (status, body) = common::post_json(
        app,
        "/locations/oslo/registrations",
        &json!({"contactDetails": "a@x.no", "locationName": "bergen", "id": 99}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let registration: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(registration["locationName"], "oslo");
    assert_eq!(registration["id"], 0);
}

#[tokio::test]
async fn test_post_to_unknown_location_returns_404() {
    let app = common::build_test_app();

    let (status, body) = common::post_json(
        app,
        "/locations/narvik/registrations",
        &json!({"contactDetails": "x@x.no"}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Unknown location: narvik");
}

#[tokio::test]
async fn test_delete_removes_the_registration_and_is_idempotent() {
    let repository = Arc::new(locreg_test_support::InMemoryRepository::new());
    repository
        .create_registration("bergen", "a@x.no")
        .await
        .unwrap();

    let app = common::build_app_with(repository.clone());
    let (status, _) = common::delete(app, "/locations/bergen/registrations/0").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Deleting again is a no-op, not an error.
    let app = common::build_app_with(repository.clone());
    let (status, _) = common::delete(app, "/locations/bergen/registrations/0").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let app = common::build_app_with(repository);
    let (_, body) = common::get(app, "/locations/bergen/registrations").await;
    let location: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(location["registrations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_on_unknown_location_returns_404() {
    let app = common::build_test_app();

    let (status, body) = common::delete(app, "/locations/narvik/registrations/0").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Unknown location: narvik");
}

#[tokio::test]
async fn test_storage_failure_surfaces_as_500_with_error_body() {
    let app = common::build_app_with(Arc::new(FailingRepository));

    let (status, body) = common::get(app, "/locations/bergen/registrations").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(error["error"], "storage_unavailable");
}

#[tokio::test]
async fn test_full_scenario_against_the_file_backend() {
    let dir = tempfile::TempDir::new().unwrap();
    let repository = Arc::new(FileRepository::new(dir.path().join("storage.json")));

    let app = common::build_app_with(repository.clone());
    let (status, body) = common::post_json(
        app,
        "/locations/bergen/registrations",
        &json!({"contactDetails": "a@x.no"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let first: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(first["id"], 0);

    let app = common::build_app_with(repository.clone());
    let (_, body) = common::post_json(
        app,
        "/locations/oslo/registrations",
        &json!({"contactDetails": "b@x.no"}),
    )
    .await;
    let second: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(second["id"], 1);

    let app = common::build_app_with(repository.clone());
    let (_, body) = common::get(app, "/locations/bergen/registrations").await;
    let bergen: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(bergen["registrations"].as_array().unwrap().len(), 1);

    // The aggregate on disk carries both registrations and the counter.
    let manager = repository.read().await.unwrap();
    assert_eq!(manager.registration_count, 2);
    assert_eq!(manager.oslo.registrations.len(), 1);
    assert!(manager.trondheim.registrations.is_empty());
}
