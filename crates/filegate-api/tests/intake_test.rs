//! Intake API integration tests.
//!
//! Run with: `cargo test -p filegate-api --test intake_test`

mod helpers;

use filegate_services::test_helpers::FakeScanEngine;
use helpers::{bearer, setup_test_app, setup_test_app_with, TEST_SERVICE_KEY};
use serde_json::json;

fn upload_body() -> serde_json::Value {
    json!({
        "subject_id": "s1",
        "path": "p",
        "name": "f.txt",
        "size": 10,
        "content_type": "text/plain"
    })
}

#[tokio::test]
async fn test_clean_upload_is_accepted() {
    let app = setup_test_app(FakeScanEngine::clean());

    let response = app
        .client()
        .post("/intake")
        .add_header("Authorization", bearer("user-1"))
        .json(&upload_body())
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["infected"], false);
    assert_eq!(body["data"]["scanned"], true);
    assert_eq!(body["data"]["uploaded_by"], "user-1");
    assert_eq!(body["data"]["subject_id"], "s1");

    let stored = app.files.all();
    assert_eq!(stored.len(), 1);
    assert_eq!(body["data"]["id"], stored[0].id.to_string());
}

#[tokio::test]
async fn test_infected_upload_is_rejected_but_recorded() {
    let app = setup_test_app(FakeScanEngine::infected(
        "/tmp/upload-scan-x: Eicar-Signature FOUND",
    ));

    let response = app
        .client()
        .post("/intake")
        .add_header("Authorization", bearer("user-1"))
        .json(&upload_body())
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "FILE_INFECTED");
    assert!(body["error"].as_str().unwrap_or("").contains("rejected"));
    assert!(body["scan_output"].as_str().unwrap_or("").contains("FOUND"));

    let stored = app.files.all();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].infected, Some(true));
    assert!(stored[0].scan_output.as_deref().unwrap_or("").contains("FOUND"));
    assert_eq!(body["file_id"], stored[0].id.to_string());
}

#[tokio::test]
async fn test_missing_fields_write_nothing_and_skip_scanner() {
    let app = setup_test_app(FakeScanEngine::clean());

    let response = app
        .client()
        .post("/intake")
        .add_header("Authorization", bearer("user-1"))
        .json(&json!({ "name": "f.txt" }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Missing required fields");
    assert!(app.files.is_empty());
    assert_eq!(app.engine.scan_count(), 0);
    assert_eq!(app.storage.download_count(), 0);
}

#[tokio::test]
async fn test_oversized_declared_size_is_rejected() {
    let app = setup_test_app(FakeScanEngine::clean());
    let mut body = upload_body();
    body["size"] = json!(10 * 1024 * 1024 + 1);

    let response = app
        .client()
        .post("/intake")
        .add_header("Authorization", bearer("user-1"))
        .json(&body)
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "File too large (max 10 MB)");
    assert_eq!(app.storage.download_count(), 0);
}

#[tokio::test]
async fn test_unknown_subject_never_fetches_bytes() {
    let app = setup_test_app(FakeScanEngine::clean());
    let mut body = upload_body();
    body["subject_id"] = json!("missing");

    let response = app
        .client()
        .post("/intake")
        .add_header("Authorization", bearer("user-1"))
        .json(&body)
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Subject not found");
    assert_eq!(app.storage.download_count(), 0);
    assert_eq!(app.engine.scan_count(), 0);
}

#[tokio::test]
async fn test_authentication_is_required() {
    let app = setup_test_app(FakeScanEngine::clean());

    let response = app.client().post("/intake").json(&upload_body()).await;
    assert_eq!(response.status_code(), 401);

    let response = app
        .client()
        .post("/intake")
        .add_header("Authorization", "Bearer not-a-token")
        .json(&upload_body())
        .await;
    assert_eq!(response.status_code(), 401);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "UNAUTHORIZED");

    assert!(app.files.is_empty());
    assert_eq!(app.storage.download_count(), 0);
}

#[tokio::test]
async fn test_service_key_is_accepted() {
    let app = setup_test_app(FakeScanEngine::clean());

    let response = app
        .client()
        .post("/intake")
        .add_header("Authorization", format!("Bearer {}", TEST_SERVICE_KEY))
        .json(&upload_body())
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["uploaded_by"], "service");
}

#[tokio::test]
async fn test_unavailable_scanner_records_skip_when_optional() {
    let app = setup_test_app(FakeScanEngine::unavailable());

    let response = app
        .client()
        .post("/intake")
        .add_header("Authorization", bearer("user-1"))
        .json(&upload_body())
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["infected"], false);
    let output = body["data"]["scan_output"].as_str().unwrap_or("");
    assert!(output.starts_with("skipped"), "scan_output was {:?}", output);
    assert_eq!(app.engine.scan_count(), 0);
}

#[tokio::test]
async fn test_unavailable_scanner_fails_closed_when_required() {
    let app = setup_test_app_with(FakeScanEngine::unavailable(), |config| {
        config.scan.require_scan = true;
    });

    let response = app
        .client()
        .post("/intake")
        .add_header("Authorization", bearer("user-1"))
        .json(&upload_body())
        .await;

    assert_eq!(response.status_code(), 503);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "SCANNER_UNAVAILABLE");
    assert!(app.files.is_empty());
}

#[tokio::test]
async fn test_engine_failure_is_internal_not_infected() {
    let app = setup_test_app(FakeScanEngine::failing("LibClamAV Error: cli_loaddb failed"));

    let response = app
        .client()
        .post("/intake")
        .add_header("Authorization", bearer("user-1"))
        .json(&upload_body())
        .await;

    assert_eq!(response.status_code(), 500);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "SCAN_ENGINE_ERROR");
    assert!(app.files.is_empty());
}

#[tokio::test]
async fn test_gateway_failure_is_internal() {
    let app = setup_test_app(FakeScanEngine::clean());
    app.storage.fail_downloads();

    let response = app
        .client()
        .post("/intake")
        .add_header("Authorization", bearer("user-1"))
        .json(&upload_body())
        .await;

    assert_eq!(response.status_code(), 500);
    assert_eq!(app.engine.scan_count(), 0);
    assert!(app.files.is_empty());
}

#[tokio::test]
async fn test_disallowed_content_type_is_rejected() {
    let app = setup_test_app_with(FakeScanEngine::clean(), |config| {
        config.scan.allowed_content_types = Some(vec!["application/pdf".to_string()]);
    });

    let response = app
        .client()
        .post("/intake")
        .add_header("Authorization", bearer("user-1"))
        .json(&upload_body())
        .await;

    assert_eq!(response.status_code(), 400);
    assert!(app.files.is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_invalid_input() {
    let app = setup_test_app(FakeScanEngine::clean());

    let response = app
        .client()
        .post("/intake")
        .add_header("Authorization", bearer("user-1"))
        .json(&json!({ "subject_id": "s1", "path": "p", "size": "ten" }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_authentication_precedes_body_parsing() {
    let app = setup_test_app(FakeScanEngine::clean());

    let response = app
        .client()
        .post("/intake")
        .json(&json!({ "subject_id": "s1", "path": "p", "size": "ten" }))
        .await;

    assert_eq!(response.status_code(), 401);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert!(body.get("details").map_or(true, |d| !d.to_string().contains("size")));
    assert!(app.files.is_empty());
}
