//! Authorization Gate Tests
//!
//! The principal gate never fails a request by itself; the activation
//! gate and handlers reject anonymous or invalid principals downstream.

use axum::http::StatusCode;

use crate::common::{body_json, TestApp};

#[tokio::test]
async fn test_protected_route_without_token_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app.get("/api/v1/rooms").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_garbage_token_is_unauthorized() {
    let app = TestApp::new().await;

    // An unparseable token resolves to an anonymous principal, which the
    // activation gate then rejects
    let response = app.get_auth("/api/v1/rooms", "not-a-jwt").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tweet_mutation_requires_authentication() {
    let app = TestApp::new().await;

    let response = app
        .post_json("/api/v1/tweets", r#"{"text":"hello"}"#)
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_file_upload_requires_authentication() {
    let app = TestApp::new().await;

    let response = app.get("/api/v1/files").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new().await;

    let response = app.get("/api/v1/nope").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unauthorized_error_uses_envelope() {
    let app = TestApp::new().await;

    let response = app.get("/api/v1/rooms").await;
    let body = body_json(response).await;

    assert_eq!(body["status"], "error");
    assert_eq!(body["code"], 10003);
    assert!(body["message"].is_string());
}
