//! Authentication API Tests
//!
//! Covers the validation surface of the auth endpoints: format and
//! password-strength checks run before any uniqueness query, so these
//! paths never touch the database.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{body_json, unique_email, unique_username, TestApp};

#[tokio::test]
async fn test_sign_up_with_invalid_email_is_rejected() {
    let app = TestApp::new().await;
    let body = json!({
        "first_name": "Jack",
        "last_name": "Bourne",
        "username": unique_username(),
        "email": "not-an-email",
        "password": "Passw0rd"
    });

    let response = app
        .post_json("/api/v1/auth/sign-up", &body.to_string())
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn test_sign_up_with_short_password_is_rejected() {
    let app = TestApp::new().await;
    let body = json!({
        "first_name": "Jack",
        "last_name": "Bourne",
        "username": unique_username(),
        "email": unique_email(),
        "password": "Pw0"
    });

    let response = app
        .post_json("/api/v1/auth/sign-up", &body.to_string())
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_sign_up_with_weak_password_is_rejected() {
    let app = TestApp::new().await;

    for password in ["password1", "PASSWORD1", "Password"] {
        let body = json!({
            "first_name": "Jack",
            "last_name": "Bourne",
            "username": unique_username(),
            "email": unique_email(),
            "password": password
        });

        let response = app
            .post_json("/api/v1/auth/sign-up", &body.to_string())
            .await;

        assert_eq!(
            response.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "password {:?} should be rejected",
            password
        );
    }
}

#[tokio::test]
async fn test_sign_in_with_empty_login_is_rejected() {
    let app = TestApp::new().await;
    let body = json!({ "login": "", "password": "Passw0rd" });

    let response = app
        .post_json("/api/v1/auth/sign-in", &body.to_string())
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_refresh_without_header_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app.post_json("/api/v1/auth/refresh", "{}").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["code"], 10003);
}

#[tokio::test]
async fn test_logout_without_header_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app.post_json("/api/v1/auth/logout", "{}").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_error_envelope_carries_code_and_message() {
    let app = TestApp::new().await;
    let body = json!({
        "first_name": "Jack",
        "last_name": "Bourne",
        "username": unique_username(),
        "email": "broken",
        "password": "Passw0rd"
    });

    let response = app
        .post_json("/api/v1/auth/sign-up", &body.to_string())
        .await;
    let body = body_json(response).await;

    assert_eq!(body["status"], "error");
    assert!(body["code"].is_u64());
    assert!(body["message"].is_string());
}
