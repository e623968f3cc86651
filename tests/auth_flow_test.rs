mod common;

use axum::http::StatusCode;
use common::{PASSWORD, register_and_login, send, setup_app};
use nexus_backend::utils::auth::validate_jwt;
use serde_json::json;

#[tokio::test]
async fn test_register_login_and_me() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let t = setup_app().await;

    // 1. Register and login
    let (id, token) = register_and_login(&t.app, "alice").await;

    // 2. Token decodes to the registered user
    let claims = validate_jwt(&token, &t.state.config.jwt_secret).unwrap();
    assert_eq!(claims.id, id);
    assert_eq!(claims.username, "alice");

    // 3. Current user
    let (status, body) = send(&t.app, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["email"], "alice@example.com");
    assert!(body.get("password_hash").is_none());

    // 4. Refresh issues a token for the same user
    let (status, body) = send(&t.app, "POST", "/api/refresh", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let refreshed = validate_jwt(body["token"].as_str().unwrap(), &t.state.config.jwt_secret).unwrap();
    assert_eq!(refreshed.id, id);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let t = setup_app().await;
    register_and_login(&t.app, "alice").await;

    let (status, _) = send(
        &t.app,
        "POST",
        "/api/register",
        None,
        Some(json!({"username": "alice", "email": "other@example.com", "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &t.app,
        "POST",
        "/api/register",
        None,
        Some(json!({"username": "alice2", "email": "alice@example.com", "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invalid_registration_rejected() {
    let t = setup_app().await;

    let (status, _) = send(
        &t.app,
        "POST",
        "/api/register",
        None,
        Some(json!({"username": "bob", "email": "not-an-email", "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &t.app,
        "POST",
        "/api/register",
        None,
        Some(json!({"username": "bob", "email": "bob@example.com", "password": "123"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wrong_password_unauthorized() {
    let t = setup_app().await;
    register_and_login(&t.app, "alice").await;

    let (status, body) = send(
        &t.app,
        "POST",
        "/api/login",
        None,
        Some(json!({"email": "alice@example.com", "password": "wrong-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &t.app,
        "POST",
        "/api/login",
        None,
        Some(json!({"email": "nobody@example.com", "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let t = setup_app().await;

    let (status, _) = send(&t.app, "GET", "/api/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&t.app, "GET", "/api/documents", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&t.app, "GET", "/api/documents/1", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&t.app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_openapi_document_lists_nested_routes() {
    let t = setup_app().await;

    let (status, body) = send(&t.app, "GET", "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let paths = body["paths"].as_object().unwrap();
    for path in [
        "/api/documents/{id}",
        "/api/documents/{id}/versions/{version_id}",
        "/api/documents/{id}/attachments/{attachment_id}",
        "/api/documents/{id}/comments/{comment_id}",
        "/api/documents/{id}/collaborators/{user_id}",
        "/api/documents/{id}/tags/{tag_id}",
    ] {
        assert!(paths.contains_key(path), "missing {}", path);
    }
    assert!(body["components"]["securitySchemes"]["jwt"].is_object());
}
