#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use http_body_util::BodyExt;
use nexus_backend::config::AppConfig;
use nexus_backend::infrastructure::database;
use nexus_backend::services::storage::LocalStorageService;
use nexus_backend::{AppState, create_app};
use sea_orm::Database;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const PASSWORD: &str = "password123";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    uploads: TempDir,
    exports: TempDir,
}

impl TestApp {
    pub fn uploads_dir(&self) -> PathBuf {
        self.uploads.path().to_path_buf()
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.exports.path().to_path_buf()
    }
}

pub async fn setup_test_db() -> sea_orm::DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    database::run_migrations(&db).await.unwrap();
    db
}

pub async fn setup_app() -> TestApp {
    setup_app_with(AppConfig::development()).await
}

pub async fn setup_app_with(config: AppConfig) -> TestApp {
    let db = setup_test_db().await;
    let uploads = tempfile::tempdir().unwrap();
    let exports = tempfile::tempdir().unwrap();

    let state = AppState {
        db,
        attachments: Arc::new(LocalStorageService::new(uploads.path())),
        exports: Arc::new(LocalStorageService::new(exports.path())),
        config,
    };

    TestApp {
        app: create_app(state.clone()),
        state,
        uploads,
        exports,
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

pub fn multipart_request(
    uri: &str,
    token: &str,
    field: &str,
    filename: &str,
    content: &[u8],
) -> Request<Body> {
    let boundary = "---------------------------123456789012345678901234567";
    let mut body = format!(
        "--{boundary}\r\n\
        Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
        Content-Type: application/octet-stream\r\n\r\n",
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token))
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn send_multipart(
    app: &Router,
    uri: &str,
    token: &str,
    field: &str,
    filename: &str,
    content: &[u8],
) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(multipart_request(uri, token, field, filename, content))
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

/// Registers `username` (email `<username>@example.com`) and logs in.
/// Returns the user id and a bearer token.
pub async fn register_and_login(app: &Router, username: &str) -> (i32, String) {
    let email = format!("{}@example.com", username);

    let (status, body) = send(
        app,
        "POST",
        "/api/register",
        None,
        Some(json!({"username": username, "email": email, "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    let (status, body) = send(
        app,
        "POST",
        "/api/login",
        None,
        Some(json!({"email": email, "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);

    let id = body["user"]["id"].as_i64().unwrap() as i32;
    let token = body["token"].as_str().unwrap().to_string();
    (id, token)
}

pub async fn create_document(app: &Router, token: &str, title: &str, content: &str) -> i32 {
    let (status, body) = send(
        app,
        "POST",
        "/api/documents",
        Some(token),
        Some(json!({"title": title, "content": content})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
    body["id"].as_i64().unwrap() as i32
}

pub async fn share(
    app: &Router,
    token: &str,
    document_id: i32,
    email: &str,
    permission: &str,
) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        &format!("/api/documents/{}/share", document_id),
        Some(token),
        Some(json!({"email": email, "permission": permission})),
    )
    .await
}
