mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{register_and_login, send, send_multipart, setup_app};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

#[tokio::test]
async fn test_export_then_import_creates_owned_copy() {
    let t = setup_app().await;
    let (_, alice) = register_and_login(&t.app, "alice").await;
    let (bob_id, bob) = register_and_login(&t.app, "bob").await;

    // 1. Alice writes a tagged, public document and edits it once
    let (status, body) = send(
        &t.app,
        "POST",
        "/api/documents",
        Some(&alice),
        Some(json!({
            "title": "Recipe",
            "content": "flour",
            "is_public": true,
            "tags": ["cooking", "baking"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let doc_id = body["id"].as_i64().unwrap();

    let (status, _) = send(
        &t.app,
        "PUT",
        &format!("/api/documents/{}", doc_id),
        Some(&alice),
        Some(json!({"content": "flour and water"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // 2. Bob exports it (public read is enough)
    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/documents/{}/export", doc_id))
                .header("Authorization", format!("Bearer {}", bob))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains(&format!("document_{}.json", doc_id)));

    let exported = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&exported).unwrap();
    assert_eq!(json["title"], "Recipe");
    assert_eq!(json["versions"].as_array().unwrap().len(), 1);
    assert_eq!(json["versions"][0]["content"], "flour");

    // A copy lands in the export directory
    assert!(t.exports_dir().join(format!("document_{}.json", doc_id)).exists());

    // 3. Bob imports it
    let (status, body) = send_multipart(
        &t.app,
        "/api/documents/import",
        &bob,
        "document",
        "recipe.json",
        &exported,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let new_id = body["id"].as_i64().unwrap();
    assert_ne!(new_id, doc_id);
    assert_eq!(body["owner_id"], bob_id);
    assert_eq!(body["title"], "Recipe");
    assert_eq!(body["content"], "flour and water");
    assert!(body["folder_id"].is_null());

    // 4. The copy carries the same tags and history
    let (status, body) = send(&t.app, "GET", &format!("/api/documents/{}", new_id), Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["access"], "owner");
    assert_eq!(body["tags"], json!(["baking", "cooking"]));

    let (_, body) = send(
        &t.app,
        "GET",
        &format!("/api/documents/{}/versions", new_id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["content"], "flour");
}

#[tokio::test]
async fn test_import_rejects_malformed_files() {
    let t = setup_app().await;
    let (_, token) = register_and_login(&t.app, "alice").await;

    let (status, _) = send_multipart(&t.app, "/api/documents/import", &token, "file", "bad.json", b"{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_multipart(
        &t.app,
        "/api/documents/import",
        &token,
        "file",
        "untitled.json",
        br#"{"title": "  ", "content": "x"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&t.app, "GET", "/api/documents", Some(&token), None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_export_requires_read_access() {
    let t = setup_app().await;
    let (_, alice) = register_and_login(&t.app, "alice").await;
    let (_, bob) = register_and_login(&t.app, "bob").await;
    let doc_id = common::create_document(&t.app, &alice, "Private", "x").await;

    let (status, _) = send(&t.app, "GET", &format!("/api/documents/{}/export", doc_id), Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
