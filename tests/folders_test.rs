mod common;

use axum::http::StatusCode;
use common::{register_and_login, send, setup_app};
use serde_json::{Value, json};

async fn create_folder(app: &axum::Router, token: &str, name: &str, parent: Option<i64>) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/folders",
        Some(token),
        Some(json!({"name": name, "parent_id": parent})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().unwrap()
}

fn find(list: &Value, id: i64) -> &Value {
    list.as_array()
        .unwrap()
        .iter()
        .find(|f| f["id"] == id)
        .unwrap()
}

#[tokio::test]
async fn test_folder_cycles_rejected() {
    let t = setup_app().await;
    let (_, token) = register_and_login(&t.app, "alice").await;

    let a = create_folder(&t.app, &token, "a", None).await;
    let b = create_folder(&t.app, &token, "b", Some(a)).await;
    let c = create_folder(&t.app, &token, "c", Some(b)).await;

    // a under c would loop a -> b -> c -> a
    let (status, _) = send(&t.app, "PUT", &format!("/api/folders/{}", a), Some(&token), Some(json!({"parent_id": c}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&t.app, "PUT", &format!("/api/folders/{}", b), Some(&token), Some(json!({"parent_id": b}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Moving c to the root is fine
    let (status, body) = send(&t.app, "PUT", &format!("/api/folders/{}", c), Some(&token), Some(json!({"parent_id": null}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["parent_id"].is_null());

    // Rename leaves the parent alone
    let (status, body) = send(&t.app, "PUT", &format!("/api/folders/{}", b), Some(&token), Some(json!({"name": "renamed"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "renamed");
    assert_eq!(body["parent_id"], a);
}

#[tokio::test]
async fn test_delete_reparents_children_and_documents() {
    let t = setup_app().await;
    let (_, token) = register_and_login(&t.app, "alice").await;

    let root = create_folder(&t.app, &token, "root", None).await;
    let middle = create_folder(&t.app, &token, "middle", Some(root)).await;
    let leaf = create_folder(&t.app, &token, "leaf", Some(middle)).await;

    let (status, body) = send(
        &t.app,
        "POST",
        "/api/documents",
        Some(&token),
        Some(json!({"title": "Filed", "content": "", "folder_id": middle})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let doc_id = body["id"].as_i64().unwrap();

    let (_, body) = send(&t.app, "GET", &format!("/api/folders/{}/documents", middle), Some(&token), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(&t.app, "DELETE", &format!("/api/folders/{}", middle), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, folders) = send(&t.app, "GET", "/api/folders", Some(&token), None).await;
    assert_eq!(folders.as_array().unwrap().len(), 2);
    assert_eq!(find(&folders, leaf)["parent_id"], root);

    let (status, body) = send(&t.app, "GET", &format!("/api/documents/{}", doc_id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["folder_id"].is_null());
}

#[tokio::test]
async fn test_folders_are_private_to_owner() {
    let t = setup_app().await;
    let (_, alice) = register_and_login(&t.app, "alice").await;
    let (_, bob) = register_and_login(&t.app, "bob").await;
    let folder = create_folder(&t.app, &alice, "private", None).await;

    let (status, _) = send(&t.app, "DELETE", &format!("/api/folders/{}", folder), Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Bob cannot file documents into Alice's folder
    let (status, _) = send(
        &t.app,
        "POST",
        "/api/documents",
        Some(&bob),
        Some(json!({"title": "Sneaky", "content": "", "folder_id": folder})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&t.app, "GET", "/api/folders", Some(&bob), None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_folder_names_rejected() {
    let t = setup_app().await;
    let (_, token) = register_and_login(&t.app, "alice").await;

    let (status, _) = send(&t.app, "POST", "/api/folders", Some(&token), Some(json!({"name": "   "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let folder = create_folder(&t.app, &token, "  Reports  ", None).await;
    let (status, _) = send(
        &t.app,
        "PUT",
        &format!("/api/folders/{}", folder),
        Some(&token),
        Some(json!({"name": " \t "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&t.app, "GET", "/api/folders", Some(&token), None).await;
    assert_eq!(find(&body, folder)["name"], "Reports");
}
