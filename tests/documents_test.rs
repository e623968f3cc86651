mod common;

use axum::http::StatusCode;
use common::{create_document, register_and_login, send, setup_app, share};
use serde_json::json;

#[tokio::test]
async fn test_document_crud_and_versions() {
    let t = setup_app().await;
    let (owner_id, token) = register_and_login(&t.app, "alice").await;

    // 1. Create
    let doc_id = create_document(&t.app, &token, "  Draft  ", "first").await;
    let base = format!("/api/documents/{}", doc_id);

    let (status, body) = send(&t.app, "GET", &base, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Draft");
    assert_eq!(body["owner_id"], owner_id);

    // 2. A content edit snapshots the previous content
    let (status, body) = send(&t.app, "PUT", &base, Some(&token), Some(json!({"content": "second"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "second");

    // A title-only edit does not
    let (status, _) = send(&t.app, "PUT", &base, Some(&token), Some(json!({"title": "Final"}))).await;
    assert_eq!(status, StatusCode::OK);

    // 3. Manual snapshot of the current content
    let (status, body) = send(
        &t.app,
        "POST",
        &format!("{}/versions", base),
        Some(&token),
        Some(json!({"change_log": "milestone"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["content"], "second");

    let (status, body) = send(&t.app, "GET", &format!("{}/versions", base), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let versions = body.as_array().unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0]["change_log"], "milestone");
    assert_eq!(versions[1]["content"], "first");
    assert_eq!(versions[1]["change_log"], "Auto-saved before update");

    let version_id = versions[1]["id"].as_i64().unwrap();
    let (status, body) = send(&t.app, "GET", &format!("{}/versions/{}", base, version_id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "first");

    let (status, _) = send(&t.app, "GET", &format!("{}/versions/9999", base), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // 4. Listing and delete
    let (_, body) = send(&t.app, "GET", "/api/documents", Some(&token), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(&t.app, "DELETE", &base, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&t.app, "GET", &base, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_validation() {
    let t = setup_app().await;
    let (_, token) = register_and_login(&t.app, "alice").await;

    let (status, _) = send(
        &t.app,
        "POST",
        "/api/documents",
        Some(&token),
        Some(json!({"title": "", "content": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_only_managers_change_visibility() {
    let t = setup_app().await;
    let (_, owner) = register_and_login(&t.app, "owner").await;
    let (_, writer) = register_and_login(&t.app, "writer").await;
    let doc_id = create_document(&t.app, &owner, "Doc", "").await;
    share(&t.app, &owner, doc_id, "writer@example.com", "write").await;
    let base = format!("/api/documents/{}", doc_id);

    let (status, _) = send(&t.app, "PUT", &base, Some(&writer), Some(json!({"is_public": true}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&t.app, "PUT", &base, Some(&owner), Some(json!({"is_public": true}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_public"], true);
}

#[tokio::test]
async fn test_search_covers_readable_documents_only() {
    let t = setup_app().await;
    let (_, alice) = register_and_login(&t.app, "alice").await;
    let (_, bob) = register_and_login(&t.app, "bob").await;

    create_document(&t.app, &alice, "Garden plan", "tomatoes").await;
    let shared = create_document(&t.app, &alice, "Shared garden", "peppers").await;
    create_document(&t.app, &bob, "Bob notes", "tomatoes too").await;
    share(&t.app, &alice, shared, "bob@example.com", "read").await;

    let (status, body) = send(&t.app, "GET", "/api/documents/search?q=garden", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], shared);

    let (_, body) = send(&t.app, "GET", "/api/documents/search?q=tomatoes", Some(&alice), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(&t.app, "GET", "/api/documents/search?q=", Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tags() {
    let t = setup_app().await;
    let (_, alice) = register_and_login(&t.app, "alice").await;
    let (_, bob) = register_and_login(&t.app, "bob").await;
    let doc_id = create_document(&t.app, &alice, "Tagged", "").await;
    let base = format!("/api/documents/{}", doc_id);

    // 1. Replace the tag set, duplicates collapse
    let (status, body) = send(
        &t.app,
        "PUT",
        &format!("{}/tags", base),
        Some(&alice),
        Some(json!({"tags": ["work", " urgent ", "work"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["urgent", "work"]);
    let urgent_id = body[0]["id"].as_i64().unwrap();

    // 2. Explicit tag creation conflicts on an existing name
    let (status, _) = send(&t.app, "POST", "/api/tags", Some(&alice), Some(json!({"name": "work"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = send(&t.app, "GET", "/api/tags", Some(&alice), None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    // 3. Search by tag respects access
    let (_, body) = send(&t.app, "GET", "/api/tags/search?tag=work", Some(&alice), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    let (_, body) = send(&t.app, "GET", "/api/tags/search?tag=work", Some(&bob), None).await;
    assert!(body.as_array().unwrap().is_empty());

    // 4. Detach
    let (status, _) = send(&t.app, "DELETE", &format!("{}/tags/{}", base, urgent_id), Some(&alice), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&t.app, "DELETE", &format!("{}/tags/{}", base, urgent_id), Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&t.app, "GET", &base, Some(&alice), None).await;
    assert_eq!(body["tags"], json!(["work"]));
}
