mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{create_document, register_and_login, send, send_multipart, setup_app, setup_app_with, share};
use http_body_util::BodyExt;
use nexus_backend::config::AppConfig;
use nexus_backend::entities::{attachments, prelude::Attachments};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use tower::ServiceExt;

fn stored_files(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[tokio::test]
async fn test_upload_list_download() {
    let t = setup_app().await;
    let (_, owner) = register_and_login(&t.app, "owner").await;
    let (_, reader) = register_and_login(&t.app, "reader").await;
    let doc_id = create_document(&t.app, &owner, "Report", "see attached").await;
    share(&t.app, &owner, doc_id, "reader@example.com", "read").await;
    let base = format!("/api/documents/{}/attachments", doc_id);

    // 1. Upload
    let content = b"quarterly numbers";
    let (status, body) = send_multipart(&t.app, &base, &owner, "file", "report.txt", content).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["filename"], "report.txt");
    assert_eq!(body["size"], content.len());
    let attachment_id = body["id"].as_i64().unwrap();
    assert_eq!(stored_files(&t.uploads_dir()), 1);

    // 2. Readers can list but not upload
    let (status, body) = send(&t.app, "GET", &base, Some(&reader), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send_multipart(&t.app, &base, &reader, "file", "x.txt", b"x").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // 3. Download
    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("{}/{}", base, attachment_id))
                .header("Authorization", format!("Bearer {}", reader))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers().get(header::CONTENT_DISPOSITION).unwrap();
    assert!(disposition.to_str().unwrap().contains("report.txt"));
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], content);

    // 4. Unknown attachment
    let (status, _) = send(&t.app, "GET", &format!("{}/9999", base), Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_filename_is_sanitized() {
    let t = setup_app().await;
    let (_, owner) = register_and_login(&t.app, "owner").await;
    let doc_id = create_document(&t.app, &owner, "Doc", "").await;

    let (status, body) = send_multipart(
        &t.app,
        &format!("/api/documents/{}/attachments", doc_id),
        &owner,
        "file",
        "../../etc/pass?wd",
        b"data",
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["filename"], "pass_wd");
}

#[tokio::test]
async fn test_oversized_upload_rejected() {
    let config = AppConfig {
        max_upload_size: 16,
        ..AppConfig::development()
    };
    let t = setup_app_with(config).await;
    let (_, owner) = register_and_login(&t.app, "owner").await;
    let doc_id = create_document(&t.app, &owner, "Doc", "").await;

    let (status, _) = send_multipart(
        &t.app,
        &format!("/api/documents/{}/attachments", doc_id),
        &owner,
        "file",
        "big.bin",
        &[7u8; 64],
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(stored_files(&t.uploads_dir()), 0);
}

#[tokio::test]
async fn test_document_delete_removes_attachments() {
    let t = setup_app().await;
    let (_, owner) = register_and_login(&t.app, "owner").await;
    let doc_id = create_document(&t.app, &owner, "Doomed", "bye").await;
    let base = format!("/api/documents/{}/attachments", doc_id);

    let (_, first) = send_multipart(&t.app, &base, &owner, "file", "a.txt", b"aaa").await;
    send_multipart(&t.app, &base, &owner, "file", "b.txt", b"bbb").await;
    assert_eq!(stored_files(&t.uploads_dir()), 2);

    let (status, _) = send(&t.app, "DELETE", &format!("/api/documents/{}", doc_id), Some(&owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let remaining = Attachments::find()
        .filter(attachments::Column::DocumentId.eq(doc_id))
        .count(&t.state.db)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
    assert_eq!(stored_files(&t.uploads_dir()), 0);

    let (status, _) = send(&t.app, "GET", &format!("{}/{}", base, first["id"]), Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&t.app, "GET", &format!("/api/documents/{}", doc_id), Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_single_attachment() {
    let t = setup_app().await;
    let (_, owner) = register_and_login(&t.app, "owner").await;
    let doc_id = create_document(&t.app, &owner, "Doc", "").await;
    let base = format!("/api/documents/{}/attachments", doc_id);

    let (_, body) = send_multipart(&t.app, &base, &owner, "file", "a.txt", b"aaa").await;
    let uri = format!("{}/{}", base, body["id"]);

    let (status, _) = send(&t.app, "DELETE", &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(stored_files(&t.uploads_dir()), 0);

    let (status, _) = send(&t.app, "GET", &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
