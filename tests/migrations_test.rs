mod common;

use chrono::Utc;
use common::setup_test_db;
use nexus_backend::entities::sea_orm_active_enums::SharePermission;
use nexus_backend::entities::{documents, shares, users};
use nexus_backend::infrastructure::database;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let db = setup_test_db().await;
    database::run_migrations(&db).await.unwrap();
}

#[tokio::test]
async fn test_unique_share_index_failure_is_fatal() {
    let db = setup_test_db().await;
    let now = Utc::now();

    let owner = users::ActiveModel {
        username: Set("owner".to_string()),
        email: Set("owner@example.com".to_string()),
        password_hash: Set("x".to_string()),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();
    let grantee = users::ActiveModel {
        username: Set("grantee".to_string()),
        email: Set("grantee@example.com".to_string()),
        password_hash: Set("x".to_string()),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();
    let doc = documents::ActiveModel {
        title: Set("Doc".to_string()),
        content: Set(String::new()),
        owner_id: Set(owner.id),
        folder_id: Set(None),
        is_public: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();

    // Without the index, duplicates can slip in; rebuilding it must then fail
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "DROP INDEX idx_shares_document_user".to_owned(),
    ))
    .await
    .unwrap();

    for _ in 0..2 {
        shares::ActiveModel {
            document_id: Set(doc.id),
            user_id: Set(grantee.id),
            permission: Set(SharePermission::Read),
            created_by_id: Set(owner.id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
    }

    assert!(database::run_migrations(&db).await.is_err());
}
