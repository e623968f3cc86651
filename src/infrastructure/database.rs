use crate::entities::{
    attachments, collaborations, comments, document_tags, documents, favorites, folders,
    notifications, recent_documents, shares, tags, users, versions,
};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema, Statement};
use std::time::Duration;
use tracing::info;

pub async fn setup_database(db_url: &str) -> anyhow::Result<DatabaseConnection> {
    info!("📂 Database: {}", db_url);

    let mut opt = ConnectOptions::new(db_url);
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;

    Ok(db)
}

pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    info!("🔄 Running auto-migrations...");

    // Order matters for foreign keys: users -> folders -> documents -> dependents
    let stmts = vec![
        (
            "users",
            schema
                .create_table_from_entity(users::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "folders",
            schema
                .create_table_from_entity(folders::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "documents",
            schema
                .create_table_from_entity(documents::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "tags",
            schema
                .create_table_from_entity(tags::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "document_tags",
            schema
                .create_table_from_entity(document_tags::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "versions",
            schema
                .create_table_from_entity(versions::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "attachments",
            schema
                .create_table_from_entity(attachments::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "shares",
            schema
                .create_table_from_entity(shares::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "collaborations",
            schema
                .create_table_from_entity(collaborations::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "comments",
            schema
                .create_table_from_entity(comments::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "notifications",
            schema
                .create_table_from_entity(notifications::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "favorites",
            schema
                .create_table_from_entity(favorites::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "recent_documents",
            schema
                .create_table_from_entity(recent_documents::Entity)
                .if_not_exists()
                .to_owned(),
        ),
    ];

    for (name, stmt) in stmts {
        let stmt = builder.build(&stmt);
        match db.execute(stmt).await {
            Ok(_) => info!("   - Table '{}' checked/created", name),
            Err(e) => {
                tracing::error!("   - Failed to create table '{}': {}", name, e);
                return Err(e.into());
            }
        }
    }

    info!("🔄 Checking indexes...");

    let unique_indexes = [
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_shares_document_user ON shares(document_id, user_id)",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_collaborations_document_user ON collaborations(document_id, user_id)",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_tags_owner_name ON tags(owner_id, name)",
    ];

    for query in unique_indexes {
        match db
            .execute(Statement::from_string(builder, query.to_owned()))
            .await
        {
            Ok(_) => info!("   - Executed: {}", query),
            Err(e) => {
                tracing::error!("   - Failed to create unique index: {} -> {}", query, e);
                return Err(e.into());
            }
        }
    }

    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_documents_owner_id ON documents(owner_id)",
        "CREATE INDEX IF NOT EXISTS idx_documents_folder_id ON documents(folder_id)",
        "CREATE INDEX IF NOT EXISTS idx_versions_document_id ON versions(document_id)",
        "CREATE INDEX IF NOT EXISTS idx_attachments_document_id ON attachments(document_id)",
        "CREATE INDEX IF NOT EXISTS idx_comments_document_id ON comments(document_id)",
        "CREATE INDEX IF NOT EXISTS idx_notifications_user_id ON notifications(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_recent_documents_user_access ON recent_documents(user_id, last_access)",
    ];

    for query in indexes {
        match db
            .execute(Statement::from_string(builder, query.to_owned()))
            .await
        {
            Ok(_) => info!("   - Executed: {}", query),
            Err(e) => tracing::warn!("   - Index warning: {} -> {}", query, e),
        }
    }

    Ok(())
}
