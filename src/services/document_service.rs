use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::access::{self, Capability, DocumentContext};
use crate::services::folder_service::FolderService;
use crate::services::storage::StorageService;
use crate::services::tag_service::TagService;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

pub const AUTO_SNAPSHOT_LOG: &str = "Auto-saved before update";

#[derive(Debug, Default)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    pub folder_id: Option<i32>,
    pub is_public: bool,
    pub tags: Vec<String>,
}

/// Partial update; `folder_id` of `Some(None)` moves the document to the root.
#[derive(Debug, Default)]
pub struct DocumentChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub folder_id: Option<Option<i32>>,
    pub is_public: Option<bool>,
    pub change_log: Option<String>,
}

pub struct DocumentService;

impl DocumentService {
    pub async fn create(
        db: &DatabaseConnection,
        owner_id: i32,
        input: NewDocument,
    ) -> Result<documents::Model, AppError> {
        if input.title.trim().is_empty() {
            return Err(AppError::BadRequest("Title is required".to_string()));
        }
        if let Some(folder_id) = input.folder_id {
            FolderService::find_owned(db, folder_id, owner_id).await?;
        }

        let txn = db.begin().await?;
        let now = Utc::now();
        let document = documents::ActiveModel {
            title: Set(input.title.trim().to_string()),
            content: Set(input.content),
            owner_id: Set(owner_id),
            folder_id: Set(input.folder_id),
            is_public: Set(input.is_public),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        TagService::attach(&txn, document.id, owner_id, &input.tags).await?;
        txn.commit().await?;

        tracing::info!("📝 Document {} created by user {}", document.id, owner_id);
        Ok(document)
    }

    pub async fn list_owned(
        db: &DatabaseConnection,
        owner_id: i32,
        folder_id: Option<i32>,
    ) -> Result<Vec<documents::Model>, AppError> {
        let mut query = Documents::find().filter(documents::Column::OwnerId.eq(owner_id));
        if let Some(folder_id) = folder_id {
            query = query.filter(documents::Column::FolderId.eq(folder_id));
        }
        Ok(query
            .order_by_desc(documents::Column::UpdatedAt)
            .all(db)
            .await?)
    }

    pub async fn update(
        db: &DatabaseConnection,
        ctx: &DocumentContext,
        changes: DocumentChanges,
    ) -> Result<documents::Model, AppError> {
        ctx.require(Capability::Write)?;
        if changes.is_public.is_some_and(|p| p != ctx.document.is_public) {
            ctx.require(Capability::Manage)?;
        }
        if let Some(Some(folder_id)) = changes.folder_id {
            FolderService::find_owned(db, folder_id, ctx.document.owner_id).await?;
        }

        let txn = db.begin().await?;
        let current = &ctx.document;

        if changes
            .content
            .as_ref()
            .is_some_and(|c| *c != current.content)
        {
            let change_log = changes
                .change_log
                .clone()
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| AUTO_SNAPSHOT_LOG.to_string());
            Self::snapshot(&txn, current, ctx.user_id, &change_log).await?;
        }

        let mut active: documents::ActiveModel = current.clone().into();
        if let Some(title) = changes.title {
            if title.trim().is_empty() {
                return Err(AppError::BadRequest("Title is required".to_string()));
            }
            active.title = Set(title.trim().to_string());
        }
        if let Some(content) = changes.content {
            active.content = Set(content);
        }
        if let Some(folder_id) = changes.folder_id {
            active.folder_id = Set(folder_id);
        }
        if let Some(is_public) = changes.is_public {
            active.is_public = Set(is_public);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&txn).await?;
        txn.commit().await?;
        Ok(updated)
    }

    /// Remove the document and every dependent row in one transaction, then
    /// the attachment files. File removal failures are logged, not returned.
    pub async fn delete(
        db: &DatabaseConnection,
        storage: &dyn StorageService,
        ctx: &DocumentContext,
    ) -> Result<(), AppError> {
        ctx.require_owner()?;
        let id = ctx.document.id;

        let txn = db.begin().await?;

        let attachments = Attachments::find()
            .filter(attachments::Column::DocumentId.eq(id))
            .all(&txn)
            .await?;

        Attachments::delete_many()
            .filter(attachments::Column::DocumentId.eq(id))
            .exec(&txn)
            .await?;
        Versions::delete_many()
            .filter(versions::Column::DocumentId.eq(id))
            .exec(&txn)
            .await?;
        DocumentTags::delete_many()
            .filter(document_tags::Column::DocumentId.eq(id))
            .exec(&txn)
            .await?;
        Shares::delete_many()
            .filter(shares::Column::DocumentId.eq(id))
            .exec(&txn)
            .await?;
        Collaborations::delete_many()
            .filter(collaborations::Column::DocumentId.eq(id))
            .exec(&txn)
            .await?;
        Comments::delete_many()
            .filter(comments::Column::DocumentId.eq(id))
            .exec(&txn)
            .await?;
        Notifications::delete_many()
            .filter(notifications::Column::DocumentId.eq(id))
            .exec(&txn)
            .await?;
        Favorites::delete_many()
            .filter(favorites::Column::DocumentId.eq(id))
            .exec(&txn)
            .await?;
        RecentDocuments::delete_many()
            .filter(recent_documents::Column::DocumentId.eq(id))
            .exec(&txn)
            .await?;
        Documents::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        for attachment in attachments {
            if let Err(e) = storage.delete(&attachment.path).await {
                tracing::warn!(
                    "Failed to remove attachment file {} of document {}: {}",
                    attachment.path,
                    id,
                    e
                );
            }
        }

        tracing::info!("🗑️  Document {} deleted", id);
        Ok(())
    }

    pub async fn search(
        db: &DatabaseConnection,
        user_id: i32,
        q: &str,
    ) -> Result<Vec<documents::Model>, AppError> {
        let q = q.trim();
        if q.is_empty() {
            return Err(AppError::BadRequest("Search query is required".to_string()));
        }

        let readable = access::readable_condition(db, user_id).await?;
        Ok(Documents::find()
            .filter(readable)
            .filter(
                Condition::any()
                    .add(documents::Column::Title.contains(q))
                    .add(documents::Column::Content.contains(q)),
            )
            .order_by_desc(documents::Column::UpdatedAt)
            .all(db)
            .await?)
    }

    async fn snapshot<C: ConnectionTrait>(
        conn: &C,
        document: &documents::Model,
        author_id: i32,
        change_log: &str,
    ) -> Result<versions::Model, AppError> {
        let version = versions::ActiveModel {
            document_id: Set(document.id),
            content: Set(document.content.clone()),
            change_log: Set(change_log.to_string()),
            created_by_id: Set(author_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        Ok(version.insert(conn).await?)
    }

    /// Record the current content as a named version.
    pub async fn create_version(
        db: &DatabaseConnection,
        ctx: &DocumentContext,
        change_log: &str,
    ) -> Result<versions::Model, AppError> {
        ctx.require(Capability::Write)?;
        Self::snapshot(db, &ctx.document, ctx.user_id, change_log.trim()).await
    }

    pub async fn list_versions(
        db: &DatabaseConnection,
        document_id: i32,
    ) -> Result<Vec<versions::Model>, AppError> {
        Ok(Versions::find()
            .filter(versions::Column::DocumentId.eq(document_id))
            .order_by_desc(versions::Column::CreatedAt)
            .order_by_desc(versions::Column::Id)
            .all(db)
            .await?)
    }

    pub async fn get_version(
        db: &DatabaseConnection,
        document_id: i32,
        version_id: i32,
    ) -> Result<versions::Model, AppError> {
        Versions::find_by_id(version_id)
            .filter(versions::Column::DocumentId.eq(document_id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Version not found".to_string()))
    }
}
