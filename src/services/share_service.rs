use crate::api::error::AppError;
use crate::entities::sea_orm_active_enums::{NotificationType, SharePermission};
use crate::entities::{prelude::*, *};
use crate::services::access::{self, Access, Capability, DocumentContext};
use crate::services::notification_service::NotificationService;
use crate::services::user_service::UserService;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

pub struct ShareService;

impl ShareService {
    /// Grant `permission` on the document to the user registered under
    /// `email`. The share row and every resulting notification are written in
    /// one transaction.
    pub async fn share_document(
        db: &DatabaseConnection,
        ctx: &DocumentContext,
        email: &str,
        permission: SharePermission,
    ) -> Result<shares::Model, AppError> {
        ctx.require(Capability::Manage)?;

        if email.trim().is_empty() {
            return Err(AppError::BadRequest("Email is required".to_string()));
        }

        let txn = db.begin().await?;

        let target = UserService::find_by_email(&txn, email).await?;

        if target.id == ctx.document.owner_id {
            return Err(AppError::BadRequest(
                "Cannot share a document with its owner".to_string(),
            ));
        }

        let existing = Shares::find()
            .filter(shares::Column::DocumentId.eq(ctx.document.id))
            .filter(shares::Column::UserId.eq(target.id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(
                "Document already shared with this user".to_string(),
            ));
        }

        let now = Utc::now();
        let share = shares::ActiveModel {
            document_id: Set(ctx.document.id),
            user_id: Set(target.id),
            permission: Set(permission),
            created_by_id: Set(ctx.user_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let message = format!("Document '{}' was shared with you", ctx.document.title);
        NotificationService::notify_user(
            &txn,
            target.id,
            ctx.user_id,
            ctx.document.id,
            NotificationType::Share,
            &message,
        )
        .await?;

        let fan_out = format!(
            "Document '{}' was shared with {}",
            ctx.document.title, target.username
        );
        NotificationService::notify_collaborators(
            &txn,
            ctx.document.id,
            ctx.user_id,
            NotificationType::Share,
            &fan_out,
            &[target.id],
        )
        .await?;

        txn.commit().await?;

        tracing::info!(
            "🔗 Document {} shared with user {} ({:?})",
            ctx.document.id,
            target.id,
            permission
        );

        Ok(share)
    }

    /// Grants on one document, with the grantee attached.
    pub async fn list_for_document(
        db: &DatabaseConnection,
        document_id: i32,
    ) -> Result<Vec<(shares::Model, Option<users::Model>)>, AppError> {
        let shares = Shares::find()
            .filter(shares::Column::DocumentId.eq(document_id))
            .order_by_asc(shares::Column::CreatedAt)
            .all(db)
            .await?;

        let users = UserService::by_ids(db, shares.iter().map(|s| s.user_id)).await?;
        Ok(shares
            .into_iter()
            .map(|s| {
                let user = users.get(&s.user_id).cloned();
                (s, user)
            })
            .collect())
    }

    /// Shares granted to the user, with their documents.
    pub async fn list_shared_with(
        db: &DatabaseConnection,
        user_id: i32,
    ) -> Result<Vec<(shares::Model, documents::Model)>, AppError> {
        let rows = Shares::find()
            .filter(shares::Column::UserId.eq(user_id))
            .find_also_related(Documents)
            .order_by_desc(shares::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(share, doc)| doc.map(|d| (share, d)))
            .collect())
    }

    /// Documents reachable through a share or a live collaboration, with the
    /// access each one resolves to.
    pub async fn shared_documents(
        db: &DatabaseConnection,
        user_id: i32,
    ) -> Result<Vec<(documents::Model, Access)>, AppError> {
        let mut ids: Vec<i32> = Shares::find()
            .select_only()
            .column(shares::Column::DocumentId)
            .filter(shares::Column::UserId.eq(user_id))
            .into_tuple()
            .all(db)
            .await?;

        let collaborating: Vec<i32> = Collaborations::find()
            .select_only()
            .column(collaborations::Column::DocumentId)
            .filter(collaborations::Column::UserId.eq(user_id))
            .filter(
                Condition::any()
                    .add(collaborations::Column::ExpiresAt.is_null())
                    .add(collaborations::Column::ExpiresAt.gt(Utc::now())),
            )
            .into_tuple()
            .all(db)
            .await?;
        ids.extend(collaborating);
        ids.sort_unstable();
        ids.dedup();

        let documents = Documents::find()
            .filter(documents::Column::Id.is_in(ids))
            .filter(documents::Column::OwnerId.ne(user_id))
            .order_by_desc(documents::Column::UpdatedAt)
            .all(db)
            .await?;

        let mut result = Vec::with_capacity(documents.len());
        for document in documents {
            let access = access::resolve_access(db, &document, user_id).await?;
            if access != Access::NoAccess {
                result.push((document, access));
            }
        }
        Ok(result)
    }

    /// Shares the user granted, with their documents.
    pub async fn list_shared_by(
        db: &DatabaseConnection,
        user_id: i32,
    ) -> Result<Vec<(shares::Model, documents::Model)>, AppError> {
        let rows = Shares::find()
            .filter(shares::Column::CreatedById.eq(user_id))
            .find_also_related(Documents)
            .order_by_desc(shares::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(share, doc)| doc.map(|d| (share, d)))
            .collect())
    }

    /// Revoke a share. Requires manage rights on the shared document.
    pub async fn revoke_share(
        db: &DatabaseConnection,
        share_id: i32,
        user_id: i32,
    ) -> Result<(), AppError> {
        let share = Shares::find_by_id(share_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Share not found".to_string()))?;

        let ctx = access::load_and_resolve(db, share.document_id, user_id).await?;
        ctx.require(Capability::Manage)?;

        let share: shares::ActiveModel = share.into();
        share.delete(db).await?;
        Ok(())
    }
}
