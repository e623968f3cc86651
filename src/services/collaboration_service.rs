use crate::api::error::AppError;
use crate::entities::sea_orm_active_enums::{CollaborationRole, NotificationType};
use crate::entities::{prelude::*, *};
use crate::services::access::{Capability, DocumentContext};
use crate::services::notification_service::NotificationService;
use crate::services::user_service::UserService;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

pub struct CollaborationService;

impl CollaborationService {
    pub async fn add_collaborator(
        db: &DatabaseConnection,
        ctx: &DocumentContext,
        email: &str,
        role: CollaborationRole,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(collaborations::Model, users::Model), AppError> {
        ctx.require(Capability::Manage)?;

        if email.trim().is_empty() {
            return Err(AppError::BadRequest("Email is required".to_string()));
        }
        if expires_at.is_some_and(|exp| exp <= Utc::now()) {
            return Err(AppError::BadRequest(
                "Expiry must be in the future".to_string(),
            ));
        }

        let txn = db.begin().await?;

        let target = UserService::find_by_email(&txn, email).await?;
        if target.id == ctx.document.owner_id {
            return Err(AppError::BadRequest(
                "The owner is already a collaborator".to_string(),
            ));
        }

        let existing = Collaborations::find()
            .filter(collaborations::Column::DocumentId.eq(ctx.document.id))
            .filter(collaborations::Column::UserId.eq(target.id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(
                "User is already a collaborator".to_string(),
            ));
        }

        let collaboration = collaborations::ActiveModel {
            document_id: Set(ctx.document.id),
            user_id: Set(target.id),
            role: Set(role),
            expires_at: Set(expires_at),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let message = format!(
            "You were added as a collaborator on '{}'",
            ctx.document.title
        );
        NotificationService::notify_user(
            &txn,
            target.id,
            ctx.user_id,
            ctx.document.id,
            NotificationType::Collaboration,
            &message,
        )
        .await?;

        txn.commit().await?;

        tracing::info!(
            "👥 User {} added to document {} as {:?}",
            target.id,
            ctx.document.id,
            role
        );

        Ok((collaboration, target))
    }

    pub async fn list_collaborators(
        db: &DatabaseConnection,
        document_id: i32,
    ) -> Result<Vec<(collaborations::Model, Option<users::Model>)>, AppError> {
        let rows = Collaborations::find()
            .filter(collaborations::Column::DocumentId.eq(document_id))
            .order_by_asc(collaborations::Column::CreatedAt)
            .all(db)
            .await?;

        let users = UserService::by_ids(db, rows.iter().map(|c| c.user_id)).await?;
        Ok(rows
            .into_iter()
            .map(|c| {
                let user = users.get(&c.user_id).cloned();
                (c, user)
            })
            .collect())
    }

    /// Managers may remove anyone; collaborators may remove themselves.
    pub async fn remove_collaborator(
        db: &DatabaseConnection,
        ctx: &DocumentContext,
        user_id: i32,
    ) -> Result<(), AppError> {
        if user_id != ctx.user_id {
            ctx.require(Capability::Manage)?;
        }

        let collaboration = Collaborations::find()
            .filter(collaborations::Column::DocumentId.eq(ctx.document.id))
            .filter(collaborations::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Collaborator not found".to_string()))?;

        let collaboration: collaborations::ActiveModel = collaboration.into();
        collaboration.delete(db).await?;
        Ok(())
    }
}
