use crate::api::error::AppError;
use crate::entities::sea_orm_active_enums::NotificationType;
use crate::entities::{prelude::*, *};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, sea_query::Expr,
};

pub struct NotificationService;

impl NotificationService {
    /// Insert one notification. Runs on whatever connection or transaction
    /// the caller is using.
    pub async fn notify_user<C: ConnectionTrait>(
        conn: &C,
        recipient_id: i32,
        sender_id: i32,
        document_id: i32,
        kind: NotificationType,
        content: &str,
    ) -> Result<notifications::Model, AppError> {
        let notification = notifications::ActiveModel {
            user_id: Set(recipient_id),
            sender_id: Set(sender_id),
            document_id: Set(document_id),
            kind: Set(kind),
            content: Set(content.to_string()),
            is_read: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        Ok(notification.insert(conn).await?)
    }

    /// One notification per collaborator of the document, skipping the actor
    /// and anyone in `skip`. Returns the recipients.
    pub async fn notify_collaborators<C: ConnectionTrait>(
        conn: &C,
        document_id: i32,
        actor_id: i32,
        kind: NotificationType,
        content: &str,
        skip: &[i32],
    ) -> Result<Vec<i32>, AppError> {
        let collaborators = Collaborations::find()
            .filter(collaborations::Column::DocumentId.eq(document_id))
            .filter(collaborations::Column::UserId.ne(actor_id))
            .all(conn)
            .await?;

        let mut recipients = Vec::with_capacity(collaborators.len());
        for collaborator in collaborators {
            if skip.contains(&collaborator.user_id) || recipients.contains(&collaborator.user_id) {
                continue;
            }
            Self::notify_user(conn, collaborator.user_id, actor_id, document_id, kind, content)
                .await?;
            recipients.push(collaborator.user_id);
        }

        tracing::debug!(
            "Notified {} collaborators of document {}",
            recipients.len(),
            document_id
        );

        Ok(recipients)
    }

    pub async fn list_for_user(
        db: &DatabaseConnection,
        user_id: i32,
        unread_only: bool,
    ) -> Result<Vec<notifications::Model>, AppError> {
        let mut query = Notifications::find().filter(notifications::Column::UserId.eq(user_id));
        if unread_only {
            query = query.filter(notifications::Column::IsRead.eq(false));
        }

        Ok(query
            .order_by_desc(notifications::Column::CreatedAt)
            .order_by_desc(notifications::Column::Id)
            .all(db)
            .await?)
    }

    async fn find_owned(
        db: &DatabaseConnection,
        id: i32,
        user_id: i32,
    ) -> Result<notifications::Model, AppError> {
        Notifications::find_by_id(id)
            .filter(notifications::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))
    }

    pub async fn mark_read(
        db: &DatabaseConnection,
        id: i32,
        user_id: i32,
    ) -> Result<notifications::Model, AppError> {
        let notification = Self::find_owned(db, id, user_id).await?;
        if notification.is_read {
            return Ok(notification);
        }

        let mut active: notifications::ActiveModel = notification.into();
        active.is_read = Set(true);
        Ok(active.update(db).await?)
    }

    pub async fn mark_all_read(db: &DatabaseConnection, user_id: i32) -> Result<u64, AppError> {
        let result = Notifications::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete(db: &DatabaseConnection, id: i32, user_id: i32) -> Result<(), AppError> {
        let notification = Self::find_owned(db, id, user_id).await?;
        let notification: notifications::ActiveModel = notification.into();
        notification.delete(db).await?;
        Ok(())
    }
}
