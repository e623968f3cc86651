use crate::api::error::AppError;
use crate::entities::sea_orm_active_enums::NotificationType;
use crate::entities::{prelude::*, *};
use crate::services::access::{Capability, DocumentContext};
use crate::services::notification_service::NotificationService;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

pub const MAX_COMMENT_LEN: usize = 10_000;

pub struct CommentService;

impl CommentService {
    /// Add a comment and notify the document's collaborators in the same
    /// transaction.
    pub async fn add_comment(
        db: &DatabaseConnection,
        ctx: &DocumentContext,
        content: &str,
        parent_id: Option<i32>,
    ) -> Result<comments::Model, AppError> {
        ctx.require(Capability::Read)?;

        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::BadRequest("Comment cannot be empty".to_string()));
        }
        if content.chars().count() > MAX_COMMENT_LEN {
            return Err(AppError::BadRequest("Comment is too long".to_string()));
        }

        let txn = db.begin().await?;

        if let Some(parent_id) = parent_id {
            Comments::find_by_id(parent_id)
                .filter(comments::Column::DocumentId.eq(ctx.document.id))
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::BadRequest("Parent comment not found".to_string()))?;
        }

        let comment = comments::ActiveModel {
            document_id: Set(ctx.document.id),
            user_id: Set(ctx.user_id),
            content: Set(content.to_string()),
            parent_id: Set(parent_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let message = format!("New comment on '{}'", ctx.document.title);
        NotificationService::notify_collaborators(
            &txn,
            ctx.document.id,
            ctx.user_id,
            NotificationType::Comment,
            &message,
            &[],
        )
        .await?;

        txn.commit().await?;
        Ok(comment)
    }

    pub async fn list(
        db: &DatabaseConnection,
        document_id: i32,
    ) -> Result<Vec<comments::Model>, AppError> {
        Ok(Comments::find()
            .filter(comments::Column::DocumentId.eq(document_id))
            .order_by_desc(comments::Column::CreatedAt)
            .order_by_desc(comments::Column::Id)
            .all(db)
            .await?)
    }

    /// Delete a comment with all replies beneath it. Allowed for the author
    /// and for document managers.
    pub async fn delete(
        db: &DatabaseConnection,
        ctx: &DocumentContext,
        comment_id: i32,
    ) -> Result<u64, AppError> {
        let comment = Comments::find_by_id(comment_id)
            .filter(comments::Column::DocumentId.eq(ctx.document.id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

        if comment.user_id != ctx.user_id {
            ctx.require(Capability::Manage)?;
        }

        let all = Self::list(db, ctx.document.id).await?;
        let subtree = collect_subtree(comment.id, &all);

        let txn = db.begin().await?;
        // children before parents to keep the self-reference valid
        for id in subtree.iter().rev() {
            Comments::delete_by_id(*id).exec(&txn).await?;
        }
        txn.commit().await?;

        Ok(subtree.len() as u64)
    }
}

/// Breadth-first ids of `root` and its descendants, root first.
fn collect_subtree(root: i32, all: &[comments::Model]) -> Vec<i32> {
    let mut ids = vec![root];
    let mut i = 0;
    while i < ids.len() {
        let current = ids[i];
        ids.extend(
            all.iter()
                .filter(|c| c.parent_id == Some(current) && !ids.contains(&c.id))
                .map(|c| c.id)
                .collect::<Vec<_>>(),
        );
        i += 1;
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: i32, parent_id: Option<i32>) -> comments::Model {
        comments::Model {
            id,
            document_id: 1,
            user_id: 1,
            content: String::new(),
            parent_id,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_collect_subtree() {
        let all = vec![
            comment(1, None),
            comment(2, Some(1)),
            comment(3, Some(2)),
            comment(4, None),
            comment(5, Some(1)),
        ];
        assert_eq!(collect_subtree(1, &all), vec![1, 2, 5, 3]);
        assert_eq!(collect_subtree(4, &all), vec![4]);
    }
}
