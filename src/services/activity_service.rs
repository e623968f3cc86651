use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::access::{self, Capability};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

/// Number of recent documents kept per user.
pub const RECENT_LIMIT: u64 = 10;

pub struct ActivityService;

impl ActivityService {
    /// Upsert the access timestamp and drop entries beyond the limit.
    pub async fn record_access(
        db: &DatabaseConnection,
        user_id: i32,
        document_id: i32,
    ) -> Result<(), AppError> {
        let now = Utc::now();
        let txn = db.begin().await?;

        match RecentDocuments::find_by_id((user_id, document_id))
            .one(&txn)
            .await?
        {
            Some(entry) => {
                let mut entry: recent_documents::ActiveModel = entry.into();
                entry.last_access = Set(now);
                entry.update(&txn).await?;
            }
            None => {
                recent_documents::ActiveModel {
                    user_id: Set(user_id),
                    document_id: Set(document_id),
                    last_access: Set(now),
                }
                .insert(&txn)
                .await?;
            }
        }

        let keep: Vec<i32> = RecentDocuments::find()
            .select_only()
            .column(recent_documents::Column::DocumentId)
            .filter(recent_documents::Column::UserId.eq(user_id))
            .order_by_desc(recent_documents::Column::LastAccess)
            .order_by_desc(recent_documents::Column::DocumentId)
            .limit(RECENT_LIMIT)
            .into_tuple()
            .all(&txn)
            .await?;

        RecentDocuments::delete_many()
            .filter(recent_documents::Column::UserId.eq(user_id))
            .filter(recent_documents::Column::DocumentId.is_not_in(keep))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(())
    }

    /// Recently opened documents the user can still read, most recent first.
    pub async fn recent(
        db: &DatabaseConnection,
        user_id: i32,
    ) -> Result<Vec<(recent_documents::Model, documents::Model)>, AppError> {
        let readable = access::readable_condition(db, user_id).await?;
        let rows = RecentDocuments::find()
            .filter(recent_documents::Column::UserId.eq(user_id))
            .find_also_related(Documents)
            .filter(readable)
            .order_by_desc(recent_documents::Column::LastAccess)
            .order_by_desc(recent_documents::Column::DocumentId)
            .limit(RECENT_LIMIT)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(entry, doc)| doc.map(|d| (entry, d)))
            .collect())
    }

    /// Idempotent; requires read access to the document.
    pub async fn add_favorite(
        db: &DatabaseConnection,
        user_id: i32,
        document_id: i32,
    ) -> Result<favorites::Model, AppError> {
        let ctx = access::load_and_resolve(db, document_id, user_id).await?;
        ctx.require(Capability::Read)?;

        if let Some(existing) = Favorites::find_by_id((user_id, document_id))
            .one(db)
            .await?
        {
            return Ok(existing);
        }

        let favorite = favorites::ActiveModel {
            user_id: Set(user_id),
            document_id: Set(document_id),
            created_at: Set(Utc::now()),
        };
        Ok(favorite.insert(db).await?)
    }

    pub async fn remove_favorite(
        db: &DatabaseConnection,
        user_id: i32,
        document_id: i32,
    ) -> Result<(), AppError> {
        let result = Favorites::delete_by_id((user_id, document_id))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Favorite not found".to_string()));
        }
        Ok(())
    }

    pub async fn favorites(
        db: &DatabaseConnection,
        user_id: i32,
    ) -> Result<Vec<(favorites::Model, documents::Model)>, AppError> {
        let rows = Favorites::find()
            .filter(favorites::Column::UserId.eq(user_id))
            .find_also_related(Documents)
            .order_by_desc(favorites::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(fav, doc)| doc.map(|d| (fav, d)))
            .collect())
    }
}
