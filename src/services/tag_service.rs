use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::access;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

pub const MAX_TAG_LEN: usize = 50;

pub struct TagService;

impl TagService {
    pub fn normalize(name: &str) -> Result<String, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Tag name cannot be empty".to_string()));
        }
        if name.chars().count() > MAX_TAG_LEN {
            return Err(AppError::BadRequest(format!(
                "Tag name exceeds {} characters",
                MAX_TAG_LEN
            )));
        }
        Ok(name.to_string())
    }

    pub async fn find_or_create<C: ConnectionTrait>(
        conn: &C,
        owner_id: i32,
        name: &str,
    ) -> Result<tags::Model, AppError> {
        let name = Self::normalize(name)?;
        if let Some(tag) = Tags::find()
            .filter(tags::Column::OwnerId.eq(owner_id))
            .filter(tags::Column::Name.eq(&name))
            .one(conn)
            .await?
        {
            return Ok(tag);
        }

        let tag = tags::ActiveModel {
            name: Set(name),
            owner_id: Set(owner_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        Ok(tag.insert(conn).await?)
    }

    pub async fn create(
        db: &DatabaseConnection,
        owner_id: i32,
        name: &str,
    ) -> Result<tags::Model, AppError> {
        let name = Self::normalize(name)?;
        let existing = Tags::find()
            .filter(tags::Column::OwnerId.eq(owner_id))
            .filter(tags::Column::Name.eq(&name))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict("Tag already exists".to_string()));
        }

        let tag = tags::ActiveModel {
            name: Set(name),
            owner_id: Set(owner_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        Ok(tag.insert(db).await?)
    }

    pub async fn list(db: &DatabaseConnection, owner_id: i32) -> Result<Vec<tags::Model>, AppError> {
        Ok(Tags::find()
            .filter(tags::Column::OwnerId.eq(owner_id))
            .order_by_asc(tags::Column::Name)
            .all(db)
            .await?)
    }

    pub async fn delete(db: &DatabaseConnection, id: i32, owner_id: i32) -> Result<(), AppError> {
        let tag = Tags::find_by_id(id)
            .filter(tags::Column::OwnerId.eq(owner_id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))?;

        let txn = db.begin().await?;
        DocumentTags::delete_many()
            .filter(document_tags::Column::TagId.eq(tag.id))
            .exec(&txn)
            .await?;
        let tag: tags::ActiveModel = tag.into();
        tag.delete(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    pub async fn tags_for_document<C: ConnectionTrait>(
        conn: &C,
        document_id: i32,
    ) -> Result<Vec<tags::Model>, AppError> {
        let rows = DocumentTags::find()
            .filter(document_tags::Column::DocumentId.eq(document_id))
            .find_also_related(Tags)
            .all(conn)
            .await?;

        let mut tags: Vec<tags::Model> = rows.into_iter().filter_map(|(_, tag)| tag).collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    /// Link `names` to the document, creating missing tags under `owner_id`.
    pub async fn attach<C: ConnectionTrait>(
        conn: &C,
        document_id: i32,
        owner_id: i32,
        names: &[String],
    ) -> Result<(), AppError> {
        let mut linked: Vec<i32> = Vec::new();
        for name in names {
            let tag = Self::find_or_create(conn, owner_id, name).await?;
            if linked.contains(&tag.id) {
                continue;
            }
            document_tags::ActiveModel {
                document_id: Set(document_id),
                tag_id: Set(tag.id),
            }
            .insert(conn)
            .await?;
            linked.push(tag.id);
        }
        Ok(())
    }

    /// Replace the document's tag set. Tags are owned by the document owner.
    pub async fn set_document_tags(
        db: &DatabaseConnection,
        document: &documents::Model,
        names: &[String],
    ) -> Result<Vec<tags::Model>, AppError> {
        let txn = db.begin().await?;
        DocumentTags::delete_many()
            .filter(document_tags::Column::DocumentId.eq(document.id))
            .exec(&txn)
            .await?;
        Self::attach(&txn, document.id, document.owner_id, names).await?;
        let tags = Self::tags_for_document(&txn, document.id).await?;
        txn.commit().await?;
        Ok(tags)
    }

    pub async fn detach(
        db: &DatabaseConnection,
        document_id: i32,
        tag_id: i32,
    ) -> Result<(), AppError> {
        let result = DocumentTags::delete_many()
            .filter(document_tags::Column::DocumentId.eq(document_id))
            .filter(document_tags::Column::TagId.eq(tag_id))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound(
                "Tag is not attached to this document".to_string(),
            ));
        }
        Ok(())
    }

    /// Readable documents carrying a tag with this name (any owner).
    pub async fn search_documents(
        db: &DatabaseConnection,
        user_id: i32,
        name: &str,
    ) -> Result<Vec<documents::Model>, AppError> {
        let name = Self::normalize(name)?;
        let tag_ids: Vec<i32> = Tags::find()
            .select_only()
            .column(tags::Column::Id)
            .filter(tags::Column::Name.eq(name))
            .into_tuple()
            .all(db)
            .await?;

        let document_ids: Vec<i32> = DocumentTags::find()
            .select_only()
            .column(document_tags::Column::DocumentId)
            .filter(document_tags::Column::TagId.is_in(tag_ids))
            .into_tuple()
            .all(db)
            .await?;

        let readable = access::readable_condition(db, user_id).await?;
        Ok(Documents::find()
            .filter(documents::Column::Id.is_in(document_ids))
            .filter(readable)
            .order_by_desc(documents::Column::UpdatedAt)
            .all(db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(TagService::normalize("  rust ").unwrap(), "rust");
        assert!(TagService::normalize("   ").is_err());
        assert!(TagService::normalize(&"x".repeat(MAX_TAG_LEN + 1)).is_err());
    }
}
