use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, sea_query::Expr,
};

pub struct FolderService;

impl FolderService {
    pub async fn find_owned<C: ConnectionTrait>(
        conn: &C,
        id: i32,
        owner_id: i32,
    ) -> Result<folders::Model, AppError> {
        Folders::find_by_id(id)
            .filter(folders::Column::OwnerId.eq(owner_id))
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Folder not found".to_string()))
    }

    pub async fn create(
        db: &DatabaseConnection,
        owner_id: i32,
        name: &str,
        parent_id: Option<i32>,
    ) -> Result<folders::Model, AppError> {
        let name = normalize_name(name)?;
        if let Some(parent_id) = parent_id {
            Self::find_owned(db, parent_id, owner_id).await?;
        }

        let folder = folders::ActiveModel {
            name: Set(name),
            owner_id: Set(owner_id),
            parent_id: Set(parent_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        Ok(folder.insert(db).await?)
    }

    pub async fn list(db: &DatabaseConnection, owner_id: i32) -> Result<Vec<folders::Model>, AppError> {
        Ok(Folders::find()
            .filter(folders::Column::OwnerId.eq(owner_id))
            .order_by_asc(folders::Column::Name)
            .all(db)
            .await?)
    }

    /// Rename and/or move a folder. `parent_id` of `Some(None)` moves it to
    /// the root.
    pub async fn update(
        db: &DatabaseConnection,
        id: i32,
        owner_id: i32,
        name: Option<String>,
        parent_id: Option<Option<i32>>,
    ) -> Result<folders::Model, AppError> {
        let folder = Self::find_owned(db, id, owner_id).await?;
        let mut active: folders::ActiveModel = folder.into();

        if let Some(name) = name {
            active.name = Set(normalize_name(&name)?);
        }

        if let Some(parent_id) = parent_id {
            if let Some(parent_id) = parent_id {
                Self::find_owned(db, parent_id, owner_id).await?;
                Self::ensure_not_descendant(db, id, parent_id).await?;
            }
            active.parent_id = Set(parent_id);
        }

        Ok(active.update(db).await?)
    }

    /// Walk up from `new_parent`; reaching `folder_id` means a cycle.
    async fn ensure_not_descendant(
        db: &DatabaseConnection,
        folder_id: i32,
        new_parent: i32,
    ) -> Result<(), AppError> {
        let mut cursor = Some(new_parent);
        let mut seen = Vec::new();
        while let Some(current) = cursor {
            if current == folder_id {
                return Err(AppError::BadRequest(
                    "A folder cannot be moved into itself or its descendants".to_string(),
                ));
            }
            if seen.contains(&current) {
                break;
            }
            seen.push(current);
            cursor = Folders::find_by_id(current)
                .one(db)
                .await?
                .and_then(|f| f.parent_id);
        }
        Ok(())
    }

    /// Children move up to the deleted folder's parent; documents move to
    /// the root.
    pub async fn delete(db: &DatabaseConnection, id: i32, owner_id: i32) -> Result<(), AppError> {
        let folder = Self::find_owned(db, id, owner_id).await?;

        let txn = db.begin().await?;

        Folders::update_many()
            .col_expr(folders::Column::ParentId, Expr::value(folder.parent_id))
            .filter(folders::Column::ParentId.eq(folder.id))
            .exec(&txn)
            .await?;

        Documents::update_many()
            .col_expr(documents::Column::FolderId, Expr::value(Option::<i32>::None))
            .filter(documents::Column::FolderId.eq(folder.id))
            .exec(&txn)
            .await?;

        let folder: folders::ActiveModel = folder.into();
        folder.delete(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    pub async fn documents_in(
        db: &DatabaseConnection,
        id: i32,
        owner_id: i32,
    ) -> Result<Vec<documents::Model>, AppError> {
        let folder = Self::find_owned(db, id, owner_id).await?;
        Ok(Documents::find()
            .filter(documents::Column::FolderId.eq(folder.id))
            .order_by_desc(documents::Column::UpdatedAt)
            .all(db)
            .await?)
    }
}

fn normalize_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Folder name is required".to_string()));
    }
    Ok(name.to_string())
}
