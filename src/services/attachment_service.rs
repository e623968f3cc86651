use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::access::{Capability, DocumentContext};
use crate::services::storage::StorageService;
use crate::utils::validation::{extension_of, sanitize_filename};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tokio::io::AsyncRead;
use uuid::Uuid;

pub struct AttachmentService;

impl AttachmentService {
    /// Store the bytes under a generated key and record the attachment. The
    /// stored file is removed again if the row cannot be written.
    pub async fn upload(
        db: &DatabaseConnection,
        storage: &dyn StorageService,
        ctx: &DocumentContext,
        filename: &str,
        data: &[u8],
        max_size: usize,
    ) -> Result<attachments::Model, AppError> {
        ctx.require(Capability::Write)?;

        if data.is_empty() {
            return Err(AppError::BadRequest("File is empty".to_string()));
        }
        if data.len() > max_size {
            return Err(AppError::PayloadTooLarge(format!(
                "File exceeds the maximum size of {} bytes",
                max_size
            )));
        }

        let filename =
            sanitize_filename(filename).map_err(|e| AppError::BadRequest(e.to_string()))?;
        let content_type = infer::get(data)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());
        let key = format!("{}{}", Uuid::new_v4(), extension_of(&filename));

        storage.save(&key, data).await?;

        let attachment = attachments::ActiveModel {
            document_id: Set(ctx.document.id),
            filename: Set(filename),
            path: Set(key.clone()),
            size: Set(data.len() as i64),
            content_type: Set(content_type),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        match attachment.insert(db).await {
            Ok(model) => {
                tracing::info!(
                    "📎 Attachment {} ({} bytes) added to document {}",
                    model.id,
                    model.size,
                    ctx.document.id
                );
                Ok(model)
            }
            Err(e) => {
                if let Err(cleanup) = storage.delete(&key).await {
                    tracing::warn!("Failed to remove orphaned upload {}: {}", key, cleanup);
                }
                Err(e.into())
            }
        }
    }

    pub async fn list(
        db: &DatabaseConnection,
        document_id: i32,
    ) -> Result<Vec<attachments::Model>, AppError> {
        Ok(Attachments::find()
            .filter(attachments::Column::DocumentId.eq(document_id))
            .order_by_asc(attachments::Column::CreatedAt)
            .all(db)
            .await?)
    }

    pub async fn find(
        db: &DatabaseConnection,
        document_id: i32,
        attachment_id: i32,
    ) -> Result<attachments::Model, AppError> {
        Attachments::find_by_id(attachment_id)
            .filter(attachments::Column::DocumentId.eq(document_id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Attachment not found".to_string()))
    }

    /// Row plus an open reader over the stored bytes.
    pub async fn open(
        db: &DatabaseConnection,
        storage: &dyn StorageService,
        ctx: &DocumentContext,
        attachment_id: i32,
    ) -> Result<(attachments::Model, Box<dyn AsyncRead + Unpin + Send>), AppError> {
        ctx.require(Capability::Read)?;
        let attachment = Self::find(db, ctx.document.id, attachment_id).await?;

        let reader = storage.open_stream(&attachment.path).await.map_err(|e| {
            tracing::warn!("Attachment {} missing from storage: {}", attachment.id, e);
            AppError::NotFound("Attachment file not found".to_string())
        })?;

        Ok((attachment, reader))
    }

    pub async fn delete(
        db: &DatabaseConnection,
        storage: &dyn StorageService,
        ctx: &DocumentContext,
        attachment_id: i32,
    ) -> Result<(), AppError> {
        ctx.require(Capability::Write)?;
        let attachment = Self::find(db, ctx.document.id, attachment_id).await?;
        let path = attachment.path.clone();

        let attachment: attachments::ActiveModel = attachment.into();
        attachment.delete(db).await?;

        if let Err(e) = storage.delete(&path).await {
            tracing::warn!("Failed to remove attachment file {}: {}", path, e);
        }
        Ok(())
    }
}
