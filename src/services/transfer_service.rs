use crate::api::error::AppError;
use crate::entities::documents;
use crate::entities::versions;
use crate::services::access::{Capability, DocumentContext};
use crate::services::document_service::DocumentService;
use crate::services::storage::StorageService;
use crate::services::tag_service::TagService;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Portable JSON form of a document.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentExport {
    #[serde(default)]
    pub id: Option<i32>,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub versions: Vec<VersionExport>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VersionExport {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub change_log: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

pub fn export_filename(document_id: i32) -> String {
    format!("document_{}.json", document_id)
}

pub struct TransferService;

impl TransferService {
    /// Serialize the document, persist a copy in the export store and return
    /// the file name with its bytes.
    pub async fn export(
        db: &DatabaseConnection,
        exports: &dyn StorageService,
        ctx: &DocumentContext,
    ) -> Result<(String, Vec<u8>), AppError> {
        ctx.require(Capability::Read)?;
        let document = &ctx.document;

        let tags = TagService::tags_for_document(db, document.id).await?;
        let mut versions = DocumentService::list_versions(db, document.id).await?;
        versions.reverse();

        let export = DocumentExport {
            id: Some(document.id),
            title: document.title.clone(),
            content: document.content.clone(),
            is_public: document.is_public,
            created_at: Some(document.created_at),
            updated_at: Some(document.updated_at),
            tags: tags.into_iter().map(|t| t.name).collect(),
            versions: versions
                .into_iter()
                .map(|v| VersionExport {
                    content: v.content,
                    change_log: v.change_log,
                    created_at: Some(v.created_at),
                })
                .collect(),
        };

        let bytes = serde_json::to_vec_pretty(&export)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let filename = export_filename(document.id);
        exports.save(&filename, &bytes).await?;

        tracing::info!("📤 Document {} exported to {}", document.id, filename);
        Ok((filename, bytes))
    }

    /// Create a new document owned by `owner_id` from an export file.
    pub async fn import(
        db: &DatabaseConnection,
        owner_id: i32,
        data: &[u8],
    ) -> Result<documents::Model, AppError> {
        let import: DocumentExport = serde_json::from_slice(data)
            .map_err(|e| AppError::BadRequest(format!("Invalid document file: {}", e)))?;

        if import.title.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Imported document has no title".to_string(),
            ));
        }

        let txn = db.begin().await?;
        let now = Utc::now();

        let document = documents::ActiveModel {
            title: Set(import.title.trim().to_string()),
            content: Set(import.content),
            owner_id: Set(owner_id),
            folder_id: Set(None),
            is_public: Set(import.is_public),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        TagService::attach(&txn, document.id, owner_id, &import.tags).await?;

        for version in import.versions {
            versions::ActiveModel {
                document_id: Set(document.id),
                content: Set(version.content),
                change_log: Set(version.change_log),
                created_by_id: Set(owner_id),
                created_at: Set(version.created_at.unwrap_or(now)),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        tracing::info!(
            "📥 Imported document {} for user {}",
            document.id,
            owner_id
        );
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_import_shape() {
        let parsed: DocumentExport = serde_json::from_str(r#"{"title":"Notes"}"#).unwrap();
        assert_eq!(parsed.title, "Notes");
        assert!(parsed.tags.is_empty());
        assert!(!parsed.is_public);
    }

    #[test]
    fn test_missing_title_rejected() {
        assert!(serde_json::from_str::<DocumentExport>(r#"{"content":"x"}"#).is_err());
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(export_filename(12), "document_12.json");
    }
}
