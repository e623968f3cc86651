use crate::api::error::AppError;
use crate::api::handlers::deserialize_some;
use crate::entities::documents;
use crate::services::access::{Access, Capability, DocumentContext};
use crate::services::activity_service::ActivityService;
use crate::services::document_service::{DocumentChanges, DocumentService, NewDocument};
use crate::services::share_service::ShareService;
use crate::services::tag_service::TagService;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

// ── Request / Response Types ──────────────────────────────────────────

#[derive(Deserialize, ToSchema, Validate)]
pub struct CreateDocumentRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub folder_id: Option<i32>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct UpdateDocumentRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,
    pub content: Option<String>,
    /// `null` moves the document back to the root.
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<i32>)]
    pub folder_id: Option<Option<i32>>,
    pub is_public: Option<bool>,
    /// Stored on the snapshot taken when the content changes.
    pub change_log: Option<String>,
}

#[derive(Deserialize)]
pub struct ListDocumentsQuery {
    pub folder_id: Option<i32>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct DocumentResponse {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub owner_id: i32,
    pub folder_id: Option<i32>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<documents::Model> for DocumentResponse {
    fn from(doc: documents::Model) -> Self {
        Self {
            id: doc.id,
            title: doc.title,
            content: doc.content,
            owner_id: doc.owner_id,
            folder_id: doc.folder_id,
            is_public: doc.is_public,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct DocumentDetailResponse {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub owner_id: i32,
    pub folder_id: Option<i32>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<String>,
    /// How the caller reaches the document: owner, shared, collaborator or none.
    pub access: String,
    pub capability: Option<Capability>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct SharedDocumentResponse {
    pub document: DocumentResponse,
    pub access: String,
    /// Share permission or collaboration role granting access.
    pub grant: String,
    pub capability: Option<Capability>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AccessResponse {
    pub document_id: i32,
    pub access: String,
    pub grant: Option<String>,
    pub capability: Option<Capability>,
    pub is_owner: bool,
    pub can_read: bool,
    pub can_write: bool,
    pub can_manage: bool,
}

fn grant_label(access: &Access) -> Option<String> {
    match access {
        Access::Owner => Some("owner".to_string()),
        Access::SharedWithPermission(p) => serde_json::to_value(p)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string)),
        Access::Collaborator(r) => serde_json::to_value(r)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string)),
        Access::NoAccess => None,
    }
}

// ── Handlers ──────────────────────────────────────────────────────────

/// List the caller's own documents
#[utoipa::path(
    get,
    path = "/api/documents",
    params(("folder_id" = Option<i32>, Query, description = "Only documents in this folder")),
    responses(
        (status = 200, description = "Documents owned by the caller", body = Vec<DocumentResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "documents"
)]
pub async fn list_documents(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<Json<Vec<DocumentResponse>>, AppError> {
    let docs = DocumentService::list_owned(&state.db, claims.id, query.folder_id).await?;
    Ok(Json(docs.into_iter().map(Into::into).collect()))
}

/// Create a document
#[utoipa::path(
    post,
    path = "/api/documents",
    request_body = CreateDocumentRequest,
    responses(
        (status = 201, description = "Document created", body = DocumentResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Folder not found")
    ),
    security(("jwt" = [])),
    tag = "documents"
)]
pub async fn create_document(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<DocumentResponse>), AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let doc = DocumentService::create(
        &state.db,
        claims.id,
        NewDocument {
            title: req.title,
            content: req.content,
            folder_id: req.folder_id,
            is_public: req.is_public,
            tags: req.tags,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(doc.into())))
}

/// Fetch a document; records it in the caller's recent list
#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document", body = DocumentDetailResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Document not found")
    ),
    security(("jwt" = [])),
    tag = "documents"
)]
pub async fn get_document(
    State(state): State<crate::AppState>,
    Extension(ctx): Extension<DocumentContext>,
) -> Result<Json<DocumentDetailResponse>, AppError> {
    ctx.require(Capability::Read)?;

    ActivityService::record_access(&state.db, ctx.user_id, ctx.document.id).await?;
    let tags = TagService::tags_for_document(&state.db, ctx.document.id).await?;

    let capability = ctx.capability();
    let access = ctx.access.label().to_string();
    let doc = ctx.document;

    Ok(Json(DocumentDetailResponse {
        id: doc.id,
        title: doc.title,
        content: doc.content,
        owner_id: doc.owner_id,
        folder_id: doc.folder_id,
        is_public: doc.is_public,
        created_at: doc.created_at,
        updated_at: doc.updated_at,
        tags: tags.into_iter().map(|t| t.name).collect(),
        access,
        capability,
    }))
}

/// Update a document
#[utoipa::path(
    put,
    path = "/api/documents/{id}",
    params(("id" = i32, Path, description = "Document ID")),
    request_body = UpdateDocumentRequest,
    responses(
        (status = 200, description = "Document updated", body = DocumentResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Document not found")
    ),
    security(("jwt" = [])),
    tag = "documents"
)]
pub async fn update_document(
    State(state): State<crate::AppState>,
    Extension(ctx): Extension<DocumentContext>,
    Json(req): Json<UpdateDocumentRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    // Permission first so outsiders learn nothing from validation errors
    ctx.require(Capability::Write)?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let doc = DocumentService::update(
        &state.db,
        &ctx,
        DocumentChanges {
            title: req.title,
            content: req.content,
            folder_id: req.folder_id,
            is_public: req.is_public,
            change_log: req.change_log,
        },
    )
    .await?;

    Ok(Json(doc.into()))
}

/// Delete a document and everything attached to it
#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 403, description = "Only the owner can delete"),
        (status = 404, description = "Document not found")
    ),
    security(("jwt" = [])),
    tag = "documents"
)]
pub async fn delete_document(
    State(state): State<crate::AppState>,
    Extension(ctx): Extension<DocumentContext>,
) -> Result<StatusCode, AppError> {
    DocumentService::delete(&state.db, state.attachments.as_ref(), &ctx).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Full-text search over readable documents
#[utoipa::path(
    get,
    path = "/api/documents/search",
    params(("q" = String, Query, description = "Text to look for in title or content")),
    responses(
        (status = 200, description = "Matching documents", body = Vec<DocumentResponse>),
        (status = 400, description = "Missing query")
    ),
    security(("jwt" = [])),
    tag = "documents"
)]
pub async fn search_documents(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<DocumentResponse>>, AppError> {
    let docs = DocumentService::search(&state.db, claims.id, &query.q).await?;
    Ok(Json(docs.into_iter().map(Into::into).collect()))
}

/// Documents shared with the caller or on which they collaborate
#[utoipa::path(
    get,
    path = "/api/documents/shared",
    responses(
        (status = 200, description = "Documents reachable through grants", body = Vec<SharedDocumentResponse>)
    ),
    security(("jwt" = [])),
    tag = "documents"
)]
pub async fn shared_documents(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<SharedDocumentResponse>>, AppError> {
    let rows = ShareService::shared_documents(&state.db, claims.id).await?;
    Ok(Json(
        rows.into_iter()
            .map(|(doc, access)| SharedDocumentResponse {
                access: access.label().to_string(),
                grant: grant_label(&access).unwrap_or_default(),
                capability: access.capability(),
                document: doc.into(),
            })
            .collect(),
    ))
}

/// Report the caller's access to a document
#[utoipa::path(
    get,
    path = "/api/documents/{id}/access",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Resolved access", body = AccessResponse),
        (status = 404, description = "Document not found")
    ),
    security(("jwt" = [])),
    tag = "documents"
)]
pub async fn check_access(
    Extension(ctx): Extension<DocumentContext>,
) -> Result<Json<AccessResponse>, AppError> {
    Ok(Json(AccessResponse {
        document_id: ctx.document.id,
        access: ctx.access.label().to_string(),
        grant: grant_label(&ctx.access),
        capability: ctx.capability(),
        is_owner: ctx.access == Access::Owner,
        can_read: ctx.can(Capability::Read),
        can_write: ctx.can(Capability::Write),
        can_manage: ctx.can(Capability::Manage),
    }))
}
