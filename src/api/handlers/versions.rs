use crate::api::error::{AppError, parse_id};
use crate::entities::versions;
use crate::services::access::{Capability, DocumentContext};
use crate::services::document_service::DocumentService;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Deserialize, ToSchema, Validate)]
pub struct CreateVersionRequest {
    #[validate(length(min = 1, max = 500, message = "Change log must be 1-500 characters"))]
    pub change_log: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct VersionResponse {
    pub id: i32,
    pub document_id: i32,
    pub content: String,
    pub change_log: String,
    pub created_by_id: i32,
    pub created_at: DateTime<Utc>,
}

impl From<versions::Model> for VersionResponse {
    fn from(v: versions::Model) -> Self {
        Self {
            id: v.id,
            document_id: v.document_id,
            content: v.content,
            change_log: v.change_log,
            created_by_id: v.created_by_id,
            created_at: v.created_at,
        }
    }
}

/// Snapshot the current content
#[utoipa::path(
    post,
    path = "/api/documents/{id}/versions",
    params(("id" = i32, Path, description = "Document ID")),
    request_body = CreateVersionRequest,
    responses(
        (status = 201, description = "Version created", body = VersionResponse),
        (status = 403, description = "Forbidden")
    ),
    security(("jwt" = [])),
    tag = "versions"
)]
pub async fn create_version(
    State(state): State<crate::AppState>,
    Extension(ctx): Extension<DocumentContext>,
    Json(req): Json<CreateVersionRequest>,
) -> Result<(StatusCode, Json<VersionResponse>), AppError> {
    ctx.require(Capability::Write)?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let version = DocumentService::create_version(&state.db, &ctx, &req.change_log).await?;
    Ok((StatusCode::CREATED, Json(version.into())))
}

/// List versions, newest first
#[utoipa::path(
    get,
    path = "/api/documents/{id}/versions",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Versions", body = Vec<VersionResponse>),
        (status = 403, description = "Forbidden")
    ),
    security(("jwt" = [])),
    tag = "versions"
)]
pub async fn list_versions(
    State(state): State<crate::AppState>,
    Extension(ctx): Extension<DocumentContext>,
) -> Result<Json<Vec<VersionResponse>>, AppError> {
    ctx.require(Capability::Read)?;
    let versions = DocumentService::list_versions(&state.db, ctx.document.id).await?;
    Ok(Json(versions.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/documents/{id}/versions/{version_id}",
    params(
        ("id" = i32, Path, description = "Document ID"),
        ("version_id" = i32, Path, description = "Version ID")
    ),
    responses(
        (status = 200, description = "Version", body = VersionResponse),
        (status = 404, description = "Version not found")
    ),
    security(("jwt" = [])),
    tag = "versions"
)]
pub async fn get_version(
    State(state): State<crate::AppState>,
    Extension(ctx): Extension<DocumentContext>,
    Path((_document_id, version_id)): Path<(String, String)>,
) -> Result<Json<VersionResponse>, AppError> {
    ctx.require(Capability::Read)?;
    let version_id = parse_id(&version_id, "version")?;
    let version = DocumentService::get_version(&state.db, ctx.document.id, version_id).await?;
    Ok(Json(version.into()))
}
