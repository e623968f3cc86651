use crate::api::error::{AppError, parse_id};
use crate::api::handlers::deserialize_some;
use crate::api::handlers::documents::DocumentResponse;
use crate::entities::folders;
use crate::services::folder_service::FolderService;
use crate::utils::auth::Claims;
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
pub struct CreateFolderRequest {
    #[validate(length(min = 1, max = 255, message = "Folder name must be 1-255 characters"))]
    pub name: String,
    pub parent_id: Option<i32>,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct UpdateFolderRequest {
    #[validate(length(min = 1, max = 255, message = "Folder name must be 1-255 characters"))]
    pub name: Option<String>,
    /// `null` moves the folder to the top level.
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<i32>)]
    pub parent_id: Option<Option<i32>>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct FolderResponse {
    pub id: i32,
    pub name: String,
    pub owner_id: i32,
    pub parent_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<folders::Model> for FolderResponse {
    fn from(f: folders::Model) -> Self {
        Self {
            id: f.id,
            name: f.name,
            owner_id: f.owner_id,
            parent_id: f.parent_id,
            created_at: f.created_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/folders",
    request_body = CreateFolderRequest,
    responses(
        (status = 201, description = "Folder created", body = FolderResponse),
        (status = 404, description = "Parent folder not found")
    ),
    security(("jwt" = [])),
    tag = "folders"
)]
pub async fn create_folder(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<FolderResponse>), AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let folder = FolderService::create(&state.db, claims.id, &req.name, req.parent_id).await?;
    Ok((StatusCode::CREATED, Json(folder.into())))
}

#[utoipa::path(
    get,
    path = "/api/folders",
    responses((status = 200, description = "The caller's folders", body = Vec<FolderResponse>)),
    security(("jwt" = [])),
    tag = "folders"
)]
pub async fn list_folders(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<FolderResponse>>, AppError> {
    let folders = FolderService::list(&state.db, claims.id).await?;
    Ok(Json(folders.into_iter().map(Into::into).collect()))
}

/// Rename or move a folder
#[utoipa::path(
    put,
    path = "/api/folders/{id}",
    params(("id" = i32, Path, description = "Folder ID")),
    request_body = UpdateFolderRequest,
    responses(
        (status = 200, description = "Folder updated", body = FolderResponse),
        (status = 400, description = "Move would create a cycle"),
        (status = 404, description = "Folder not found")
    ),
    security(("jwt" = [])),
    tag = "folders"
)]
pub async fn update_folder(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<UpdateFolderRequest>,
) -> Result<Json<FolderResponse>, AppError> {
    let id = parse_id(&id, "folder")?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let folder = FolderService::update(&state.db, id, claims.id, req.name, req.parent_id).await?;
    Ok(Json(folder.into()))
}

/// Delete a folder; its contents move up one level
#[utoipa::path(
    delete,
    path = "/api/folders/{id}",
    params(("id" = i32, Path, description = "Folder ID")),
    responses(
        (status = 204, description = "Folder deleted"),
        (status = 404, description = "Folder not found")
    ),
    security(("jwt" = [])),
    tag = "folders"
)]
pub async fn delete_folder(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "folder")?;
    FolderService::delete(&state.db, id, claims.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/folders/{id}/documents",
    params(("id" = i32, Path, description = "Folder ID")),
    responses(
        (status = 200, description = "Documents in the folder", body = Vec<DocumentResponse>),
        (status = 404, description = "Folder not found")
    ),
    security(("jwt" = [])),
    tag = "folders"
)]
pub async fn folder_documents(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Vec<DocumentResponse>>, AppError> {
    let id = parse_id(&id, "folder")?;
    let docs = FolderService::documents_in(&state.db, id, claims.id).await?;
    Ok(Json(docs.into_iter().map(Into::into).collect()))
}
