use crate::api::error::{AppError, parse_id};
use crate::api::handlers::documents::DocumentResponse;
use crate::entities::tags;
use crate::services::access::{Capability, DocumentContext};
use crate::services::tag_service::TagService;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateTagRequest {
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SetTagsRequest {
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct TagSearchQuery {
    pub tag: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct TagResponse {
    pub id: i32,
    pub name: String,
    pub owner_id: i32,
    pub created_at: DateTime<Utc>,
}

impl From<tags::Model> for TagResponse {
    fn from(t: tags::Model) -> Self {
        Self {
            id: t.id,
            name: t.name,
            owner_id: t.owner_id,
            created_at: t.created_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/tags",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Tag created", body = TagResponse),
        (status = 409, description = "Tag already exists")
    ),
    security(("jwt" = [])),
    tag = "tags"
)]
pub async fn create_tag(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateTagRequest>,
) -> Result<(StatusCode, Json<TagResponse>), AppError> {
    let tag = TagService::create(&state.db, claims.id, &req.name).await?;
    Ok((StatusCode::CREATED, Json(tag.into())))
}

#[utoipa::path(
    get,
    path = "/api/tags",
    responses((status = 200, description = "The caller's tags", body = Vec<TagResponse>)),
    security(("jwt" = [])),
    tag = "tags"
)]
pub async fn list_tags(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<TagResponse>>, AppError> {
    let tags = TagService::list(&state.db, claims.id).await?;
    Ok(Json(tags.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    delete,
    path = "/api/tags/{id}",
    params(("id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 404, description = "Tag not found")
    ),
    security(("jwt" = [])),
    tag = "tags"
)]
pub async fn delete_tag(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "tag")?;
    TagService::delete(&state.db, id, claims.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Readable documents carrying a tag
#[utoipa::path(
    get,
    path = "/api/tags/search",
    params(("tag" = String, Query, description = "Tag name")),
    responses((status = 200, description = "Matching documents", body = Vec<DocumentResponse>)),
    security(("jwt" = [])),
    tag = "tags"
)]
pub async fn search_by_tag(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<TagSearchQuery>,
) -> Result<Json<Vec<DocumentResponse>>, AppError> {
    let docs = TagService::search_documents(&state.db, claims.id, &query.tag).await?;
    Ok(Json(docs.into_iter().map(Into::into).collect()))
}

/// Replace the document's tags
#[utoipa::path(
    put,
    path = "/api/documents/{id}/tags",
    params(("id" = i32, Path, description = "Document ID")),
    request_body = SetTagsRequest,
    responses(
        (status = 200, description = "Tags now on the document", body = Vec<TagResponse>),
        (status = 403, description = "Forbidden")
    ),
    security(("jwt" = [])),
    tag = "tags"
)]
pub async fn set_document_tags(
    State(state): State<crate::AppState>,
    Extension(ctx): Extension<DocumentContext>,
    Json(req): Json<SetTagsRequest>,
) -> Result<Json<Vec<TagResponse>>, AppError> {
    ctx.require(Capability::Write)?;
    let tags = TagService::set_document_tags(&state.db, &ctx.document, &req.tags).await?;
    Ok(Json(tags.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    delete,
    path = "/api/documents/{id}/tags/{tag_id}",
    params(
        ("id" = i32, Path, description = "Document ID"),
        ("tag_id" = i32, Path, description = "Tag ID")
    ),
    responses(
        (status = 204, description = "Tag detached"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Tag not attached")
    ),
    security(("jwt" = [])),
    tag = "tags"
)]
pub async fn detach_tag(
    State(state): State<crate::AppState>,
    Extension(ctx): Extension<DocumentContext>,
    Path((_document_id, tag_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    ctx.require(Capability::Write)?;
    let tag_id = parse_id(&tag_id, "tag")?;
    TagService::detach(&state.db, ctx.document.id, tag_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
