use crate::api::error::{AppError, parse_id};
use crate::api::handlers::documents::DocumentResponse;
use crate::services::activity_service::ActivityService;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct FavoriteResponse {
    pub document: DocumentResponse,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RecentDocumentResponse {
    pub document: DocumentResponse,
    pub last_access: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/api/favorites",
    responses((status = 200, description = "Favorite documents", body = Vec<FavoriteResponse>)),
    security(("jwt" = [])),
    tag = "activity"
)]
pub async fn list_favorites(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<FavoriteResponse>>, AppError> {
    let rows = ActivityService::favorites(&state.db, claims.id).await?;
    Ok(Json(
        rows.into_iter()
            .map(|(fav, doc)| FavoriteResponse {
                document: doc.into(),
                created_at: fav.created_at,
            })
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/favorites/{id}",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 201, description = "Document is a favorite"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Document not found")
    ),
    security(("jwt" = [])),
    tag = "activity"
)]
pub async fn add_favorite(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "document")?;
    ActivityService::add_favorite(&state.db, claims.id, id).await?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    delete,
    path = "/api/favorites/{id}",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 204, description = "Favorite removed"),
        (status = 404, description = "Not a favorite")
    ),
    security(("jwt" = [])),
    tag = "activity"
)]
pub async fn remove_favorite(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "document")?;
    ActivityService::remove_favorite(&state.db, claims.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Recently opened documents, most recent first
#[utoipa::path(
    get,
    path = "/api/recent",
    responses((status = 200, description = "Up to 10 recent documents", body = Vec<RecentDocumentResponse>)),
    security(("jwt" = [])),
    tag = "activity"
)]
pub async fn list_recent(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<RecentDocumentResponse>>, AppError> {
    let rows = ActivityService::recent(&state.db, claims.id).await?;
    Ok(Json(
        rows.into_iter()
            .map(|(entry, doc)| RecentDocumentResponse {
                document: doc.into(),
                last_access: entry.last_access,
            })
            .collect(),
    ))
}
