use crate::api::error::{AppError, parse_id};
use crate::api::handlers::documents::DocumentResponse;
use crate::entities::sea_orm_active_enums::SharePermission;
use crate::entities::{documents, shares, users};
use crate::services::access::{Capability, DocumentContext};
use crate::services::share_service::ShareService;
use crate::services::user_service::UserService;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ── Request / Response Types ──────────────────────────────────────────

#[derive(Deserialize, ToSchema)]
pub struct ShareRequest {
    pub email: String,
    pub permission: SharePermission,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ShareResponse {
    pub id: i32,
    pub document_id: i32,
    pub user_id: i32,
    pub username: Option<String>,
    pub email: Option<String>,
    pub permission: SharePermission,
    pub created_by_id: i32,
    pub created_at: DateTime<Utc>,
}

impl ShareResponse {
    fn new(share: shares::Model, grantee: Option<&users::Model>) -> Self {
        Self {
            id: share.id,
            document_id: share.document_id,
            user_id: share.user_id,
            username: grantee.map(|u| u.username.clone()),
            email: grantee.map(|u| u.email.clone()),
            permission: share.permission,
            created_by_id: share.created_by_id,
            created_at: share.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ShareWithDocumentResponse {
    pub id: i32,
    pub permission: SharePermission,
    pub user_id: i32,
    pub created_by_id: i32,
    pub created_at: DateTime<Utc>,
    pub document: DocumentResponse,
}

// ── Handlers ──────────────────────────────────────────────────────────

/// Share a document with another user by email
#[utoipa::path(
    post,
    path = "/api/documents/{id}/share",
    params(("id" = i32, Path, description = "Document ID")),
    request_body = ShareRequest,
    responses(
        (status = 201, description = "Share created", body = ShareResponse),
        (status = 400, description = "Bad request"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Already shared with this user")
    ),
    security(("jwt" = [])),
    tag = "shares"
)]
pub async fn share_document(
    State(state): State<crate::AppState>,
    Extension(ctx): Extension<DocumentContext>,
    Json(req): Json<ShareRequest>,
) -> Result<(StatusCode, Json<ShareResponse>), AppError> {
    let share = ShareService::share_document(&state.db, &ctx, &req.email, req.permission).await?;
    let grantee = UserService::find_by_id(&state.db, share.user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ShareResponse::new(share, Some(&grantee))),
    ))
}

/// List grants on a document
#[utoipa::path(
    get,
    path = "/api/documents/{id}/shares",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Shares", body = Vec<ShareResponse>),
        (status = 403, description = "Forbidden")
    ),
    security(("jwt" = [])),
    tag = "shares"
)]
pub async fn list_document_shares(
    State(state): State<crate::AppState>,
    Extension(ctx): Extension<DocumentContext>,
) -> Result<Json<Vec<ShareResponse>>, AppError> {
    ctx.require(Capability::Read)?;
    let rows = ShareService::list_for_document(&state.db, ctx.document.id).await?;
    Ok(Json(
        rows.into_iter()
            .map(|(share, user)| ShareResponse::new(share, user.as_ref()))
            .collect(),
    ))
}

/// Revoke a share
#[utoipa::path(
    delete,
    path = "/api/shares/{id}",
    params(("id" = i32, Path, description = "Share ID")),
    responses(
        (status = 204, description = "Share revoked"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Share not found")
    ),
    security(("jwt" = [])),
    tag = "shares"
)]
pub async fn revoke_share(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(share_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let share_id = parse_id(&share_id, "share")?;
    ShareService::revoke_share(&state.db, share_id, claims.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn with_document(rows: Vec<(shares::Model, documents::Model)>) -> Vec<ShareWithDocumentResponse> {
    rows.into_iter()
        .map(|(share, doc)| ShareWithDocumentResponse {
            id: share.id,
            permission: share.permission,
            user_id: share.user_id,
            created_by_id: share.created_by_id,
            created_at: share.created_at,
            document: doc.into(),
        })
        .collect()
}

/// Shares granted to the caller
#[utoipa::path(
    get,
    path = "/api/shares/with-me",
    responses(
        (status = 200, description = "Shares received", body = Vec<ShareWithDocumentResponse>)
    ),
    security(("jwt" = [])),
    tag = "shares"
)]
pub async fn shared_with_me(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ShareWithDocumentResponse>>, AppError> {
    let rows = ShareService::list_shared_with(&state.db, claims.id).await?;
    Ok(Json(with_document(rows)))
}

/// Shares the caller granted
#[utoipa::path(
    get,
    path = "/api/shares/by-me",
    responses(
        (status = 200, description = "Shares granted", body = Vec<ShareWithDocumentResponse>)
    ),
    security(("jwt" = [])),
    tag = "shares"
)]
pub async fn shared_by_me(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ShareWithDocumentResponse>>, AppError> {
    let rows = ShareService::list_shared_by(&state.db, claims.id).await?;
    Ok(Json(with_document(rows)))
}
