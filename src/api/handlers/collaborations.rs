use crate::api::error::{AppError, parse_id};
use crate::entities::sea_orm_active_enums::CollaborationRole;
use crate::entities::{collaborations, users};
use crate::services::access::{Capability, DocumentContext};
use crate::services::collaboration_service::CollaborationService;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct AddCollaboratorRequest {
    pub email: String,
    pub role: CollaborationRole,
    /// Access stops after this instant; omit for no expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct CollaboratorResponse {
    pub id: i32,
    pub document_id: i32,
    pub user_id: i32,
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: CollaborationRole,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CollaboratorResponse {
    fn new(c: collaborations::Model, user: Option<&users::Model>) -> Self {
        Self {
            id: c.id,
            document_id: c.document_id,
            user_id: c.user_id,
            username: user.map(|u| u.username.clone()),
            email: user.map(|u| u.email.clone()),
            role: c.role,
            expires_at: c.expires_at,
            created_at: c.created_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/documents/{id}/collaborators",
    params(("id" = i32, Path, description = "Document ID")),
    request_body = AddCollaboratorRequest,
    responses(
        (status = 201, description = "Collaborator added", body = CollaboratorResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Already a collaborator")
    ),
    security(("jwt" = [])),
    tag = "collaborators"
)]
pub async fn add_collaborator(
    State(state): State<crate::AppState>,
    Extension(ctx): Extension<DocumentContext>,
    Json(req): Json<AddCollaboratorRequest>,
) -> Result<(StatusCode, Json<CollaboratorResponse>), AppError> {
    let (collaboration, user) =
        CollaborationService::add_collaborator(&state.db, &ctx, &req.email, req.role, req.expires_at)
            .await?;

    Ok((
        StatusCode::CREATED,
        Json(CollaboratorResponse::new(collaboration, Some(&user))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/documents/{id}/collaborators",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Collaborators", body = Vec<CollaboratorResponse>),
        (status = 403, description = "Forbidden")
    ),
    security(("jwt" = [])),
    tag = "collaborators"
)]
pub async fn list_collaborators(
    State(state): State<crate::AppState>,
    Extension(ctx): Extension<DocumentContext>,
) -> Result<Json<Vec<CollaboratorResponse>>, AppError> {
    ctx.require(Capability::Read)?;
    let rows = CollaborationService::list_collaborators(&state.db, ctx.document.id).await?;
    Ok(Json(
        rows.into_iter()
            .map(|(c, user)| CollaboratorResponse::new(c, user.as_ref()))
            .collect(),
    ))
}

/// Remove a collaborator. Collaborators may remove themselves.
#[utoipa::path(
    delete,
    path = "/api/documents/{id}/collaborators/{user_id}",
    params(
        ("id" = i32, Path, description = "Document ID"),
        ("user_id" = i32, Path, description = "Collaborator's user ID")
    ),
    responses(
        (status = 204, description = "Collaborator removed"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Collaborator not found")
    ),
    security(("jwt" = [])),
    tag = "collaborators"
)]
pub async fn remove_collaborator(
    State(state): State<crate::AppState>,
    Extension(ctx): Extension<DocumentContext>,
    Path((_document_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let user_id = parse_id(&user_id, "user")?;
    CollaborationService::remove_collaborator(&state.db, &ctx, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
