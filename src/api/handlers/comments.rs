use crate::api::error::{AppError, parse_id};
use crate::entities::comments;
use crate::services::access::{Capability, DocumentContext};
use crate::services::comment_service::CommentService;
use crate::services::user_service::UserService;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateCommentRequest {
    pub content: String,
    /// Comment being replied to.
    pub parent_id: Option<i32>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub document_id: i32,
    pub user_id: i32,
    pub username: Option<String>,
    pub content: String,
    pub parent_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl CommentResponse {
    fn new(c: comments::Model, username: Option<String>) -> Self {
        Self {
            id: c.id,
            document_id: c.document_id,
            user_id: c.user_id,
            username,
            content: c.content,
            parent_id: c.parent_id,
            created_at: c.created_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/documents/{id}/comments",
    params(("id" = i32, Path, description = "Document ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment added", body = CommentResponse),
        (status = 400, description = "Empty comment or unknown parent"),
        (status = 403, description = "Forbidden")
    ),
    security(("jwt" = [])),
    tag = "comments"
)]
pub async fn add_comment(
    State(state): State<crate::AppState>,
    Extension(ctx): Extension<DocumentContext>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    let comment = CommentService::add_comment(&state.db, &ctx, &req.content, req.parent_id).await?;
    let author = UserService::find_by_id(&state.db, comment.user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(CommentResponse::new(comment, Some(author.username))),
    ))
}

/// List comments, newest first
#[utoipa::path(
    get,
    path = "/api/documents/{id}/comments",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Comments", body = Vec<CommentResponse>),
        (status = 403, description = "Forbidden")
    ),
    security(("jwt" = [])),
    tag = "comments"
)]
pub async fn list_comments(
    State(state): State<crate::AppState>,
    Extension(ctx): Extension<DocumentContext>,
) -> Result<Json<Vec<CommentResponse>>, AppError> {
    ctx.require(Capability::Read)?;
    let comments = CommentService::list(&state.db, ctx.document.id).await?;
    let authors = UserService::by_ids(&state.db, comments.iter().map(|c| c.user_id)).await?;

    Ok(Json(
        comments
            .into_iter()
            .map(|c| {
                let username = authors.get(&c.user_id).map(|u| u.username.clone());
                CommentResponse::new(c, username)
            })
            .collect(),
    ))
}

/// Delete a comment and its replies
#[utoipa::path(
    delete,
    path = "/api/documents/{id}/comments/{comment_id}",
    params(
        ("id" = i32, Path, description = "Document ID"),
        ("comment_id" = i32, Path, description = "Comment ID")
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Comment not found")
    ),
    security(("jwt" = [])),
    tag = "comments"
)]
pub async fn delete_comment(
    State(state): State<crate::AppState>,
    Extension(ctx): Extension<DocumentContext>,
    Path((_document_id, comment_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    ctx.require(Capability::Read)?;
    let comment_id = parse_id(&comment_id, "comment")?;
    CommentService::delete(&state.db, &ctx, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
