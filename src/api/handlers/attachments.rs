use crate::api::error::{AppError, parse_id};
use crate::api::handlers::{content_disposition, read_file_field};
use crate::entities::attachments;
use crate::services::access::{Capability, DocumentContext};
use crate::services::attachment_service::AttachmentService;
use axum::{
    Extension, Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AttachmentResponse {
    pub id: i32,
    pub document_id: i32,
    pub filename: String,
    pub size: i64,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

impl From<attachments::Model> for AttachmentResponse {
    fn from(a: attachments::Model) -> Self {
        Self {
            id: a.id,
            document_id: a.document_id,
            filename: a.filename,
            size: a.size,
            content_type: a.content_type,
            created_at: a.created_at,
        }
    }
}

/// Upload an attachment (multipart field `file`)
#[utoipa::path(
    post,
    path = "/api/documents/{id}/attachments",
    params(("id" = i32, Path, description = "Document ID")),
    request_body(content = Object, description = "File to attach", content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Attachment stored", body = AttachmentResponse),
        (status = 403, description = "Forbidden"),
        (status = 413, description = "File too large")
    ),
    security(("jwt" = [])),
    tag = "attachments"
)]
pub async fn upload_attachment(
    State(state): State<crate::AppState>,
    Extension(ctx): Extension<DocumentContext>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<AttachmentResponse>), AppError> {
    ctx.require(Capability::Write)?;
    let (filename, data) = read_file_field(&mut multipart, &["file"]).await?;

    let attachment = AttachmentService::upload(
        &state.db,
        state.attachments.as_ref(),
        &ctx,
        &filename,
        &data,
        state.config.max_upload_size,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(attachment.into())))
}

#[utoipa::path(
    get,
    path = "/api/documents/{id}/attachments",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Attachments", body = Vec<AttachmentResponse>),
        (status = 403, description = "Forbidden")
    ),
    security(("jwt" = [])),
    tag = "attachments"
)]
pub async fn list_attachments(
    State(state): State<crate::AppState>,
    Extension(ctx): Extension<DocumentContext>,
) -> Result<Json<Vec<AttachmentResponse>>, AppError> {
    ctx.require(Capability::Read)?;
    let items = AttachmentService::list(&state.db, ctx.document.id).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// Stream an attachment back to the client
#[utoipa::path(
    get,
    path = "/api/documents/{id}/attachments/{attachment_id}",
    params(
        ("id" = i32, Path, description = "Document ID"),
        ("attachment_id" = i32, Path, description = "Attachment ID")
    ),
    responses(
        (status = 200, description = "File contents"),
        (status = 404, description = "Attachment not found")
    ),
    security(("jwt" = [])),
    tag = "attachments"
)]
pub async fn download_attachment(
    State(state): State<crate::AppState>,
    Extension(ctx): Extension<DocumentContext>,
    Path((_document_id, attachment_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let attachment_id = parse_id(&attachment_id, "attachment")?;
    let (attachment, reader) =
        AttachmentService::open(&state.db, state.attachments.as_ref(), &ctx, attachment_id)
            .await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, attachment.content_type)
        .header(header::CONTENT_LENGTH, attachment.size)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&attachment.filename),
        )
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(e.to_string()))
}

#[utoipa::path(
    delete,
    path = "/api/documents/{id}/attachments/{attachment_id}",
    params(
        ("id" = i32, Path, description = "Document ID"),
        ("attachment_id" = i32, Path, description = "Attachment ID")
    ),
    responses(
        (status = 204, description = "Attachment deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Attachment not found")
    ),
    security(("jwt" = [])),
    tag = "attachments"
)]
pub async fn delete_attachment(
    State(state): State<crate::AppState>,
    Extension(ctx): Extension<DocumentContext>,
    Path((_document_id, attachment_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let attachment_id = parse_id(&attachment_id, "attachment")?;
    AttachmentService::delete(&state.db, state.attachments.as_ref(), &ctx, attachment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
