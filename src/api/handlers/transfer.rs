use crate::api::error::AppError;
use crate::api::handlers::documents::DocumentResponse;
use crate::api::handlers::{content_disposition, read_file_field};
use crate::services::access::DocumentContext;
use crate::services::transfer_service::TransferService;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    body::Body,
    extract::{Multipart, State},
    http::{StatusCode, header},
    response::Response,
};

/// Export a document as a JSON file
#[utoipa::path(
    get,
    path = "/api/documents/{id}/export",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "JSON export", content_type = "application/json"),
        (status = 403, description = "Forbidden")
    ),
    security(("jwt" = [])),
    tag = "transfer"
)]
pub async fn export_document(
    State(state): State<crate::AppState>,
    Extension(ctx): Extension<DocumentContext>,
) -> Result<Response, AppError> {
    let (filename, bytes) = TransferService::export(&state.db, state.exports.as_ref(), &ctx).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .header(header::CONTENT_DISPOSITION, content_disposition(&filename))
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Import a document from an export file (multipart field `document` or `file`)
#[utoipa::path(
    post,
    path = "/api/documents/import",
    request_body(content = Object, description = "Exported JSON document", content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document imported", body = DocumentResponse),
        (status = 400, description = "Malformed file")
    ),
    security(("jwt" = [])),
    tag = "transfer"
)]
pub async fn import_document(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentResponse>), AppError> {
    let (_, data) = read_file_field(&mut multipart, &["document", "file"]).await?;
    let doc = TransferService::import(&state.db, claims.id, &data).await?;
    Ok((StatusCode::CREATED, Json(doc.into())))
}
