use crate::AppState;
use crate::api::error::{AppError, parse_id};
use crate::services::access;
use crate::utils::auth::Claims;
use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;

/// Resolves the caller's access to the `:id` document and stores the
/// resulting `DocumentContext` in request extensions. Missing documents stop
/// here with 404; capability checks happen in the handlers.
pub async fn document_access_middleware(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let raw = params
        .get("id")
        .ok_or_else(|| AppError::BadRequest("Missing document ID".to_string()))?;
    let document_id = parse_id(raw, "document")?;

    let claims = req
        .extensions()
        .get::<Claims>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    let ctx = access::load_and_resolve(&state.db, document_id, claims.id).await?;
    tracing::debug!(
        "Document {} resolved for user {} as {}",
        document_id,
        claims.id,
        ctx.access.label()
    );

    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}
