use crate::api::error::AppError;
use crate::utils::auth::validate_jwt;
use crate::{AppState, entities::prelude::Users};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sea_orm::EntityTrait;
use serde::Deserialize;

#[derive(Deserialize)]
struct AuthQuery {
    token: Option<String>,
}

fn bearer_token(req: &Request) -> Option<String> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string());

    if auth_header.is_some() {
        return auth_header;
    }

    // Download links can't carry headers
    let query = req.uri().query().unwrap_or_default();
    serde_urlencoded::from_str::<AuthQuery>(query)
        .ok()
        .and_then(|q| q.token)
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req)
        .ok_or_else(|| AppError::Unauthorized("Missing authentication token".to_string()))?;

    let claims = validate_jwt(&token, &state.config.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

    // Check if user still exists in DB
    let user_exists = Users::find_by_id(claims.id)
        .one(&state.db)
        .await?
        .is_some();

    if !user_exists {
        return Err(AppError::Unauthorized("User no longer exists".to_string()));
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
