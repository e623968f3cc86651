use crate::api::error::{AppError, parse_id};
use crate::entities::notifications;
use crate::entities::sea_orm_active_enums::NotificationType;
use crate::services::notification_service::NotificationService;
use crate::services::user_service::UserService;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct NotificationResponse {
    pub id: i32,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub content: String,
    pub document_id: i32,
    pub sender_id: i32,
    pub sender_username: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationResponse {
    fn new(n: notifications::Model, sender_username: Option<String>) -> Self {
        Self {
            id: n.id,
            kind: n.kind,
            content: n.content,
            document_id: n.document_id,
            sender_id: n.sender_id,
            sender_username,
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

/// The caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(("unread_only" = Option<bool>, Query, description = "Skip notifications already read")),
    responses((status = 200, description = "Notifications", body = Vec<NotificationResponse>)),
    security(("jwt" = [])),
    tag = "notifications"
)]
pub async fn list_notifications(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<NotificationResponse>>, AppError> {
    let items = NotificationService::list_for_user(&state.db, claims.id, query.unread_only).await?;
    let senders = UserService::by_ids(&state.db, items.iter().map(|n| n.sender_id)).await?;

    Ok(Json(
        items
            .into_iter()
            .map(|n| {
                let sender = senders.get(&n.sender_id).map(|u| u.username.clone());
                NotificationResponse::new(n, sender)
            })
            .collect(),
    ))
}

#[utoipa::path(
    put,
    path = "/api/notifications/{id}/read",
    params(("id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked read", body = NotificationResponse),
        (status = 404, description = "Notification not found")
    ),
    security(("jwt" = [])),
    tag = "notifications"
)]
pub async fn mark_read(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<NotificationResponse>, AppError> {
    let id = parse_id(&id, "notification")?;
    let notification = NotificationService::mark_read(&state.db, id, claims.id).await?;
    let sender = UserService::by_ids(&state.db, [notification.sender_id])
        .await?
        .remove(&notification.sender_id)
        .map(|u| u.username);
    Ok(Json(NotificationResponse::new(notification, sender)))
}

#[utoipa::path(
    put,
    path = "/api/notifications/read-all",
    responses((status = 200, description = "Number of notifications updated", body = MarkAllReadResponse)),
    security(("jwt" = [])),
    tag = "notifications"
)]
pub async fn mark_all_read(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MarkAllReadResponse>, AppError> {
    let updated = NotificationService::mark_all_read(&state.db, claims.id).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}

#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    params(("id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 404, description = "Notification not found")
    ),
    security(("jwt" = [])),
    tag = "notifications"
)]
pub async fn delete_notification(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "notification")?;
    NotificationService::delete(&state.db, id, claims.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
