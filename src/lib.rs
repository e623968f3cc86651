pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::api::handlers::{
    activity, attachments, auth, collaborations, comments, documents, folders, health,
    notifications, shares, tags, transfer, versions,
};
use crate::api::middleware::{
    auth::auth_middleware, document_access::document_access_middleware,
    request_id::request_id_middleware,
};
use crate::config::AppConfig;
use crate::services::storage::StorageService;
use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::refresh,
        auth::me,
        documents::list_documents,
        documents::create_document,
        documents::get_document,
        documents::update_document,
        documents::delete_document,
        documents::search_documents,
        documents::shared_documents,
        documents::check_access,
        versions::create_version,
        versions::list_versions,
        versions::get_version,
        attachments::upload_attachment,
        attachments::list_attachments,
        attachments::download_attachment,
        attachments::delete_attachment,
        shares::share_document,
        shares::list_document_shares,
        shares::revoke_share,
        shares::shared_with_me,
        shares::shared_by_me,
        collaborations::add_collaborator,
        collaborations::list_collaborators,
        collaborations::remove_collaborator,
        comments::add_comment,
        comments::list_comments,
        comments::delete_comment,
        tags::create_tag,
        tags::list_tags,
        tags::delete_tag,
        tags::search_by_tag,
        tags::set_document_tags,
        tags::detach_tag,
        folders::create_folder,
        folders::list_folders,
        folders::update_folder,
        folders::delete_folder,
        folders::folder_documents,
        notifications::list_notifications,
        notifications::mark_read,
        notifications::mark_all_read,
        notifications::delete_notification,
        activity::list_favorites,
        activity::add_favorite,
        activity::remove_favorite,
        activity::list_recent,
        transfer::export_document,
        transfer::import_document,
    ),
    components(
        schemas(
            health::HealthResponse,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::UserResponse,
            auth::AuthResponse,
            documents::CreateDocumentRequest,
            documents::UpdateDocumentRequest,
            documents::DocumentResponse,
            documents::DocumentDetailResponse,
            documents::SharedDocumentResponse,
            documents::AccessResponse,
            versions::CreateVersionRequest,
            versions::VersionResponse,
            attachments::AttachmentResponse,
            shares::ShareRequest,
            shares::ShareResponse,
            shares::ShareWithDocumentResponse,
            collaborations::AddCollaboratorRequest,
            collaborations::CollaboratorResponse,
            comments::CreateCommentRequest,
            comments::CommentResponse,
            tags::CreateTagRequest,
            tags::SetTagsRequest,
            tags::TagResponse,
            folders::CreateFolderRequest,
            folders::UpdateFolderRequest,
            folders::FolderResponse,
            notifications::NotificationResponse,
            notifications::MarkAllReadResponse,
            activity::FavoriteResponse,
            activity::RecentDocumentResponse,
            services::access::Capability,
            services::transfer_service::DocumentExport,
            services::transfer_service::VersionExport,
            entities::sea_orm_active_enums::SharePermission,
            entities::sea_orm_active_enums::CollaborationRole,
            entities::sea_orm_active_enums::NotificationType,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration and sessions"),
        (name = "documents", description = "Document management"),
        (name = "versions", description = "Content snapshots"),
        (name = "attachments", description = "Files attached to documents"),
        (name = "shares", description = "Per-user document grants"),
        (name = "collaborators", description = "Ongoing document collaboration"),
        (name = "comments", description = "Threaded comments"),
        (name = "tags", description = "Tagging and tag search"),
        (name = "folders", description = "Folder hierarchy"),
        (name = "notifications", description = "In-app notifications"),
        (name = "activity", description = "Favorites and recent documents"),
        (name = "transfer", description = "JSON export and import"),
        (name = "system", description = "Health")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub attachments: Arc<dyn StorageService>,
    pub exports: Arc<dyn StorageService>,
    pub config: AppConfig,
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
        .expose_headers([
            header::CONTENT_DISPOSITION,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn create_app(state: AppState) -> Router {
    // Everything under /api/documents/:id gets a resolved DocumentContext
    let document_routes = Router::new()
        .route(
            "/api/documents/:id",
            get(documents::get_document)
                .put(documents::update_document)
                .delete(documents::delete_document),
        )
        .route("/api/documents/:id/access", get(documents::check_access))
        .route("/api/documents/:id/share", post(shares::share_document))
        .route(
            "/api/documents/:id/shares",
            get(shares::list_document_shares),
        )
        .route(
            "/api/documents/:id/collaborators",
            get(collaborations::list_collaborators).post(collaborations::add_collaborator),
        )
        .route(
            "/api/documents/:id/collaborators/:user_id",
            delete(collaborations::remove_collaborator),
        )
        .route(
            "/api/documents/:id/versions",
            get(versions::list_versions).post(versions::create_version),
        )
        .route(
            "/api/documents/:id/versions/:version_id",
            get(versions::get_version),
        )
        .route(
            "/api/documents/:id/attachments",
            get(attachments::list_attachments).post(attachments::upload_attachment),
        )
        .route(
            "/api/documents/:id/attachments/:attachment_id",
            get(attachments::download_attachment).delete(attachments::delete_attachment),
        )
        .route(
            "/api/documents/:id/comments",
            get(comments::list_comments).post(comments::add_comment),
        )
        .route(
            "/api/documents/:id/comments/:comment_id",
            delete(comments::delete_comment),
        )
        .route("/api/documents/:id/tags", put(tags::set_document_tags))
        .route(
            "/api/documents/:id/tags/:tag_id",
            delete(tags::detach_tag),
        )
        .route(
            "/api/documents/:id/export",
            get(transfer::export_document),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            document_access_middleware,
        ));

    let protected = Router::new()
        .route("/api/refresh", post(auth::refresh))
        .route("/api/me", get(auth::me))
        .route(
            "/api/documents",
            get(documents::list_documents).post(documents::create_document),
        )
        .route("/api/documents/search", get(documents::search_documents))
        .route("/api/documents/shared", get(documents::shared_documents))
        .route("/api/documents/import", post(transfer::import_document))
        .route("/api/shares/with-me", get(shares::shared_with_me))
        .route("/api/shares/by-me", get(shares::shared_by_me))
        .route("/api/shares/:id", delete(shares::revoke_share))
        .route(
            "/api/folders",
            get(folders::list_folders).post(folders::create_folder),
        )
        .route(
            "/api/folders/:id",
            put(folders::update_folder).delete(folders::delete_folder),
        )
        .route(
            "/api/folders/:id/documents",
            get(folders::folder_documents),
        )
        .route("/api/tags", get(tags::list_tags).post(tags::create_tag))
        .route("/api/tags/search", get(tags::search_by_tag))
        .route("/api/tags/:id", delete(tags::delete_tag))
        .route(
            "/api/notifications",
            get(notifications::list_notifications),
        )
        .route(
            "/api/notifications/read-all",
            put(notifications::mark_all_read),
        )
        .route(
            "/api/notifications/:id/read",
            put(notifications::mark_read),
        )
        .route(
            "/api/notifications/:id",
            delete(notifications::delete_notification),
        )
        .route("/api/favorites", get(activity::list_favorites))
        .route(
            "/api/favorites/:id",
            post(activity::add_favorite).delete(activity::remove_favorite),
        )
        .route("/api/recent", get(activity::list_recent))
        .merge(document_routes)
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health::health_check))
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .merge(protected)
        .layer(from_fn(request_id_middleware))
        .layer(cors_layer(&state.config))
        .layer(axum::extract::DefaultBodyLimit::max(
            state.config.max_upload_size + 10 * 1024 * 1024, // Add 10MB buffer for multipart overhead
        ))
        .with_state(state)
}
