pub mod access;
pub mod activity_service;
pub mod attachment_service;
pub mod collaboration_service;
pub mod comment_service;
pub mod document_service;
pub mod folder_service;
pub mod notification_service;
pub mod share_service;
pub mod storage;
pub mod tag_service;
pub mod transfer_service;
pub mod user_service;
