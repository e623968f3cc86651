pub mod auth;
pub mod document_access;
pub mod request_id;
