pub mod prelude;

pub mod sea_orm_active_enums;

pub mod attachments;
pub mod collaborations;
pub mod comments;
pub mod document_tags;
pub mod documents;
pub mod favorites;
pub mod folders;
pub mod notifications;
pub mod recent_documents;
pub mod shares;
pub mod tags;
pub mod users;
pub mod versions;
