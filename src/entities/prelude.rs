pub use super::attachments::Entity as Attachments;
pub use super::collaborations::Entity as Collaborations;
pub use super::comments::Entity as Comments;
pub use super::document_tags::Entity as DocumentTags;
pub use super::documents::Entity as Documents;
pub use super::favorites::Entity as Favorites;
pub use super::folders::Entity as Folders;
pub use super::notifications::Entity as Notifications;
pub use super::recent_documents::Entity as RecentDocuments;
pub use super::shares::Entity as Shares;
pub use super::tags::Entity as Tags;
pub use super::users::Entity as Users;
pub use super::versions::Entity as Versions;
