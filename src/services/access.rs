use crate::api::error::AppError;
use crate::entities::sea_orm_active_enums::{CollaborationRole, SharePermission};
use crate::entities::{prelude::*, *};
use chrono::Utc;
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What a user may do with a document, ordered from weakest to strongest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Read,
    Write,
    Manage,
}

impl From<SharePermission> for Capability {
    fn from(permission: SharePermission) -> Self {
        match permission {
            SharePermission::Read => Capability::Read,
            SharePermission::Write => Capability::Write,
            SharePermission::Admin => Capability::Manage,
        }
    }
}

impl From<CollaborationRole> for Capability {
    fn from(role: CollaborationRole) -> Self {
        match role {
            CollaborationRole::Viewer => Capability::Read,
            CollaborationRole::Editor => Capability::Write,
            CollaborationRole::Admin => Capability::Manage,
        }
    }
}

/// Outcome of resolving a (document, user) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Owner,
    SharedWithPermission(SharePermission),
    Collaborator(CollaborationRole),
    NoAccess,
}

impl Access {
    pub fn capability(&self) -> Option<Capability> {
        match self {
            Access::Owner => Some(Capability::Manage),
            Access::SharedWithPermission(p) => Some((*p).into()),
            Access::Collaborator(r) => Some((*r).into()),
            Access::NoAccess => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Access::Owner => "owner",
            Access::SharedWithPermission(_) => "shared",
            Access::Collaborator(_) => "collaborator",
            Access::NoAccess => "none",
        }
    }
}

/// A loaded document plus the caller's resolved access, handed to document
/// routes through request extensions.
#[derive(Debug, Clone)]
pub struct DocumentContext {
    pub document: documents::Model,
    pub access: Access,
    pub user_id: i32,
}

impl DocumentContext {
    /// Effective capability, counting public visibility as read access.
    pub fn capability(&self) -> Option<Capability> {
        let public = self.document.is_public.then_some(Capability::Read);
        self.access.capability().max(public)
    }

    pub fn can(&self, needed: Capability) -> bool {
        self.capability().is_some_and(|cap| cap >= needed)
    }

    pub fn require(&self, needed: Capability) -> Result<(), AppError> {
        if self.can(needed) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You do not have permission to perform this action".to_string(),
            ))
        }
    }

    pub fn require_owner(&self) -> Result<(), AppError> {
        if self.access == Access::Owner {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only the document owner can perform this action".to_string(),
            ))
        }
    }
}

/// Resolve the caller's relationship to an already loaded document.
pub async fn resolve_access<C: ConnectionTrait>(
    conn: &C,
    document: &documents::Model,
    user_id: i32,
) -> Result<Access, AppError> {
    if document.owner_id == user_id {
        return Ok(Access::Owner);
    }

    let share = Shares::find()
        .filter(shares::Column::DocumentId.eq(document.id))
        .filter(shares::Column::UserId.eq(user_id))
        .one(conn)
        .await?;

    let now = Utc::now();
    let collaboration = Collaborations::find()
        .filter(collaborations::Column::DocumentId.eq(document.id))
        .filter(collaborations::Column::UserId.eq(user_id))
        .one(conn)
        .await?
        .filter(|c| c.is_live(now));

    Ok(pick_access(
        share.map(|s| s.permission),
        collaboration.map(|c| c.role),
    ))
}

fn pick_access(share: Option<SharePermission>, role: Option<CollaborationRole>) -> Access {
    match (share, role) {
        (Some(p), Some(r)) if Capability::from(r) > Capability::from(p) => Access::Collaborator(r),
        (Some(p), _) => Access::SharedWithPermission(p),
        (None, Some(r)) => Access::Collaborator(r),
        (None, None) => Access::NoAccess,
    }
}

/// Load the document and resolve access. A missing document is `NotFound`.
pub async fn load_and_resolve<C: ConnectionTrait>(
    conn: &C,
    document_id: i32,
    user_id: i32,
) -> Result<DocumentContext, AppError> {
    let document = Documents::find_by_id(document_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    let access = resolve_access(conn, &document, user_id).await?;

    Ok(DocumentContext {
        document,
        access,
        user_id,
    })
}

/// Filter matching every document the user can at least read.
pub async fn readable_condition<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
) -> Result<Condition, AppError> {
    let shared: Vec<i32> = Shares::find()
        .select_only()
        .column(shares::Column::DocumentId)
        .filter(shares::Column::UserId.eq(user_id))
        .into_tuple()
        .all(conn)
        .await?;

    let now = Utc::now();
    let collaborating: Vec<i32> = Collaborations::find()
        .filter(collaborations::Column::UserId.eq(user_id))
        .filter(
            Condition::any()
                .add(collaborations::Column::ExpiresAt.is_null())
                .add(collaborations::Column::ExpiresAt.gt(now)),
        )
        .all(conn)
        .await?
        .into_iter()
        .map(|c| c.document_id)
        .collect();

    Ok(Condition::any()
        .add(documents::Column::OwnerId.eq(user_id))
        .add(documents::Column::IsPublic.eq(true))
        .add(documents::Column::Id.is_in(shared))
        .add(documents::Column::Id.is_in(collaborating)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(access: Access, is_public: bool) -> DocumentContext {
        let now = Utc::now();
        DocumentContext {
            document: documents::Model {
                id: 1,
                title: "t".into(),
                content: String::new(),
                owner_id: 1,
                folder_id: None,
                is_public,
                created_at: now,
                updated_at: now,
            },
            access,
            user_id: 2,
        }
    }

    #[test]
    fn test_capability_wire_format() {
        assert_eq!(serde_json::to_value(Capability::Manage).unwrap(), "manage");
        let parsed: Option<Capability> = serde_json::from_str(r#""write""#).unwrap();
        assert_eq!(parsed, Some(Capability::Write));
    }

    #[test]
    fn test_capability_ordering() {
        assert!(Capability::Read < Capability::Write);
        assert!(Capability::Write < Capability::Manage);
    }

    #[test]
    fn test_permission_and_role_mapping() {
        assert_eq!(Capability::from(SharePermission::Read), Capability::Read);
        assert_eq!(Capability::from(SharePermission::Write), Capability::Write);
        assert_eq!(Capability::from(SharePermission::Admin), Capability::Manage);
        assert_eq!(Capability::from(CollaborationRole::Viewer), Capability::Read);
        assert_eq!(Capability::from(CollaborationRole::Editor), Capability::Write);
        assert_eq!(Capability::from(CollaborationRole::Admin), Capability::Manage);
    }

    #[test]
    fn test_pick_access_prefers_stronger_grant() {
        assert_eq!(
            pick_access(Some(SharePermission::Read), Some(CollaborationRole::Editor)),
            Access::Collaborator(CollaborationRole::Editor)
        );
        // ties go to the share
        assert_eq!(
            pick_access(Some(SharePermission::Write), Some(CollaborationRole::Editor)),
            Access::SharedWithPermission(SharePermission::Write)
        );
        assert_eq!(pick_access(None, None), Access::NoAccess);
    }

    #[test]
    fn test_no_access_private_is_forbidden() {
        let ctx = context(Access::NoAccess, false);
        assert!(matches!(
            ctx.require(Capability::Read),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_public_grants_read_only() {
        let ctx = context(Access::NoAccess, true);
        assert!(ctx.require(Capability::Read).is_ok());
        assert!(ctx.require(Capability::Write).is_err());
    }

    #[test]
    fn test_only_owner_passes_owner_check() {
        assert!(context(Access::Owner, false).require_owner().is_ok());
        let admin = context(Access::SharedWithPermission(SharePermission::Admin), false);
        assert!(admin.require(Capability::Manage).is_ok());
        assert!(admin.require_owner().is_err());
    }
}
