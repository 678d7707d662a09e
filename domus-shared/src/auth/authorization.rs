/// Role-based authorization
///
/// Every family action is one [`Permission`]. Whether a role holds it is a
/// single lookup in [`role_allows`]; nothing else in the crate compares
/// roles directly.
///
/// | Permission           | head | worker | member |
/// |----------------------|------|--------|--------|
/// | ViewFamily           | yes  | yes    | yes    |
/// | LeaveFamily          | yes  | yes    | yes    |
/// | CreateExpense        | yes  | yes    | yes    |
/// | ViewMovements        | yes  | yes    | yes    |
/// | ViewReports          | yes  | yes    | yes    |
/// | ViewHousing          | yes  | yes    | yes    |
/// | CreateIncome         | yes  | yes    | no     |
/// | ManageHousing        | yes  | yes    | no     |
/// | ManageMembers        | yes  | no     | no     |
/// | RegenerateInviteCode | yes  | no     | no     |
/// | DeleteFamily         | yes  | no     | no     |
/// | ManageAnyMovement    | yes  | no     | no     |
///
/// # Example
///
/// ```no_run
/// use domus_shared::auth::authorization::{require_permission, Permission};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, family_id: Uuid, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let membership = require_permission(&pool, family_id, user_id, Permission::CreateIncome).await?;
/// println!("acting as {}", membership.role.as_str());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::membership::{MemberRole, Membership};

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("Not a member of family {0}")]
    NotMember(Uuid),

    #[error("Role {role:?} lacks permission {permission:?}")]
    MissingPermission {
        permission: Permission,
        role: MemberRole,
    },

    #[error("Not authorized to access this resource")]
    NotAuthorized,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewFamily,
    LeaveFamily,
    CreateExpense,
    ViewMovements,
    ViewReports,
    ViewHousing,
    CreateIncome,
    ManageHousing,
    ManageMembers,
    RegenerateInviteCode,
    DeleteFamily,
    ManageAnyMovement,
}

impl Permission {
    pub const ALL: [Permission; 12] = [
        Permission::ViewFamily,
        Permission::LeaveFamily,
        Permission::CreateExpense,
        Permission::ViewMovements,
        Permission::ViewReports,
        Permission::ViewHousing,
        Permission::CreateIncome,
        Permission::ManageHousing,
        Permission::ManageMembers,
        Permission::RegenerateInviteCode,
        Permission::DeleteFamily,
        Permission::ManageAnyMovement,
    ];
}

/// The permission table
pub fn role_allows(role: MemberRole, permission: Permission) -> bool {
    use Permission::*;

    match permission {
        ViewFamily | LeaveFamily | CreateExpense | ViewMovements | ViewReports | ViewHousing => true,
        CreateIncome | ManageHousing => matches!(role, MemberRole::Head | MemberRole::Worker),
        ManageMembers | RegenerateInviteCode | DeleteFamily | ManageAnyMovement => {
            matches!(role, MemberRole::Head)
        }
    }
}

/// Every permission the role holds, in table order
pub fn granted_permissions(role: MemberRole) -> Vec<Permission> {
    Permission::ALL
        .into_iter()
        .filter(|p| role_allows(role, *p))
        .collect()
}

/// Checks a role already loaded by the caller
pub fn check_permission(role: MemberRole, permission: Permission) -> Result<(), AuthzError> {
    if role_allows(role, permission) {
        Ok(())
    } else {
        Err(AuthzError::MissingPermission { permission, role })
    }
}

/// Loads the user's membership in a family
///
/// # Errors
///
/// Returns `AuthzError::NotMember` when the user does not belong to the family
pub async fn require_membership(
    pool: &PgPool,
    family_id: Uuid,
    user_id: Uuid,
) -> Result<Membership, AuthzError> {
    Membership::find(pool, family_id, user_id)
        .await?
        .ok_or(AuthzError::NotMember(family_id))
}

/// Loads the user's membership and checks it against the permission table
///
/// # Errors
///
/// - `AuthzError::NotMember` when the user does not belong to the family
/// - `AuthzError::MissingPermission` when their role lacks the permission
pub async fn require_permission(
    pool: &PgPool,
    family_id: Uuid,
    user_id: Uuid,
    permission: Permission,
) -> Result<Membership, AuthzError> {
    let membership = require_membership(pool, family_id, user_id).await?;
    check_permission(membership.role, permission)?;
    Ok(membership)
}

/// Authors manage their own records; others need `fallback`
pub fn require_ownership_or(
    requester_id: Uuid,
    requester_role: MemberRole,
    owner_id: Uuid,
    fallback: Permission,
) -> Result<(), AuthzError> {
    if requester_id == owner_id || role_allows(requester_role, fallback) {
        Ok(())
    } else {
        Err(AuthzError::NotAuthorized)
    }
}
