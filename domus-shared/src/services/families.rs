//! Family lifecycle: create, join, roles, leaving and invite codes.
//!
//! A user belongs to at most one family. The creator becomes its head and
//! stays head for the family's lifetime; other members join as `member`
//! and may be promoted to `worker`.

use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use crate::auth::authorization::{check_permission, require_permission, AuthzError, Permission};
use crate::models::family::{
    generate_invite_code, is_invite_code_collision, normalize_invite_code, Family,
};
use crate::models::membership::{MemberDetail, MemberRole, Membership};

/// Attempts at drawing an unused invite code before giving up
pub const INVITE_CODE_ATTEMPTS: usize = 5;

const MEMBERSHIP_USER_CONSTRAINT: &str = "family_members_user_id_key";
const ALREADY_IN_FAMILY: &str = "You already belong to a family";

#[derive(Debug, Clone, Serialize)]
pub struct FamilyOverview {
    pub family: Family,
    pub members: Vec<MemberDetail>,
    pub your_role: MemberRole,
}

/// What removing a member does to the family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalOutcome {
    MemberRemoved,
    FamilyDeleted,
}

/// Rules for a head changing someone's role
pub fn check_role_change(requester_id: Uuid, target_id: Uuid, new_role: MemberRole) -> ServiceResult<()> {
    if requester_id == target_id {
        return Err(ServiceError::InvalidInput("You cannot change your own role".to_string()));
    }
    if !new_role.is_assignable() {
        return Err(ServiceError::validation(
            "role",
            "A family has exactly one head; only worker or member can be assigned",
        ));
    }
    Ok(())
}

/// Decides what happens when `target_role` leaves a family of `member_count`
pub fn plan_removal(target_role: MemberRole, member_count: i64) -> ServiceResult<RemovalOutcome> {
    if member_count <= 1 {
        return Ok(RemovalOutcome::FamilyDeleted);
    }
    if target_role == MemberRole::Head {
        return Err(ServiceError::Conflict(
            "The head cannot leave while other members remain".to_string(),
        ));
    }
    Ok(RemovalOutcome::MemberRemoved)
}

/// Permission needed to remove `target_id`: leaving yourself or managing others
pub fn removal_permission(requester_id: Uuid, target_id: Uuid) -> Permission {
    if requester_id == target_id {
        Permission::LeaveFamily
    } else {
        Permission::ManageMembers
    }
}

async fn ensure_not_in_family(pool: &PgPool, user_id: Uuid) -> ServiceResult<()> {
    if Membership::find_by_user(pool, user_id).await?.is_some() {
        return Err(ServiceError::Conflict(ALREADY_IN_FAMILY.to_string()));
    }
    Ok(())
}

fn check_surname(surname: &str) -> ServiceResult<String> {
    let surname = surname.trim();
    let len = surname.chars().count();
    if !(2..=100).contains(&len) {
        return Err(ServiceError::validation(
            "surname",
            "Surname must be between 2 and 100 characters",
        ));
    }
    Ok(surname.to_string())
}

/// Creates a family with the requester as head
pub async fn create_family(pool: &PgPool, requester_id: Uuid, surname: &str) -> ServiceResult<Family> {
    let surname = check_surname(surname)?;
    ensure_not_in_family(pool, requester_id).await?;

    for attempt in 1..=INVITE_CODE_ATTEMPTS {
        let mut tx = pool.begin().await?;

        let family = match Family::create(&mut *tx, &surname, &generate_invite_code()).await {
            Ok(family) => family,
            Err(e) if is_invite_code_collision(&e) => {
                warn!(attempt, "Invite code collision, retrying");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        Membership::create(&mut *tx, family.id, requester_id, MemberRole::Head)
            .await
            .map_err(|e| ServiceError::from_unique_violation(e, MEMBERSHIP_USER_CONSTRAINT, ALREADY_IN_FAMILY))?;

        tx.commit().await?;

        info!(family_id = %family.id, head_id = %requester_id, "Family created");
        return Ok(family);
    }

    Err(ServiceError::Conflict(
        "Could not allocate a unique invite code, try again".to_string(),
    ))
}

/// Joins the family owning the invite code, as `member`
pub async fn join_family(pool: &PgPool, requester_id: Uuid, invite_code: &str) -> ServiceResult<Family> {
    let code = normalize_invite_code(invite_code).ok_or_else(|| {
        ServiceError::validation("invite_code", "Invite code must be 8 letters or digits")
    })?;

    ensure_not_in_family(pool, requester_id).await?;

    let family = Family::find_by_invite_code(pool, &code)
        .await?
        .ok_or(ServiceError::NotFound("Family for this invite code"))?;

    Membership::create(pool, family.id, requester_id, MemberRole::Member)
        .await
        .map_err(|e| ServiceError::from_unique_violation(e, MEMBERSHIP_USER_CONSTRAINT, ALREADY_IN_FAMILY))?;

    info!(family_id = %family.id, user_id = %requester_id, "User joined family");
    Ok(family)
}

/// Locks the family row and checks the requester holds `permission` in it
///
/// A family that does not exist is reported like one the requester is not
/// a member of.
async fn lock_family(
    tx: &mut Transaction<'_, Postgres>,
    family_id: Uuid,
    requester_id: Uuid,
    permission: Permission,
) -> ServiceResult<Membership> {
    Family::lock_for_update(&mut **tx, family_id)
        .await?
        .ok_or(AuthzError::NotMember(family_id))?;

    let requester = Membership::find(&mut **tx, family_id, requester_id)
        .await?
        .ok_or(AuthzError::NotMember(family_id))?;
    check_permission(requester.role, permission)?;

    Ok(requester)
}

pub async fn list_families(pool: &PgPool, requester_id: Uuid) -> ServiceResult<Vec<Family>> {
    Ok(Family::list_by_user(pool, requester_id).await?)
}

pub async fn get_family(pool: &PgPool, requester_id: Uuid, family_id: Uuid) -> ServiceResult<FamilyOverview> {
    let membership = require_permission(pool, family_id, requester_id, Permission::ViewFamily).await?;

    let family = Family::find_by_id(pool, family_id)
        .await?
        .ok_or(ServiceError::NotFound("Family"))?;
    let members = Membership::list_members(pool, family_id).await?;

    Ok(FamilyOverview {
        family,
        members,
        your_role: membership.role,
    })
}

pub async fn change_member_role(
    pool: &PgPool,
    requester_id: Uuid,
    family_id: Uuid,
    target_id: Uuid,
    new_role: MemberRole,
) -> ServiceResult<Membership> {
    check_role_change(requester_id, target_id, new_role)?;

    let mut tx = pool.begin().await?;
    lock_family(&mut tx, family_id, requester_id, Permission::ManageMembers).await?;

    let updated = Membership::update_role(&mut *tx, family_id, target_id, new_role)
        .await?
        .ok_or(ServiceError::NotFound("Family member"))?;
    tx.commit().await?;

    info!(
        family_id = %family_id,
        user_id = %target_id,
        role = new_role.as_str(),
        "Member role changed"
    );
    Ok(updated)
}

/// Removes a member, or lets the requester leave
///
/// The last member leaving deletes the family.
pub async fn remove_member(
    pool: &PgPool,
    requester_id: Uuid,
    family_id: Uuid,
    target_id: Uuid,
) -> ServiceResult<RemovalOutcome> {
    let mut tx = pool.begin().await?;
    lock_family(&mut tx, family_id, requester_id, removal_permission(requester_id, target_id)).await?;

    let target = Membership::find(&mut *tx, family_id, target_id)
        .await?
        .ok_or(ServiceError::NotFound("Family member"))?;
    let member_count = Membership::count_by_family(&mut *tx, family_id).await?;

    let outcome = plan_removal(target.role, member_count)?;
    match outcome {
        RemovalOutcome::FamilyDeleted => {
            Family::delete(&mut *tx, family_id).await?;
        }
        RemovalOutcome::MemberRemoved => {
            Membership::delete(&mut *tx, family_id, target_id).await?;
        }
    }

    tx.commit().await?;

    info!(family_id = %family_id, user_id = %target_id, ?outcome, "Member removed");
    Ok(outcome)
}

pub async fn regenerate_invite_code(pool: &PgPool, requester_id: Uuid, family_id: Uuid) -> ServiceResult<Family> {
    require_permission(pool, family_id, requester_id, Permission::RegenerateInviteCode).await?;

    for attempt in 1..=INVITE_CODE_ATTEMPTS {
        match Family::update_invite_code(pool, family_id, &generate_invite_code()).await {
            Ok(Some(family)) => {
                info!(family_id = %family_id, "Invite code regenerated");
                return Ok(family);
            }
            Ok(None) => return Err(ServiceError::NotFound("Family")),
            Err(e) if is_invite_code_collision(&e) => {
                warn!(attempt, "Invite code collision, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(ServiceError::Conflict(
        "Could not allocate a unique invite code, try again".to_string(),
    ))
}

/// Deletes the family; only allowed once the head is its sole member
pub async fn delete_family(pool: &PgPool, requester_id: Uuid, family_id: Uuid) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;
    lock_family(&mut tx, family_id, requester_id, Permission::DeleteFamily).await?;

    if Membership::count_by_family(&mut *tx, family_id).await? > 1 {
        return Err(ServiceError::Conflict(
            "Remove the other members before deleting the family".to_string(),
        ));
    }

    Family::delete(&mut *tx, family_id).await?;
    tx.commit().await?;

    info!(family_id = %family_id, "Family deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_change_rules() {
        let head = Uuid::new_v4();
        let member = Uuid::new_v4();

        assert!(check_role_change(head, member, MemberRole::Worker).is_ok());
        assert!(check_role_change(head, member, MemberRole::Member).is_ok());
        assert!(matches!(
            check_role_change(head, head, MemberRole::Worker),
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            check_role_change(head, member, MemberRole::Head),
            Err(ServiceError::Validation { field: "role", .. })
        ));
    }

    #[test]
    fn test_plan_removal() {
        assert_eq!(plan_removal(MemberRole::Member, 3).unwrap(), RemovalOutcome::MemberRemoved);
        assert_eq!(plan_removal(MemberRole::Worker, 2).unwrap(), RemovalOutcome::MemberRemoved);
        assert_eq!(plan_removal(MemberRole::Head, 1).unwrap(), RemovalOutcome::FamilyDeleted);
        assert!(matches!(
            plan_removal(MemberRole::Head, 2),
            Err(ServiceError::Conflict(_))
        ));
    }

    #[test]
    fn test_removal_permission() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(removal_permission(a, a), Permission::LeaveFamily);
        assert_eq!(removal_permission(a, b), Permission::ManageMembers);
    }

    #[test]
    fn test_check_surname() {
        assert_eq!(check_surname("  Rossi ").unwrap(), "Rossi");
        assert!(check_surname("R").is_err());
        assert!(check_surname(&"x".repeat(101)).is_err());
    }
}
