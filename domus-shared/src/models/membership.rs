/// Family membership model
///
/// A membership links one user to one family with exactly one role. The
/// schema allows a user a single membership (`UNIQUE (user_id)`), so "the
/// user's family" is always well defined.
///
/// # Roles
///
/// - **Head** (capofamiglia): administers the family
/// - **Worker** (lavoratore): records income as well as expenses
/// - **Member** (membro): records expenses and views family data
///
/// What each role may do is decided by the permission table in
/// [`crate::auth::authorization`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::auth::authorization::{role_allows, Permission};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Head,
    Worker,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Head => "head",
            MemberRole::Worker => "worker",
            MemberRole::Member => "member",
        }
    }

    /// Looks the role up in the permission table
    pub fn can(&self, permission: Permission) -> bool {
        role_allows(*self, permission)
    }

    /// Whether a head may hand this role to another member
    ///
    /// A family has exactly one head, created with the family.
    pub fn is_assignable(&self) -> bool {
        !matches!(self, MemberRole::Head)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    pub family_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

/// A membership joined with the member's public profile
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberDetail {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        family_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO family_members (family_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING family_id, user_id, role, joined_at
            "#,
        )
        .bind(family_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(executor)
        .await
    }

    pub async fn find<'e, E: PgExecutor<'e>>(
        executor: E,
        family_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Membership>(
            r#"
            SELECT family_id, user_id, role, joined_at
            FROM family_members
            WHERE family_id = $1 AND user_id = $2
            "#,
        )
        .bind(family_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    /// The user's membership, if they belong to a family
    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Membership>(
            r#"
            SELECT family_id, user_id, role, joined_at
            FROM family_members
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn update_role<'e, E: PgExecutor<'e>>(
        executor: E,
        family_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Membership>(
            r#"
            UPDATE family_members
            SET role = $3
            WHERE family_id = $1 AND user_id = $2
            RETURNING family_id, user_id, role, joined_at
            "#,
        )
        .bind(family_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(executor)
        .await
    }

    pub async fn delete<'e, E: PgExecutor<'e>>(
        executor: E,
        family_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM family_members WHERE family_id = $1 AND user_id = $2")
            .bind(family_id)
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_by_family<'e, E: PgExecutor<'e>>(
        executor: E,
        family_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM family_members WHERE family_id = $1")
                .bind(family_id)
                .fetch_one(executor)
                .await?;

        Ok(count)
    }

    /// Members with their names, head first, then by join date
    pub async fn list_members(pool: &PgPool, family_id: Uuid) -> Result<Vec<MemberDetail>, sqlx::Error> {
        sqlx::query_as::<_, MemberDetail>(
            r#"
            SELECT u.id AS user_id, u.first_name, u.last_name, u.email,
                   fm.role, fm.joined_at
            FROM family_members fm
            JOIN users u ON u.id = fm.user_id
            WHERE fm.family_id = $1
            ORDER BY fm.role = 'head' DESC, fm.joined_at ASC
            "#,
        )
        .bind(family_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_role_as_str() {
        assert_eq!(MemberRole::Head.as_str(), "head");
        assert_eq!(MemberRole::Worker.as_str(), "worker");
        assert_eq!(MemberRole::Member.as_str(), "member");
    }

    #[test]
    fn test_member_role_serde() {
        assert_eq!(serde_json::to_string(&MemberRole::Worker).unwrap(), "\"worker\"");
        let role: MemberRole = serde_json::from_str("\"head\"").unwrap();
        assert_eq!(role, MemberRole::Head);
        assert!(serde_json::from_str::<MemberRole>("\"owner\"").is_err());
    }

    #[test]
    fn test_only_head_is_not_assignable() {
        assert!(!MemberRole::Head.is_assignable());
        assert!(MemberRole::Worker.is_assignable());
        assert!(MemberRole::Member.is_assignable());
    }

    #[test]
    fn test_role_delegates_to_permission_table() {
        assert!(MemberRole::Worker.can(Permission::CreateIncome));
        assert!(!MemberRole::Member.can(Permission::CreateIncome));
        assert!(MemberRole::Head.can(Permission::ManageMembers));
    }
}
