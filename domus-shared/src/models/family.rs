/// Family model
///
/// A family groups users who share finances. Outsiders join with the
/// family's invite code: eight characters from `A-Z0-9`, globally unique.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

pub const INVITE_CODE_LENGTH: usize = 8;

const INVITE_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Name of the unique constraint guarding invite codes
pub const INVITE_CODE_CONSTRAINT: &str = "families_invite_code_key";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Family {
    pub id: Uuid,
    pub surname: String,
    pub invite_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Draws a random invite code
pub fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();
    (0..INVITE_CODE_LENGTH)
        .map(|_| INVITE_CODE_ALPHABET[rng.gen_range(0..INVITE_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Canonical form of a code typed by a user, or `None` if it cannot be one
pub fn normalize_invite_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_ascii_uppercase();

    let well_formed = code.len() == INVITE_CODE_LENGTH
        && code.bytes().all(|b| INVITE_CODE_ALPHABET.contains(&b));

    well_formed.then_some(code)
}

/// True when the error is a collision on the invite code constraint
pub fn is_invite_code_collision(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint() == Some(INVITE_CODE_CONSTRAINT),
        _ => false,
    }
}

impl Family {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        surname: &str,
        invite_code: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Family>(
            r#"
            INSERT INTO families (surname, invite_code)
            VALUES ($1, $2)
            RETURNING id, surname, invite_code, created_at, updated_at
            "#,
        )
        .bind(surname)
        .bind(invite_code)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Family>(
            r#"
            SELECT id, surname, invite_code, created_at, updated_at
            FROM families
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_invite_code(pool: &PgPool, code: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Family>(
            r#"
            SELECT id, surname, invite_code, created_at, updated_at
            FROM families
            WHERE invite_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(pool)
        .await
    }

    /// Families the user belongs to (at most one)
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Family>(
            r#"
            SELECT f.id, f.surname, f.invite_code, f.created_at, f.updated_at
            FROM families f
            JOIN family_members fm ON fm.family_id = f.id
            WHERE fm.user_id = $1
            ORDER BY f.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Reads the family row and locks it until the transaction ends
    ///
    /// Membership changes take this lock first so that concurrent leaves
    /// cannot both see themselves as "not the last member".
    pub async fn lock_for_update<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Family>(
            r#"
            SELECT id, surname, invite_code, created_at, updated_at
            FROM families
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn update_invite_code(
        pool: &PgPool,
        id: Uuid,
        invite_code: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Family>(
            r#"
            UPDATE families
            SET invite_code = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, surname, invite_code, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(invite_code)
        .fetch_optional(pool)
        .await
    }

    /// Deletes the family; memberships, movements and dwellings cascade
    pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM families WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
