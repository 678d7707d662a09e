/// Dwellings registered by a family
///
/// Addresses follow the Italian format: five-digit postal code (CAP) and a
/// two-letter province code stored uppercase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Dwelling {
    pub id: Uuid,
    pub family_id: Uuid,
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub province: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateDwelling {
    pub family_id: Uuid,
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub province: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateDwelling {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub province: Option<String>,
    pub description: Option<String>,
}

impl Dwelling {
    pub async fn create(pool: &PgPool, data: CreateDwelling) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Dwelling>(
            r#"
            INSERT INTO dwellings (family_id, name, address, city, postal_code, province, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, family_id, name, address, city, postal_code, province, description,
                      created_at, updated_at
            "#,
        )
        .bind(data.family_id)
        .bind(data.name)
        .bind(data.address)
        .bind(data.city)
        .bind(data.postal_code)
        .bind(data.province)
        .bind(data.description)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Dwelling>(
            r#"
            SELECT id, family_id, name, address, city, postal_code, province, description,
                   created_at, updated_at
            FROM dwellings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_by_family(pool: &PgPool, family_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Dwelling>(
            r#"
            SELECT id, family_id, name, address, city, postal_code, province, description,
                   created_at, updated_at
            FROM dwellings
            WHERE family_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(family_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateDwelling) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Dwelling>(
            r#"
            UPDATE dwellings
            SET name = COALESCE($2, name),
                address = COALESCE($3, address),
                city = COALESCE($4, city),
                postal_code = COALESCE($5, postal_code),
                province = COALESCE($6, province),
                description = CASE WHEN $7::TEXT IS NULL THEN description ELSE NULLIF($7, '') END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, family_id, name, address, city, postal_code, province, description,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.address)
        .bind(data.city)
        .bind(data.postal_code)
        .bind(data.province)
        .bind(data.description)
        .fetch_optional(pool)
        .await
    }

    /// Deletes the dwelling and, by cascade, its contracts
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM dwellings WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
