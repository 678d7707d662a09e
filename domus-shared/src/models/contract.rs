/// Utility contracts attached to a dwelling
///
/// `payment_due` defaults to `start_date + duration_days` (see
/// [`default_payment_due`]). The PDF itself is stored elsewhere; only its URL
/// is kept here.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "utility_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UtilityKind {
    Electricity,
    Gas,
    Water,
    Internet,
    Phone,
    Waste,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "periodicity", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Periodicity {
    Monthly,
    Bimonthly,
    Quarterly,
    Semiannual,
    Annual,
}

impl Periodicity {
    /// Billing periods in one year
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Periodicity::Monthly => 12,
            Periodicity::Bimonthly => 6,
            Periodicity::Quarterly => 4,
            Periodicity::Semiannual => 2,
            Periodicity::Annual => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UtilityContract {
    pub id: Uuid,
    pub dwelling_id: Uuid,
    pub utility_kind: UtilityKind,
    pub supplier: String,
    pub tariff_plan: String,
    pub start_date: NaiveDate,
    pub duration_days: i32,
    pub periodic_cost: Decimal,
    pub periodicity: Periodicity,
    pub payment_due: Option<NaiveDate>,
    pub document_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UtilityContract {
    /// Projected yearly cost of the contract
    pub fn annual_cost(&self) -> Decimal {
        self.periodic_cost * Decimal::from(self.periodicity.periods_per_year())
    }
}

#[derive(Debug, Clone)]
pub struct CreateContract {
    pub dwelling_id: Uuid,
    pub utility_kind: UtilityKind,
    pub supplier: String,
    pub tariff_plan: String,
    pub start_date: NaiveDate,
    pub duration_days: i32,
    pub periodic_cost: Decimal,
    pub periodicity: Periodicity,
    pub payment_due: Option<NaiveDate>,
    pub document_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateContract {
    pub utility_kind: Option<UtilityKind>,
    pub supplier: Option<String>,
    pub tariff_plan: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub duration_days: Option<i32>,
    pub periodic_cost: Option<Decimal>,
    pub periodicity: Option<Periodicity>,
    pub payment_due: Option<NaiveDate>,
}

/// End of the contract term, used when no due date is given
pub fn default_payment_due(start_date: NaiveDate, duration_days: i32) -> Option<NaiveDate> {
    start_date.checked_add_signed(Duration::days(i64::from(duration_days)))
}

const CONTRACT_COLUMNS: &str = "id, dwelling_id, utility_kind, supplier, tariff_plan, start_date, \
     duration_days, periodic_cost, periodicity, payment_due, document_url, created_at, updated_at";

impl UtilityContract {
    pub async fn create(pool: &PgPool, data: CreateContract) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, UtilityContract>(&format!(
            r#"
            INSERT INTO utility_contracts
                (dwelling_id, utility_kind, supplier, tariff_plan, start_date, duration_days,
                 periodic_cost, periodicity, payment_due, document_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {CONTRACT_COLUMNS}
            "#
        ))
        .bind(data.dwelling_id)
        .bind(data.utility_kind)
        .bind(data.supplier)
        .bind(data.tariff_plan)
        .bind(data.start_date)
        .bind(data.duration_days)
        .bind(data.periodic_cost)
        .bind(data.periodicity)
        .bind(data.payment_due)
        .bind(data.document_url)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UtilityContract>(&format!(
            "SELECT {CONTRACT_COLUMNS} FROM utility_contracts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_by_dwelling(pool: &PgPool, dwelling_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, UtilityContract>(&format!(
            r#"
            SELECT {CONTRACT_COLUMNS}
            FROM utility_contracts
            WHERE dwelling_id = $1
            ORDER BY start_date DESC
            "#
        ))
        .bind(dwelling_id)
        .fetch_all(pool)
        .await
    }

    /// Contracts of any dwelling of the family with a due date in `[from, to]`
    pub async fn list_due_between(
        pool: &PgPool,
        family_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, UtilityContract>(
            r#"
            SELECT c.id, c.dwelling_id, c.utility_kind, c.supplier, c.tariff_plan, c.start_date,
                   c.duration_days, c.periodic_cost, c.periodicity, c.payment_due, c.document_url,
                   c.created_at, c.updated_at
            FROM utility_contracts c
            JOIN dwellings d ON d.id = c.dwelling_id
            WHERE d.family_id = $1
              AND c.payment_due BETWEEN $2 AND $3
            ORDER BY c.payment_due ASC
            "#,
        )
        .bind(family_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateContract) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UtilityContract>(&format!(
            r#"
            UPDATE utility_contracts
            SET utility_kind = COALESCE($2, utility_kind),
                supplier = COALESCE($3, supplier),
                tariff_plan = COALESCE($4, tariff_plan),
                start_date = COALESCE($5, start_date),
                duration_days = COALESCE($6, duration_days),
                periodic_cost = COALESCE($7, periodic_cost),
                periodicity = COALESCE($8, periodicity),
                payment_due = COALESCE($9, payment_due),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CONTRACT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(data.utility_kind)
        .bind(data.supplier)
        .bind(data.tariff_plan)
        .bind(data.start_date)
        .bind(data.duration_days)
        .bind(data.periodic_cost)
        .bind(data.periodicity)
        .bind(data.payment_due)
        .fetch_optional(pool)
        .await
    }

    pub async fn set_document_url(pool: &PgPool, id: Uuid, url: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UtilityContract>(&format!(
            r#"
            UPDATE utility_contracts
            SET document_url = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {CONTRACT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(url)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM utility_contracts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
