/// Aggregation queries behind the family reports
///
/// These return raw sums; percentages, colours and the twelve-month layout
/// are assembled in [`crate::services::reports`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::movement::{Category, MovementKind};

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: Decimal,
    pub movement_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct MonthlyTotal {
    pub month: i32,
    pub kind: MovementKind,
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, sqlx::FromRow)]
pub struct KindTotals {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
}

/// Sum and count per category for one kind within `[from, until)`
pub async fn category_totals(
    pool: &PgPool,
    family_id: Uuid,
    kind: MovementKind,
    from: NaiveDate,
    until: NaiveDate,
) -> Result<Vec<CategoryTotal>, sqlx::Error> {
    sqlx::query_as::<_, CategoryTotal>(
        r#"
        SELECT category, SUM(amount) AS total, COUNT(*) AS movement_count
        FROM movements
        WHERE family_id = $1 AND kind = $2 AND date >= $3 AND date < $4
        GROUP BY category
        ORDER BY total DESC
        "#,
    )
    .bind(family_id)
    .bind(kind)
    .bind(from)
    .bind(until)
    .fetch_all(pool)
    .await
}

/// Sums per (month, kind) within `[from, until)`; months without movements are absent
pub async fn monthly_totals(
    pool: &PgPool,
    family_id: Uuid,
    from: NaiveDate,
    until: NaiveDate,
) -> Result<Vec<MonthlyTotal>, sqlx::Error> {
    sqlx::query_as::<_, MonthlyTotal>(
        r#"
        SELECT EXTRACT(MONTH FROM date)::INT AS month, kind, SUM(amount) AS total
        FROM movements
        WHERE family_id = $1 AND date >= $2 AND date < $3
        GROUP BY 1, 2
        ORDER BY 1
        "#,
    )
    .bind(family_id)
    .bind(from)
    .bind(until)
    .fetch_all(pool)
    .await
}

/// All-time income and expense sums of a family
pub async fn kind_totals(pool: &PgPool, family_id: Uuid) -> Result<KindTotals, sqlx::Error> {
    sqlx::query_as::<_, KindTotals>(
        r#"
        SELECT COALESCE(SUM(amount) FILTER (WHERE kind = 'income'), 0) AS total_income,
               COALESCE(SUM(amount) FILTER (WHERE kind = 'expense'), 0) AS total_expenses
        FROM movements
        WHERE family_id = $1
        "#,
    )
    .bind(family_id)
    .fetch_one(pool)
    .await
}
