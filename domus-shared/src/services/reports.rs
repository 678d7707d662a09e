/// Family reports: spending by category and income/expense balances
///
/// The database returns raw sums; the functions here turn them into
/// percentages, fill the months with no movements and attach chart colours.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::error::ServiceResult;
use super::period::{month_bounds, year_bounds};
use crate::auth::authorization::{require_permission, Permission};
use crate::models::movement::{Category, MovementKind};
use crate::models::report::{self, CategoryTotal, KindTotals, MonthlyTotal};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStat {
    pub category: Category,
    pub total: Decimal,
    pub movement_count: i64,
    /// Share of the kind's total for the period, 0..=100 with 2 decimals
    pub percentage: Decimal,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBalance {
    pub month: u32,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalBalance {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub balance: Decimal,
}

impl From<KindTotals> for TotalBalance {
    fn from(totals: KindTotals) -> Self {
        Self {
            total_income: totals.total_income,
            total_expenses: totals.total_expenses,
            balance: totals.total_income - totals.total_expenses,
        }
    }
}

pub fn assemble_category_stats(totals: Vec<CategoryTotal>) -> Vec<CategoryStat> {
    let grand_total: Decimal = totals.iter().map(|t| t.total).sum();
    let hundred = Decimal::ONE_HUNDRED;

    let mut stats: Vec<CategoryStat> = totals
        .into_iter()
        .map(|t| {
            let percentage = if grand_total.is_zero() {
                Decimal::ZERO
            } else {
                (t.total * hundred / grand_total).round_dp(2)
            };

            CategoryStat {
                category: t.category,
                total: t.total,
                movement_count: t.movement_count,
                percentage,
                color: t.category.color(),
            }
        })
        .collect();

    stats.sort_by(|a, b| b.total.cmp(&a.total));
    stats
}

/// Twelve entries, January first, whatever months `totals` covers
pub fn assemble_monthly_balance(totals: &[MonthlyTotal]) -> Vec<MonthlyBalance> {
    (1..=12u32)
        .map(|month| {
            let sum_of = |kind: MovementKind| -> Decimal {
                totals
                    .iter()
                    .filter(|t| t.kind == kind && u32::try_from(t.month) == Ok(month))
                    .map(|t| t.total)
                    .sum()
            };

            let total_income = sum_of(MovementKind::Income);
            let total_expenses = sum_of(MovementKind::Expense);

            MonthlyBalance {
                month,
                total_income,
                total_expenses,
                balance: total_income - total_expenses,
            }
        })
        .collect()
}

pub async fn category_stats(
    pool: &PgPool,
    requester_id: Uuid,
    family_id: Uuid,
    kind: MovementKind,
    year: i32,
    month: u32,
) -> ServiceResult<Vec<CategoryStat>> {
    require_permission(pool, family_id, requester_id, Permission::ViewReports).await?;
    let (from, until) = month_bounds(year, month)?;

    let totals = report::category_totals(pool, family_id, kind, from, until).await?;
    debug!(family_id = %family_id, categories = totals.len(), "Category totals loaded");

    Ok(assemble_category_stats(totals))
}

pub async fn monthly_balance(
    pool: &PgPool,
    requester_id: Uuid,
    family_id: Uuid,
    year: i32,
) -> ServiceResult<Vec<MonthlyBalance>> {
    require_permission(pool, family_id, requester_id, Permission::ViewReports).await?;
    let (from, until) = year_bounds(year)?;

    let totals = report::monthly_totals(pool, family_id, from, until).await?;
    Ok(assemble_monthly_balance(&totals))
}

pub async fn total_balance(pool: &PgPool, requester_id: Uuid, family_id: Uuid) -> ServiceResult<TotalBalance> {
    require_permission(pool, family_id, requester_id, Permission::ViewReports).await?;

    Ok(report::kind_totals(pool, family_id).await?.into())
}
