/// Report endpoints
///
/// - `GET /v1/families/:family_id/reports/categories?kind=&month=&year=`
/// - `GET /v1/families/:family_id/reports/balance?year=`
/// - `GET /v1/families/:family_id/reports/total`
///
/// Missing periods default to the current month or year; `kind` defaults to
/// `expense`.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{Datelike, Utc};
use domus_shared::{
    auth::middleware::AuthContext,
    models::movement::MovementKind,
    services::reports::{self, CategoryStat, MonthlyBalance, TotalBalance},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CategoryReportQuery {
    pub kind: Option<MovementKind>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct CategoryReport {
    pub kind: MovementKind,
    pub year: i32,
    pub month: u32,
    pub categories: Vec<CategoryStat>,
}

#[derive(Debug, Serialize)]
pub struct BalanceReport {
    pub year: i32,
    pub months: Vec<MonthlyBalance>,
}

pub async fn category_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(family_id): Path<Uuid>,
    Query(query): Query<CategoryReportQuery>,
) -> ApiResult<Json<CategoryReport>> {
    let today = Utc::now().date_naive();
    let kind = query.kind.unwrap_or(MovementKind::Expense);
    let month = query.month.unwrap_or_else(|| today.month());
    let year = query.year.unwrap_or_else(|| today.year());

    let categories = reports::category_stats(&state.db, auth.user_id, family_id, kind, year, month).await?;

    Ok(Json(CategoryReport {
        kind,
        year,
        month,
        categories,
    }))
}

pub async fn monthly_balance(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(family_id): Path<Uuid>,
    Query(query): Query<BalanceQuery>,
) -> ApiResult<Json<BalanceReport>> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let months = reports::monthly_balance(&state.db, auth.user_id, family_id, year).await?;

    Ok(Json(BalanceReport { year, months }))
}

pub async fn total_balance(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(family_id): Path<Uuid>,
) -> ApiResult<Json<TotalBalance>> {
    Ok(Json(
        reports::total_balance(&state.db, auth.user_id, family_id).await?,
    ))
}
