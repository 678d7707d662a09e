/// Movement endpoints
///
/// # Endpoints
///
/// - `GET /v1/families/:family_id/movements` - Filtered family movements
/// - `POST /v1/families/:family_id/expenses` - Record an expense
/// - `POST /v1/families/:family_id/incomes` - Record an income (worker, head)
/// - `GET /v1/movements/mine` - The caller's movements for one month
/// - `GET /v1/movements/:id`
/// - `PATCH /v1/movements/:id` - Author or head
/// - `DELETE /v1/movements/:id` - Author or head
///
/// List filters take comma-separated values for `kinds` and `categories`:
///
/// ```text
/// GET /v1/families/{id}/movements?kinds=expense&categories=groceries,transport&amount_min=10
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::validators::{not_blank, positive_amount},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{Datelike, NaiveDate, Utc};
use domus_shared::{
    auth::middleware::AuthContext,
    models::movement::{
        Category, Movement, MovementDetail, MovementFilter, MovementKind, Responsibility,
        UpdateMovement,
    },
    services::movements::{self, NewMovement},
};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateExpenseRequest {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub description: String,

    #[validate(custom(function = "positive_amount"))]
    pub amount: Decimal,

    pub date: NaiveDate,
    pub category: Category,
    pub responsibility: Responsibility,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateIncomeRequest {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub description: String,

    #[validate(custom(function = "positive_amount"))]
    pub amount: Decimal,

    pub date: NaiveDate,
    pub category: Category,
}

/// Partial update; the kind of a movement never changes
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMovementRequest {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub description: Option<String>,

    #[validate(custom(function = "positive_amount"))]
    pub amount: Option<Decimal>,

    pub date: Option<NaiveDate>,
    pub category: Option<Category>,
    pub responsibility: Option<Responsibility>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListMovementsQuery {
    pub kinds: Option<String>,
    pub categories: Option<String>,
    pub amount_min: Option<Decimal>,
    pub amount_max: Option<Decimal>,
    pub responsibility: Option<Responsibility>,
    pub user_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct MyMovementsQuery {
    pub kind: Option<MovementKind>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

/// Parses `a,b,c` into values named the way they serialize
fn parse_list<T: DeserializeOwned>(field: &'static str, raw: Option<&str>) -> ApiResult<Vec<T>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            serde_json::from_value(serde_json::Value::String(item.to_ascii_lowercase()))
                .map_err(|_| ApiError::invalid_field(field, format!("Unknown value '{}'", item)))
        })
        .collect()
}

impl ListMovementsQuery {
    pub fn into_filter(self) -> ApiResult<MovementFilter> {
        Ok(MovementFilter {
            kinds: parse_list("kinds", self.kinds.as_deref())?,
            categories: parse_list("categories", self.categories.as_deref())?,
            amount_min: self.amount_min,
            amount_max: self.amount_max,
            responsibility: self.responsibility,
            user_id: self.user_id,
            date_from: self.date_from,
            date_to: self.date_to,
        })
    }
}

pub async fn list_family_movements(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(family_id): Path<Uuid>,
    Query(query): Query<ListMovementsQuery>,
) -> ApiResult<Json<Vec<MovementDetail>>> {
    let filter = query.into_filter()?;

    let rows = movements::list_family_movements(&state.db, auth.user_id, family_id, &filter).await?;
    Ok(Json(rows))
}

pub async fn create_expense(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(family_id): Path<Uuid>,
    Json(req): Json<CreateExpenseRequest>,
) -> ApiResult<(StatusCode, Json<Movement>)> {
    req.validate()?;

    let movement = movements::create_expense(
        &state.db,
        auth.user_id,
        family_id,
        NewMovement {
            description: req.description,
            amount: req.amount,
            date: req.date,
            category: req.category,
            responsibility: Some(req.responsibility),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(movement)))
}

pub async fn create_income(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(family_id): Path<Uuid>,
    Json(req): Json<CreateIncomeRequest>,
) -> ApiResult<(StatusCode, Json<Movement>)> {
    req.validate()?;

    let movement = movements::create_income(
        &state.db,
        auth.user_id,
        family_id,
        NewMovement {
            description: req.description,
            amount: req.amount,
            date: req.date,
            category: req.category,
            responsibility: None,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(movement)))
}

/// Month and year default to the current ones
pub async fn list_my_movements(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<MyMovementsQuery>,
) -> ApiResult<Json<Vec<Movement>>> {
    let today = Utc::now().date_naive();
    let month = query.month.unwrap_or_else(|| today.month());
    let year = query.year.unwrap_or_else(|| today.year());

    let rows = movements::list_my_movements(&state.db, auth.user_id, query.kind, year, month).await?;
    Ok(Json(rows))
}

pub async fn get_movement(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(movement_id): Path<Uuid>,
) -> ApiResult<Json<Movement>> {
    Ok(Json(
        movements::get_movement(&state.db, auth.user_id, movement_id).await?,
    ))
}

pub async fn update_movement(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(movement_id): Path<Uuid>,
    Json(req): Json<UpdateMovementRequest>,
) -> ApiResult<Json<Movement>> {
    req.validate()?;

    let movement = movements::update_movement(
        &state.db,
        auth.user_id,
        movement_id,
        UpdateMovement {
            description: req.description,
            amount: req.amount,
            date: req.date,
            category: req.category,
            responsibility: req.responsibility,
        },
    )
    .await?;

    Ok(Json(movement))
}

pub async fn delete_movement(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(movement_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    movements::delete_movement(&state.db, auth.user_id, movement_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
