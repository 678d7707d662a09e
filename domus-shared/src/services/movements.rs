//! Recording and browsing expenses and incomes.
//!
//! Every member may record expenses; only workers and the head record
//! income. A movement can be edited or deleted by its author or by the head.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use super::money::check_money;
use super::period::month_bounds;
use crate::auth::authorization::{
    require_membership, require_ownership_or, require_permission, Permission,
};
use crate::models::movement::{
    Category, CreateMovement, Movement, MovementDetail, MovementFilter, MovementKind,
    Responsibility, UpdateMovement,
};

pub const MAX_DESCRIPTION_LENGTH: usize = 255;

#[derive(Debug, Clone)]
pub struct NewMovement {
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category: Category,
    pub responsibility: Option<Responsibility>,
}

fn check_description(description: &str) -> ServiceResult<()> {
    let len = description.trim().chars().count();
    if len == 0 || len > MAX_DESCRIPTION_LENGTH {
        return Err(ServiceError::validation(
            "description",
            format!("Description must be between 1 and {} characters", MAX_DESCRIPTION_LENGTH),
        ));
    }
    Ok(())
}

fn check_amount(amount: Decimal) -> ServiceResult<()> {
    check_money("amount", "Amount", amount)
}

fn check_category(kind: MovementKind, category: Category) -> ServiceResult<()> {
    if !kind.categories().contains(&category) {
        return Err(ServiceError::validation(
            "category",
            format!("Category {} is not valid for {}", category.as_str(), kind.as_str()),
        ));
    }
    Ok(())
}

fn check_responsibility(kind: MovementKind, responsibility: Option<Responsibility>) -> ServiceResult<()> {
    match (kind, responsibility) {
        (MovementKind::Expense, None) => Err(ServiceError::validation(
            "responsibility",
            "Expenses must be marked personal or family",
        )),
        (MovementKind::Income, Some(_)) => Err(ServiceError::validation(
            "responsibility",
            "Incomes do not carry a responsibility",
        )),
        _ => Ok(()),
    }
}

/// Business rules for a new movement of `kind`
pub fn check_new_movement(kind: MovementKind, data: &NewMovement) -> ServiceResult<()> {
    check_description(&data.description)?;
    check_amount(data.amount)?;
    check_category(kind, data.category)?;
    check_responsibility(kind, data.responsibility)
}

/// Business rules for changes to an existing movement of `kind`
pub fn check_changes(kind: MovementKind, changes: &UpdateMovement) -> ServiceResult<()> {
    if let Some(description) = &changes.description {
        check_description(description)?;
    }
    if let Some(amount) = changes.amount {
        check_amount(amount)?;
    }
    if let Some(category) = changes.category {
        check_category(kind, category)?;
    }
    if changes.responsibility.is_some() {
        check_responsibility(kind, changes.responsibility)?;
    }
    Ok(())
}

/// Rejects inverted ranges
pub fn check_filter(filter: &MovementFilter) -> ServiceResult<()> {
    if let (Some(min), Some(max)) = (filter.amount_min, filter.amount_max) {
        if min > max {
            return Err(ServiceError::validation(
                "amount_min",
                "Minimum amount cannot exceed maximum amount",
            ));
        }
    }
    if let (Some(from), Some(to)) = (filter.date_from, filter.date_to) {
        if from > to {
            return Err(ServiceError::validation("date_from", "Start date cannot follow end date"));
        }
    }
    Ok(())
}

fn permission_to_create(kind: MovementKind) -> Permission {
    match kind {
        MovementKind::Expense => Permission::CreateExpense,
        MovementKind::Income => Permission::CreateIncome,
    }
}

async fn create(
    pool: &PgPool,
    requester_id: Uuid,
    family_id: Uuid,
    kind: MovementKind,
    data: NewMovement,
) -> ServiceResult<Movement> {
    require_permission(pool, family_id, requester_id, permission_to_create(kind)).await?;
    check_new_movement(kind, &data)?;

    let movement = Movement::create(
        pool,
        CreateMovement {
            family_id,
            user_id: requester_id,
            kind,
            description: data.description.trim().to_string(),
            amount: data.amount,
            date: data.date,
            category: data.category,
            responsibility: data.responsibility,
        },
    )
    .await?;

    info!(
        movement_id = %movement.id,
        family_id = %family_id,
        kind = kind.as_str(),
        "Movement recorded"
    );
    Ok(movement)
}

pub async fn create_expense(
    pool: &PgPool,
    requester_id: Uuid,
    family_id: Uuid,
    data: NewMovement,
) -> ServiceResult<Movement> {
    create(pool, requester_id, family_id, MovementKind::Expense, data).await
}

pub async fn create_income(
    pool: &PgPool,
    requester_id: Uuid,
    family_id: Uuid,
    data: NewMovement,
) -> ServiceResult<Movement> {
    create(pool, requester_id, family_id, MovementKind::Income, data).await
}

pub async fn get_movement(pool: &PgPool, requester_id: Uuid, movement_id: Uuid) -> ServiceResult<Movement> {
    let movement = Movement::find_by_id(pool, movement_id)
        .await?
        .ok_or(ServiceError::NotFound("Movement"))?;

    require_permission(pool, movement.family_id, requester_id, Permission::ViewMovements).await?;
    Ok(movement)
}

pub async fn list_family_movements(
    pool: &PgPool,
    requester_id: Uuid,
    family_id: Uuid,
    filter: &MovementFilter,
) -> ServiceResult<Vec<MovementDetail>> {
    require_permission(pool, family_id, requester_id, Permission::ViewMovements).await?;
    check_filter(filter)?;

    Ok(Movement::list_for_family(pool, family_id, filter).await?)
}

/// The requester's own movements in one calendar month
pub async fn list_my_movements(
    pool: &PgPool,
    requester_id: Uuid,
    kind: Option<MovementKind>,
    year: i32,
    month: u32,
) -> ServiceResult<Vec<Movement>> {
    let (from, until) = month_bounds(year, month)?;
    Ok(Movement::list_for_user_between(pool, requester_id, kind, from, until).await?)
}

async fn load_for_change(pool: &PgPool, requester_id: Uuid, movement_id: Uuid) -> ServiceResult<Movement> {
    let movement = Movement::find_by_id(pool, movement_id)
        .await?
        .ok_or(ServiceError::NotFound("Movement"))?;

    let membership = require_membership(pool, movement.family_id, requester_id).await?;
    require_ownership_or(
        requester_id,
        membership.role,
        movement.user_id,
        Permission::ManageAnyMovement,
    )?;

    Ok(movement)
}

pub async fn update_movement(
    pool: &PgPool,
    requester_id: Uuid,
    movement_id: Uuid,
    mut changes: UpdateMovement,
) -> ServiceResult<Movement> {
    let movement = load_for_change(pool, requester_id, movement_id).await?;
    check_changes(movement.kind, &changes)?;
    changes.description = changes.description.map(|d| d.trim().to_string());

    let updated = Movement::update(pool, movement_id, changes)
        .await?
        .ok_or(ServiceError::NotFound("Movement"))?;

    info!(movement_id = %movement_id, "Movement updated");
    Ok(updated)
}

pub async fn delete_movement(pool: &PgPool, requester_id: Uuid, movement_id: Uuid) -> ServiceResult<()> {
    load_for_change(pool, requester_id, movement_id).await?;

    if !Movement::delete(pool, movement_id).await? {
        return Err(ServiceError::NotFound("Movement"));
    }

    info!(movement_id = %movement_id, "Movement deleted");
    Ok(())
}
