//! Registration, login and profile management.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use super::period::age_in_years;
use crate::auth::authorization::{granted_permissions, Permission};
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::models::family::Family;
use crate::models::membership::{MemberRole, Membership};
use crate::models::user::{normalize_email, CreateUser, UpdateUser, User, EMAIL_CONSTRAINT};

pub const MIN_AGE: i32 = 18;
pub const MAX_AGE: i32 = 120;
pub const MIN_NAME_LENGTH: usize = 2;
pub const MAX_NAME_LENGTH: usize = 100;

const DUPLICATE_EMAIL: &str = "Email already registered";

#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birth_date: NaiveDate,
    pub password: String,
}

/// The caller's account, family and what their role lets them do
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user: User,
    pub family: Option<Family>,
    pub role: Option<MemberRole>,
    pub permissions: Vec<Permission>,
}

/// Accepts birth dates giving an age of 18 to 120 years
pub fn validate_birth_date(birth_date: NaiveDate, today: NaiveDate) -> ServiceResult<()> {
    if birth_date > today {
        return Err(ServiceError::validation("birth_date", "Birth date is in the future"));
    }

    let age = age_in_years(birth_date, today);
    if age < MIN_AGE {
        return Err(ServiceError::validation(
            "birth_date",
            format!("You must be at least {} years old", MIN_AGE),
        ));
    }
    if age > MAX_AGE {
        return Err(ServiceError::validation("birth_date", "Birth date is not plausible"));
    }

    Ok(())
}

fn check_password(password: &str) -> ServiceResult<()> {
    validate_password_strength(password).map_err(|msg| ServiceError::validation("password", msg))
}

fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

/// Trims a first or last name and checks its length
pub fn clean_name(field: &'static str, value: &str) -> ServiceResult<String> {
    let name = trimmed(value);
    let len = name.chars().count();
    if !(MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&len) {
        return Err(ServiceError::validation(
            field,
            format!(
                "Name must be between {} and {} characters",
                MIN_NAME_LENGTH, MAX_NAME_LENGTH
            ),
        ));
    }
    Ok(name)
}

pub async fn register(pool: &PgPool, registration: Registration) -> ServiceResult<User> {
    let first_name = clean_name("first_name", &registration.first_name)?;
    let last_name = clean_name("last_name", &registration.last_name)?;
    check_password(&registration.password)?;
    validate_birth_date(registration.birth_date, Utc::now().date_naive())?;

    let email = normalize_email(&registration.email);
    if User::find_by_email(pool, &email).await?.is_some() {
        return Err(ServiceError::Conflict(DUPLICATE_EMAIL.to_string()));
    }

    let password_hash = hash_password(&registration.password)?;

    let user = User::create(
        pool,
        CreateUser {
            first_name,
            last_name,
            email,
            birth_date: registration.birth_date,
            password_hash,
        },
    )
    .await
    .map_err(|e| ServiceError::from_unique_violation(e, EMAIL_CONSTRAINT, DUPLICATE_EMAIL))?;

    info!(user_id = %user.id, "User registered");
    Ok(user)
}

/// Checks credentials; unknown email and wrong password fail the same way
pub async fn authenticate(pool: &PgPool, email: &str, password: &str) -> ServiceResult<User> {
    let user = User::find_by_email(pool, &normalize_email(email))
        .await?
        .ok_or(ServiceError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash)? {
        debug!(user_id = %user.id, "Password mismatch");
        return Err(ServiceError::InvalidCredentials);
    }

    Ok(user)
}

pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> ServiceResult<Profile> {
    let user = User::find_by_id(pool, user_id)
        .await?
        .ok_or(ServiceError::NotFound("User"))?;

    let membership = Membership::find_by_user(pool, user_id).await?;
    let (family, role) = match membership {
        Some(m) => (Family::find_by_id(pool, m.family_id).await?, Some(m.role)),
        None => (None, None),
    };

    Ok(Profile {
        user,
        family,
        role,
        permissions: role.map(granted_permissions).unwrap_or_default(),
    })
}

pub async fn update_profile(pool: &PgPool, user_id: Uuid, mut changes: UpdateUser) -> ServiceResult<User> {
    if let Some(birth_date) = changes.birth_date {
        validate_birth_date(birth_date, Utc::now().date_naive())?;
    }

    changes.email = changes.email.as_deref().map(normalize_email);
    changes.first_name = changes
        .first_name
        .as_deref()
        .map(|name| clean_name("first_name", name))
        .transpose()?;
    changes.last_name = changes
        .last_name
        .as_deref()
        .map(|name| clean_name("last_name", name))
        .transpose()?;

    if let Some(email) = &changes.email {
        if let Some(owner) = User::find_by_email(pool, email).await? {
            if owner.id != user_id {
                return Err(ServiceError::Conflict(DUPLICATE_EMAIL.to_string()));
            }
        }
    }

    let user = User::update(pool, user_id, changes)
        .await
        .map_err(|e| ServiceError::from_unique_violation(e, EMAIL_CONSTRAINT, DUPLICATE_EMAIL))?
        .ok_or(ServiceError::NotFound("User"))?;

    info!(user_id = %user.id, "Profile updated");
    Ok(user)
}

pub async fn change_password(
    pool: &PgPool,
    user_id: Uuid,
    current_password: &str,
    new_password: &str,
) -> ServiceResult<()> {
    let user = User::find_by_id(pool, user_id)
        .await?
        .ok_or(ServiceError::NotFound("User"))?;

    if !verify_password(current_password, &user.password_hash)? {
        return Err(ServiceError::validation(
            "current_password",
            "Current password is incorrect",
        ));
    }
    check_password(new_password)?;

    User::update_password(pool, user_id, &hash_password(new_password)?).await?;

    info!(user_id = %user_id, "Password changed");
    Ok(())
}
