/// The caller's own account
///
/// # Endpoints
///
/// - `GET /v1/me` - Profile with family, role and permissions
/// - `PUT /v1/me` - Update name, email or birth date
/// - `PUT /v1/me/password` - Change password

use crate::{app::AppState, error::ApiResult, routes::validators::not_blank};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::NaiveDate;
use domus_shared::{
    auth::middleware::AuthContext,
    models::user::{UpdateUser, User},
    services::users::{self, Profile},
};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 100), custom(function = "not_blank"))]
    pub first_name: Option<String>,

    #[validate(length(min = 2, max = 100), custom(function = "not_blank"))]
    pub last_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Profile>> {
    Ok(Json(users::get_profile(&state.db, auth.user_id).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    req.validate()?;

    let user = users::update_profile(
        &state.db,
        auth.user_id,
        UpdateUser {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            birth_date: req.birth_date,
        },
    )
    .await?;

    Ok(Json(user))
}

/// # Errors
///
/// - `422 Unprocessable Entity`: wrong current password or weak new password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    req.validate()?;

    users::change_password(&state.db, auth.user_id, &req.current_password, &req.new_password).await?;

    Ok(StatusCode::NO_CONTENT)
}
