/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register a new user
/// - `POST /v1/auth/login` - Login and get tokens
/// - `POST /v1/auth/refresh` - Exchange a refresh token for an access token
///
/// Registration does not create or join a family; that happens afterwards
/// through `/v1/families`.

use crate::{app::AppState, error::ApiResult, routes::validators::not_blank};
use axum::{extract::State, http::StatusCode, Json};
use chrono::NaiveDate;
use domus_shared::{
    auth::jwt::{self, TokenPair},
    models::user::User,
    services::users::{self, Registration},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(min = 2, max = 100, message = "First name must be 2 to 100 characters"),
        custom(function = "not_blank")
    )]
    pub first_name: String,

    #[validate(
        length(min = 2, max = 100, message = "Last name must be 2 to 100 characters"),
        custom(function = "not_blank")
    )]
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// `YYYY-MM-DD`
    pub birth_date: NaiveDate,

    /// Strength is checked by the service
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Returned by register and login
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,

    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "first_name": "Giulia",
///   "last_name": "Rossi",
///   "email": "giulia@example.com",
///   "birth_date": "1988-04-12",
///   "password": "Sicura2024"
/// }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Validation failed, weak password, under 18
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    req.validate()?;

    let user = users::register(
        &state.db,
        Registration {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            birth_date: req.birth_date,
            password: req.password,
        },
    )
    .await?;

    let tokens = jwt::issue_token_pair(user.id, state.jwt_secret())?;

    Ok((StatusCode::CREATED, Json(SessionResponse { user, tokens })))
}

/// Login endpoint
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials (same message for unknown email)
/// - `422 Unprocessable Entity`: Malformed email
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    req.validate()?;

    let user = users::authenticate(&state.db, &req.email, &req.password).await?;
    let tokens = jwt::issue_token_pair(user.id, state.jwt_secret())?;

    info!(user_id = %user.id, "User logged in");
    Ok(Json(SessionResponse { user, tokens }))
}

/// Token refresh endpoint
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token, or an access token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}
