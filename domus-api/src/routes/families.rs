/// Family endpoints
///
/// # Endpoints
///
/// - `GET /v1/families` - Families of the caller
/// - `POST /v1/families` - Create a family, caller becomes head
/// - `POST /v1/families/join` - Join with an invite code
/// - `GET /v1/families/:family_id` - Family with members
/// - `DELETE /v1/families/:family_id` - Delete (head, sole member)
/// - `POST /v1/families/:family_id/invite-code` - New invite code (head)
/// - `PATCH /v1/families/:family_id/members/:user_id` - Change role (head)
/// - `DELETE /v1/families/:family_id/members/:user_id` - Remove member or leave

use crate::{app::AppState, error::ApiResult, routes::validators::not_blank};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use domus_shared::{
    auth::middleware::AuthContext,
    models::{
        family::Family,
        membership::{MemberRole, Membership},
    },
    services::families::{self, FamilyOverview, RemovalOutcome},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFamilyRequest {
    #[validate(
        length(min = 2, max = 100, message = "Surname must be 2 to 100 characters"),
        custom(function = "not_blank")
    )]
    pub surname: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct JoinFamilyRequest {
    #[validate(length(min = 1, max = 32, message = "Invite code is required"))]
    pub invite_code: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: MemberRole,
}

#[derive(Debug, Serialize)]
pub struct RemovalResponse {
    pub outcome: RemovalOutcome,
}

pub async fn list_families(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Family>>> {
    Ok(Json(families::list_families(&state.db, auth.user_id).await?))
}

/// # Errors
///
/// - `409 Conflict`: the caller already belongs to a family
pub async fn create_family(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateFamilyRequest>,
) -> ApiResult<(StatusCode, Json<Family>)> {
    req.validate()?;

    let family = families::create_family(&state.db, auth.user_id, &req.surname).await?;
    Ok((StatusCode::CREATED, Json(family)))
}

/// # Errors
///
/// - `404 Not Found`: no family has this code
/// - `409 Conflict`: the caller already belongs to a family
pub async fn join_family(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<JoinFamilyRequest>,
) -> ApiResult<Json<Family>> {
    req.validate()?;

    Ok(Json(
        families::join_family(&state.db, auth.user_id, &req.invite_code).await?,
    ))
}

pub async fn get_family(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(family_id): Path<Uuid>,
) -> ApiResult<Json<FamilyOverview>> {
    Ok(Json(families::get_family(&state.db, auth.user_id, family_id).await?))
}

pub async fn delete_family(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(family_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    families::delete_family(&state.db, auth.user_id, family_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn regenerate_invite_code(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(family_id): Path<Uuid>,
) -> ApiResult<Json<Family>> {
    Ok(Json(
        families::regenerate_invite_code(&state.db, auth.user_id, family_id).await?,
    ))
}

pub async fn change_member_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((family_id, user_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<ChangeRoleRequest>,
) -> ApiResult<Json<Membership>> {
    let membership =
        families::change_member_role(&state.db, auth.user_id, family_id, user_id, req.role).await?;
    Ok(Json(membership))
}

/// Removes a member; with the caller's own id this is "leave family"
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((family_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<RemovalResponse>> {
    let outcome = families::remove_member(&state.db, auth.user_id, family_id, user_id).await?;
    Ok(Json(RemovalResponse { outcome }))
}
