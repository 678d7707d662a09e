/// Dwelling endpoints
///
/// - `GET /v1/families/:family_id/dwellings`
/// - `POST /v1/families/:family_id/dwellings` - worker or head
/// - `GET /v1/dwellings/:id`
/// - `PATCH /v1/dwellings/:id` - worker or head
/// - `DELETE /v1/dwellings/:id` - worker or head; deletes its contracts too

use crate::{
    app::AppState,
    error::ApiResult,
    routes::validators::not_blank,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use domus_shared::{
    auth::middleware::AuthContext,
    models::dwelling::{Dwelling, UpdateDwelling},
    services::housing::{self, DwellingInput},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDwellingRequest {
    #[validate(length(min = 2, max = 100), custom(function = "not_blank"))]
    pub name: String,

    #[validate(length(min = 5, max = 255))]
    pub address: String,

    #[validate(length(min = 2, max = 100))]
    pub city: String,

    #[validate(custom(function = "crate::routes::validators::postal_code"))]
    pub postal_code: String,

    #[validate(custom(function = "crate::routes::validators::province"))]
    pub province: String,

    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDwellingRequest {
    #[validate(length(min = 2, max = 100), custom(function = "not_blank"))]
    pub name: Option<String>,

    #[validate(length(min = 5, max = 255))]
    pub address: Option<String>,

    #[validate(length(min = 2, max = 100))]
    pub city: Option<String>,

    #[validate(custom(function = "crate::routes::validators::postal_code"))]
    pub postal_code: Option<String>,

    #[validate(custom(function = "crate::routes::validators::province"))]
    pub province: Option<String>,

    #[validate(length(max = 500))]
    pub description: Option<String>,
}

pub async fn list_dwellings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(family_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Dwelling>>> {
    Ok(Json(
        housing::list_dwellings(&state.db, auth.user_id, family_id).await?,
    ))
}

pub async fn create_dwelling(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(family_id): Path<Uuid>,
    Json(req): Json<CreateDwellingRequest>,
) -> ApiResult<(StatusCode, Json<Dwelling>)> {
    req.validate()?;

    let dwelling = housing::create_dwelling(
        &state.db,
        auth.user_id,
        family_id,
        DwellingInput {
            name: req.name,
            address: req.address,
            city: req.city,
            postal_code: req.postal_code,
            province: req.province,
            description: req.description,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(dwelling)))
}

pub async fn get_dwelling(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(dwelling_id): Path<Uuid>,
) -> ApiResult<Json<Dwelling>> {
    Ok(Json(
        housing::get_dwelling(&state.db, auth.user_id, dwelling_id).await?,
    ))
}

pub async fn update_dwelling(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(dwelling_id): Path<Uuid>,
    Json(req): Json<UpdateDwellingRequest>,
) -> ApiResult<Json<Dwelling>> {
    req.validate()?;

    let dwelling = housing::update_dwelling(
        &state.db,
        auth.user_id,
        dwelling_id,
        UpdateDwelling {
            name: req.name,
            address: req.address,
            city: req.city,
            postal_code: req.postal_code,
            province: req.province,
            description: req.description,
        },
    )
    .await?;

    Ok(Json(dwelling))
}

pub async fn delete_dwelling(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(dwelling_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    housing::delete_dwelling(&state.db, auth.user_id, dwelling_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
