/// Utility contract endpoints
///
/// - `GET /v1/dwellings/:id/contracts`
/// - `POST /v1/dwellings/:id/contracts` - worker or head
/// - `GET /v1/families/:family_id/contracts/expiring?within_days=30`
/// - `GET /v1/contracts/:id`
/// - `PATCH /v1/contracts/:id` - worker or head
/// - `DELETE /v1/contracts/:id` - worker or head
/// - `PUT /v1/contracts/:id/document` - record the PDF location
///
/// Responses carry `annual_cost`, the periodic cost times the billing
/// periods per year.

use crate::{
    app::AppState,
    error::ApiResult,
    routes::validators::{not_blank, positive_amount},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use domus_shared::{
    auth::middleware::AuthContext,
    models::contract::{Periodicity, UpdateContract, UtilityContract, UtilityKind},
    services::housing::{self, ContractInput},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct ContractResponse {
    #[serde(flatten)]
    pub contract: UtilityContract,
    pub annual_cost: Decimal,
}

impl From<UtilityContract> for ContractResponse {
    fn from(contract: UtilityContract) -> Self {
        Self {
            annual_cost: contract.annual_cost(),
            contract,
        }
    }
}

fn responses(contracts: Vec<UtilityContract>) -> Vec<ContractResponse> {
    contracts.into_iter().map(ContractResponse::from).collect()
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateContractRequest {
    pub utility_kind: UtilityKind,

    #[validate(length(min = 2, max = 100), custom(function = "not_blank"))]
    pub supplier: String,

    #[validate(length(min = 2, max = 100), custom(function = "not_blank"))]
    pub tariff_plan: String,

    pub start_date: NaiveDate,

    #[validate(range(min = 1, max = 36500))]
    pub duration_days: i32,

    #[validate(custom(function = "positive_amount"))]
    pub periodic_cost: Decimal,

    pub periodicity: Periodicity,

    /// Defaults to the end of the contract term
    pub payment_due: Option<NaiveDate>,

    #[validate(url, length(max = 512))]
    pub document_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateContractRequest {
    pub utility_kind: Option<UtilityKind>,

    #[validate(length(min = 2, max = 100), custom(function = "not_blank"))]
    pub supplier: Option<String>,

    #[validate(length(min = 2, max = 100), custom(function = "not_blank"))]
    pub tariff_plan: Option<String>,

    pub start_date: Option<NaiveDate>,

    #[validate(range(min = 1, max = 36500))]
    pub duration_days: Option<i32>,

    #[validate(custom(function = "positive_amount"))]
    pub periodic_cost: Option<Decimal>,

    pub periodicity: Option<Periodicity>,
    pub payment_due: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AttachDocumentRequest {
    #[validate(url(message = "Must be a valid URL"), length(max = 512))]
    pub document_url: String,
}

#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    pub within_days: Option<u32>,
}

pub async fn list_contracts(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(dwelling_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ContractResponse>>> {
    let contracts = housing::list_contracts_for_dwelling(&state.db, auth.user_id, dwelling_id).await?;
    Ok(Json(responses(contracts)))
}

pub async fn create_contract(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(dwelling_id): Path<Uuid>,
    Json(req): Json<CreateContractRequest>,
) -> ApiResult<(StatusCode, Json<ContractResponse>)> {
    req.validate()?;

    let contract = housing::create_contract(
        &state.db,
        auth.user_id,
        dwelling_id,
        ContractInput {
            utility_kind: req.utility_kind,
            supplier: req.supplier,
            tariff_plan: req.tariff_plan,
            start_date: req.start_date,
            duration_days: req.duration_days,
            periodic_cost: req.periodic_cost,
            periodicity: req.periodicity,
            payment_due: req.payment_due,
            document_url: req.document_url,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(contract.into())))
}

pub async fn list_expiring_contracts(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(family_id): Path<Uuid>,
    Query(query): Query<ExpiringQuery>,
) -> ApiResult<Json<Vec<ContractResponse>>> {
    let contracts =
        housing::list_expiring_contracts(&state.db, auth.user_id, family_id, query.within_days).await?;
    Ok(Json(responses(contracts)))
}

pub async fn get_contract(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(contract_id): Path<Uuid>,
) -> ApiResult<Json<ContractResponse>> {
    let contract = housing::get_contract(&state.db, auth.user_id, contract_id).await?;
    Ok(Json(contract.into()))
}

pub async fn update_contract(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(contract_id): Path<Uuid>,
    Json(req): Json<UpdateContractRequest>,
) -> ApiResult<Json<ContractResponse>> {
    req.validate()?;

    let contract = housing::update_contract(
        &state.db,
        auth.user_id,
        contract_id,
        UpdateContract {
            utility_kind: req.utility_kind,
            supplier: req.supplier,
            tariff_plan: req.tariff_plan,
            start_date: req.start_date,
            duration_days: req.duration_days,
            periodic_cost: req.periodic_cost,
            periodicity: req.periodicity,
            payment_due: req.payment_due,
        },
    )
    .await?;

    Ok(Json(contract.into()))
}

pub async fn delete_contract(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(contract_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    housing::delete_contract(&state.db, auth.user_id, contract_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn attach_document(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(contract_id): Path<Uuid>,
    Json(req): Json<AttachDocumentRequest>,
) -> ApiResult<Json<ContractResponse>> {
    req.validate()?;

    let contract =
        housing::attach_contract_document(&state.db, auth.user_id, contract_id, &req.document_url).await?;
    Ok(Json(contract.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_response_includes_annual_cost() {
        let contract = UtilityContract {
            id: Uuid::new_v4(),
            dwelling_id: Uuid::new_v4(),
            utility_kind: UtilityKind::Internet,
            supplier: "Fastweb".to_string(),
            tariff_plan: "Casa Light".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            duration_days: 730,
            periodic_cost: Decimal::new(2995, 2),
            periodicity: Periodicity::Monthly,
            payment_due: None,
            document_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(ContractResponse::from(contract)).unwrap();
        assert_eq!(json["annual_cost"], "359.40");
        assert_eq!(json["supplier"], "Fastweb");
    }

    #[test]
    fn test_document_url_must_be_url() {
        let req = AttachDocumentRequest {
            document_url: "not a url".to_string(),
        };
        assert!(req.validate().is_err());

        let req = AttachDocumentRequest {
            document_url: "https://files.example.com/contracts/enel.pdf".to_string(),
        };
        assert!(req.validate().is_ok());
    }
}
