/// Dwellings and their utility contracts
///
/// Every dwelling belongs to one family, and contracts inherit that
/// family through their dwelling. Viewing needs `ViewHousing`; any change
/// needs `ManageHousing` in the owning family.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use super::money::check_money;
use crate::auth::authorization::{require_permission, Permission};
use crate::models::contract::{
    default_payment_due, CreateContract, Periodicity, UpdateContract, UtilityContract, UtilityKind,
};
use crate::models::dwelling::{CreateDwelling, Dwelling, UpdateDwelling};

pub const DEFAULT_EXPIRY_WINDOW_DAYS: u32 = 30;
pub const MAX_EXPIRY_WINDOW_DAYS: u32 = 3650;
pub const MAX_DOCUMENT_URL_LENGTH: usize = 512;
const MAX_DURATION_DAYS: i32 = 36500;

fn check_length(field: &'static str, value: &str, min: usize, max: usize) -> ServiceResult<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ServiceError::validation(
            field,
            format!("Must be between {} and {} characters", min, max),
        ));
    }
    Ok(())
}

fn check_postal_code(value: &str) -> ServiceResult<()> {
    if value.len() == 5 && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ServiceError::validation("postal_code", "Postal code must be 5 digits"))
    }
}

fn check_province(value: &str) -> ServiceResult<()> {
    if value.len() == 2 && value.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(ServiceError::validation("province", "Province must be 2 letters"))
    }
}

fn check_description(value: &str) -> ServiceResult<()> {
    if value.chars().count() > 500 {
        return Err(ServiceError::validation(
            "description",
            "Description cannot exceed 500 characters",
        ));
    }
    Ok(())
}

fn clean(value: &str) -> String {
    value.trim().to_string()
}

fn clean_province(value: &str) -> String {
    value.trim().to_ascii_uppercase()
}

fn clean_description(value: &str) -> Option<String> {
    Some(clean(value)).filter(|d| !d.is_empty())
}

#[derive(Debug, Clone)]
pub struct DwellingInput {
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub province: String,
    pub description: Option<String>,
}

impl DwellingInput {
    /// Trims every field, uppercases the province and drops a blank description
    pub fn normalized(self) -> Self {
        Self {
            name: clean(&self.name),
            address: clean(&self.address),
            city: clean(&self.city),
            postal_code: clean(&self.postal_code),
            province: clean_province(&self.province),
            description: self.description.as_deref().and_then(clean_description),
        }
    }

    pub fn validate(&self) -> ServiceResult<()> {
        check_length("name", &self.name, 2, 100)?;
        check_length("address", &self.address, 5, 255)?;
        check_length("city", &self.city, 2, 100)?;
        check_postal_code(&self.postal_code)?;
        check_province(&self.province)?;
        if let Some(description) = &self.description {
            check_description(description)?;
        }
        Ok(())
    }
}

/// Normalizes and validates the fields being changed
///
/// A blank description becomes the empty string, which clears the stored
/// description on update.
pub fn prepare_dwelling_changes(changes: UpdateDwelling) -> ServiceResult<UpdateDwelling> {
    let changes = UpdateDwelling {
        name: changes.name.as_deref().map(clean),
        address: changes.address.as_deref().map(clean),
        city: changes.city.as_deref().map(clean),
        postal_code: changes.postal_code.as_deref().map(clean),
        province: changes.province.as_deref().map(clean_province),
        description: changes.description.as_deref().map(clean),
    };

    if let Some(name) = &changes.name {
        check_length("name", name, 2, 100)?;
    }
    if let Some(address) = &changes.address {
        check_length("address", address, 5, 255)?;
    }
    if let Some(city) = &changes.city {
        check_length("city", city, 2, 100)?;
    }
    if let Some(postal_code) = &changes.postal_code {
        check_postal_code(postal_code)?;
    }
    if let Some(province) = &changes.province {
        check_province(province)?;
    }
    if let Some(description) = &changes.description {
        check_description(description)?;
    }

    Ok(changes)
}

#[derive(Debug, Clone)]
pub struct ContractInput {
    pub utility_kind: UtilityKind,
    pub supplier: String,
    pub tariff_plan: String,
    pub start_date: NaiveDate,
    pub duration_days: i32,
    pub periodic_cost: Decimal,
    pub periodicity: Periodicity,
    pub payment_due: Option<NaiveDate>,
    pub document_url: Option<String>,
}

fn check_duration(days: i32) -> ServiceResult<()> {
    if !(1..=MAX_DURATION_DAYS).contains(&days) {
        return Err(ServiceError::validation(
            "duration_days",
            format!("Duration must be between 1 and {} days", MAX_DURATION_DAYS),
        ));
    }
    Ok(())
}

fn check_cost(cost: Decimal) -> ServiceResult<()> {
    check_money("periodic_cost", "Cost", cost)
}

fn check_document_url(url: &str) -> ServiceResult<()> {
    if url.is_empty() || url.chars().count() > MAX_DOCUMENT_URL_LENGTH {
        return Err(ServiceError::validation(
            "document_url",
            format!("Document URL must be between 1 and {} characters", MAX_DOCUMENT_URL_LENGTH),
        ));
    }
    Ok(())
}

fn due_date_for(start_date: NaiveDate, duration_days: i32) -> ServiceResult<NaiveDate> {
    default_payment_due(start_date, duration_days)
        .ok_or_else(|| ServiceError::validation("duration_days", "Contract ends out of range"))
}

impl ContractInput {
    /// Validates the input and resolves the due date into a row for `dwelling_id`
    pub fn into_create(self, dwelling_id: Uuid) -> ServiceResult<CreateContract> {
        let supplier = clean(&self.supplier);
        let tariff_plan = clean(&self.tariff_plan);
        let document_url = self.document_url.as_deref().map(clean);

        check_length("supplier", &supplier, 2, 100)?;
        check_length("tariff_plan", &tariff_plan, 2, 100)?;
        check_duration(self.duration_days)?;
        check_cost(self.periodic_cost)?;
        if let Some(url) = &document_url {
            check_document_url(url)?;
        }

        let payment_due = match self.payment_due {
            Some(due) => due,
            None => due_date_for(self.start_date, self.duration_days)?,
        };

        Ok(CreateContract {
            dwelling_id,
            utility_kind: self.utility_kind,
            supplier,
            tariff_plan,
            start_date: self.start_date,
            duration_days: self.duration_days,
            periodic_cost: self.periodic_cost,
            periodicity: self.periodicity,
            payment_due: Some(payment_due),
            document_url,
        })
    }
}

/// Validates contract changes against the stored contract
///
/// A new start date or duration without an explicit due date moves the due
/// date to the new end of term.
pub fn prepare_contract_changes(current: &UtilityContract, changes: UpdateContract) -> ServiceResult<UpdateContract> {
    let mut changes = UpdateContract {
        supplier: changes.supplier.as_deref().map(clean),
        tariff_plan: changes.tariff_plan.as_deref().map(clean),
        ..changes
    };

    if let Some(supplier) = &changes.supplier {
        check_length("supplier", supplier, 2, 100)?;
    }
    if let Some(tariff_plan) = &changes.tariff_plan {
        check_length("tariff_plan", tariff_plan, 2, 100)?;
    }
    if let Some(days) = changes.duration_days {
        check_duration(days)?;
    }
    if let Some(cost) = changes.periodic_cost {
        check_cost(cost)?;
    }

    let term_changed = changes.start_date.is_some() || changes.duration_days.is_some();
    if changes.payment_due.is_none() && term_changed {
        let start_date = changes.start_date.unwrap_or(current.start_date);
        let duration_days = changes.duration_days.unwrap_or(current.duration_days);
        changes.payment_due = Some(due_date_for(start_date, duration_days)?);
    }

    Ok(changes)
}

/// `[today, today + within_days]`
pub fn expiry_window(today: NaiveDate, within_days: Option<u32>) -> ServiceResult<(NaiveDate, NaiveDate)> {
    let days = within_days.unwrap_or(DEFAULT_EXPIRY_WINDOW_DAYS);
    if days > MAX_EXPIRY_WINDOW_DAYS {
        return Err(ServiceError::validation(
            "within_days",
            format!("Window cannot exceed {} days", MAX_EXPIRY_WINDOW_DAYS),
        ));
    }

    let end = today
        .checked_add_days(chrono::Days::new(u64::from(days)))
        .ok_or_else(|| ServiceError::validation("within_days", "Window ends out of range"))?;
    Ok((today, end))
}

async fn load_dwelling(pool: &PgPool, dwelling_id: Uuid) -> ServiceResult<Dwelling> {
    Dwelling::find_by_id(pool, dwelling_id)
        .await?
        .ok_or(ServiceError::NotFound("Dwelling"))
}

/// Loads a dwelling and checks the requester's permission in its family
async fn dwelling_with(
    pool: &PgPool,
    requester_id: Uuid,
    dwelling_id: Uuid,
    permission: Permission,
) -> ServiceResult<Dwelling> {
    let dwelling = load_dwelling(pool, dwelling_id).await?;
    require_permission(pool, dwelling.family_id, requester_id, permission).await?;
    Ok(dwelling)
}

/// Loads a contract and checks the requester's permission in the family owning its dwelling
async fn contract_with(
    pool: &PgPool,
    requester_id: Uuid,
    contract_id: Uuid,
    permission: Permission,
) -> ServiceResult<UtilityContract> {
    let contract = UtilityContract::find_by_id(pool, contract_id)
        .await?
        .ok_or(ServiceError::NotFound("Contract"))?;
    dwelling_with(pool, requester_id, contract.dwelling_id, permission).await?;
    Ok(contract)
}

pub async fn create_dwelling(
    pool: &PgPool,
    requester_id: Uuid,
    family_id: Uuid,
    input: DwellingInput,
) -> ServiceResult<Dwelling> {
    require_permission(pool, family_id, requester_id, Permission::ManageHousing).await?;

    let input = input.normalized();
    input.validate()?;

    let dwelling = Dwelling::create(
        pool,
        CreateDwelling {
            family_id,
            name: input.name,
            address: input.address,
            city: input.city,
            postal_code: input.postal_code,
            province: input.province,
            description: input.description,
        },
    )
    .await?;

    info!(dwelling_id = %dwelling.id, family_id = %family_id, "Dwelling created");
    Ok(dwelling)
}

pub async fn list_dwellings(pool: &PgPool, requester_id: Uuid, family_id: Uuid) -> ServiceResult<Vec<Dwelling>> {
    require_permission(pool, family_id, requester_id, Permission::ViewHousing).await?;
    Ok(Dwelling::list_by_family(pool, family_id).await?)
}

pub async fn get_dwelling(pool: &PgPool, requester_id: Uuid, dwelling_id: Uuid) -> ServiceResult<Dwelling> {
    dwelling_with(pool, requester_id, dwelling_id, Permission::ViewHousing).await
}

pub async fn update_dwelling(
    pool: &PgPool,
    requester_id: Uuid,
    dwelling_id: Uuid,
    changes: UpdateDwelling,
) -> ServiceResult<Dwelling> {
    dwelling_with(pool, requester_id, dwelling_id, Permission::ManageHousing).await?;
    let changes = prepare_dwelling_changes(changes)?;

    let dwelling = Dwelling::update(pool, dwelling_id, changes)
        .await?
        .ok_or(ServiceError::NotFound("Dwelling"))?;

    info!(dwelling_id = %dwelling_id, "Dwelling updated");
    Ok(dwelling)
}

/// Deletes a dwelling together with its contracts
pub async fn delete_dwelling(pool: &PgPool, requester_id: Uuid, dwelling_id: Uuid) -> ServiceResult<()> {
    dwelling_with(pool, requester_id, dwelling_id, Permission::ManageHousing).await?;

    if !Dwelling::delete(pool, dwelling_id).await? {
        return Err(ServiceError::NotFound("Dwelling"));
    }

    info!(dwelling_id = %dwelling_id, "Dwelling deleted");
    Ok(())
}

pub async fn create_contract(
    pool: &PgPool,
    requester_id: Uuid,
    dwelling_id: Uuid,
    input: ContractInput,
) -> ServiceResult<UtilityContract> {
    dwelling_with(pool, requester_id, dwelling_id, Permission::ManageHousing).await?;
    let data = input.into_create(dwelling_id)?;

    let contract = UtilityContract::create(pool, data).await?;

    info!(
        contract_id = %contract.id,
        dwelling_id = %dwelling_id,
        supplier = %contract.supplier,
        "Utility contract created"
    );
    Ok(contract)
}

pub async fn list_contracts_for_dwelling(
    pool: &PgPool,
    requester_id: Uuid,
    dwelling_id: Uuid,
) -> ServiceResult<Vec<UtilityContract>> {
    dwelling_with(pool, requester_id, dwelling_id, Permission::ViewHousing).await?;
    Ok(UtilityContract::list_by_dwelling(pool, dwelling_id).await?)
}

pub async fn get_contract(pool: &PgPool, requester_id: Uuid, contract_id: Uuid) -> ServiceResult<UtilityContract> {
    contract_with(pool, requester_id, contract_id, Permission::ViewHousing).await
}

pub async fn update_contract(
    pool: &PgPool,
    requester_id: Uuid,
    contract_id: Uuid,
    changes: UpdateContract,
) -> ServiceResult<UtilityContract> {
    let current = contract_with(pool, requester_id, contract_id, Permission::ManageHousing).await?;
    let changes = prepare_contract_changes(&current, changes)?;

    let contract = UtilityContract::update(pool, contract_id, changes)
        .await?
        .ok_or(ServiceError::NotFound("Contract"))?;

    info!(contract_id = %contract_id, "Utility contract updated");
    Ok(contract)
}

pub async fn delete_contract(pool: &PgPool, requester_id: Uuid, contract_id: Uuid) -> ServiceResult<()> {
    contract_with(pool, requester_id, contract_id, Permission::ManageHousing).await?;

    if !UtilityContract::delete(pool, contract_id).await? {
        return Err(ServiceError::NotFound("Contract"));
    }

    info!(contract_id = %contract_id, "Utility contract deleted");
    Ok(())
}

/// Records where the contract's PDF is stored
pub async fn attach_contract_document(
    pool: &PgPool,
    requester_id: Uuid,
    contract_id: Uuid,
    document_url: &str,
) -> ServiceResult<UtilityContract> {
    contract_with(pool, requester_id, contract_id, Permission::ManageHousing).await?;

    let document_url = clean(document_url);
    check_document_url(&document_url)?;

    let contract = UtilityContract::set_document_url(pool, contract_id, &document_url)
        .await?
        .ok_or(ServiceError::NotFound("Contract"))?;

    info!(contract_id = %contract_id, "Contract document attached");
    Ok(contract)
}

/// Contracts of the family whose payment falls due within the next `within_days`
pub async fn list_expiring_contracts(
    pool: &PgPool,
    requester_id: Uuid,
    family_id: Uuid,
    within_days: Option<u32>,
) -> ServiceResult<Vec<UtilityContract>> {
    require_permission(pool, family_id, requester_id, Permission::ViewHousing).await?;
    let (from, to) = expiry_window(Utc::now().date_naive(), within_days)?;

    let contracts = UtilityContract::list_due_between(pool, family_id, from, to).await?;
    debug!(family_id = %family_id, count = contracts.len(), %from, %to, "Expiring contracts loaded");

    Ok(contracts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dwelling() -> DwellingInput {
        DwellingInput {
            name: " Casa al mare ".to_string(),
            address: "Via Roma 12".to_string(),
            city: "Rimini".to_string(),
            postal_code: "47921".to_string(),
            province: "rn".to_string(),
            description: Some("   ".to_string()),
        }
    }

    fn contract() -> ContractInput {
        ContractInput {
            utility_kind: UtilityKind::Electricity,
            supplier: "Enel Energia".to_string(),
            tariff_plan: "Bioraria".to_string(),
            start_date: date(2024, 1, 1),
            duration_days: 365,
            periodic_cost: Decimal::new(8500, 2),
            periodicity: Periodicity::Bimonthly,
            payment_due: None,
            document_url: None,
        }
    }

    fn stored_contract() -> UtilityContract {
        UtilityContract {
            id: Uuid::new_v4(),
            dwelling_id: Uuid::new_v4(),
            utility_kind: UtilityKind::Gas,
            supplier: "Hera".to_string(),
            tariff_plan: "Placet".to_string(),
            start_date: date(2024, 1, 1),
            duration_days: 365,
            periodic_cost: Decimal::new(6000, 2),
            periodicity: Periodicity::Monthly,
            payment_due: Some(date(2024, 12, 31)),
            document_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_dwelling_normalization() {
        let input = dwelling().normalized();
        assert_eq!(input.name, "Casa al mare");
        assert_eq!(input.province, "RN");
        assert_eq!(input.description, None);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_dwelling_field_rules() {
        let cases = [
            (DwellingInput { postal_code: "4792".to_string(), ..dwelling() }, "postal_code"),
            (DwellingInput { postal_code: "4792A".to_string(), ..dwelling() }, "postal_code"),
            (DwellingInput { province: "R1".to_string(), ..dwelling() }, "province"),
            (DwellingInput { province: "RNA".to_string(), ..dwelling() }, "province"),
            (DwellingInput { address: "Via".to_string(), ..dwelling() }, "address"),
            (DwellingInput { name: "C".to_string(), ..dwelling() }, "name"),
            (
                DwellingInput { description: Some("x".repeat(501)), ..dwelling() },
                "description",
            ),
        ];

        for (input, expected) in cases {
            match input.normalized().validate() {
                Err(ServiceError::Validation { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected {} error, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn test_dwelling_changes() {
        let changes = prepare_dwelling_changes(UpdateDwelling {
            province: Some(" bo".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(changes.province.as_deref(), Some("BO"));
        assert!(changes.name.is_none());

        let cleared = prepare_dwelling_changes(UpdateDwelling {
            description: Some("  \t ".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cleared.description.as_deref(), Some(""));

        assert!(prepare_dwelling_changes(UpdateDwelling {
            postal_code: Some("abcde".to_string()),
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_contract_defaults_due_date_to_end_of_term() {
        let dwelling_id = Uuid::new_v4();
        let data = contract().into_create(dwelling_id).unwrap();

        assert_eq!(data.dwelling_id, dwelling_id);
        assert_eq!(data.payment_due, Some(date(2024, 12, 31)));
    }

    #[test]
    fn test_contract_keeps_explicit_due_date() {
        let input = ContractInput {
            payment_due: Some(date(2024, 3, 15)),
            ..contract()
        };
        let data = input.into_create(Uuid::new_v4()).unwrap();
        assert_eq!(data.payment_due, Some(date(2024, 3, 15)));
    }

    #[test]
    fn test_contract_rules() {
        let zero_cost = ContractInput { periodic_cost: Decimal::ZERO, ..contract() };
        let no_duration = ContractInput { duration_days: 0, ..contract() };
        let too_long = ContractInput { duration_days: 36501, ..contract() };
        let short_supplier = ContractInput { supplier: " A ".to_string(), ..contract() };
        let long_url = ContractInput {
            document_url: Some(format!("https://docs.example.com/{}", "a".repeat(500))),
            ..contract()
        };

        for input in [zero_cost, no_duration, too_long, short_supplier, long_url] {
            assert!(input.into_create(Uuid::new_v4()).is_err());
        }
    }

    #[test]
    fn test_contract_cost_follows_money_rule() {
        let costs = [
            Decimal::new(12_345, 3),
            Decimal::new(4, 3),
            Decimal::new(100_000_000_000, 0),
        ];

        for cost in costs {
            let input = ContractInput { periodic_cost: cost, ..contract() };
            assert!(
                matches!(
                    input.into_create(Uuid::new_v4()),
                    Err(ServiceError::Validation { field: "periodic_cost", .. })
                ),
                "{} should be rejected",
                cost
            );

            let changes = UpdateContract {
                periodic_cost: Some(cost),
                ..Default::default()
            };
            assert!(matches!(
                prepare_contract_changes(&stored_contract(), changes),
                Err(ServiceError::Validation { field: "periodic_cost", .. })
            ));
        }
    }

    #[test]
    fn test_contract_changes_move_due_date() {
        let current = stored_contract();

        let longer = prepare_contract_changes(
            &current,
            UpdateContract {
                duration_days: Some(730),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(longer.payment_due, Some(date(2025, 12, 31)));

        let explicit = prepare_contract_changes(
            &current,
            UpdateContract {
                start_date: Some(date(2025, 1, 1)),
                payment_due: Some(date(2025, 2, 1)),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(explicit.payment_due, Some(date(2025, 2, 1)));

        let cost_only = prepare_contract_changes(
            &current,
            UpdateContract {
                periodic_cost: Some(Decimal::new(7000, 2)),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(cost_only.payment_due, None);
    }

    #[test]
    fn test_expiry_window() {
        let today = date(2024, 12, 15);
        assert_eq!(expiry_window(today, None).unwrap(), (today, date(2025, 1, 14)));
        assert_eq!(expiry_window(today, Some(0)).unwrap(), (today, today));
        assert!(expiry_window(today, Some(MAX_EXPIRY_WINDOW_DAYS + 1)).is_err());
    }
}
