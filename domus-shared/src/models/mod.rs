/// Database models for Domus
///
/// Each model owns its row type and the parameterized queries that read
/// and write it. Authorization lives one layer up, in `services`.
///
/// # Models
///
/// - `user`: Accounts and credentials
/// - `family`: Families and invite codes
/// - `membership`: User-family links with roles
/// - `movement`: Expenses and incomes
/// - `report`: Aggregations over movements
/// - `dwelling`: Homes registered by a family
/// - `contract`: Utility contracts of a dwelling
///
/// # Example
///
/// ```no_run
/// use domus_shared::db::pool::{create_pool, DatabaseConfig};
/// use domus_shared::models::family::{generate_invite_code, Family};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let family = Family::create(&pool, "Rossi", &generate_invite_code()).await?;
/// println!("invite code {}", family.invite_code);
/// # Ok(())
/// # }
/// ```

pub mod contract;
pub mod dwelling;
pub mod family;
pub mod membership;
pub mod movement;
pub mod report;
pub mod user;
