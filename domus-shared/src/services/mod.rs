/// Business operations
///
/// Each function takes the pool and the id of the requesting user, checks
/// the permission table, applies the business rules and then calls into
/// `models`. Rules that do not need the database are plain functions so
/// they can be tested without one.
///
/// - `users`: registration, login, profile
/// - `families`: create/join, roles, leaving, invite codes
/// - `movements`: expenses and incomes
/// - `reports`: category statistics and balances
/// - `housing`: dwellings and utility contracts
/// - `money`: the shared rule for amounts and costs

pub mod error;
pub mod families;
pub mod housing;
pub mod money;
pub mod movements;
pub mod period;
pub mod reports;
pub mod users;

pub use error::{ServiceError, ServiceResult};
