/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, token refresh
/// - `profile`: The caller's own account
/// - `families`: Families, members and invite codes
/// - `movements`: Expenses and incomes
/// - `reports`: Category statistics and balances
/// - `dwellings`: Dwellings of a family
/// - `contracts`: Utility contracts of a dwelling
///
/// Every authenticated handler receives the caller as `Extension<AuthContext>`
/// and passes its user id to the matching service.

pub mod auth;
pub mod contracts;
pub mod dwellings;
pub mod families;
pub mod health;
pub mod movements;
pub mod profile;
pub mod reports;
pub mod validators;
