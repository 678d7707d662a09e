//! # Domus Shared Library
//!
//! Types, persistence and business rules shared by the Domus API server.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, JWT tokens and the role permission table
//! - `db`: Connection pool and embedded migrations
//! - `models`: Database rows and their queries
//! - `services`: Authorization and business rules on top of the models

pub mod auth;
pub mod db;
pub mod models;
pub mod services;

/// Current version of the Domus shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
