/// Database layer for Domus
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: Embedded migration runner
///
/// Row types and queries live in the `models` module at crate root.

pub mod migrations;
pub mod pool;
