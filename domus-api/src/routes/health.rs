/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "pool": { "active_connections": 1, "idle_connections": 4, "total_connections": 5 },
///   "migrations": { "applied_migrations": 1, "latest_version": 20250601000000 }
/// }
/// ```
///
/// The endpoint answers 200 even when the database is down; `status` is then
/// `degraded` and `migrations` is null.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use domus_shared::db::{
    migrations::{get_migration_status, MigrationStatus},
    pool::{get_pool_stats, health_check as database_health_check, PoolStats},
};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    pub pool: PoolStats,
    pub migrations: Option<MigrationStatus>,
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let (status, database) = match database_health_check(&state.db).await {
        Ok(()) => ("healthy", "connected"),
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            ("degraded", "disconnected")
        }
    };

    let migrations = if database == "connected" {
        match get_migration_status(&state.db).await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!(error = %e, "Could not read migration status");
                None
            }
        }
    } else {
        None
    };

    Ok(Json(HealthResponse {
        status,
        version: domus_shared::VERSION,
        database,
        pool: get_pool_stats(&state.db),
        migrations,
    }))
}
