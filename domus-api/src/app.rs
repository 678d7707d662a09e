/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use domus_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let app = build_router(AppState::new(pool, config));
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, patch, post, put},
    Router,
};
use domus_shared::auth::middleware::authenticate;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health
/// └── /v1/
///     ├── /auth/{register,login,refresh}         public
///     ├── /me, /me/password                      account
///     ├── /families/...                          families, members, invite codes
///     ├── /families/:id/{movements,expenses,incomes}
///     ├── /families/:id/reports/{categories,balance,total}
///     ├── /families/:id/{dwellings,contracts/expiring}
///     ├── /movements/{mine,:id}
///     ├── /dwellings/:id[/contracts]
///     └── /contracts/:id[/document]
/// ```
///
/// Everything under `/v1` except `/v1/auth` requires a Bearer access token.
///
/// # Middleware Stack
///
/// Outermost first: security headers, CORS, compression, tracing, then
/// per-route authentication.
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{
        auth, contracts, dwellings, families, health, movements, profile, reports,
    };

    let health_routes = Router::new().route("/health", get(health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh));

    let protected_routes = Router::new()
        .route("/me", get(profile::get_profile).put(profile::update_profile))
        .route("/me/password", put(profile::change_password))
        .route(
            "/families",
            get(families::list_families).post(families::create_family),
        )
        .route("/families/join", post(families::join_family))
        .route(
            "/families/:family_id",
            get(families::get_family).delete(families::delete_family),
        )
        .route(
            "/families/:family_id/invite-code",
            post(families::regenerate_invite_code),
        )
        .route(
            "/families/:family_id/members/:user_id",
            patch(families::change_member_role).delete(families::remove_member),
        )
        .route(
            "/families/:family_id/movements",
            get(movements::list_family_movements),
        )
        .route("/families/:family_id/expenses", post(movements::create_expense))
        .route("/families/:family_id/incomes", post(movements::create_income))
        .route(
            "/families/:family_id/reports/categories",
            get(reports::category_stats),
        )
        .route("/families/:family_id/reports/balance", get(reports::monthly_balance))
        .route("/families/:family_id/reports/total", get(reports::total_balance))
        .route(
            "/families/:family_id/dwellings",
            get(dwellings::list_dwellings).post(dwellings::create_dwelling),
        )
        .route(
            "/families/:family_id/contracts/expiring",
            get(contracts::list_expiring_contracts),
        )
        .route("/movements/mine", get(movements::list_my_movements))
        .route(
            "/movements/:id",
            get(movements::get_movement)
                .patch(movements::update_movement)
                .delete(movements::delete_movement),
        )
        .route(
            "/dwellings/:id",
            get(dwellings::get_dwelling)
                .patch(dwellings::update_dwelling)
                .delete(dwellings::delete_dwelling),
        )
        .route(
            "/dwellings/:id/contracts",
            get(contracts::list_contracts).post(contracts::create_contract),
        )
        .route(
            "/contracts/:id",
            get(contracts::get_contract)
                .patch(contracts::update_contract)
                .delete(contracts::delete_contract),
        )
        .route("/contracts/:id/document", put(contracts::attach_document))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Permissive when `*` is configured, otherwise the listed origins only
fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// JWT authentication middleware layer
///
/// Validates the Bearer access token and injects `AuthContext` into the
/// request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(req.headers(), state.jwt_secret())?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
