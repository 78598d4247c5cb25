/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use docketly_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config)?;
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{auth::jwt_auth_layer, security::SecurityHeadersLayer},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use docketly_shared::{
    crypto::{CryptoError, FieldCipher},
    services::Services,
};
use sqlx::PgPool;
use std::sync::Arc;
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

    /// Domain services sharing the pool and bank-field cipher
    pub services: Arc<Services>,
}

impl AppState {
    /// Creates application state
    ///
    /// # Errors
    ///
    /// Fails if `FIELD_ENCRYPTION_KEY` is not a valid 32-byte hex key.
    pub fn new(db: PgPool, config: Config) -> Result<Self, CryptoError> {
        let cipher = FieldCipher::from_hex_key(&config.encryption.field_key)?;
        let services = Services::new(db.clone(), cipher);

        Ok(Self {
            db,
            config: Arc::new(config),
            services: Arc::new(services),
        })
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /health                                  public
/// /v1/auth/{register,login,refresh}        public
/// /v1/auth/{me,change-password}            any role
/// /v1/users                                ADMIN
/// /v1/builders, /v1/contractors            ADMIN, SUPERVISOR (reads)
/// /v1/dockets                              ADMIN, owning SUPERVISOR
/// /v1/weekly                               ADMIN, SUPERVISOR
/// /v1/invoices, /v1/history, /v1/dashboard ADMIN (invoice reads: owning WORKER)
/// /v1/worker                               WORKER
/// ```
///
/// Everything except the public routes sits behind the JWT layer. Role and
/// ownership checks happen in the handlers and services.
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .route("/change-password", post(routes::auth::change_password))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_layer))
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let protected_routes = Router::new()
        .nest("/users", routes::users::router())
        .nest("/builders", routes::builders::router())
        .nest("/contractors", routes::contractors::router())
        .nest("/dockets", routes::dockets::router())
        .nest("/weekly", routes::weekly::router())
        .nest("/invoices", routes::invoices::router())
        .nest("/history", routes::history::router())
        .route("/dashboard", get(routes::dashboard::dashboard))
        .nest("/worker", routes::worker::router())
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
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

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|o| o == "*") {
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
        .expose_headers([header::CONTENT_DISPOSITION])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
