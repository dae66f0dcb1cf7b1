/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskmate_api::{app::{build_router, AppState}, config::Config};
/// use taskmate_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskmate_shared::store::postgres::PgStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig::new(config.database.url.clone())).await?;
/// let state = AppState::new(Arc::new(PgStore::new(pool)), config);
/// let app = build_router(state);
/// # let _ = app;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{auth::resolve_principal, security::SecurityHeadersLayer},
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use taskmate_shared::auth::credentials::{CredentialService, JwtCredentialService};
use taskmate_shared::store::EntityStore;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned per request by the `State` extractor; everything inside is an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Entity store every operation runs its transaction on
    pub store: Arc<dyn EntityStore>,

    /// Password and token handling
    pub credentials: Arc<dyn CredentialService>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// State with a JWT/Argon2id credential service built from `config`
    pub fn new(store: Arc<dyn EntityStore>, config: Config) -> Self {
        let credentials = Arc::new(JwtCredentialService::new(
            config.jwt.secret.clone(),
            config.access_ttl(),
        ));

        Self::with_credentials(store, credentials, config)
    }

    pub fn with_credentials(
        store: Arc<dyn EntityStore>,
        credentials: Arc<dyn CredentialService>,
        config: Config,
    ) -> Self {
        Self {
            store,
            credentials,
            config: Arc::new(config),
        }
    }

    pub fn store(&self) -> &dyn EntityStore {
        self.store.as_ref()
    }

    pub fn credentials(&self) -> &dyn CredentialService {
        self.credentials.as_ref()
    }
}

/// Builds the complete router
///
/// ```text
/// /
/// ├── GET /health
/// └── /v1/                                  bearer token resolved here
///     ├── /auth/  POST register, POST login
///     ├── /account             GET, PUT, DELETE
///     ├── /account/password    PUT
///     ├── /tasks               GET, POST
///     ├── /tasks/:id           GET, PUT, DELETE
///     ├── /tasks/:id/recurrence    GET, PUT
///     ├── /tasks/:id/attachments   GET, POST
///     ├── /subtasks            POST
///     ├── /subtasks/:id        GET, PUT, DELETE
///     ├── /subtasks/task/:task_id        GET
///     ├── /subtasks/complete/:id         PUT
///     ├── /subtasks/in-complete/:id      PUT
///     ├── /recurrences/:id     DELETE
///     └── /attachments/:id     GET, DELETE
/// ```
///
/// Outermost first: security headers, CORS, request tracing.
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{account, attachments, auth, health, recurrences, subtasks, tasks};

    let health_routes = Router::new().route("/health", get(health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .route(
            "/account",
            get(account::get_account)
                .put(account::edit_account)
                .delete(account::delete_account),
        )
        .route("/account/password", put(account::change_password))
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/tasks/:id",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route(
            "/tasks/:id/recurrence",
            get(recurrences::get_recurrence).put(recurrences::set_recurrence),
        )
        .route(
            "/tasks/:id/attachments",
            get(attachments::list_attachments).post(attachments::create_attachment),
        )
        .route("/subtasks", post(subtasks::create_subtask))
        .route(
            "/subtasks/:id",
            get(subtasks::get_subtask)
                .put(subtasks::update_subtask)
                .delete(subtasks::delete_subtask),
        )
        .route("/subtasks/task/:task_id", get(subtasks::list_subtasks))
        .route("/subtasks/complete/:id", put(subtasks::complete_subtask))
        .route("/subtasks/in-complete/:id", put(subtasks::reopen_subtask))
        .route(
            "/recurrences/:id",
            axum::routing::delete(recurrences::delete_recurrence),
        )
        .route(
            "/attachments/:id",
            get(attachments::get_attachment).delete(attachments::delete_attachment),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            resolve_principal,
        ));

    let cors = cors_layer(&state.config);
    let production = state.config.api.production;

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}

/// Permissive with `*`, otherwise the configured origins only
fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_permissive() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
