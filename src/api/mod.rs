//! HTTP API - axum router, shared state and server lifecycle.
//!
//! All JSON routes live under `/api`; uploaded images are served from
//! `/uploads`. Authentication is a `Authorization: Bearer <jwt>` header,
//! resolved per request by the extractors in [`extract`].

pub mod error;
pub mod extract;
pub mod handlers;


use crate::{
    config::{app::ServerConfig, seed::SettingsSeed},
    core::{auth::AuthKeys, upload::MAX_IMAGE_BYTES},
    errors::Result,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, patch, post, put},
};
use handlers::{auth, bookings, health, menu, orders, settings, upload, users};
use sea_orm::DatabaseConnection;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

/// Request body limit on the upload route, leaving room for multipart framing.
const UPLOAD_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 1024 * 1024;

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Shared by every clone of the state
    pub db: Arc<DatabaseConnection>,
    pub keys: Arc<AuthKeys>,
    /// Used when the settings row is first created
    pub settings_defaults: Arc<SettingsSeed>,
    pub upload_dir: Arc<PathBuf>,
}

impl AppState {
    /// Builds the state from an open connection and the server configuration.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &ServerConfig, settings_defaults: SettingsSeed) -> Self {
        Self {
            db: Arc::new(db),
            keys: Arc::new(AuthKeys::new(&config.jwt_secret)),
            settings_defaults: Arc::new(settings_defaults),
            upload_dir: Arc::new(config.upload_dir.clone()),
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Builds the application router (separated from [`serve`] for testing).
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    let api = Router::new()
        .route("/health", get(health::health))
        // Accounts
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/profile", put(auth::update_profile))
        .route("/auth/password", put(auth::change_password))
        .route(
            "/auth/addresses",
            get(auth::list_addresses).post(auth::add_address),
        )
        .route(
            "/auth/addresses/{id}",
            put(auth::update_address).delete(auth::delete_address),
        )
        .route(
            "/auth/addresses/{id}/default",
            patch(auth::set_default_address),
        )
        // Menu
        .route("/menu", get(menu::list).post(menu::create))
        .route(
            "/menu/{id}",
            get(menu::get).put(menu::update).delete(menu::delete),
        )
        .route("/menu/{id}/availability", patch(menu::set_availability))
        .route(
            "/menu/{id}/reviews",
            get(menu::list_reviews).post(menu::add_review),
        )
        // Orders
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/stats", get(orders::stats))
        .route("/orders/{id}", get(orders::get).delete(orders::cancel))
        .route("/orders/{id}/status", patch(orders::set_status))
        // Bookings
        .route("/bookings", get(bookings::list).post(bookings::create))
        .route("/bookings/mine", get(bookings::mine))
        .route("/bookings/{id}/status", patch(bookings::set_status))
        // Back office
        .route("/users", get(users::list))
        .route("/users/{id}/block", patch(users::set_blocked))
        .route("/settings", get(settings::get).put(settings::update))
        .route(
            "/upload",
            post(upload::upload_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        );

    let uploads = ServeDir::new(state.upload_dir.as_path());

    Router::new()
        .nest("/api", api)
        .nest_service("/uploads", uploads)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

/// Binds the configured port and serves until Ctrl+C or SIGTERM.
///
/// # Errors
/// Returns an error if the port cannot be bound or the server fails.
pub async fn serve(state: AppState, config: &ServerConfig) -> Result<()> {
    let app = router(state, &config.allowed_origins);

    let address = format!("0.0.0.0:{}", config.port);
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal as unix_signal};

        match unix_signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
