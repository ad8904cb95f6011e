#![allow(clippy::result_large_err)]

use bistro::{
    api::{self, AppState},
    config::{
        app::ServerConfig,
        database::{create_connection, create_tables},
        seed::load_seed,
    },
    core::{auth::ensure_admin, menu::seed_menu},
    errors::Result,
};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the server configuration
    let config = ServerConfig::from_env()
        .inspect_err(|e| error!("Critical error loading configuration: {}", e))?;

    // 4. Connect to the database and create the schema
    let db = create_connection(&config.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed the starter menu (only into an empty menu)
    let seed = load_seed(&config.seed_file)?;
    seed_menu(&db, &seed.menu)
        .await
        .inspect_err(|e| error!("Failed to seed menu: {}", e))?;

    // 6. Bootstrap the admin account if credentials are configured
    if let Some((email, password)) = &config.admin_credentials {
        ensure_admin(&db, "Administrator", email, password)
            .await
            .inspect_err(|e| error!("Failed to create admin account: {}", e))?;
    }

    // 7. Serve until shutdown
    let state = AppState::new(db, &config, seed.settings);
    api::serve(state, &config).await
}
