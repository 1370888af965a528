//! Goldtap economy service entry point.
//!
//! Wires together configuration, the `PostgreSQL` pool, migrations,
//! and the HTTP API server.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `goldtap-config.yaml`
//! 3. Connect to `PostgreSQL` and run migrations
//! 4. Build the shared application state
//! 5. Serve the HTTP API until the process is terminated

mod config;

use std::path::Path;
use std::sync::Arc;

use goldtap_api::{AppState, ServerConfig, start_server};
use goldtap_db::PostgresPool;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ServiceConfig;

/// Default configuration file path, relative to the working directory.
const CONFIG_PATH: &str = "goldtap-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration loading, the database connection,
/// migrations, or the HTTP server fail.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("goldtap-server starting");

    // 2. Load configuration.
    let config_path = Path::new(CONFIG_PATH);
    let config = if config_path.exists() {
        ServiceConfig::from_file(config_path)?
    } else {
        warn!(path = CONFIG_PATH, "Config file not found, using defaults");
        let mut config = ServiceConfig::default();
        config.database.apply_env_overrides();
        config
    };
    info!(
        host = config.server.host,
        port = config.server.port,
        max_connections = config.database.max_connections,
        "Configuration loaded"
    );

    // 3. Connect to PostgreSQL and run migrations.
    let pool =
        PostgresPool::connect(&config.database.url, config.database.max_connections).await?;
    pool.run_migrations().await?;

    // 4. Build the shared application state.
    let state = Arc::new(AppState::new(pool.pool().clone()));

    // 5. Serve the HTTP API.
    let server_config = ServerConfig {
        host: config.server.host,
        port: config.server.port,
    };
    start_server(&server_config, state).await?;

    pool.close().await;
    Ok(())
}
