//! Board Server Binary
//!
//! Opens the board database and serves the REST API.
//!
//! # Environment Variables
//!
//! - `BOARDS_PORT`: Server port (default: 3001)
//! - `BOARDS_BIND_ADDR`: Bind address (default: 127.0.0.1)
//! - `BOARDS_DB_PATH`: Database file (default: ./data/boards.db)
//! - `CORS_ALLOW_ORIGIN`: Single allowed origin (default: localhost dev origins)
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")

use std::sync::Arc;

use boardspace_core::db::DatabaseService;
use boardspace_core::operations::BoardOperations;
use boardspace_server::{start_server, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    tracing::info!("Boardspace server {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Database: {}", config.db_path.display());

    let db = Arc::new(DatabaseService::new(config.db_path.clone()).await?);
    let state = AppState::new(BoardOperations::new(db));

    start_server(state, config).await
}
