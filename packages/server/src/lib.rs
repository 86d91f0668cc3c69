//! Boardspace HTTP server
//!
//! Exposes the board hierarchy engine as a REST API. The server holds no
//! hierarchy logic of its own: it maps requests onto `BoardOperations` and
//! errors onto `HttpError` responses.
//!
//! # Usage
//!
//! ```bash
//! # Start with default settings (port 3001, ./data/boards.db)
//! cargo run --bin boards-server
//!
//! # Custom port and database
//! BOARDS_PORT=3002 BOARDS_DB_PATH=/tmp/boards.db cargo run --bin boards-server
//! ```

use axum::{
    http::{header, Method},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use boardspace_core::operations::BoardOperations;

mod board_endpoints;
pub mod config;
mod http_error;

pub use config::{ConfigError, ServerConfig};
pub use http_error::HttpError;

/// Application state shared across all endpoints
#[derive(Clone)]
pub struct AppState {
    pub operations: Arc<BoardOperations>,
}

impl AppState {
    pub fn new(operations: BoardOperations) -> Self {
        Self {
            operations: Arc::new(operations),
        }
    }
}

/// Create the application router with all board routes
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .merge(board_endpoints::routes(state))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}

/// CORS layer allowing the configured origins
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(config.cors_origins.clone())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(false)
}

/// Bind to the configured address and serve until SIGINT or SIGTERM
///
/// # Errors
///
/// Returns error if server fails to bind or start.
pub async fn start_server(state: AppState, config: ServerConfig) -> anyhow::Result<()> {
    let app = create_router(state, &config);

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Board server listening on http://{}", addr);

    serve(listener, app, shutdown_signal()).await
}

/// Serve `app` on `listener` until `shutdown` resolves
///
/// In-flight requests, and the write transactions behind them, run to
/// completion before this returns.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Board server stopped");
    Ok(())
}

/// Resolves on Ctrl+C, or on SIGTERM where available
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received, draining in-flight requests");
}
