//! License Proxy - Main Application Entry Point
//!
//! An HTTP proxy in front of a third-party chat endpoint. Every proxied
//! request must carry a license key; limited licenses get a daily request
//! quota counted per Solar Hijri day. A small admin API and a static panel
//! manage the licenses.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx, or an in-memory store without `DATABASE_URL`
//! - **Upstream**: reqwest client with a fixed 10 second timeout
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Initialize logging
//! 3. Open the license store (connect and migrate when using PostgreSQL)
//! 4. Build the upstream client and the shared application state
//! 5. Start server on configured port, until Ctrl-C or SIGTERM

mod calendar;
mod config;
mod db;
mod error;
mod handlers;
mod logging;
mod middleware;
mod models;
mod routes;
mod services;
mod state;
mod store;

use std::sync::Arc;

use calendar::SystemClock;
use services::upstream_service::UpstreamClient;
use state::{AppState, DeveloperInfo};
use store::{LicenseStore, MemoryLicenseStore, PgLicenseStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::Config::from_env()?;
    let _log_guard = logging::init(config.log_file.as_deref())?;
    tracing::info!("Configuration loaded");

    let store: Arc<dyn LicenseStore> = match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = db::create_pool(database_url).await?;
            tracing::info!("Database pool created");

            db::run_migrations(&pool).await?;
            tracing::info!("Database migrations complete");

            Arc::new(PgLicenseStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, licenses are kept in memory and lost on restart");
            Arc::new(MemoryLicenseStore::new())
        }
    };

    let upstream = UpstreamClient::new(&config.upstream_url)?;
    tracing::info!(endpoint = %upstream.endpoint(), "Upstream client ready");

    let admin_token_digest = config.admin_token().map(middleware::admin::token_digest);
    if admin_token_digest.is_none() {
        tracing::warn!("ADMIN_TOKEN not set, license management API is unauthenticated");
    }

    let state = AppState {
        store,
        clock: Arc::new(SystemClock),
        upstream,
        admin_token_digest,
        developer: DeveloperInfo {
            name: config.developer_name.clone(),
            id: config.developer_id.clone(),
        },
    };

    let app = routes::build_router(state, &config.panel_path);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running at http://localhost:{}", config.server_port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
