//! PR Review Service - reviewer assignment for pull requests.
//!
//! This is the main library for the service backend: SQLite storage, the
//! reviewer assignment engine, team and user management, and the axum HTTP
//! transport that exposes them.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod server;
pub mod services;

use config::Config;
use error::AppError;
use server::AppState;
use services::{AssignmentEngine, SqliteStore, TeamService, UserService};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Wire the services to an initialized pool.
pub fn build_state(pool: db::pool::DbPool, config: &Config) -> AppState {
    let store = SqliteStore::new(pool.clone());

    AppState {
        engine: AssignmentEngine::new(Arc::new(store)),
        teams: TeamService::new(pool.clone()),
        users: UserService::new(pool),
        request_timeout: config.request_timeout(),
    }
}

/// Apply pending migrations and return.
pub async fn migrate(config: &Config) -> Result<(), AppError> {
    let pool = db::initialize(&config.database.path, config.database.max_connections).await?;
    pool.close().await;

    log::info!(
        "[app] Database at {} is up to date",
        config.database.path.display()
    );
    Ok(())
}

/// Run the HTTP service until `shutdown` is cancelled.
pub async fn run(config: Config, shutdown: CancellationToken) -> Result<(), AppError> {
    log::info!("[app] Starting in {} environment", config.env);

    let pool = db::initialize(&config.database.path, config.database.max_connections).await?;

    let listener = tokio::net::TcpListener::bind(&config.server.listen_address)
        .await
        .map_err(|e| {
            AppError::internal(format!(
                "Failed to bind to {}: {}",
                config.server.listen_address, e
            ))
        })?;

    let state = build_state(pool.clone(), &config);

    server::serve(listener, state, shutdown)
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    pool.close().await;
    Ok(())
}
