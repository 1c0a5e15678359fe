//! HTTP server for the review service.
//!
//! Wraps the services in an axum router with request tracing and permissive
//! CORS, and serves it until the cancellation token fires.

pub mod api;

use crate::services::{deadline, AssignmentEngine, TeamService, UserService};
use axum::Router;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state for the axum routes.
#[derive(Clone)]
pub struct AppState {
    pub engine: AssignmentEngine,
    pub teams: TeamService,
    pub users: UserService,
    pub request_timeout: Duration,
}

impl AppState {
    /// Deadline for a request that starts now.
    pub fn deadline(&self) -> Instant {
        deadline::after(self.request_timeout)
    }
}

/// Build the full router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(api::team_routes())
        .merge(api::user_routes())
        .merge(api::pull_request_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Serve on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    log::info!("[server] Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
        })
        .await?;

    log::info!("[server] Server stopped");
    Ok(())
}
