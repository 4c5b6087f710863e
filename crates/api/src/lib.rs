//! `api` crate — HTTP REST API layer.
//!
//! Exposes:
//!   GET    /health
//!   POST   /workflows
//!   GET    /workflows
//!   GET    /workflows/{id}
//!   POST   /workflows/{id}/run
//!   GET    /runs/{id}

pub mod error;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use engine::WorkflowService;

pub use error::ApiError;
pub use handlers::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/workflows",
            get(handlers::workflows::list).post(handlers::workflows::create),
        )
        .route("/workflows/:id", get(handlers::workflows::get))
        .route("/workflows/:id/run", post(handlers::runs::trigger))
        .route("/runs/:id", get(handlers::runs::get))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind to `bind` and serve until Ctrl-C.  In-flight runs finish before the
/// server exits.
pub async fn serve(bind: &str, service: WorkflowService) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(AppState::new(service)))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("cannot listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
