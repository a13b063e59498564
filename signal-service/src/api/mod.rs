mod error;
mod handlers;

pub use error::ApiError;

use crate::service::SignalService;
use crate::types::Result;
use axum::{Router, routing::get};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the application router
pub fn router(service: Arc<SignalService>) -> Router {
    Router::new()
        .route("/signal/latest/{identifier}", get(handlers::latest_signal))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Serve until ctrl-c
pub async fn serve(listener: TcpListener, service: Arc<SignalService>) -> Result<()> {
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
