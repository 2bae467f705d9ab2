use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::session::ResearchDesk;

pub mod handlers;
pub mod models;

pub fn create_router(desk: Arc<ResearchDesk>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Page routes
        .route(
            "/",
            get(handlers::index_handler).post(handlers::submit_handler),
        )
        // API routes
        .route("/api/render", post(handlers::render_handler))
        .route("/api/health", get(handlers::health_handler))
        .with_state(desk)
        .layer(cors)
}

/// Serves the preview UI until the process is stopped.
pub async fn serve(desk: Arc<ResearchDesk>, bind_addr: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    tracing::info!("preview server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_router(desk))
        .await
        .context("Preview server stopped unexpectedly")?;
    Ok(())
}
