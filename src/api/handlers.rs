use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::Html,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;

use crate::error::ClientError;
use crate::session::{PageSurface, ResearchDesk};
use crate::view::{self, PageState};

use super::models::{ErrorResponse, RenderRequest, RenderResponse, ResearchForm};

pub fn status_for(error: &ClientError) -> StatusCode {
    match error {
        ClientError::Validation(_) => StatusCode::BAD_REQUEST,
        ClientError::InFlight => StatusCode::CONFLICT,
        ClientError::Service(_) | ClientError::Transport(_) => StatusCode::BAD_GATEWAY,
    }
}

pub async fn index_handler() -> Html<String> {
    Html(view::page(&PageState::default()))
}

/// Form submission: the outcome, error included, is rendered into the page.
pub async fn submit_handler(
    State(desk): State<Arc<ResearchDesk>>,
    Form(form): Form<ResearchForm>,
) -> Html<String> {
    let surface = PageSurface::new(form.query.trim());
    // the surface already holds the error message
    let _ = desk.search(&form.query, &surface).await;
    Html(view::page(&surface.snapshot()))
}

pub async fn render_handler(
    State(desk): State<Arc<ResearchDesk>>,
    Json(request): Json<RenderRequest>,
) -> Result<Json<RenderResponse>, (StatusCode, Json<ErrorResponse>)> {
    let start = Instant::now();
    let surface = PageSurface::new(&request.query);

    let view = desk.search(&request.query, &surface).await.map_err(|e| {
        (
            status_for(&e),
            Json(ErrorResponse {
                detail: e.to_string(),
            }),
        )
    })?;

    let processing_time_ms = start.elapsed().as_millis();

    Ok(Json(RenderResponse {
        query: request.query.trim().to_string(),
        summary_html: view.summary_html,
        sources_html: view.sources_html,
        stats_html: view.stats_html,
        processing_time_ms,
    }))
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "Research Assistant" }))
}
