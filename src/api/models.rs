use serde::{Deserialize, Serialize};

/// A missing `query` is treated as blank so it fails validation with a 400.
#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub query: String,
}

/// Fields of the HTML form; a missing field counts as an empty query.
#[derive(Debug, Deserialize)]
pub struct ResearchForm {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RenderResponse {
    pub query: String,
    pub summary_html: String,
    pub sources_html: String,
    pub stats_html: String,
    pub processing_time_ms: u128,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
