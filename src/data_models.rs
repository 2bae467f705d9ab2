use serde::{Deserialize, Serialize};

use crate::error::ClientError;

pub const VALIDATION_MESSAGE: &str = "Please enter a research query";
pub const FALLBACK_ERROR_MESSAGE: &str = "Research failed";

/// A trimmed, non-empty research query. Only constructed through [`Query::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Query(String);

impl Query {
    pub fn parse(raw: &str) -> Result<Query, ClientError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ClientError::Validation(VALIDATION_MESSAGE.to_string()));
        }
        Ok(Query(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of `POST /api/research`.
#[derive(Debug, Serialize)]
pub struct ResearchRequest<'a> {
    pub query: &'a Query,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResearchResult {
    pub summary: String,
    pub sources: Vec<Source>,
    pub word_count: u64,
    /// Seconds.
    pub processing_time: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Source {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    pub source: String,
    pub link: String,
}

impl Source {
    pub fn display_title(&self) -> &str {
        non_empty(self.title.as_deref()).unwrap_or("No title available")
    }

    pub fn display_snippet(&self) -> &str {
        non_empty(self.snippet.as_deref()).unwrap_or("No description available")
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Error body returned with a non-success status.
#[derive(Deserialize, Debug, Default)]
pub struct ErrorPayload {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorPayload {
    /// The user-facing message, or `None` when the payload carries nothing usable.
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            // e.g. a list of validation problems
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_is_trimmed() {
        let query = Query::parse("  rust async runtimes \n").unwrap();
        assert_eq!(query.as_str(), "rust async runtimes");
    }

    #[test]
    fn test_blank_query_is_rejected() {
        for raw in ["", "   ", "\t\n "] {
            let err = Query::parse(raw).unwrap_err();
            assert!(matches!(err, ClientError::Validation(_)));
            assert_eq!(err.to_string(), VALIDATION_MESSAGE);
        }
    }

    #[test]
    fn test_request_body_shape() {
        let query = Query::parse("tokio").unwrap();
        let body = serde_json::to_value(ResearchRequest { query: &query }).unwrap();
        assert_eq!(body, serde_json::json!({ "query": "tokio" }));
    }

    #[test]
    fn test_source_placeholders() {
        let source: Source = serde_json::from_value(serde_json::json!({
            "title": "",
            "source": "Serper",
            "link": "https://example.com"
        }))
        .unwrap();
        assert_eq!(source.display_title(), "No title available");
        assert_eq!(source.display_snippet(), "No description available");
    }

    #[test]
    fn test_error_payload_message() {
        let parse = |v: serde_json::Value| serde_json::from_value::<ErrorPayload>(v).unwrap();

        assert_eq!(
            parse(serde_json::json!({ "detail": "quota exceeded" })).message(),
            Some("quota exceeded".to_string())
        );
        assert_eq!(parse(serde_json::json!({})).message(), None);
        assert_eq!(parse(serde_json::json!({ "detail": null })).message(), None);
        assert_eq!(parse(serde_json::json!({ "detail": "" })).message(), None);
        assert_eq!(
            parse(serde_json::json!({ "detail": [{ "msg": "field required" }] })).message(),
            Some(r#"[{"msg":"field required"}]"#.to_string())
        );
    }
}
