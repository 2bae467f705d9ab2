use serde::Serialize;
use url::Url;

use crate::data_models::{ResearchResult, Source};
use crate::renderer::{SummaryRenderer, escape_html};

/// The three fragments shown for one result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub summary_html: String,
    pub sources_html: String,
    pub stats_html: String,
}

impl ResultView {
    pub fn build(result: &ResearchResult, renderer: &dyn SummaryRenderer) -> Self {
        Self {
            summary_html: renderer.render(&result.summary),
            sources_html: sources_fragment(&result.sources),
            stats_html: stats_fragment(result),
        }
    }
}

/// Only `http` and `https` links are clickable.
fn visit_link(link: &str) -> String {
    match Url::parse(link) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => format!(
            r#"<a href="{}" target="_blank" rel="noopener noreferrer">Visit Source →</a>"#,
            escape_html(link)
        ),
        _ => String::new(),
    }
}

/// One card per source, in the order received. Nothing is truncated here.
pub fn sources_fragment(sources: &[Source]) -> String {
    sources
        .iter()
        .map(|source| {
            format!(
                r#"<div class="source-item"><div class="source-title">{}</div><div class="source-snippet">{}</div><div class="source-meta"><span>{}</span>{}</div></div>"#,
                escape_html(source.display_title()),
                escape_html(source.display_snippet()),
                escape_html(&source.source),
                visit_link(&source.link),
            )
        })
        .collect::<Vec<String>>()
        .join("\n")
}

pub fn stats_fragment(result: &ResearchResult) -> String {
    [
        (result.word_count.to_string(), "Words Generated"),
        (result.sources.len().to_string(), "Sources Analyzed"),
        (format!("{:.2}s", result.processing_time), "Processing Time"),
    ]
    .iter()
    .map(|(value, label)| {
        format!(
            r#"<div class="stat-item"><div class="stat-value">{value}</div><div class="stat-label">{label}</div></div>"#
        )
    })
    .collect::<Vec<String>>()
    .join("\n")
}

/// What the page shows below the form.
#[derive(Debug, Clone, Default)]
pub struct PageState {
    pub query: String,
    pub busy: bool,
    pub error: Option<String>,
    pub results: Option<ResultView>,
}

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Research Assistant</title>
<style>
body { font-family: system-ui, sans-serif; max-width: 60rem; margin: 2rem auto; padding: 0 1rem; }
.hidden { display: none; }
.error { color: #b00020; border: 1px solid #b00020; padding: .75rem; }
.source-item { border-bottom: 1px solid #ddd; padding: .5rem 0; }
.source-meta { display: flex; justify-content: space-between; font-size: .85rem; }
#stats { display: flex; gap: 2rem; }
.stat-value { font-size: 1.5rem; font-weight: bold; }
</style>
</head>
<body>
<header><h1>Research Assistant</h1></header>
"#;

/// A complete HTML document: the query form plus whatever `state` holds.
/// Pressing Enter in the field submits the form, and the button is disabled
/// as soon as the browser sends it.
pub fn page(state: &PageState) -> String {
    let mut html = String::from(PAGE_HEAD);

    html.push_str(&format!(
        r#"<form method="post" action="/" onsubmit="searchBtn.disabled = true; searchBtn.textContent = 'Researching...'"><input id="queryInput" name="query" type="text" value="{}" autofocus><button id="searchBtn" type="submit"{}>{}</button></form>
"#,
        escape_html(&state.query),
        if state.busy { " disabled" } else { "" },
        if state.busy { "Researching..." } else { "Research" },
    ));

    if let Some(error) = &state.error {
        html.push_str(&format!(
            "<div id=\"error\" class=\"error\">{}</div>\n",
            escape_html(error)
        ));
    }

    if let Some(results) = &state.results {
        html.push_str(&format!(
            "<section id=\"results\">\n<h2>Summary</h2>\n<div id=\"summary\">{}</div>\n<h2>Sources</h2>\n<div id=\"sources\">{}</div>\n<div id=\"stats\">{}</div>\n</section>\n",
            results.summary_html, results.sources_html, results.stats_html
        ));
    }

    html.push_str("</body>\n</html>\n");
    html
}
