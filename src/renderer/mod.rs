//! Summary rendering: turns the Markdown subset produced by the research
//! service into an HTML fragment.
//!
//! Two renderers are provided. [`LegacyRenderer`] is a fixed chain of global
//! substitutions and reproduces the historical output byte for byte, quirks
//! included. [`StructuredRenderer`] classifies lines first and builds blocks
//! from them, so every list gets its container and source text is escaped.

use std::str::FromStr;

pub mod legacy;
pub mod structured;

pub use legacy::{LegacyRenderer, MarkupRule};
pub use structured::StructuredRenderer;

/// A pure `raw text -> HTML fragment` conversion.
pub trait SummaryRenderer: Send + Sync {
    fn render(&self, raw: &str) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RendererKind {
    #[default]
    Structured,
    Legacy,
}

impl RendererKind {
    /// An explicit choice wins; otherwise the configured name is parsed.
    pub fn resolve(flag: Option<RendererKind>, configured: &str) -> Result<Self, String> {
        match flag {
            Some(kind) => Ok(kind),
            None => configured.parse(),
        }
    }

    pub fn build(self) -> Box<dyn SummaryRenderer> {
        match self {
            RendererKind::Structured => Box::new(StructuredRenderer),
            RendererKind::Legacy => Box::new(LegacyRenderer::default()),
        }
    }
}

impl FromStr for RendererKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "structured" => Ok(RendererKind::Structured),
            "legacy" => Ok(RendererKind::Legacy),
            other => Err(format!(
                "unknown renderer {other:?}, expected \"structured\" or \"legacy\""
            )),
        }
    }
}

/// Escapes text for use in element content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_renderer_kind_from_str() {
        assert_eq!("legacy".parse(), Ok(RendererKind::Legacy));
        assert_eq!(" Structured ".parse(), Ok(RendererKind::Structured));
        assert!("commonmark".parse::<RendererKind>().is_err());
    }

    #[test]
    fn test_resolve_prefers_flag() {
        assert_eq!(
            RendererKind::resolve(Some(RendererKind::Legacy), "structured"),
            Ok(RendererKind::Legacy)
        );
        // a bad configured name does not matter once a flag is given
        assert_eq!(
            RendererKind::resolve(Some(RendererKind::Structured), "bogus"),
            Ok(RendererKind::Structured)
        );
    }

    #[test]
    fn test_resolve_from_configured_name() {
        let kind = RendererKind::resolve(None, "LEGACY").unwrap();
        assert_eq!(kind, RendererKind::Legacy);
        assert_eq!(kind.build().render("- a\n- b"), "<ul><li>a</li><li>b</li></ul>");

        let kind = RendererKind::resolve(None, "structured").unwrap();
        assert_eq!(kind.build().render("x <y>"), "<p>x &lt;y&gt;</p>");

        let err = RendererKind::resolve(None, "markdown-it").unwrap_err();
        assert!(err.contains("markdown-it"));
    }

    #[test]
    fn test_kinds_disagree_on_escaping() {
        let raw = "a < b";
        assert_eq!(RendererKind::Legacy.build().render(raw), "<p>a < b</p>");
        assert_eq!(RendererKind::Structured.build().render(raw), "<p>a &lt; b</p>");
    }
}
