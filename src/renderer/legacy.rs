use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::SummaryRenderer;

static HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(#{1,4}) ([^\n]*)\n?").expect("header pattern"));
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern"));
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").expect("italic pattern"));
static CODE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(\w+)?\n(.*?)```").expect("code block pattern"));
static INLINE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`(.*?)`").expect("inline code pattern"));
static BULLET_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^- ([^\n]*)\n?").expect("bullet pattern"));
static NUMBERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\d+\. ([^\n]*)\n?").expect("numbered pattern"));
static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\n").expect("paragraph pattern"));
static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n").expect("line break pattern"));

/// One step of the substitution chain. A rule sees the whole output of the
/// rule before it, markup included.
pub trait MarkupRule: Send + Sync {
    fn apply(&self, text: String) -> String;
}

/// `#`..`####` at the start of a line becomes `<h1>`..`<h4>`; the line's
/// newline is consumed with it.
pub struct HeaderRule;

impl MarkupRule for HeaderRule {
    fn apply(&self, text: String) -> String {
        HEADER
            .replace_all(&text, |caps: &Captures| {
                let level = caps[1].len();
                format!("<h{level}>{}</h{level}>", &caps[2])
            })
            .into_owned()
    }
}

/// Replaces every match of a pattern with a fixed template.
pub struct SubstitutionRule {
    pattern: &'static Regex,
    replacement: &'static str,
}

impl SubstitutionRule {
    pub fn new(pattern: &'static Regex, replacement: &'static str) -> Self {
        Self {
            pattern,
            replacement,
        }
    }
}

impl MarkupRule for SubstitutionRule {
    fn apply(&self, text: String) -> String {
        self.pattern.replace_all(&text, self.replacement).into_owned()
    }
}

/// Turns every matching line into `<li>` and wraps only the first run of
/// directly adjacent items in `open`/`close`. Later runs stay unwrapped.
pub struct ListRule {
    item: &'static Regex,
    open: &'static str,
    close: &'static str,
}

impl ListRule {
    pub fn unordered() -> Self {
        Self {
            item: &BULLET_ITEM,
            open: "<ul>",
            close: "</ul>",
        }
    }

    pub fn ordered() -> Self {
        Self {
            item: &NUMBERED_ITEM,
            open: "<ol>",
            close: "</ol>",
        }
    }
}

impl MarkupRule for ListRule {
    fn apply(&self, text: String) -> String {
        let mut out = String::with_capacity(text.len() + 16);
        let mut last = 0;
        let mut opened = false;
        let mut in_run = false;

        for caps in self.item.captures_iter(&text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if in_run && whole.start() != last {
                out.push_str(self.close);
                in_run = false;
            }
            out.push_str(&text[last..whole.start()]);
            if !opened {
                out.push_str(self.open);
                opened = true;
                in_run = true;
            }
            out.push_str("<li>");
            out.push_str(&caps[1]);
            out.push_str("</li>");
            last = whole.end();
        }

        if in_run {
            out.push_str(self.close);
        }
        out.push_str(&text[last..]);
        out
    }
}

/// Opening tags the earlier rules emit that already form a block.
const BLOCK_TAGS: [&str; 8] = ["<h1>", "<h2>", "<h3>", "<h4>", "<ul>", "<ol>", "<pre>", "<p>"];

/// Wraps the fragment in `<p>` unless it already starts with a block element.
/// Inline openers such as `<strong>` or `<code>` still get wrapped.
pub struct ParagraphWrapRule;

impl MarkupRule for ParagraphWrapRule {
    fn apply(&self, text: String) -> String {
        if BLOCK_TAGS.iter().any(|tag| text.starts_with(tag)) {
            text
        } else {
            format!("<p>{text}</p>")
        }
    }
}

/// The historical substitution pipeline. Rule order matters: list items are
/// produced before their containers, emphasis before code.
pub struct LegacyRenderer {
    rules: Vec<Box<dyn MarkupRule>>,
}

impl LegacyRenderer {
    pub fn new(rules: Vec<Box<dyn MarkupRule>>) -> Self {
        Self { rules }
    }
}

impl Default for LegacyRenderer {
    fn default() -> Self {
        Self::new(vec![
            Box::new(HeaderRule),
            Box::new(SubstitutionRule::new(&BOLD, "<strong>$1</strong>")),
            Box::new(SubstitutionRule::new(&ITALIC, "<em>$1</em>")),
            Box::new(SubstitutionRule::new(&CODE_BLOCK, "<pre><code>$2</code></pre>")),
            Box::new(SubstitutionRule::new(&INLINE_CODE, "<code>$1</code>")),
            Box::new(ListRule::unordered()),
            Box::new(ListRule::ordered()),
            Box::new(SubstitutionRule::new(&PARAGRAPH_BREAK, "</p><p>")),
            Box::new(SubstitutionRule::new(&LINE_BREAK, "<br>")),
            Box::new(ParagraphWrapRule),
        ])
    }
}

impl SummaryRenderer for LegacyRenderer {
    fn render(&self, raw: &str) -> String {
        let mut html = raw.to_string();
        for rule in self.rules.iter() {
            html = rule.apply(html);
        }
        html
    }
}
