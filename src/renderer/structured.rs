use once_cell::sync::Lazy;
use regex::Regex;

use super::{SummaryRenderer, escape_html};

static STRONG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("strong pattern"));
static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").expect("em pattern"));

/// What a single source line is, decided without looking at its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    Heading { level: usize, text: &'a str },
    Bullet(&'a str),
    Numbered(&'a str),
    Fence,
    Blank,
    Text(&'a str),
}

pub fn classify(line: &str) -> Line<'_> {
    if line.trim().is_empty() {
        return Line::Blank;
    }
    if line.starts_with("```") {
        return Line::Fence;
    }

    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if (1..=4).contains(&hashes) {
        if let Some(text) = line[hashes..].strip_prefix(' ') {
            return Line::Heading { level: hashes, text };
        }
    }

    if let Some(text) = line.strip_prefix("- ") {
        return Line::Bullet(text);
    }

    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 {
        if let Some(text) = line[digits..].strip_prefix(". ") {
            return Line::Numbered(text);
        }
    }

    Line::Text(line)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block<'a> {
    Heading { level: usize, text: &'a str },
    List { ordered: bool, items: Vec<&'a str> },
    Code(Vec<&'a str>),
    Paragraph(Vec<&'a str>),
}

/// Groups classified lines into blocks. Adjacent list items of the same kind
/// share one list; a blank line or any other line kind ends it. A fence
/// swallows everything up to the closing fence, or to the end of input.
pub fn build_blocks(raw: &str) -> Vec<Block<'_>> {
    let mut blocks: Vec<Block> = Vec::new();
    // whether the next line may extend the last block
    let mut open = false;
    let mut lines = raw.lines();

    while let Some(line) = lines.next() {
        match classify(line) {
            Line::Blank => open = false,
            Line::Fence => {
                let mut body = Vec::new();
                for inner in lines.by_ref() {
                    if inner.starts_with("```") {
                        break;
                    }
                    body.push(inner);
                }
                blocks.push(Block::Code(body));
                open = false;
            }
            Line::Heading { level, text } => {
                blocks.push(Block::Heading { level, text });
                open = false;
            }
            Line::Bullet(item) => {
                push_item(&mut blocks, open, false, item);
                open = true;
            }
            Line::Numbered(item) => {
                push_item(&mut blocks, open, true, item);
                open = true;
            }
            Line::Text(text) => {
                if open {
                    if let Some(Block::Paragraph(para)) = blocks.last_mut() {
                        para.push(text);
                        continue;
                    }
                }
                blocks.push(Block::Paragraph(vec![text]));
                open = true;
            }
        }
    }

    blocks
}

fn push_item<'a>(blocks: &mut Vec<Block<'a>>, open: bool, ordered: bool, item: &'a str) {
    if open {
        if let Some(Block::List {
            ordered: last_ordered,
            items,
        }) = blocks.last_mut()
        {
            if *last_ordered == ordered {
                items.push(item);
                return;
            }
        }
    }
    blocks.push(Block::List {
        ordered,
        items: vec![item],
    });
}

/// Code spans first, so their content is never treated as emphasis. Text is
/// escaped before any tag is inserted.
pub fn render_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('`') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('`') else {
            break;
        };
        out.push_str(&render_emphasis(&rest[..open]));
        out.push_str("<code>");
        out.push_str(&escape_html(&after[..close]));
        out.push_str("</code>");
        rest = &after[close + 1..];
    }

    out.push_str(&render_emphasis(rest));
    out
}

fn render_emphasis(text: &str) -> String {
    let escaped = escape_html(text);
    let strong = STRONG.replace_all(&escaped, "<strong>$1</strong>");
    EMPHASIS.replace_all(&strong, "<em>$1</em>").into_owned()
}

fn render_block(block: &Block, out: &mut String) {
    match block {
        Block::Heading { level, text } => {
            out.push_str(&format!("<h{level}>{}</h{level}>", render_inline(text)));
        }
        Block::List { ordered, items } => {
            let tag = if *ordered { "ol" } else { "ul" };
            out.push_str(&format!("<{tag}>"));
            for item in items {
                out.push_str("<li>");
                out.push_str(&render_inline(item));
                out.push_str("</li>");
            }
            out.push_str(&format!("</{tag}>"));
        }
        Block::Code(lines) => {
            out.push_str("<pre><code>");
            for line in lines {
                out.push_str(&escape_html(line));
                out.push('\n');
            }
            out.push_str("</code></pre>");
        }
        Block::Paragraph(lines) => {
            let rendered = lines
                .iter()
                .map(|l| render_inline(l))
                .collect::<Vec<String>>()
                .join("<br>");
            out.push_str("<p>");
            out.push_str(&rendered);
            out.push_str("</p>");
        }
    }
}

/// Line classification followed by block building. Every list is wrapped in
/// its own container and all source text is escaped.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredRenderer;

impl SummaryRenderer for StructuredRenderer {
    fn render(&self, raw: &str) -> String {
        let mut html = String::with_capacity(raw.len() + 32);
        for block in build_blocks(raw).iter() {
            render_block(block, &mut html);
        }
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(raw: &str) -> String {
        StructuredRenderer.render(raw)
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("### Intro"), Line::Heading { level: 3, text: "Intro" });
        assert_eq!(classify("##### Intro"), Line::Text("##### Intro"));
        assert_eq!(classify("#hashtag"), Line::Text("#hashtag"));
        assert_eq!(classify("- item"), Line::Bullet("item"));
        assert_eq!(classify("12. item"), Line::Numbered("item"));
        assert_eq!(classify("12.item"), Line::Text("12.item"));
        assert_eq!(classify("```python"), Line::Fence);
        assert_eq!(classify("   "), Line::Blank);
    }

    #[test]
    fn test_build_blocks_groups_lists() {
        let blocks = build_blocks("- a\n- b\n1. c\n\n- d");
        assert_eq!(
            blocks,
            vec![
                Block::List { ordered: false, items: vec!["a", "b"] },
                Block::List { ordered: true, items: vec!["c"] },
                Block::List { ordered: false, items: vec!["d"] },
            ]
        );
    }

    #[test]
    fn test_heading() {
        assert_eq!(render("# Title"), "<h1>Title</h1>");
        assert_eq!(render("## Sub **bold**"), "<h2>Sub <strong>bold</strong></h2>");
    }

    #[test]
    fn test_emphasis() {
        assert_eq!(
            render("**bold** and *italic*"),
            "<p><strong>bold</strong> and <em>italic</em></p>"
        );
    }

    #[test]
    fn test_inline_code_content_is_literal() {
        assert_eq!(render("`code`"), "<p><code>code</code></p>");
        assert_eq!(render("`a*b*c` and `<x>`"), "<p><code>a*b*c</code> and <code>&lt;x&gt;</code></p>");
    }

    #[test]
    fn test_unbalanced_backtick_is_text() {
        assert_eq!(render("a ` b"), "<p>a ` b</p>");
    }

    #[test]
    fn test_every_list_is_wrapped() {
        assert_eq!(
            render("- a\n- b\n\ntext\n\n- c\n- d"),
            "<ul><li>a</li><li>b</li></ul><p>text</p><ul><li>c</li><li>d</li></ul>"
        );
    }

    #[test]
    fn test_paragraph_lines_become_breaks() {
        assert_eq!(render("line one\nline two"), "<p>line one<br>line two</p>");
        assert_eq!(render("one\n\ntwo"), "<p>one</p><p>two</p>");
    }

    #[test]
    fn test_html_is_escaped() {
        assert_eq!(
            render("<script>alert(1)</script> & more"),
            "<p>&lt;script&gt;alert(1)&lt;/script&gt; &amp; more</p>"
        );
    }

    #[test]
    fn test_code_block() {
        assert_eq!(
            render("```rust\nlet x = **y** < 2;\n```\nafter"),
            "<pre><code>let x = **y** &lt; 2;\n</code></pre><p>after</p>"
        );
    }

    #[test]
    fn test_unterminated_fence_runs_to_end() {
        assert_eq!(render("```\n- not a list"), "<pre><code>- not a list\n</code></pre>");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(render(""), "");
        assert_eq!(render("\n\n"), "");
    }
}
