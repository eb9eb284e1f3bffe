//! Minimal Markdown dialect.
//!
//! A small, fixed rule set applied as successive substitutions. It is used
//! for release notes and for documents fetched live when no snapshot exists;
//! snapshot documents go through [`commonmark`](super::commonmark) instead.
//!
//! Rules, in order:
//!
//! 1. fenced code blocks, body trimmed and escaped
//! 2. inline code
//! 3. `#`, `##`, `###` headings
//! 4. bold (`**x**`, `__x__`)
//! 5. italic (`*x*`, `_x_`)
//! 6. links, opened in a new browsing context
//! 7. images, lazily loaded
//! 8. unordered items, each contiguous run wrapped in `<ul>`
//! 9. ordered items (`<li>` only, no `<ol>`)
//! 10. blockquotes, one per line
//! 11. horizontal rules
//! 12. paragraphs on blank-line boundaries
//!
//! Code produced by rules 1 and 2 is parked behind placeholder tokens until
//! the end, so later rules never see it. All remaining text is HTML-escaped
//! before rule 3, so markup in the input is shown as text, never emitted.

use super::escape_html;
use regex::{Captures, Regex};
use std::sync::LazyLock;

const BLOCK_OPEN: char = '\u{E000}';
const INLINE_OPEN: char = '\u{E001}';
const TOKEN_CLOSE: char = '\u{E002}';

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(\w+)?\n(.*?)```").expect("valid regex"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`\n]+)`").expect("valid regex"));
static H3: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^### (.*)$").expect("valid regex"));
static H2: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^## (.*)$").expect("valid regex"));
static H1: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^# (.*)$").expect("valid regex"));
static BOLD_STARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*\n]+)\*\*").expect("valid regex"));
static BOLD_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__([^_\n]+)__").expect("valid regex"));
static ITALIC_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\s][^*\n]*)\*").expect("valid regex"));
static ITALIC_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[^\w])_([^_\s][^_\n]*)_").expect("valid regex"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!?)\[([^\]]+)\]\(([^)]+)\)").expect("valid regex"));
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").expect("valid regex"));
static UNORDERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[*-] (.+)$").expect("valid regex"));
static ORDERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\d+\. (.+)$").expect("valid regex"));
// Matches after escaping, so the marker is `&gt;`.
static BLOCKQUOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^&gt; (.+)$").expect("valid regex"));
static RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:---|\*\*\*)$").expect("valid regex"));
static BLOCK_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<(h[1-6]|ul|ol|pre|blockquote|hr)").expect("valid regex"));

/// Render Markdown in the minimal dialect to HTML.
pub fn render(markdown: &str) -> String {
    if markdown.is_empty() {
        return String::new();
    }

    let text = markdown.replace("\r\n", "\n");
    let mut parked: Vec<String> = Vec::new();

    // 1. Fenced code blocks
    let text = FENCE.replace_all(&text, |caps: &Captures| {
        let lang = caps.get(1).map_or("text", |m| m.as_str());
        let code = escape_html(caps[2].trim());
        park(
            &mut parked,
            BLOCK_OPEN,
            format!("<pre><code class=\"language-{lang}\">{code}</code></pre>"),
        )
    });

    // 2. Inline code
    let text = INLINE_CODE.replace_all(&text, |caps: &Captures| {
        park(
            &mut parked,
            INLINE_OPEN,
            format!("<code>{}</code>", escape_html(&caps[1])),
        )
    });

    let text = escape_html(&text);

    // 3. Headings (longest marker first)
    let text = H3.replace_all(&text, "<h3>$1</h3>");
    let text = H2.replace_all(&text, "<h2>$1</h2>");
    let text = H1.replace_all(&text, "<h1>$1</h1>");

    // 4. Bold
    let text = BOLD_STARS.replace_all(&text, "<strong>$1</strong>");
    let text = BOLD_UNDERSCORES.replace_all(&text, "<strong>$1</strong>");

    // 5. Italic
    let text = ITALIC_STAR.replace_all(&text, "<em>$1</em>");
    let text = ITALIC_UNDERSCORE.replace_all(&text, "$1<em>$2</em>");

    // 6. Links (images are left for rule 7)
    let text = LINK.replace_all(&text, |caps: &Captures| {
        if &caps[1] == "!" {
            return caps[0].to_string();
        }
        format!(
            r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
            &caps[3], &caps[2]
        )
    });

    // 7. Images
    let text = IMAGE.replace_all(&text, r#"<img src="$2" alt="$1" loading="lazy">"#);

    // 8. Unordered lists
    let text = wrap_unordered_lists(&text);

    // 9. Ordered list items
    let text = ORDERED_ITEM.replace_all(&text, "<li>$1</li>");

    // 10. Blockquotes
    let text = BLOCKQUOTE.replace_all(&text, "<blockquote>$1</blockquote>");

    // 11. Horizontal rules
    let text = RULE.replace_all(&text, "<hr>");

    // 12. Paragraphs
    let html = text
        .split("\n\n")
        .map(|chunk| {
            let trimmed = chunk.trim();
            if trimmed.is_empty() {
                String::new()
            } else if BLOCK_START.is_match(trimmed) || trimmed.starts_with(BLOCK_OPEN) {
                trimmed.to_string()
            } else {
                format!("<p>{trimmed}</p>")
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    restore(&html, &parked)
}

/// Replace `html` with a placeholder token and remember it.
fn park(parked: &mut Vec<String>, open: char, html: String) -> String {
    parked.push(html);
    format!("{open}{}{TOKEN_CLOSE}", parked.len() - 1)
}

fn restore(text: &str, parked: &[String]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find([BLOCK_OPEN, INLINE_OPEN]) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + BLOCK_OPEN.len_utf8()..];
        let resolved = after_open.find(TOKEN_CLOSE).and_then(|end| {
            let html = after_open[..end]
                .parse::<usize>()
                .ok()
                .and_then(|i| parked.get(i))?;
            Some((html, end))
        });
        match resolved {
            Some((html, end)) => {
                out.push_str(html);
                rest = &after_open[end + TOKEN_CLOSE.len_utf8()..];
            }
            None => {
                out.push_str(&rest[start..start + BLOCK_OPEN.len_utf8()]);
                rest = after_open;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Turn `* ` / `- ` lines into `<li>` and wrap each contiguous run in `<ul>`.
fn wrap_unordered_lists(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut run: Vec<String> = Vec::new();

    for line in text.split('\n') {
        match UNORDERED_ITEM.captures(line) {
            Some(caps) => run.push(format!("<li>{}</li>", &caps[1])),
            None => {
                flush_run(&mut run, &mut lines);
                lines.push(line.to_string());
            }
        }
    }
    flush_run(&mut run, &mut lines);
    lines.join("\n")
}

fn flush_run(run: &mut Vec<String>, lines: &mut Vec<String>) {
    if run.is_empty() {
        return;
    }
    lines.push(format!("<ul>{}</ul>", run.join("\n")));
    run.clear();
}
