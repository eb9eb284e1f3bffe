//! Standards-compliant Markdown rendering for build-time documents.
//!
//! README, CHANGELOG, ROADMAP and blog post bodies are rendered with
//! pulldown-cmark using the GitHub-flavoured extensions that hosted READMEs
//! rely on. Raw HTML in the source passes through unchanged.

use pulldown_cmark::{Options, Parser, html};

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
}

/// Render CommonMark (plus GFM tables, strikethrough, task lists, footnotes).
pub fn render(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, options());
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
