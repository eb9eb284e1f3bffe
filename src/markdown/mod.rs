//! Markdown rendering and HTML post-processing.
//!
//! Two renderers live here:
//!
//! - [`commonmark`] renders build-time documents (README, CHANGELOG, ROADMAP,
//!   blog posts) with pulldown-cmark.
//! - [`dialect`] is the small restricted dialect used for release notes and
//!   for live fallbacks when no snapshot exists.
//!
//! [`links`] and [`images`] operate on the rendered HTML (or, for README
//! images, on the Markdown source just before rendering).

pub mod commonmark;
pub mod dialect;
pub mod images;
pub mod links;

/// Escape text for inclusion in HTML element content or a quoted attribute.
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
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(escape_html("hello world"), "hello world");
    }
}
