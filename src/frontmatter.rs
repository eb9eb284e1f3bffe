//! Frontmatter extraction.
//!
//! A document may start with a metadata block:
//!
//! ```text
//! ---
//! title: "Hello"
//! tags: [rust, web]
//! date: 2024-06-01
//! ---
//! Body text...
//! ```
//!
//! The block is a flat list of `key: value` lines, not YAML. Values are
//! coerced per line:
//!
//! | Raw value | Result |
//! |---|---|
//! | `[a, b]` | list `["a", "b"]` |
//! | `"quoted"` | scalar `quoted` |
//! | anything else | trimmed scalar |
//!
//! Parsing never fails. A document without a block has empty metadata and
//! its whole text as body.

use std::collections::BTreeMap;

const DELIMITER: &str = "---";

/// A single frontmatter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(String),
    List(Vec<String>),
}

impl Value {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::List(_) => None,
        }
    }

    /// The value as a list. A non-empty scalar becomes a one-element list.
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.clone(),
            Self::Scalar(s) if s.is_empty() => Vec::new(),
            Self::Scalar(s) => vec![s.clone()],
        }
    }
}

/// Parsed metadata block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontmatter {
    entries: BTreeMap<String, Value>,
}

impl Frontmatter {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Scalar value for `key`, if present and not a list.
    pub fn scalar(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_scalar)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A document split into metadata and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document<'a> {
    pub metadata: Frontmatter,
    pub body: &'a str,
    /// Whether a metadata block was found at all.
    pub has_block: bool,
}

/// Split `input` into its frontmatter block and body.
pub fn parse(input: &str) -> Document<'_> {
    match split_block(input) {
        Some((block, body)) => Document {
            metadata: parse_block(block),
            body,
            has_block: true,
        },
        None => Document {
            metadata: Frontmatter::default(),
            body: input,
            has_block: false,
        },
    }
}

/// Locate the `---` delimited block at the very start of the input.
///
/// Returns the block text (without delimiters) and the remaining body. The
/// closing delimiter must be a line of its own, followed by a newline or the
/// end of input.
fn split_block(input: &str) -> Option<(&str, &str)> {
    let rest = input.strip_prefix(DELIMITER)?.strip_prefix('\n')?;

    let mut search_from = 0;
    while let Some(pos) = rest[search_from..].find("\n---") {
        let start = search_from + pos;
        let after = &rest[start + 4..];
        if after.is_empty() {
            return Some((&rest[..start], ""));
        }
        if let Some(body) = after.strip_prefix('\n') {
            return Some((&rest[..start], body));
        }
        search_from = start + 1;
    }
    None
}

fn parse_block(block: &str) -> Frontmatter {
    let mut entries = BTreeMap::new();
    for line in block.lines() {
        let Some((key, raw)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        entries.insert(key.to_string(), coerce(raw.trim()));
    }
    Frontmatter { entries }
}

fn coerce(value: &str) -> Value {
    if let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        if inner.trim().is_empty() {
            return Value::List(Vec::new());
        }
        return Value::List(inner.split(',').map(|s| s.trim().to_string()).collect());
    }
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        return Value::Scalar(value[1..value.len() - 1].to_string());
    }
    Value::Scalar(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_block_means_empty_metadata_and_full_body() {
        let input = "# Title\n\nJust text: with a colon.";
        let doc = parse(input);
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.body, input);
        assert!(!doc.has_block);
    }

    #[test]
    fn two_key_block() {
        let doc = parse("---\ntitle: \"A\"\ntags: [x, y]\n---\nbody");
        assert_eq!(doc.metadata.len(), 2);
        assert_eq!(
            doc.metadata.get("title"),
            Some(&Value::Scalar("A".to_string()))
        );
        assert_eq!(
            doc.metadata.get("tags"),
            Some(&Value::List(vec!["x".to_string(), "y".to_string()]))
        );
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn value_keeps_everything_after_first_colon() {
        let doc = parse("---\nlink: https://example.com:8080/x\n---\n");
        assert_eq!(doc.metadata.scalar("link"), Some("https://example.com:8080/x"));
    }

    #[test]
    fn lines_without_colon_are_skipped() {
        let doc = parse("---\njust words\ntitle: T\n---\nbody");
        assert_eq!(doc.metadata.len(), 1);
        assert_eq!(doc.metadata.scalar("title"), Some("T"));
    }

    #[test]
    fn last_duplicate_key_wins() {
        let doc = parse("---\ntitle: one\n title : two\n---\n");
        assert_eq!(doc.metadata.scalar("title"), Some("two"));
    }

    #[test]
    fn list_elements_are_trimmed_in_order_without_dedup() {
        let doc = parse("---\ntags: [ b ,a, b]\n---\n");
        assert_eq!(
            doc.metadata.get("tags").unwrap().to_list(),
            vec!["b", "a", "b"]
        );
    }

    #[test]
    fn empty_brackets_are_an_empty_list() {
        let doc = parse("---\ntags: []\n---\n");
        assert_eq!(doc.metadata.get("tags"), Some(&Value::List(vec![])));
    }

    #[test]
    fn lone_quote_is_not_stripped() {
        let doc = parse("---\nodd: \"\n---\n");
        assert_eq!(doc.metadata.scalar("odd"), Some("\""));
    }

    #[test]
    fn unknown_keys_pass_through() {
        let doc = parse("---\nmood: sunny\n---\n");
        assert_eq!(doc.metadata.scalar("mood"), Some("sunny"));
    }

    #[test]
    fn closing_delimiter_at_end_of_input() {
        let doc = parse("---\ntitle: T\n---");
        assert!(doc.has_block);
        assert_eq!(doc.body, "");
    }

    #[test]
    fn unterminated_block_is_body() {
        let input = "---\ntitle: T\nno closing line";
        let doc = parse(input);
        assert!(!doc.has_block);
        assert_eq!(doc.body, input);
    }

    #[test]
    fn dashes_inside_a_line_do_not_close_the_block() {
        let doc = parse("---\ntitle: a --- b\n----\nsummary: s\n---\nbody");
        assert_eq!(doc.metadata.scalar("title"), Some("a --- b"));
        assert_eq!(doc.metadata.scalar("summary"), Some("s"));
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn body_keeps_later_horizontal_rules() {
        let doc = parse("---\ntitle: T\n---\nintro\n---\nmore");
        assert_eq!(doc.body, "intro\n---\nmore");
    }

    #[test]
    fn scalar_to_list() {
        assert_eq!(Value::Scalar("rust".into()).to_list(), vec!["rust"]);
        assert!(Value::Scalar(String::new()).to_list().is_empty());
    }
}
