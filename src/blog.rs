//! Blog index step.
//!
//! Scans the posts directory for `*.md` files, reads each post's frontmatter,
//! and writes `blog-index.json`, newest first. Files without a frontmatter
//! block are not posts and are skipped with a warning.
//!
//! | Frontmatter key | Field | Default |
//! |---|---|---|
//! | `title` | `title` | `Untitled` |
//! | `date` | `date` | empty |
//! | `author` | `author` | empty |
//! | `tags` | `tags` (a single value becomes a list) | `[]` |
//! | `excerpt` | `excerpt` | empty |
//!
//! The slug is the file stem. Post bodies are kept in memory for page
//! generation but never written to the index.

use crate::dates;
use crate::frontmatter;
use crate::types::{BlogIndex, BlogPost};
use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum BlogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

const UNTITLED: &str = "Untitled";

/// Build a post from its source text, or `None` without a frontmatter block.
pub fn parse_post(slug: &str, source: &str) -> Option<BlogPost> {
    let doc = frontmatter::parse(source);
    if !doc.has_block {
        return None;
    }
    let meta = &doc.metadata;
    let text = |key: &str| meta.scalar(key).unwrap_or_default().to_string();

    let title = match meta.scalar("title") {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => UNTITLED.to_string(),
    };

    Some(BlogPost {
        slug: slug.to_string(),
        title,
        date: text("date"),
        author: text("author"),
        tags: meta.get("tags").map(|v| v.to_list()).unwrap_or_default(),
        excerpt: text("excerpt"),
        content: doc.body.to_string(),
    })
}

/// Newest first. Posts whose date does not parse go last; ties keep their
/// existing order.
pub fn sort_posts(posts: &mut [BlogPost]) {
    posts.sort_by(|a, b| {
        match (dates::parse_post_date(&a.date), dates::parse_post_date(&b.date)) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

/// Load and sort every post in `dir`. A missing directory means no posts.
pub fn load_posts(dir: &Path) -> Result<Vec<BlogPost>, BlogError> {
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "no posts directory");
        return Ok(Vec::new());
    }

    let mut files: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();

    let mut posts = Vec::with_capacity(files.len());
    for path in files {
        let Some(slug) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let source = fs::read_to_string(&path)?;
        match parse_post(slug, &source) {
            Some(post) => {
                debug!(slug, title = %post.title, "post loaded");
                posts.push(post);
            }
            None => warn!(file = %path.display(), "no frontmatter, skipping"),
        }
    }

    sort_posts(&mut posts);
    Ok(posts)
}

/// Write the blog index (without bodies) to `path`.
pub fn write_index(path: &Path, posts: &[BlogPost]) -> Result<(), BlogError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let index = BlogIndex {
        posts: posts.to_vec(),
    };
    fs::write(path, serde_json::to_string_pretty(&index)?)?;
    Ok(())
}
