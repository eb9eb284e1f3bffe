//! CLI output formatting for all pipeline stages.
//!
//! Output is information-first: every line leads with what was built (a
//! project, a post, a feed) and its position, and the file it landed in
//! follows after an arrow. Details go on indented context lines.
//!
//! # Output Format
//!
//! ## Snapshots
//!
//! ```text
//! Snapshots
//! 001 Tool → data/cache/projects/tool.json
//!     Stars: 42
//!     Release: v1.2.0
//!     Sections: readme, changelog
//! 002 Other: kept previous snapshot
//!     Error: Fetch failed: API returned status 500 for https://api.github.com/repos/o/other
//! ```
//!
//! ## Pages
//!
//! ```text
//! Projects
//! 001 Tool → projects/tool.html
//! Home → index.html
//! ```
//!
//! ## Blog
//!
//! ```text
//! Blog (2 posts) → blog/blog-index.json
//! 001 Hello → blog/posts/hello.html
//!     Date: 2024-05-01
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::pipeline::{BlogReport, BuildReport, CheckReport, PagesReport};
use crate::snapshot::SnapshotOutcome;
use std::path::{Path, PathBuf};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `001 Title → path`
fn entity_line(index: usize, title: &str, path: &Path, root: &Path) -> String {
    format!(
        "{} {} \u{2192} {}",
        format_index(index),
        title,
        relative(path, root)
    )
}

/// Path relative to the site root, for display.
fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { one } else { many })
}

// ============================================================================
// Stage output
// ============================================================================

pub fn format_snapshot_outcomes(outcomes: &[SnapshotOutcome], root: &Path) -> Vec<String> {
    let mut lines = vec!["Snapshots".to_string()];
    if outcomes.is_empty() {
        lines.push(format!("{}(no projects)", indent(1)));
    }
    for (i, outcome) in outcomes.iter().enumerate() {
        match &outcome.result {
            Ok(summary) => {
                lines.push(entity_line(i + 1, &outcome.name, &summary.path, root));
                if let Some(stars) = summary.stars {
                    lines.push(format!("{}Stars: {}", indent(1), stars));
                }
                if let Some(release) = &summary.release {
                    lines.push(format!("{}Release: {}", indent(1), release));
                }
                let sections: Vec<&str> = [
                    (summary.has_readme, "readme"),
                    (summary.has_changelog, "changelog"),
                    (summary.has_roadmap, "roadmap"),
                ]
                .into_iter()
                .filter_map(|(present, name)| present.then_some(name))
                .collect();
                if !sections.is_empty() {
                    lines.push(format!("{}Sections: {}", indent(1), sections.join(", ")));
                }
            }
            Err(e) => {
                lines.push(format!(
                    "{} {}: kept previous snapshot",
                    format_index(i + 1),
                    outcome.name
                ));
                lines.push(format!("{}Error: {}", indent(1), e));
            }
        }
    }
    lines
}

pub fn print_snapshot_outcomes(outcomes: &[SnapshotOutcome], root: &Path) {
    for line in format_snapshot_outcomes(outcomes, root) {
        println!("{}", line);
    }
}

pub fn format_pages(report: &PagesReport, root: &Path) -> Vec<String> {
    let mut lines = vec!["Projects".to_string()];
    for (i, page) in report.project_pages.iter().enumerate() {
        lines.push(entity_line(i + 1, &page.title, &page.path, root));
    }
    if let Some(index) = &report.index_page {
        lines.push(format!("Home \u{2192} {}", relative(index, root)));
    }
    lines
}

pub fn print_pages(report: &PagesReport, root: &Path) {
    for line in format_pages(report, root) {
        println!("{}", line);
    }
}

pub fn format_blog(report: &BlogReport, root: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "Blog ({}) \u{2192} {}",
        plural(report.posts.len(), "post", "posts"),
        relative(&report.index_path, root)
    )];
    for (i, (post, page)) in report.posts.iter().zip(&report.post_pages).enumerate() {
        lines.push(entity_line(i + 1, &post.title, &page.path, root));
        if !post.date.is_empty() {
            lines.push(format!("{}Date: {}", indent(1), post.date));
        }
        if !post.excerpt.is_empty() {
            lines.push(format!("{}Excerpt: {}", indent(1), truncate_desc(&post.excerpt, 60)));
        }
    }
    lines
}

pub fn print_blog(report: &BlogReport, root: &Path) {
    for line in format_blog(report, root) {
        println!("{}", line);
    }
}

pub fn format_feeds(written: &[PathBuf], root: &Path) -> Vec<String> {
    let mut lines = vec!["Feeds".to_string()];
    for path in written {
        lines.push(format!("{}{}", indent(1), relative(path, root)));
    }
    lines
}

pub fn print_feeds(written: &[PathBuf], root: &Path) {
    for line in format_feeds(written, root) {
        println!("{}", line);
    }
}

/// One-line summary after a full build.
pub fn format_build_summary(report: &BuildReport) -> String {
    let failed = report.failed_snapshots();
    let snapshots = plural(report.snapshots.len() - failed, "snapshot", "snapshots");
    let failed = if failed > 0 {
        format!(" ({} failed)", failed)
    } else {
        String::new()
    };
    format!(
        "Built {}{}, {}, {}, {}",
        snapshots,
        failed,
        plural(report.pages.project_pages.len(), "project page", "project pages"),
        plural(report.blog.posts.len(), "post", "posts"),
        plural(report.feeds.len(), "feed", "feeds"),
    )
}

pub fn print_build_output(report: &BuildReport, root: &Path) {
    let sections = [
        format_snapshot_outcomes(&report.snapshots, root),
        format_blog(&report.blog, root),
        format_pages(&report.pages, root),
        format_feeds(&report.feeds, root),
    ];
    for section in sections {
        for line in section {
            println!("{}", line);
        }
        println!();
    }
    println!("{}", format_build_summary(report));
}

pub fn format_check(report: &CheckReport) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Projects: {} ({} cached)",
            report.projects,
            plural(report.snapshots, "snapshot", "snapshots")
        ),
        format!("Posts: {}", report.posts),
    ];
    if !report.skipped_posts.is_empty() {
        lines.push("Skipped (no frontmatter)".to_string());
        for file in &report.skipped_posts {
            lines.push(format!("{}{}", indent(1), file));
        }
    }
    if report.is_ok() {
        lines.push("OK".to_string());
    } else {
        lines.push(format!("Problems ({})", report.problems.len()));
        for problem in &report.problems {
            lines.push(format!("{}{}", indent(1), problem));
        }
    }
    lines
}

pub fn print_check(report: &CheckReport) {
    for line in format_check(report) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosting::FetchError;
    use crate::pipeline::PageRecord;
    use crate::snapshot::{SnapshotError, SnapshotSummary};
    use crate::types::BlogPost;

    fn root() -> PathBuf {
        PathBuf::from("/site")
    }

    fn summary(id: &str) -> SnapshotSummary {
        SnapshotSummary {
            path: root().join(format!("data/cache/projects/{id}.json")),
            stars: Some(42),
            release: Some("v1.2.0".to_string()),
            has_readme: true,
            has_changelog: true,
            has_roadmap: false,
        }
    }

    fn post(slug: &str, excerpt: &str) -> BlogPost {
        BlogPost {
            slug: slug.to_string(),
            title: slug.to_uppercase(),
            date: "2024-05-01".to_string(),
            author: String::new(),
            tags: vec![],
            excerpt: excerpt.to_string(),
            content: String::new(),
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_desc("short", 10), "short");
        assert_eq!(truncate_desc("Grüße aus Köln", 5), "Grüße...");
    }

    #[test]
    fn relative_falls_back_to_full_path() {
        assert_eq!(relative(Path::new("/site/feed.xml"), &root()), "feed.xml");
        assert_eq!(relative(Path::new("/elsewhere/x"), &root()), "/elsewhere/x");
    }

    // =========================================================================
    // Stages
    // =========================================================================

    #[test]
    fn snapshot_outcomes_show_success_and_failure() {
        let outcomes = vec![
            SnapshotOutcome {
                id: "tool".to_string(),
                name: "Tool".to_string(),
                result: Ok(summary("tool")),
            },
            SnapshotOutcome {
                id: "other".to_string(),
                name: "Other".to_string(),
                result: Err(SnapshotError::Fetch(FetchError::Status {
                    status: 500,
                    url: "https://api.test/repos/o/other".to_string(),
                })),
            },
        ];
        let lines = format_snapshot_outcomes(&outcomes, &root());
        assert_eq!(lines[0], "Snapshots");
        assert_eq!(lines[1], "001 Tool \u{2192} data/cache/projects/tool.json");
        assert_eq!(lines[2], "    Stars: 42");
        assert_eq!(lines[3], "    Release: v1.2.0");
        assert_eq!(lines[4], "    Sections: readme, changelog");
        assert_eq!(lines[5], "002 Other: kept previous snapshot");
        assert!(lines[6].starts_with("    Error: "));
        assert!(lines[6].contains("500"));
    }

    #[test]
    fn pages_list_projects_then_home() {
        let report = PagesReport {
            project_pages: vec![PageRecord {
                title: "Tool".to_string(),
                path: root().join("projects/tool.html"),
            }],
            index_page: Some(root().join("index.html")),
        };
        assert_eq!(
            format_pages(&report, &root()),
            vec![
                "Projects",
                "001 Tool \u{2192} projects/tool.html",
                "Home \u{2192} index.html",
            ]
        );
    }

    #[test]
    fn blog_lists_posts_with_context() {
        let long = "x".repeat(80);
        let report = BlogReport {
            posts: vec![post("hello", ""), post("later", &long)],
            index_path: root().join("blog/blog-index.json"),
            post_pages: vec![
                PageRecord {
                    title: "HELLO".to_string(),
                    path: root().join("blog/posts/hello.html"),
                },
                PageRecord {
                    title: "LATER".to_string(),
                    path: root().join("blog/posts/later.html"),
                },
            ],
        };
        let lines = format_blog(&report, &root());
        assert_eq!(lines[0], "Blog (2 posts) \u{2192} blog/blog-index.json");
        assert_eq!(lines[1], "001 HELLO \u{2192} blog/posts/hello.html");
        assert_eq!(lines[2], "    Date: 2024-05-01");
        assert_eq!(lines[3], "002 LATER \u{2192} blog/posts/later.html");
        assert!(lines[5].ends_with("..."));
    }

    #[test]
    fn build_summary_counts_failures() {
        let report = BuildReport {
            snapshots: vec![SnapshotOutcome {
                id: "a".to_string(),
                name: "A".to_string(),
                result: Ok(summary("a")),
            }],
            feeds: vec![root().join("sitemap.xml")],
            ..BuildReport::default()
        };
        assert_eq!(
            format_build_summary(&report),
            "Built 1 snapshot, 0 project pages, 0 posts, 1 feed"
        );
    }

    #[test]
    fn check_lists_problems() {
        let report = CheckReport {
            projects: 2,
            snapshots: 1,
            posts: 1,
            skipped_posts: vec!["blog/posts/draft.md".to_string()],
            problems: vec!["Missing template: project-template.html".to_string()],
        };
        assert_eq!(
            format_check(&report),
            vec![
                "Projects: 2 (1 snapshot cached)",
                "Posts: 1",
                "Skipped (no frontmatter)",
                "    blog/posts/draft.md",
                "Problems (1)",
                "    Missing template: project-template.html",
            ]
        );
    }

    #[test]
    fn check_ok() {
        let lines = format_check(&CheckReport::default());
        assert_eq!(lines.last().map(String::as_str), Some("OK"));
    }
}
