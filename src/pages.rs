//! Page generation from HTML templates.
//!
//! Templates are plain HTML files with `{{NAME}}` placeholders. Substitution
//! is a single left-to-right pass: every known placeholder is replaced,
//! unknown ones are left as they are, and inserted values are never scanned
//! again. A README that happens to contain `{{PROJECT_NAME}}` stays literal.
//!
//! ## Project pages (`projects/{id}.html`)
//!
//! | Placeholder | Value |
//! |---|---|
//! | `PROJECT_NAME`, `PROJECT_DESCRIPTION`, `REPO_NAME`, `PROJECT_ID` | project list entry |
//! | `PROJECT_STATS`, `LATEST_RELEASE`, `README`, `SCREENSHOTS`, `RELEASES`, `CHANGELOG`, `ROADMAP` | [`widgets`](crate::widgets) |
//!
//! ## Post pages (`blog/posts/{slug}.html`)
//!
//! | Placeholder | Value |
//! |---|---|
//! | `POST_TITLE`, `POST_DATE`, `POST_SLUG` | frontmatter / file name |
//! | `POST_EXCERPT` | excerpt, or the title when empty |
//! | `POST_DATE_FORMATTED` | long date in the site language |
//! | `POST_AUTHOR`, `POST_TAGS` | small HTML fragments |
//! | `POST_CONTENT` | CommonMark body with mentions expanded and external links opened in a new tab |
//!
//! ## Index page (`index.html`)
//!
//! Only generated when the index template exists: `PROJECT_GRID`,
//! `BLOG_POSTS`.

use crate::config::{HostingConfig, Language, PathsConfig};
use crate::dates;
use crate::markdown::commonmark;
use crate::markdown::links::{RepoLinks, expand_mentions, open_external_links};
use crate::types::{BlogPost, Project};
use crate::widgets::{self, Labels, ProjectView};
use maud::Markup;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),
}

/// Placeholder name to replacement value.
pub type Values = HashMap<&'static str, String>;

/// Replace `{{NAME}}` placeholders in one pass.
pub fn fill_template(template: &str, values: &Values) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let known = after
            .find("}}")
            .and_then(|end| values.get(&after[..end]).map(|value| (end, value)));
        match known {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Read a template, reporting a missing file by path.
pub fn load_template(path: &Path) -> Result<String, PageError> {
    if !path.is_file() {
        return Err(PageError::TemplateNotFound(path.to_path_buf()));
    }
    Ok(fs::read_to_string(path)?)
}

fn markup(m: Markup) -> String {
    m.into_string()
}

/// Placeholder values for a project page.
pub fn project_values(
    project: &Project,
    view: &ProjectView,
    hosting: &HostingConfig,
    language: Language,
) -> Values {
    let labels = Labels::for_language(language);
    let links = RepoLinks {
        web_base: &hosting.web_base,
        repo: &project.repo,
        branch: &hosting.default_branch,
    };

    Values::from([
        ("PROJECT_NAME", project.name.clone()),
        ("PROJECT_DESCRIPTION", project.description.clone()),
        ("REPO_NAME", project.repo.clone()),
        ("PROJECT_ID", project.id.clone()),
        (
            "PROJECT_STATS",
            markup(widgets::project_stats(view.repo_info.ready(), labels)),
        ),
        (
            "LATEST_RELEASE",
            markup(widgets::latest_release(view.latest_release.ready(), language)),
        ),
        ("README", markup(widgets::readme(&view.readme_html, labels))),
        (
            "SCREENSHOTS",
            markup(widgets::screenshots(
                view.readme_html.ready().map(String::as_str),
                &project.name,
                labels,
            )),
        ),
        (
            "RELEASES",
            markup(widgets::release_list(&view.releases, hosting.releases_shown, language)),
        ),
        ("CHANGELOG", markup(widgets::changelog(&view.changelog_html, labels))),
        ("ROADMAP", markup(widgets::roadmap(&view.roadmap_html, &links, labels))),
    ])
}

/// Post body: CommonMark, then mentions, then new-context external links.
pub fn render_post_content(markdown: &str, web_base: &str) -> String {
    let html = commonmark::render(markdown);
    let html = expand_mentions(&html, web_base);
    open_external_links(&html)
}

/// Placeholder values for a post page.
pub fn post_values(post: &BlogPost, web_base: &str, language: Language) -> Values {
    let labels = Labels::for_language(language);
    let excerpt = if post.excerpt.is_empty() {
        post.title.clone()
    } else {
        post.excerpt.clone()
    };

    Values::from([
        ("POST_TITLE", post.title.clone()),
        ("POST_EXCERPT", excerpt),
        ("POST_DATE", post.date.clone()),
        (
            "POST_DATE_FORMATTED",
            dates::display_post_date(&post.date, language),
        ),
        ("POST_AUTHOR", markup(widgets::post_author(&post.author, labels))),
        ("POST_TAGS", markup(widgets::post_tags(&post.tags))),
        ("POST_CONTENT", render_post_content(&post.content, web_base)),
        ("POST_SLUG", post.slug.clone()),
    ])
}

/// Placeholder values for the index page.
pub fn index_values(
    project_cards: &[Markup],
    posts: &[BlogPost],
    paths: &PathsConfig,
    language: Language,
) -> Values {
    let labels = Labels::for_language(language);
    Values::from([
        ("PROJECT_GRID", markup(widgets::project_grid(project_cards, labels))),
        ("BLOG_POSTS", markup(widgets::blog_teasers(posts, paths, language))),
    ])
}

/// Fill `template` and write it to `path`, creating parent directories.
pub fn write_page(path: &Path, template: &str, values: &Values) -> Result<(), PageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, fill_template(template, values))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::Section;
    use tempfile::TempDir;

    fn values(pairs: &[(&'static str, &str)]) -> Values {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    // =========================================================================
    // fill_template
    // =========================================================================

    #[test]
    fn replaces_every_occurrence() {
        let out = fill_template(
            "<title>{{PROJECT_NAME}}</title><h1>{{PROJECT_NAME}}</h1>",
            &values(&[("PROJECT_NAME", "Tool")]),
        );
        assert_eq!(out, "<title>Tool</title><h1>Tool</h1>");
    }

    #[test]
    fn unknown_placeholders_are_left_intact() {
        let out = fill_template("{{UNKNOWN}} {{A}}", &values(&[("A", "a")]));
        assert_eq!(out, "{{UNKNOWN}} a");
    }

    #[test]
    fn values_are_not_rescanned() {
        let out = fill_template(
            "{{README}}|{{NAME}}",
            &values(&[("README", "literal {{NAME}}"), ("NAME", "n")]),
        );
        assert_eq!(out, "literal {{NAME}}|n");
    }

    #[test]
    fn unterminated_braces_pass_through() {
        let out = fill_template("a {{ b {{A}}", &values(&[("A", "x")]));
        assert_eq!(out, "a {{ b x");
    }

    #[test]
    fn template_without_placeholders_is_unchanged() {
        let template = "<p>static</p>";
        assert_eq!(fill_template(template, &Values::new()), template);
    }

    // =========================================================================
    // Page values
    // =========================================================================

    fn post() -> BlogPost {
        BlogPost {
            slug: "hello".to_string(),
            title: "Hello".to_string(),
            date: "2024-06-01".to_string(),
            author: "Ann".to_string(),
            tags: vec!["rust".to_string()],
            excerpt: String::new(),
            content: "Hi @octocat, see [site](https://example.com).".to_string(),
        }
    }

    #[test]
    fn post_values_fill_fallbacks_and_formatting() {
        let v = post_values(&post(), "https://github.com", Language::De);
        assert_eq!(v["POST_EXCERPT"], "Hello");
        assert_eq!(v["POST_DATE_FORMATTED"], "1. Juni 2024");
        assert_eq!(v["POST_AUTHOR"], "<span>von Ann</span>");
        assert!(v["POST_TAGS"].contains(r#"<span class="tag">rust</span>"#));
        assert_eq!(v["POST_SLUG"], "hello");
    }

    #[test]
    fn post_content_expands_mentions_and_external_links() {
        let html = render_post_content(&post().content, "https://github.com");
        assert!(html.contains(r#"class="user-mention">@octocat</a>"#));
        assert!(html.contains(
            r#"<a href="https://example.com" target="_blank" rel="noopener noreferrer">site</a>"#
        ));
    }

    #[test]
    fn project_values_cover_all_placeholders() {
        let project = Project {
            id: "tool".to_string(),
            name: "Tool".to_string(),
            repo: "o/r".to_string(),
            description: "A tool".to_string(),
            icon: None,
        };
        let view = ProjectView {
            repo_info: Section::Missing,
            latest_release: Section::Missing,
            readme_html: Section::Ready("<p>readme</p>".to_string()),
            changelog_html: Section::Missing,
            roadmap_html: Section::Missing,
            releases: Section::Missing,
        };
        let v = project_values(&project, &view, &HostingConfig::default(), Language::En);
        for key in [
            "PROJECT_NAME",
            "PROJECT_DESCRIPTION",
            "REPO_NAME",
            "PROJECT_ID",
            "PROJECT_STATS",
            "LATEST_RELEASE",
            "README",
            "SCREENSHOTS",
            "RELEASES",
            "CHANGELOG",
            "ROADMAP",
        ] {
            assert!(v.contains_key(key), "missing {key}");
        }
        assert_eq!(v["README"], "<p>readme</p>");
        assert_eq!(v["LATEST_RELEASE"], "");
    }

    #[test]
    fn write_page_creates_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("projects/tool.html");
        write_page(&path, "<h1>{{PROJECT_NAME}}</h1>", &values(&[("PROJECT_NAME", "Tool")])).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "<h1>Tool</h1>");
    }

    #[test]
    fn missing_template_is_reported_by_path() {
        let tmp = TempDir::new().unwrap();
        let err = load_template(&tmp.path().join("nope.html")).unwrap_err();
        assert!(matches!(err, PageError::TemplateNotFound(_)));
        assert!(err.to_string().contains("nope.html"));
    }
}
