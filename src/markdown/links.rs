//! Link rewriting for rendered HTML.
//!
//! Repository documents are written to be read on the hosting site, so their
//! relative links point at files and tags that do not exist on a project
//! page. [`rewrite_repo_links`] fixes them up, rule by rule, on every `<a>`
//! opening tag:
//!
//! | Link target | Rewritten to |
//! |---|---|
//! | `README.md`, `CHANGELOG.md`, `ROADMAP.md` (any directory) | `#readme`, `#changelog`, `#roadmap` |
//! | other relative `*.md` | file browser URL |
//! | `LICENSE` | file browser URL of the license |
//! | `compare/A...HEAD` | commit history |
//! | `compare/A...1.2.3` | release tag `v1.2.3` |
//! | `v1.2.3` | release tag |
//! | any other `http(s)` link | unchanged, opened in a new browsing context |
//!
//! Every rewritten link that leaves the page gets `target="_blank"` and
//! `rel="noopener noreferrer"`. A tag that already declares a `target` is
//! never touched again, so rewriting is idempotent.
//!
//! Blog posts use [`open_external_links`] and [`expand_mentions`] instead.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static ANCHOR_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<a\s[^>]*>").expect("valid regex"));
static HREF_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bhref\s*=\s*"([^"]*)""#).expect("valid regex"));
static TARGET_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\btarget\s*=").expect("valid regex"));
static REL_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\brel\s*=").expect("valid regex"));
static CONTEXT_ATTRS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\s+(?:target|rel)\s*=\s*"[^"]*""#).expect("valid regex"));
static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*:").expect("valid regex"));

static DOC_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[^?#]*/)?(readme|changelog|roadmap)\.md(?:#.*)?$").expect("valid regex")
});
static MD_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([^?#]+\.md)(#.*)?$").expect("valid regex"));
static LICENSE_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\./|/)?(LICEN[SC]E(?:\.txt)?)(?:#.*)?$").expect("valid regex")
});
static COMPARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|/)compare/.+?\.\.\.(.+)$").expect("valid regex"));
static VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v?\d+\.\d+\.\d+[^/?#]*$").expect("valid regex"));
static VERSION_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\./)?(v\d+\.\d+\.\d+[^/?#]*)$").expect("valid regex"));

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static TAG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<(/?)([a-zA-Z][a-zA-Z0-9]*)").expect("valid regex"));
static MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^\w.@/:])@([A-Za-z0-9][A-Za-z0-9_-]*)").expect("valid regex")
});

/// Repository coordinates used to build absolute links.
#[derive(Debug, Clone, Copy)]
pub struct RepoLinks<'a> {
    /// Web UI root, e.g. `https://github.com`.
    pub web_base: &'a str,
    /// `owner/name`.
    pub repo: &'a str,
    pub branch: &'a str,
}

impl RepoLinks<'_> {
    pub fn repo_url(&self) -> String {
        format!("{}/{}", self.web_base.trim_end_matches('/'), self.repo)
    }

    /// File browser URL for a repository path.
    pub fn blob_url(&self, path: &str) -> String {
        let path = path.trim_start_matches("./").trim_start_matches('/');
        format!("{}/blob/{}/{}", self.repo_url(), self.branch, path)
    }

    pub fn commits_url(&self) -> String {
        format!("{}/commits/{}", self.repo_url(), self.branch)
    }

    /// Release page for a version; `v` is prefixed when missing.
    pub fn tag_url(&self, version: &str) -> String {
        if version.starts_with('v') {
            format!("{}/releases/tag/{}", self.repo_url(), version)
        } else {
            format!("{}/releases/tag/v{}", self.repo_url(), version)
        }
    }

    /// Open enhancement issues, the fallback when a project has no roadmap.
    pub fn enhancement_issues_url(&self) -> String {
        format!(
            "{}/issues?q=is%3Aissue+is%3Aopen+label%3Aenhancement",
            self.repo_url()
        )
    }
}

enum Rewrite {
    /// Same-page anchor; new-context attributes are dropped.
    Anchor(String),
    /// Absolute URL opened in a new browsing context.
    External(String),
    Keep,
}

/// Apply the repository link rules to every `<a>` tag in `html`.
pub fn rewrite_repo_links(html: &str, links: &RepoLinks<'_>) -> String {
    ANCHOR_TAG
        .replace_all(html, |caps: &Captures| rewrite_tag(&caps[0], links))
        .into_owned()
}

/// Give every absolute `http(s)` link a new browsing context.
pub fn open_external_links(html: &str) -> String {
    ANCHOR_TAG
        .replace_all(html, |caps: &Captures| ensure_new_context(&caps[0]))
        .into_owned()
}

fn rewrite_tag(tag: &str, links: &RepoLinks<'_>) -> String {
    let Some(href) = HREF_ATTR.captures(tag).map(|c| c[1].to_string()) else {
        return tag.to_string();
    };
    match classify(&href, links) {
        Rewrite::Anchor(target) => {
            let tag = replace_href(tag, &target);
            CONTEXT_ATTRS.replace_all(&tag, "").into_owned()
        }
        Rewrite::External(target) => ensure_new_context(&replace_href(tag, &target)),
        Rewrite::Keep => ensure_new_context(tag),
    }
}

fn classify(href: &str, links: &RepoLinks<'_>) -> Rewrite {
    let relative = is_relative(href);

    if relative && let Some(caps) = DOC_FILE.captures(href) {
        return Rewrite::Anchor(format!("#{}", caps[1].to_ascii_lowercase()));
    }
    if relative && let Some(caps) = MD_FILE.captures(href) {
        let fragment = caps.get(2).map_or("", |m| m.as_str());
        return Rewrite::External(format!("{}{fragment}", links.blob_url(&caps[1])));
    }
    if relative && let Some(caps) = LICENSE_FILE.captures(href) {
        return Rewrite::External(links.blob_url(&caps[1]));
    }

    let own_compare = href.starts_with(&format!("{}/compare/", links.repo_url()));
    if (relative || own_compare)
        && let Some(caps) = COMPARE.captures(href)
    {
        let head = &caps[1];
        if head == "HEAD" {
            return Rewrite::External(links.commits_url());
        }
        if VERSION.is_match(head) {
            return Rewrite::External(links.tag_url(head));
        }
    }

    if relative && let Some(caps) = VERSION_TAG.captures(href) {
        return Rewrite::External(links.tag_url(&caps[1]));
    }
    Rewrite::Keep
}

/// Relative to the document: no scheme, not protocol-relative, not a fragment.
fn is_relative(href: &str) -> bool {
    !href.is_empty() && !href.starts_with('#') && !href.starts_with("//") && !SCHEME.is_match(href)
}

fn is_web_url(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn replace_href(tag: &str, target: &str) -> String {
    match HREF_ATTR.find(tag) {
        Some(m) => format!("{}href=\"{}\"{}", &tag[..m.start()], target, &tag[m.end()..]),
        None => tag.to_string(),
    }
}

/// Add `target="_blank"` (and `rel` when absent) to a web link without a target.
fn ensure_new_context(tag: &str) -> String {
    if TARGET_ATTR.is_match(tag) {
        return tag.to_string();
    }
    let Some(href) = HREF_ATTR.captures(tag) else {
        return tag.to_string();
    };
    if !is_web_url(&href[1]) {
        return tag.to_string();
    }
    let end = href.get(0).map_or(tag.len(), |m| m.end());
    let rel = if REL_ATTR.is_match(tag) {
        ""
    } else {
        r#" rel="noopener noreferrer""#
    };
    format!(r#"{} target="_blank"{rel}{}"#, &tag[..end], &tag[end..])
}

/// Expand `@username` mentions in text into an avatar link and a profile link.
///
/// Only text outside of tags is considered, and text inside `<a>`, `<code>`
/// and `<pre>` elements is left alone. Email addresses are not mentions.
pub fn expand_mentions(html: &str, web_base: &str) -> String {
    let web_base = web_base.trim_end_matches('/');
    let mut out = String::with_capacity(html.len());
    let mut skip_depth: usize = 0;
    let mut last = 0;

    for tag in HTML_TAG.find_iter(html) {
        push_text(&mut out, &html[last..tag.start()], skip_depth, web_base);
        out.push_str(tag.as_str());
        last = tag.end();

        if let Some(caps) = TAG_NAME.captures(tag.as_str()) {
            let name = caps[2].to_ascii_lowercase();
            if matches!(name.as_str(), "a" | "code" | "pre") {
                if caps[1].is_empty() {
                    if !tag.as_str().ends_with("/>") {
                        skip_depth += 1;
                    }
                } else {
                    skip_depth = skip_depth.saturating_sub(1);
                }
            }
        }
    }
    push_text(&mut out, &html[last..], skip_depth, web_base);
    out
}

fn push_text(out: &mut String, text: &str, skip_depth: usize, web_base: &str) {
    if skip_depth > 0 {
        out.push_str(text);
        return;
    }
    let expanded = MENTION.replace_all(text, |caps: &Captures| {
        format!("{}{}", &caps[1], mention_html(web_base, &caps[2]))
    });
    out.push_str(&expanded);
}

fn mention_html(web_base: &str, user: &str) -> String {
    format!(
        concat!(
            r#"<a href="{base}/{user}" target="_blank" rel="noopener noreferrer" class="user-avatar-link">"#,
            r#"<img src="{base}/{user}.png" width="16" height="16" alt="@{user}" class="user-avatar" loading="lazy">"#,
            r#"</a><a href="{base}/{user}" target="_blank" rel="noopener noreferrer" class="user-mention">@{user}</a>"#
        ),
        base = web_base,
        user = user
    )
}
