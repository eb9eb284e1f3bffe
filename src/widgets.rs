//! HTML fragments for project pages, the index page and the blog teaser.
//!
//! Each widget renders from a [`ProjectView`], which resolves every section
//! cache first: the persisted snapshot wins, and only when it lacks a section
//! is the live API asked (if a client is available). Sections fail
//! independently. A failed README shows an error line, a failed roadmap
//! shows the roadmap fallback, and so on; nothing else on the page is
//! affected.
//!
//! | Widget | Placeholder | Hidden / fallback |
//! |---|---|---|
//! | [`project_stats`] | `PROJECT_STATS` | empty without repository data |
//! | [`latest_release`] | `LATEST_RELEASE` | empty without a release |
//! | [`readme`] | `README` | "README not available." |
//! | [`screenshots`] | `SCREENSHOTS` | empty without screenshots |
//! | [`release_list`] | `RELEASES` | "No releases available." |
//! | [`changelog`] | `CHANGELOG` | pointer to the releases section |
//! | [`roadmap`] | `ROADMAP` | link to open enhancement issues |
//! | [`project_grid`] | `PROJECT_GRID` | "No projects configured." |
//! | [`blog_teasers`] | `BLOG_POSTS` | "No blog posts yet" |

use crate::config::{HostingConfig, Language, PathsConfig};
use crate::dates;
use crate::hosting::HostingClient;
use crate::markdown::images;
use crate::markdown::links::{RepoLinks, rewrite_repo_links};
use crate::markdown::dialect;
use crate::types::{BlogPost, Project, ProjectSnapshot, Release, RepoInfo};
use maud::{Markup, PreEscaped, html};
use tracing::warn;

/// Number of posts shown in the blog teaser.
pub const TEASER_POSTS: usize = 5;

/// User-visible strings, per site language.
#[derive(Debug)]
pub struct Labels {
    pub open_issues: &'static str,
    pub published_on: &'static str,
    pub no_release_notes: &'static str,
    pub readme_unavailable: &'static str,
    pub readme_failed: &'static str,
    pub screenshot: &'static str,
    pub no_releases: &'static str,
    pub view_release: &'static str,
    pub no_changelog: &'static str,
    pub see: &'static str,
    pub releases: &'static str,
    pub for_history: &'static str,
    pub no_roadmap: &'static str,
    pub planned_features: &'static str,
    pub enhancement_issues: &'static str,
    pub no_description: &'static str,
    pub latest_version: &'static str,
    pub issues: &'static str,
    pub more_details: &'static str,
    pub data_unavailable: &'static str,
    pub view_repository: &'static str,
    pub no_projects: &'static str,
    pub by: &'static str,
    pub read_more: &'static str,
    pub all_posts: &'static str,
    pub no_posts: &'static str,
    pub no_posts_hint: &'static str,
}

static LABELS_EN: Labels = Labels {
    open_issues: "open",
    published_on: "Published on",
    no_release_notes: "No release notes available.",
    readme_unavailable: "README not available.",
    readme_failed: "README could not be loaded.",
    screenshot: "Screenshot",
    no_releases: "No releases available.",
    view_release: "View release →",
    no_changelog: "No CHANGELOG.md found.",
    see: "See",
    releases: "Releases",
    for_history: "for the version history.",
    no_roadmap: "No separate roadmap available.",
    planned_features: "Planned features are tracked in the",
    enhancement_issues: "enhancement issues",
    no_description: "No description available",
    latest_version: "Latest version:",
    issues: "issues",
    more_details: "More details →",
    data_unavailable: "Repository data could not be loaded.",
    view_repository: "View repository →",
    no_projects: "No projects configured.",
    by: "by",
    read_more: "Read more →",
    all_posts: "All blog posts →",
    no_posts: "No blog posts yet",
    no_posts_hint: "Posts are Markdown files in blog/posts/ and appear here after the next build.",
};

static LABELS_DE: Labels = Labels {
    open_issues: "offen",
    published_on: "Veröffentlicht am",
    no_release_notes: "Keine Release-Notes verfügbar.",
    readme_unavailable: "README nicht verfügbar.",
    readme_failed: "README konnte nicht geladen werden.",
    screenshot: "Screenshot",
    no_releases: "Keine Releases verfügbar.",
    view_release: "Release ansehen →",
    no_changelog: "Kein CHANGELOG.md gefunden.",
    see: "Siehe",
    releases: "Releases",
    for_history: "für die Versionshistorie.",
    no_roadmap: "Keine separate Roadmap verfügbar.",
    planned_features: "Geplante Features findest du in den",
    enhancement_issues: "Enhancement-Issues",
    no_description: "Keine Beschreibung verfügbar",
    latest_version: "Neueste Version:",
    issues: "Issues",
    more_details: "Mehr Details →",
    data_unavailable: "Repository-Daten konnten nicht geladen werden.",
    view_repository: "Repository ansehen →",
    no_projects: "Keine Projekte konfiguriert.",
    by: "von",
    read_more: "Weiterlesen →",
    all_posts: "Alle Blog-Posts anzeigen →",
    no_posts: "Noch keine Blog-Posts",
    no_posts_hint: "Blog-Posts sind Markdown-Dateien in blog/posts/ und erscheinen nach dem nächsten Build hier.",
};

impl Labels {
    pub fn for_language(language: Language) -> &'static Labels {
        match language {
            Language::En => &LABELS_EN,
            Language::De => &LABELS_DE,
        }
    }
}

// =============================================================================
// Cache-first project view
// =============================================================================

/// One section of a project view.
#[derive(Debug, Clone, PartialEq)]
pub enum Section<T> {
    Ready(T),
    /// Neither the snapshot nor the API has it.
    Missing,
    /// The live fetch failed; carries the error text.
    Failed(String),
}

impl<T> Section<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(value) => Some(value),
            _ => None,
        }
    }

    fn from_live<E: std::fmt::Display>(what: &str, repo: &str, result: Result<Option<T>, E>) -> Self {
        match result {
            Ok(Some(value)) => Section::Ready(value),
            Ok(None) => Section::Missing,
            Err(e) => {
                warn!(repo, section = what, error = %e, "live fetch failed");
                Section::Failed(e.to_string())
            }
        }
    }
}

/// Everything a project page shows, resolved cache first.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectView {
    pub repo_info: Section<RepoInfo>,
    pub latest_release: Section<Release>,
    pub readme_html: Section<String>,
    pub changelog_html: Section<String>,
    pub roadmap_html: Section<String>,
    pub releases: Section<Vec<Release>>,
}

impl ProjectView {
    /// Resolve each section from `snapshot`, asking `live` for what it lacks.
    ///
    /// Live Markdown is rendered with the restricted dialect and then passed
    /// through the repository link rewriter.
    pub fn resolve(
        project: &Project,
        snapshot: Option<&ProjectSnapshot>,
        live: Option<&HostingClient<'_>>,
        hosting: &HostingConfig,
    ) -> Self {
        let repo = project.repo.as_str();
        let links = RepoLinks {
            web_base: &hosting.web_base,
            repo,
            branch: &hosting.default_branch,
        };
        let render = |markdown: String| rewrite_repo_links(&dialect::render(&markdown), &links);

        let cached = |field: Option<&String>| field.cloned();

        let repo_info = match (snapshot.and_then(|s| s.repo_info.clone()), live) {
            (Some(info), _) => Section::Ready(info),
            (None, Some(client)) => Section::from_live("repository", repo, client.repository(repo)),
            (None, None) => Section::Missing,
        };

        let latest_release = match (snapshot.and_then(|s| s.latest_release.clone()), live) {
            (Some(release), _) => Section::Ready(release),
            (None, Some(client)) => {
                Section::from_live("latest release", repo, client.latest_release(repo))
            }
            (None, None) => Section::Missing,
        };

        let readme_html = match (snapshot.and_then(|s| cached(s.readme_html.as_ref())), live) {
            (Some(html), _) => Section::Ready(html),
            (None, Some(client)) => Section::from_live(
                "readme",
                repo,
                client.readme(repo).map(|md| {
                    md.map(|md| {
                        render(images::absolutize_readme_images(
                            &md,
                            &hosting.raw_base,
                            repo,
                            &hosting.default_branch,
                        ))
                    })
                }),
            ),
            (None, None) => Section::Missing,
        };

        let changelog_html = match (snapshot.and_then(|s| cached(s.changelog_html.as_ref())), live) {
            (Some(html), _) => Section::Ready(html),
            (None, Some(client)) => Section::from_live(
                "changelog",
                repo,
                client.changelog(repo).map(|md| md.map(render)),
            ),
            (None, None) => Section::Missing,
        };

        let roadmap_html = match (snapshot.and_then(|s| cached(s.roadmap_html.as_ref())), live) {
            (Some(html), _) => Section::Ready(html),
            (None, Some(client)) => Section::from_live(
                "roadmap",
                repo,
                client.roadmap(repo).map(|md| md.map(render)),
            ),
            (None, None) => Section::Missing,
        };

        // The release list is not part of the snapshot; without the API the
        // latest release stands in for it.
        let releases = match live {
            Some(client) => {
                let listed = Section::from_live(
                    "releases",
                    repo,
                    client
                        .releases(repo, hosting.releases_per_page)
                        .map(|list| Some(list).filter(|l| !l.is_empty())),
                );
                match (listed, latest_release.ready()) {
                    (Section::Ready(list), _) => Section::Ready(list),
                    (_, Some(latest)) => Section::Ready(vec![latest.clone()]),
                    (other, None) => other,
                }
            }
            None => match latest_release.ready() {
                Some(latest) => Section::Ready(vec![latest.clone()]),
                None => Section::Missing,
            },
        };

        Self {
            repo_info,
            latest_release,
            readme_html,
            changelog_html,
            roadmap_html,
            releases,
        }
    }
}

// =============================================================================
// Project page widgets
// =============================================================================

fn release_date(release: &Release, language: Language) -> Option<String> {
    release
        .published_at
        .as_deref()
        .and_then(dates::parse_post_date)
        .map(|d| dates::format_long_date(d, language))
}

/// Stars, forks and open issues.
pub fn project_stats(info: Option<&RepoInfo>, labels: &Labels) -> Markup {
    let Some(info) = info else {
        return html! {};
    };
    html! {
        div.project-stats {
            span.stat { "★ " span #stars { (info.stars) } }
            span.stat { "⑂ " span #forks { (info.forks) } }
            span.stat #open-issues { (info.open_issues) " " (labels.open_issues) }
        }
    }
}

/// Banner for the latest release. Empty when there is none.
pub fn latest_release(release: Option<&Release>, language: Language) -> Markup {
    let Some(release) = release else {
        return html! {};
    };
    let labels = Labels::for_language(language);
    let notes = match release.body.as_deref() {
        Some(body) if !body.trim().is_empty() => body,
        _ => labels.no_release_notes,
    };
    html! {
        section #latest-release .release-banner {
            span.version-tag { (release.tag_name) }
            h3 { (release.title()) }
            @if let Some(date) = release_date(release, language) {
                span.release-date { (labels.published_on) " " (date) }
            }
            div #latest-release-notes { (PreEscaped(dialect::render(notes))) }
        }
    }
}

/// The README body, or a fallback line.
pub fn readme(section: &Section<String>, labels: &Labels) -> Markup {
    match section {
        Section::Ready(html) => html! { (PreEscaped(html)) },
        Section::Missing => html! { p { (labels.readme_unavailable) } },
        Section::Failed(_) => html! { p.error { (labels.readme_failed) } },
    }
}

/// Lightbox gallery of the README's screenshots. Empty when there are none.
pub fn screenshots(readme_html: Option<&str>, project_name: &str, labels: &Labels) -> Markup {
    let shots = readme_html
        .map(|html| images::screenshots(html, project_name))
        .unwrap_or_default();
    if shots.is_empty() {
        return html! {};
    }
    html! {
        div #screenshot-grid .screenshot-grid {
            @for shot in &shots {
                @let caption = caption(shot, labels);
                figure {
                    img src=(shot.src) alt=(caption) loading="lazy";
                    figcaption { (caption) }
                }
            }
        }
    }
}

fn caption<'a>(shot: &'a images::ImageRef, labels: &'a Labels) -> &'a str {
    if shot.alt.is_empty() {
        labels.screenshot
    } else {
        &shot.alt
    }
}

/// The first `shown` releases with their notes.
pub fn release_list(releases: &Section<Vec<Release>>, shown: usize, language: Language) -> Markup {
    let labels = Labels::for_language(language);
    let list = match releases {
        Section::Ready(list) if !list.is_empty() => list,
        _ => return html! { p { (labels.no_releases) } },
    };
    html! {
        @for release in list.iter().take(shown) {
            div.release-item {
                div.release-header {
                    span.version-tag { (release.tag_name) }
                    h3 { (release.title()) }
                    @if let (Some(raw), Some(date)) = (release.published_at.as_deref(), release_date(release, language)) {
                        time datetime=(raw) { (date) }
                    }
                }
                div.release-body {
                    (PreEscaped(dialect::render(release.body.as_deref().unwrap_or(labels.no_release_notes))))
                }
                a.release-link href=(release.html_url) target="_blank" rel="noopener noreferrer" {
                    (labels.view_release)
                }
            }
        }
    }
}

/// The CHANGELOG, or a pointer to the releases section.
pub fn changelog(section: &Section<String>, labels: &Labels) -> Markup {
    if let Section::Ready(html) = section {
        return html! { (PreEscaped(html)) };
    }
    html! {
        p { (labels.no_changelog) }
        p { (labels.see) " " a href="#releases" { (labels.releases) } " " (labels.for_history) }
    }
}

/// The ROADMAP, or a link to the open enhancement issues.
pub fn roadmap(section: &Section<String>, links: &RepoLinks<'_>, labels: &Labels) -> Markup {
    if let Section::Ready(html) = section {
        return html! { (PreEscaped(html)) };
    }
    html! {
        p { (labels.no_roadmap) }
        p {
            (labels.planned_features) " "
            a href=(links.enhancement_issues_url()) target="_blank" rel="noopener noreferrer" {
                (labels.enhancement_issues)
            }
            "."
        }
    }
}

// =============================================================================
// Index page widgets
// =============================================================================

/// A project card for the index grid.
///
/// Without repository data the card falls back to the project list entry and
/// a link to the repository.
pub fn project_card(
    project: &Project,
    info: Option<&RepoInfo>,
    release: Option<&Release>,
    page_href: &str,
    web_base: &str,
    labels: &Labels,
) -> Markup {
    let Some(info) = info else {
        let repo_url = format!("{}/{}", web_base.trim_end_matches('/'), project.repo);
        let description = if project.description.is_empty() {
            labels.no_description
        } else {
            project.description.as_str()
        };
        return html! {
            div.project-card {
                h3 { (project.name) }
                p { (description) }
                p.error { (labels.data_unavailable) }
                a.btn href=(repo_url) target="_blank" rel="noopener noreferrer" { (labels.view_repository) }
            }
        };
    };

    let description = [Some(project.description.as_str()), info.description.as_deref()]
        .into_iter()
        .flatten()
        .find(|d| !d.is_empty())
        .unwrap_or(labels.no_description);

    html! {
        div.project-card {
            div.project-header {
                @if let Some(icon) = &project.icon {
                    img.project-icon src=(icon) alt=(project.name);
                }
                h3 { (project.name) }
            }
            p { (description) }
            @if let Some(release) = release {
                span.version-tag { (release.tag_name) }
                p { strong { (labels.latest_version) } " " (release.title()) }
            }
            div.meta {
                span { "★ " (info.stars) }
                span { "⑂ " (info.forks) }
                span { (info.open_issues) " " (labels.issues) }
            }
            a.btn href=(page_href) { (labels.more_details) }
        }
    }
}

/// Cards for every project, in list order.
pub fn project_grid(cards: &[Markup], labels: &Labels) -> Markup {
    if cards.is_empty() {
        return html! { p.loading { (labels.no_projects) } };
    }
    html! { @for card in cards { (card) } }
}

/// Tag chips for a post.
pub fn post_tags(tags: &[String]) -> Markup {
    if tags.is_empty() {
        return html! {};
    }
    html! {
        div.post-tags { @for tag in tags { span.tag { (tag) } } }
    }
}

/// `by Author`, or nothing for anonymous posts.
pub fn post_author(author: &str, labels: &Labels) -> Markup {
    if author.is_empty() {
        return html! {};
    }
    html! { span { (labels.by) " " (author) } }
}

/// The newest posts as teasers, with a link to the full list when there are
/// more.
pub fn blog_teasers(posts: &[BlogPost], paths: &PathsConfig, language: Language) -> Markup {
    let labels = Labels::for_language(language);
    if posts.is_empty() {
        return html! {
            div.blog-post {
                h3 { (labels.no_posts) }
                p.excerpt { (labels.no_posts_hint) }
            }
        };
    }
    html! {
        @for post in posts.iter().take(TEASER_POSTS) {
            @let href = paths.post_page(&post.slug);
            article.blog-post {
                h3 { a href=(href) { (post.title) } }
                div.post-meta {
                    time datetime=(post.date) { (dates::display_post_date(&post.date, language)) }
                    (post_author(&post.author, labels))
                }
                @if !post.excerpt.is_empty() {
                    p.excerpt { (post.excerpt) }
                }
                (post_tags(&post.tags))
                a.read-more href=(href) { (labels.read_more) }
            }
        }
        @if posts.len() > TEASER_POSTS {
            div.all-posts { a.btn href=(paths.blog_page) { (labels.all_posts) } }
        }
    }
}
