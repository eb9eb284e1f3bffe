//! Build orchestration.
//!
//! A [`Site`] is a root directory plus its loaded config. The stages below
//! each read what earlier stages wrote, so they can also run on their own
//! from the CLI:
//!
//! ```text
//! snapshots   data/projects.json ──► data/cache/projects/{id}.json
//! pages       snapshots + project template ──► projects/{id}.html, index.html
//! blog        blog/posts/*.md ──► blog/blog-index.json, blog/posts/{slug}.html
//! feeds       projects + blog index ──► sitemap.xml, sitemap.html, feed.xml
//! ```
//!
//! Missing or unparsable local inputs (project list, templates) are fatal.
//! Remote failures are not: they are reported per project and the build
//! carries on with whatever snapshot is on disk.

use crate::blog::{self, BlogError};
use crate::config::{self, ConfigError, SiteConfig};
use crate::feeds;
use crate::frontmatter;
use crate::hosting::HostingClient;
use crate::pages::{self, PageError};
use crate::snapshot::{self, SnapshotBuilder, SnapshotOutcome};
use crate::types::{BlogIndex, BlogPost, Project, ProjectList};
use crate::widgets::{self, Labels, ProjectView};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Missing input: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("Cannot parse {}: {source}", path.display())]
    InvalidInput {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Page error: {0}")]
    Page(#[from] PageError),
    #[error("Blog error: {0}")]
    Blog(#[from] BlogError),
}

/// A site root and its configuration.
#[derive(Debug, Clone)]
pub struct Site {
    pub root: PathBuf,
    pub config: SiteConfig,
}

impl Site {
    /// Load `config.toml` (or the stock defaults) from `root`.
    pub fn load(root: &Path) -> Result<Self, BuildError> {
        Ok(Self {
            root: root.to_path_buf(),
            config: config::load_config(root)?,
        })
    }

    /// Resolve a configured path against the site root.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.path(&self.config.paths.snapshots)
    }

    /// Read the project list.
    pub fn projects(&self) -> Result<Vec<Project>, BuildError> {
        let path = self.path(&self.config.paths.projects);
        if !path.is_file() {
            return Err(BuildError::MissingInput(path));
        }
        let content = fs::read_to_string(&path)?;
        let list: ProjectList =
            serde_json::from_str(&content).map_err(|source| BuildError::InvalidInput {
                path: path.clone(),
                source,
            })?;
        Ok(list.projects)
    }

    /// Site-relative display form of a path under the root.
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// A generated page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub title: String,
    pub path: PathBuf,
}

/// Result of the pages stage.
#[derive(Debug, Default)]
pub struct PagesReport {
    pub project_pages: Vec<PageRecord>,
    pub index_page: Option<PathBuf>,
}

/// Result of the blog stage.
#[derive(Debug, Default)]
pub struct BlogReport {
    /// Sorted posts, with bodies.
    pub posts: Vec<BlogPost>,
    pub index_path: PathBuf,
    pub post_pages: Vec<PageRecord>,
}

/// Everything a full build produced.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub snapshots: Vec<SnapshotOutcome>,
    pub pages: PagesReport,
    pub blog: BlogReport,
    pub feeds: Vec<PathBuf>,
}

impl BuildReport {
    pub fn failed_snapshots(&self) -> usize {
        self.snapshots.iter().filter(|o| o.result.is_err()).count()
    }
}

/// Stage 1: refresh every project's snapshot.
pub fn run_snapshots(
    site: &Site,
    projects: &[Project],
    client: &HostingClient<'_>,
    now: DateTime<Utc>,
) -> Vec<SnapshotOutcome> {
    let builder = SnapshotBuilder::new(client, &site.config.hosting, now);
    let fetchers = config::effective_fetchers(&site.config.build);
    info!(projects = projects.len(), fetchers, "building snapshots");
    builder.build_all(projects, &site.snapshots_dir(), fetchers)
}

fn load_snapshot(site: &Site, project: &Project) -> Option<crate::types::ProjectSnapshot> {
    match snapshot::read_snapshot(&site.snapshots_dir(), &project.id) {
        Ok(found) => found,
        Err(e) => {
            warn!(project = %project.id, error = %e, "unreadable snapshot ignored");
            None
        }
    }
}

/// Stage 2: project pages and, when its template exists, the index page.
///
/// `live` enables the API fallback for sections the snapshot lacks.
pub fn run_pages(
    site: &Site,
    projects: &[Project],
    posts: &[BlogPost],
    live: Option<&HostingClient<'_>>,
) -> Result<PagesReport, BuildError> {
    let cfg = &site.config;
    let language = cfg.language();
    let labels = Labels::for_language(language);
    let template = pages::load_template(&site.path(&cfg.paths.project_template))?;

    let mut report = PagesReport::default();
    let mut cards = Vec::with_capacity(projects.len());

    for project in projects {
        let snapshot = load_snapshot(site, project);
        if snapshot.is_none() {
            warn!(project = %project.id, "no snapshot");
        }
        let view = ProjectView::resolve(project, snapshot.as_ref(), live, &cfg.hosting);

        let path = site.path(&cfg.paths.project_page(&project.id));
        let values = pages::project_values(project, &view, &cfg.hosting, language);
        pages::write_page(&path, &template, &values)?;
        info!(project = %project.id, path = %path.display(), "project page written");

        cards.push(widgets::project_card(
            project,
            view.repo_info.ready(),
            view.latest_release.ready(),
            &cfg.paths.project_page(&project.id),
            &cfg.hosting.web_base,
            labels,
        ));
        report.project_pages.push(PageRecord {
            title: project.name.clone(),
            path,
        });
    }

    let index_template = site.path(&cfg.paths.index_template);
    if index_template.is_file() {
        let template = pages::load_template(&index_template)?;
        let path = site.path(&cfg.paths.index_page);
        pages::write_page(&path, &template, &pages::index_values(&cards, posts, &cfg.paths, language))?;
        info!(path = %path.display(), "index page written");
        report.index_page = Some(path);
    }

    Ok(report)
}

/// Stage 3: blog index and post pages.
pub fn run_blog(site: &Site) -> Result<BlogReport, BuildError> {
    let cfg = &site.config;
    let posts = blog::load_posts(&site.path(&cfg.paths.posts))?;
    let index_path = site.path(&cfg.paths.blog_index);
    blog::write_index(&index_path, &posts)?;
    info!(posts = posts.len(), path = %index_path.display(), "blog index written");

    let mut post_pages = Vec::with_capacity(posts.len());
    if !posts.is_empty() {
        let template = pages::load_template(&site.path(&cfg.paths.post_template))?;
        for post in &posts {
            let path = site.path(&cfg.paths.post_page(&post.slug));
            let values = pages::post_values(post, &cfg.hosting.web_base, cfg.language());
            pages::write_page(&path, &template, &values)?;
            post_pages.push(PageRecord {
                title: post.title.clone(),
                path,
            });
        }
    }

    Ok(BlogReport {
        posts,
        index_path,
        post_pages,
    })
}

/// Read the blog index written by [`run_blog`]. A missing index means no
/// posts.
pub fn read_blog_index(site: &Site) -> Result<Vec<BlogPost>, BuildError> {
    let path = site.path(&site.config.paths.blog_index);
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(&path)?;
    let index: BlogIndex =
        serde_json::from_str(&content).map_err(|source| BuildError::InvalidInput {
            path: path.clone(),
            source,
        })?;
    Ok(index.posts)
}

/// Stage 4: `sitemap.xml`, `sitemap.html` and the RSS feed.
pub fn run_feeds(
    site: &Site,
    projects: &[Project],
    posts: &[BlogPost],
    now: DateTime<Utc>,
) -> Result<Vec<PathBuf>, BuildError> {
    let cfg = &site.config;
    let outputs = [
        (
            &cfg.paths.sitemap_xml,
            feeds::sitemap_xml(&cfg.site, &cfg.paths, projects, posts, now),
        ),
        (
            &cfg.paths.sitemap_html,
            feeds::sitemap_html(&cfg.site, &cfg.paths, projects, posts, cfg.language()),
        ),
        (
            &cfg.paths.feed,
            feeds::rss_feed(&cfg.site, &cfg.paths, posts, now),
        ),
    ];

    let mut written = Vec::with_capacity(outputs.len());
    for (relative, content) in outputs {
        let path = site.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        info!(path = %path.display(), "feed written");
        written.push(path);
    }
    Ok(written)
}

/// Run every stage: snapshots, blog, pages, feeds.
///
/// Pages render from the snapshots just written. With `live`, sections a
/// snapshot lacks are asked for again, costing one more request each.
pub fn run_build(
    site: &Site,
    client: &HostingClient<'_>,
    live: bool,
    now: DateTime<Utc>,
) -> Result<BuildReport, BuildError> {
    let projects = site.projects()?;
    let snapshots = run_snapshots(site, &projects, client, now);
    let blog = run_blog(site)?;
    let pages = run_pages(site, &projects, &blog.posts, live.then_some(client))?;
    let feeds = run_feeds(site, &projects, &blog.posts, now)?;

    Ok(BuildReport {
        snapshots,
        pages,
        blog,
        feeds,
    })
}

/// Findings of [`check`].
#[derive(Debug, Default)]
pub struct CheckReport {
    pub projects: usize,
    pub snapshots: usize,
    pub posts: usize,
    /// Markdown files in the posts directory without frontmatter.
    pub skipped_posts: Vec<String>,
    pub problems: Vec<String>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Validate inputs without network access or writes.
pub fn check(site: &Site) -> Result<CheckReport, BuildError> {
    let cfg = &site.config;
    let mut report = CheckReport::default();

    match site.projects() {
        Ok(projects) => {
            report.projects = projects.len();
            report.snapshots = projects
                .iter()
                .filter(|p| snapshot::snapshot_path(&site.snapshots_dir(), &p.id).is_file())
                .count();
            for project in &projects {
                if !project.repo.contains('/') {
                    report.problems.push(format!(
                        "project {}: repo \"{}\" is not owner/name",
                        project.id, project.repo
                    ));
                }
            }
        }
        Err(e) => report.problems.push(e.to_string()),
    }

    let template = site.path(&cfg.paths.project_template);
    if !template.is_file() {
        report
            .problems
            .push(format!("Missing template: {}", site.display_path(&template)));
    }

    let posts_dir = site.path(&cfg.paths.posts);
    if posts_dir.is_dir() {
        let mut files: Vec<PathBuf> = fs::read_dir(&posts_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
            .collect();
        files.sort();
        for file in files {
            if frontmatter::parse(&fs::read_to_string(&file)?).has_block {
                report.posts += 1;
            } else {
                report.skipped_posts.push(site.display_path(&file));
            }
        }
        let post_template = site.path(&cfg.paths.post_template);
        if report.posts > 0 && !post_template.is_file() {
            report
                .problems
                .push(format!("Missing template: {}", site.display_path(&post_template)));
        }
    }

    Ok(report)
}
