//! # Folio
//!
//! Build pipeline for a static portfolio and blog. Projects live on a code
//! hosting service; their metadata (stars, releases, README, CHANGELOG,
//! ROADMAP) is fetched once per build, persisted as JSON snapshots, and
//! rendered into static pages. Blog posts are Markdown files with a small
//! frontmatter block.
//!
//! # Architecture: Four Stages
//!
//! ```text
//! 1. Snapshots  data/projects.json  →  data/cache/projects/{id}.json   (hosting API → JSON)
//! 2. Blog       blog/posts/*.md     →  blog-index.json, blog/posts/{slug}.html
//! 3. Pages      snapshots + templates → projects/{id}.html, index.html
//! 4. Feeds      projects + posts    →  sitemap.xml, sitemap.html, feed.xml
//! ```
//!
//! Each stage reads what earlier stages left on disk, so any of them can be
//! rerun on its own. Pages only need snapshots, which means a site can be
//! regenerated offline from the last successful fetch.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Stage orchestration, site loading, `check` |
//! | [`hosting`] | Transport seam, response cache, typed API client |
//! | [`snapshot`] | Per-project snapshot build and atomic persistence |
//! | [`blog`] | Post discovery, sorting, and the blog index |
//! | [`pages`] | `{{PLACEHOLDER}}` templates filled with widgets |
//! | [`widgets`] | Cache-first project view and HTML fragments (Maud) |
//! | [`feeds`] | XML sitemap, HTML sitemap, RSS 2.0 |
//! | [`markdown`] | Restricted dialect, CommonMark, link and image rewriting |
//! | [`frontmatter`] | `---` delimited `key: value` header parser |
//! | [`dates`] | Post date parsing and localized formatting |
//! | [`config`] | `config.toml` loading, validation, and merging onto stock defaults |
//! | [`types`] | Shared types serialized between stages |
//! | [`output`] | CLI output formatting for every stage |
//!
//! # Design Decisions
//!
//! ## Snapshots Are the Source of Truth for Pages
//!
//! Remote data is fetched in the snapshot stage and nowhere else unless
//! `pages` or `build` runs with `--live`. A failed fetch leaves the previous
//! snapshot untouched, so a flaky API never blanks a page that rendered fine
//! yesterday.
//!
//! ## Injected Transport
//!
//! The API client never talks to the network directly. It takes a
//! [`hosting::Transport`] by reference; the CLI passes the reqwest-backed
//! [`hosting::HttpTransport`], tests pass a mock that records requests.
//!
//! ## Two Markdown Renderers
//!
//! Snapshot content and blog posts go through CommonMark
//! ([`markdown::commonmark`]). Release notes and live fallbacks use a small
//! line-based dialect ([`markdown::dialect`]) that never emits raw HTML from
//! its input.

pub mod blog;
pub mod config;
pub mod dates;
pub mod feeds;
pub mod frontmatter;
pub mod hosting;
pub mod markdown;
pub mod output;
pub mod pages;
pub mod pipeline;
pub mod snapshot;
pub mod types;
pub mod widgets;
