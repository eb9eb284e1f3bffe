//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! serialized to a TOML table and the user's file is merged on top of it, so a
//! config file only needs the keys it wants to change.
//!
//! ## Config File Location
//!
//! ```text
//! site/
//! ├── config.toml              # Optional, overrides stock defaults
//! ├── data/projects.json       # Project list
//! ├── project-template.html
//! ├── blog-post-template.html
//! └── blog/posts/*.md
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! [site]
//! base_url = "https://example.com"
//! title = "Portfolio & Blog"
//! description = "Projects and notes"
//! language = "en"            # "en" or "de"; drives long dates
//! feed_email = "noreply@example.com"
//!
//! [hosting]
//! api_base = "https://api.github.com"
//! raw_base = "https://raw.githubusercontent.com"
//! web_base = "https://github.com"
//! default_branch = "main"
//! token_env = "GITHUB_TOKEN"
//! cache_ttl_secs = 300
//! releases_per_page = 10
//! releases_shown = 5
//!
//! [build]
//! max_fetches = 1            # Projects fetched in parallel (capped at CPU cores)
//! ```
//!
//! The `[paths]` table relocates every input and output; see
//! [`stock_config_toml`] for the full list.
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Name of the config file inside the site root.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Public identity of the site (feeds, sitemaps, date language).
    pub site: SiteInfo,
    /// Hosting API endpoints and fetch behaviour.
    pub hosting: HostingConfig,
    /// Input and output locations, relative to the site root.
    pub paths: PathsConfig,
    /// Build fan-out settings.
    pub build: BuildConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.site.base_url.starts_with("http://") && !self.site.base_url.starts_with("https://")
        {
            return Err(ConfigError::Validation(
                "site.base_url must be an absolute http(s) URL".into(),
            ));
        }
        if Language::parse(&self.site.language).is_none() {
            return Err(ConfigError::Validation(format!(
                "site.language must be \"en\" or \"de\", got \"{}\"",
                self.site.language
            )));
        }
        if self.hosting.releases_per_page == 0 {
            return Err(ConfigError::Validation(
                "hosting.releases_per_page must be at least 1".into(),
            ));
        }
        if self.build.max_fetches == Some(0) {
            return Err(ConfigError::Validation(
                "build.max_fetches must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The configured language, falling back to English.
    pub fn language(&self) -> Language {
        Language::parse(&self.site.language).unwrap_or_default()
    }
}

/// Language used for human-readable dates and labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    En,
    De,
}

impl Language {
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Self::En),
            "de" => Some(Self::De),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::De => "de",
        }
    }
}

/// Public identity of the site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    /// Absolute base URL without trailing slash, used in sitemaps and feeds.
    pub base_url: String,
    /// Site title (RSS channel title, HTML sitemap heading).
    pub title: String,
    /// Site description (RSS channel description).
    pub description: String,
    /// `en` or `de`.
    pub language: String,
    /// Address shown in RSS `<author>` elements.
    pub feed_email: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            base_url: "https://example.com".to_string(),
            title: "Portfolio & Blog".to_string(),
            description: "Projects, releases and notes".to_string(),
            language: "en".to_string(),
            feed_email: "noreply@example.com".to_string(),
        }
    }
}

/// Hosting API endpoints and fetch behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostingConfig {
    /// REST API root.
    pub api_base: String,
    /// Raw file host, used to absolutize README images.
    pub raw_base: String,
    /// Web UI root, used for blob, release, and profile links.
    pub web_base: String,
    /// Branch used for raw and blob URLs.
    pub default_branch: String,
    /// Environment variable holding the optional access token.
    pub token_env: String,
    /// Freshness window of the in-memory response cache.
    pub cache_ttl_secs: u64,
    /// Page size for the releases listing.
    pub releases_per_page: u32,
    /// How many releases the release list widget shows.
    pub releases_shown: usize,
}

impl Default for HostingConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            raw_base: "https://raw.githubusercontent.com".to_string(),
            web_base: "https://github.com".to_string(),
            default_branch: "main".to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
            cache_ttl_secs: 300,
            releases_per_page: 10,
            releases_shown: 5,
        }
    }
}

impl HostingConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Read the access token from the configured environment variable.
    ///
    /// Empty values count as absent.
    pub fn token_from_env(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}

/// Input and output locations, relative to the site root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub projects: String,
    pub snapshots: String,
    pub project_template: String,
    pub post_template: String,
    pub index_template: String,
    pub posts: String,
    pub blog_index: String,
    pub project_pages: String,
    pub index_page: String,
    /// Hand-written page listing every post, linked from the index teasers.
    pub blog_page: String,
    pub sitemap_xml: String,
    pub sitemap_html: String,
    pub feed: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            projects: "data/projects.json".to_string(),
            snapshots: "data/cache/projects".to_string(),
            project_template: "project-template.html".to_string(),
            post_template: "blog-post-template.html".to_string(),
            index_template: "index-template.html".to_string(),
            posts: "blog/posts".to_string(),
            blog_index: "blog/blog-index.json".to_string(),
            project_pages: "projects".to_string(),
            index_page: "index.html".to_string(),
            blog_page: "blog.html".to_string(),
            sitemap_xml: "sitemap.xml".to_string(),
            sitemap_html: "sitemap.html".to_string(),
            feed: "feed.xml".to_string(),
        }
    }
}

impl PathsConfig {
    /// Site-relative URL of a post page.
    pub fn post_page(&self, slug: &str) -> String {
        format!("{}/{}.html", self.posts.trim_end_matches('/'), slug)
    }

    /// Site-relative URL of a project page.
    pub fn project_page(&self, id: &str) -> String {
        format!("{}/{}.html", self.project_pages.trim_end_matches('/'), id)
    }
}

/// Build fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Number of projects whose snapshots are fetched at the same time.
    /// Values larger than the core count are clamped down.
    pub max_fetches: Option<usize>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            max_fetches: Some(1),
        }
    }
}

/// Resolve the effective number of snapshot workers.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_fetchers(config: &BuildConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_fetches.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from the site root as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load the site config: stock defaults with the user's file merged on top.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match load_raw_config(root)? {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# folio configuration
# ====================
# All settings are optional. Values shown below are the defaults.
# Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Site identity
# ---------------------------------------------------------------------------
[site]
# Absolute URL the site is served from (no trailing slash).
base_url = "https://example.com"
title = "Portfolio & Blog"
description = "Projects, releases and notes"
# "en" or "de". Controls long date formatting on pages and sitemaps.
language = "en"
# Address used in RSS <author> elements.
feed_email = "noreply@example.com"

# ---------------------------------------------------------------------------
# Hosting API
# ---------------------------------------------------------------------------
[hosting]
api_base = "https://api.github.com"
raw_base = "https://raw.githubusercontent.com"
web_base = "https://github.com"
default_branch = "main"
# Environment variable read for an access token (optional).
token_env = "GITHUB_TOKEN"
# Seconds a fetched response stays fresh in the in-memory cache.
cache_ttl_secs = 300
releases_per_page = 10
releases_shown = 5

# ---------------------------------------------------------------------------
# Paths (relative to the site root)
# ---------------------------------------------------------------------------
[paths]
projects = "data/projects.json"
snapshots = "data/cache/projects"
project_template = "project-template.html"
post_template = "blog-post-template.html"
index_template = "index-template.html"
posts = "blog/posts"
blog_index = "blog/blog-index.json"
project_pages = "projects"
index_page = "index.html"
blog_page = "blog.html"
sitemap_xml = "sitemap.xml"
sitemap_html = "sitemap.html"
feed = "feed.xml"

# ---------------------------------------------------------------------------
# Build
# ---------------------------------------------------------------------------
[build]
# Projects fetched in parallel, capped at the number of CPU cores.
max_fetches = 1
"##
}
