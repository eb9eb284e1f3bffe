//! Shared types serialized between pipeline stages.
//!
//! Field names follow the on-disk JSON documents: the project list and blog
//! index use the names the browser scripts read, snapshots use camelCase.

use serde::{Deserialize, Serialize};

/// A project entry from `data/projects.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Stable identifier; names the snapshot file and the project page.
    pub id: String,
    pub name: String,
    /// Remote repository as `owner/name`.
    pub repo: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// The project list document: `{ "projects": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectList {
    #[serde(default)]
    pub projects: Vec<Project>,
}

/// Persisted per-project snapshot of remote metadata.
///
/// Rebuilt from scratch on every run and written as the sole content of
/// `{snapshots}/{id}.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub repo: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// RFC 3339 UTC timestamp of the build that produced this snapshot.
    pub last_update: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_info: Option<RepoInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_release: Option<Release>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roadmap_html: Option<String>,
}

/// Repository statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoInfo {
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// A published release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Release notes in Markdown.
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    pub html_url: String,
}

impl Release {
    /// Display title: the release name, or the tag when the name is empty.
    pub fn title(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.tag_name,
        }
    }
}

/// A blog post parsed from a frontmatter-delimited Markdown file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    /// File stem; unique key and output file name.
    pub slug: String,
    pub title: String,
    /// Date as written in the frontmatter (normally `YYYY-MM-DD`).
    pub date: String,
    pub author: String,
    pub tags: Vec<String>,
    pub excerpt: String,
    /// Markdown body. Never written to the blog index.
    #[serde(skip)]
    pub content: String,
}

/// The blog index document: `{ "posts": [...] }`, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlogIndex {
    #[serde(default)]
    pub posts: Vec<BlogPost>,
}
