//! Cache builder: per-project snapshots of remote metadata.
//!
//! For each project the builder fetches, in order:
//!
//! 1. repository statistics
//! 2. the latest release
//! 3. the README (relative images made absolute before rendering)
//! 4. the CHANGELOG
//! 5. the ROADMAP
//!
//! Documents are rendered with the CommonMark renderer and passed through the
//! repository link rewriter. A resource the API reports as missing is simply
//! left out of the snapshot. Any other fetch failure abandons the project:
//! nothing is written and the snapshot from the previous build stays in
//! place.
//!
//! ## Output
//!
//! ```text
//! data/cache/projects/
//! ├── tipels.json       # ProjectSnapshot, pretty-printed
//! └── other.json
//! ```
//!
//! Files are written to a temporary sibling and renamed into place, so a
//! reader never sees a half-written snapshot.
//!
//! Projects are independent. [`SnapshotBuilder::build_all`] runs them on a
//! bounded rayon pool and reports one [`SnapshotOutcome`] per project in
//! input order.

use crate::config::HostingConfig;
use crate::dates;
use crate::hosting::{FetchError, HostingClient};
use crate::markdown::links::{RepoLinks, rewrite_repo_links};
use crate::markdown::{commonmark, images};
use crate::types::{Project, ProjectSnapshot};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

/// Result of building one project's snapshot.
#[derive(Debug)]
pub struct SnapshotOutcome {
    pub id: String,
    pub name: String,
    pub result: Result<SnapshotSummary, SnapshotError>,
}

/// What a written snapshot contains, for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub path: PathBuf,
    pub stars: Option<u64>,
    pub release: Option<String>,
    pub has_readme: bool,
    pub has_changelog: bool,
    pub has_roadmap: bool,
}

impl SnapshotSummary {
    fn of(path: PathBuf, snapshot: &ProjectSnapshot) -> Self {
        Self {
            path,
            stars: snapshot.repo_info.as_ref().map(|info| info.stars),
            release: snapshot.latest_release.as_ref().map(|r| r.tag_name.clone()),
            has_readme: snapshot.readme_html.is_some(),
            has_changelog: snapshot.changelog_html.is_some(),
            has_roadmap: snapshot.roadmap_html.is_some(),
        }
    }
}

/// Builds snapshots with a shared client and a fixed build timestamp.
pub struct SnapshotBuilder<'a> {
    client: &'a HostingClient<'a>,
    hosting: &'a HostingConfig,
    now: DateTime<Utc>,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(client: &'a HostingClient<'a>, hosting: &'a HostingConfig, now: DateTime<Utc>) -> Self {
        Self {
            client,
            hosting,
            now,
        }
    }

    fn links<'p>(&'p self, project: &'p Project) -> RepoLinks<'p> {
        RepoLinks {
            web_base: &self.hosting.web_base,
            repo: &project.repo,
            branch: &self.hosting.default_branch,
        }
    }

    /// Fetch everything for one project. Does not touch the filesystem.
    pub fn build_snapshot(&self, project: &Project) -> Result<ProjectSnapshot, SnapshotError> {
        let repo = project.repo.as_str();
        let links = self.links(project);
        let render = |markdown: &str| rewrite_repo_links(&commonmark::render(markdown), &links);

        let repo_info = self.client.repository(repo)?;
        if repo_info.is_none() {
            warn!(project = %project.id, repo, "repository not found");
        }

        let latest_release = self.client.latest_release(repo)?;
        if latest_release.is_none() {
            info!(project = %project.id, "no release published");
        }

        let readme_html = self.client.readme(repo)?.map(|markdown| {
            let markdown = images::absolutize_readme_images(
                &markdown,
                &self.hosting.raw_base,
                repo,
                &self.hosting.default_branch,
            );
            render(&markdown)
        });
        let changelog_html = self.client.changelog(repo)?.map(|md| render(&md));
        let roadmap_html = self.client.roadmap(repo)?.map(|md| render(&md));

        Ok(ProjectSnapshot {
            repo: project.repo.clone(),
            name: project.name.clone(),
            description: project.description.clone(),
            last_update: dates::iso_timestamp(self.now),
            repo_info,
            latest_release,
            readme_html,
            changelog_html,
            roadmap_html,
        })
    }

    /// Build and persist one project's snapshot.
    pub fn refresh(&self, project: &Project, dir: &Path) -> Result<SnapshotSummary, SnapshotError> {
        let snapshot = self.build_snapshot(project)?;
        let path = write_snapshot(dir, &project.id, &snapshot)?;
        Ok(SnapshotSummary::of(path, &snapshot))
    }

    /// Refresh every project with at most `fetchers` running at once.
    pub fn build_all(&self, projects: &[Project], dir: &Path, fetchers: usize) -> Vec<SnapshotOutcome> {
        let run = |project: &Project| {
            info!(project = %project.id, repo = %project.repo, "fetching");
            let result = self.refresh(project, dir);
            match &result {
                Ok(summary) => info!(project = %project.id, path = %summary.path.display(), "snapshot written"),
                Err(e) => warn!(project = %project.id, error = %e, "snapshot kept from previous build"),
            }
            SnapshotOutcome {
                id: project.id.clone(),
                name: project.name.clone(),
                result,
            }
        };

        if fetchers <= 1 {
            return projects.iter().map(run).collect();
        }
        match rayon::ThreadPoolBuilder::new().num_threads(fetchers).build() {
            Ok(pool) => pool.install(|| projects.par_iter().map(run).collect()),
            Err(e) => {
                warn!(error = %e, "cannot start fetch pool, fetching sequentially");
                projects.iter().map(run).collect()
            }
        }
    }
}

/// Path of a project's snapshot file.
pub fn snapshot_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{id}.json"))
}

/// Write `snapshot` as the sole content of `{dir}/{id}.json`, atomically.
pub fn write_snapshot(dir: &Path, id: &str, snapshot: &ProjectSnapshot) -> Result<PathBuf, SnapshotError> {
    fs::create_dir_all(dir)?;
    let path = snapshot_path(dir, id);
    let tmp = dir.join(format!(".{id}.json.tmp"));
    fs::write(&tmp, serde_json::to_string_pretty(snapshot)?)?;
    fs::rename(&tmp, &path)?;
    Ok(path)
}

/// Read a persisted snapshot; `Ok(None)` when the project has none yet.
pub fn read_snapshot(dir: &Path, id: &str) -> Result<Option<ProjectSnapshot>, SnapshotError> {
    let path = snapshot_path(dir, id);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosting::NoCache;
    use crate::hosting::client::tests::{API, REPO_JSON, RELEASE_JSON, contents_json};
    use crate::hosting::transport::tests::MockTransport;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn hosting() -> HostingConfig {
        HostingConfig {
            api_base: API.to_string(),
            ..HostingConfig::default()
        }
    }

    fn project(id: &str, repo: &str) -> Project {
        Project {
            id: id.to_string(),
            name: id.to_uppercase(),
            repo: repo.to_string(),
            description: "desc".to_string(),
            icon: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn full_transport(repo: &str) -> MockTransport {
        let base = format!("{API}/repos/{repo}");
        MockTransport::new()
            .respond(&base, 200, REPO_JSON)
            .respond(&format!("{base}/releases/latest"), 200, RELEASE_JSON)
            .respond(
                &format!("{base}/readme"),
                200,
                "# Tool\n\n![ui](docs/ui.png)\n\nSee [roadmap](ROADMAP.md).\n",
            )
            .respond(
                &format!("{base}/contents/CHANGELOG.md"),
                200,
                &contents_json("## [1.2.0](compare/v1.1.0...v1.2.0)\n"),
            )
            .respond(
                &format!("{base}/contents/ROADMAP.md"),
                200,
                &contents_json("- more\n"),
            )
    }

    #[test]
    fn full_snapshot() {
        let transport = full_transport("o/r");
        let hosting = hosting();
        let client = HostingClient::new(&transport, &NoCache, API);
        let builder = SnapshotBuilder::new(&client, &hosting, now());

        let snap = builder.build_snapshot(&project("r", "o/r")).unwrap();
        assert_eq!(snap.repo, "o/r");
        assert_eq!(snap.last_update, "2024-06-01T12:00:00.000Z");
        assert_eq!(snap.repo_info.unwrap().stars, 42);
        assert_eq!(snap.latest_release.unwrap().tag_name, "v1.2.0");

        let readme = snap.readme_html.unwrap();
        assert!(readme.contains("https://raw.githubusercontent.com/o/r/main/docs/ui.png"));
        assert!(readme.contains(r##"href="#roadmap""##));

        let changelog = snap.changelog_html.unwrap();
        assert!(changelog.contains("https://github.com/o/r/releases/tag/v1.2.0"));
        assert!(snap.roadmap_html.unwrap().contains("<li>more</li>"));
    }

    #[test]
    fn fetch_order_is_fixed() {
        let transport = full_transport("o/r");
        let hosting = hosting();
        let client = HostingClient::new(&transport, &NoCache, API);
        SnapshotBuilder::new(&client, &hosting, now())
            .build_snapshot(&project("r", "o/r"))
            .unwrap();

        let urls: Vec<String> = transport.get_requests().into_iter().map(|r| r.url).collect();
        let base = format!("{API}/repos/o/r");
        assert_eq!(
            urls,
            vec![
                base.clone(),
                format!("{base}/releases/latest"),
                format!("{base}/readme"),
                format!("{base}/contents/CHANGELOG.md"),
                format!("{base}/contents/ROADMAP.md"),
            ]
        );
    }

    #[test]
    fn missing_release_still_yields_snapshot() {
        let base = format!("{API}/repos/o/r");
        let transport = MockTransport::new()
            .respond(&base, 200, REPO_JSON)
            .respond(&format!("{base}/readme"), 200, "hello");
        let hosting = hosting();
        let client = HostingClient::new(&transport, &NoCache, API);
        let tmp = TempDir::new().unwrap();

        let summary = SnapshotBuilder::new(&client, &hosting, now())
            .refresh(&project("r", "o/r"), tmp.path())
            .unwrap();
        assert_eq!(summary.release, None);
        assert!(summary.has_readme);

        let json = fs::read_to_string(summary.path).unwrap();
        assert!(!json.contains("latestRelease"));
        assert!(json.contains("repoInfo"));
    }

    #[test]
    fn failure_leaves_previous_snapshot_untouched() {
        let tmp = TempDir::new().unwrap();
        let previous = r#"{"repo":"o/r","name":"R","description":"","lastUpdate":"old"}"#;
        fs::write(tmp.path().join("r.json"), previous).unwrap();

        let base = format!("{API}/repos/o/r");
        let transport = MockTransport::new()
            .respond(&base, 200, REPO_JSON)
            .respond(&format!("{base}/releases/latest"), 500, "boom");
        let hosting = hosting();
        let client = HostingClient::new(&transport, &NoCache, API);

        let result = SnapshotBuilder::new(&client, &hosting, now())
            .refresh(&project("r", "o/r"), tmp.path());
        assert!(matches!(
            result,
            Err(SnapshotError::Fetch(FetchError::Status { status: 500, .. }))
        ));
        assert_eq!(fs::read_to_string(tmp.path().join("r.json")).unwrap(), previous);
    }

    #[test]
    fn one_failure_does_not_affect_other_projects() {
        let tmp = TempDir::new().unwrap();
        let transport = full_transport("o/good").fail(&format!("{API}/repos/o/bad"), "reset");
        let hosting = hosting();
        let client = HostingClient::new(&transport, &NoCache, API);
        let builder = SnapshotBuilder::new(&client, &hosting, now());

        let projects = vec![project("bad", "o/bad"), project("good", "o/good")];
        for fetchers in [1, 2] {
            let outcomes = builder.build_all(&projects, tmp.path(), fetchers);
            assert_eq!(outcomes.len(), 2);
            assert_eq!(outcomes[0].id, "bad");
            assert!(outcomes[0].result.is_err());
            assert_eq!(outcomes[1].id, "good");
            assert!(outcomes[1].result.is_ok());
        }
        assert!(!tmp.path().join("bad.json").exists());
        assert!(tmp.path().join("good.json").exists());
    }

    #[test]
    fn write_then_read() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested/cache");
        let snapshot = ProjectSnapshot {
            repo: "o/r".to_string(),
            name: "R".to_string(),
            description: String::new(),
            last_update: "t".to_string(),
            repo_info: None,
            latest_release: None,
            readme_html: Some("<p>x</p>".to_string()),
            changelog_html: None,
            roadmap_html: None,
        };
        write_snapshot(&dir, "r", &snapshot).unwrap();
        assert_eq!(read_snapshot(&dir, "r").unwrap(), Some(snapshot));
        assert_eq!(read_snapshot(&dir, "missing").unwrap(), None);
        assert!(!dir.join(".r.json.tmp").exists());
    }
}
