//! Typed access to the hosting API.
//!
//! Every call follows the same status policy:
//!
//! | Outcome | Result |
//! |---|---|
//! | 2xx | `Ok(Some(..))`, body cached by URL |
//! | 404 | `Ok(None)`, not cached |
//! | any other status | `Err(FetchError::Status)` |
//! | network failure | `Err(FetchError::Transport)` |
//!
//! A fresh cache hit returns without touching the transport.

use super::cache::ResponseCache;
use super::transport::{ACCEPT_JSON, ACCEPT_RAW, Request, Transport, TransportError};
use crate::types::{Release, RepoInfo};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("API returned status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("Invalid JSON from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Cannot decode content from {url}: {message}")]
    Decode { url: String, message: String },
}

/// `GET /repos/{repo}` response, reduced to what the site shows.
#[derive(Debug, Deserialize)]
struct ApiRepository {
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    open_issues_count: u64,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    homepage: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
}

impl From<ApiRepository> for RepoInfo {
    fn from(api: ApiRepository) -> Self {
        RepoInfo {
            stars: api.stargazers_count,
            forks: api.forks_count,
            open_issues: api.open_issues_count,
            description: api.description,
            homepage: api.homepage.filter(|h| !h.is_empty()),
            topics: api.topics,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiRelease {
    tag_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    html_url: String,
}

impl From<ApiRelease> for Release {
    fn from(api: ApiRelease) -> Self {
        Release {
            tag_name: api.tag_name,
            name: api.name,
            body: api.body,
            published_at: api.published_at,
            html_url: api.html_url,
        }
    }
}

/// `GET /repos/{repo}/contents/{path}` response.
#[derive(Debug, Deserialize)]
struct ApiContent {
    #[serde(default)]
    content: Option<String>,
}

/// Client for a GitHub-compatible hosting API.
///
/// Transport and cache are borrowed so tests can inspect them after the
/// calls, and so one client can be shared across a rayon fan-out.
pub struct HostingClient<'a> {
    transport: &'a dyn Transport,
    cache: &'a dyn ResponseCache,
    api_base: String,
    token: Option<String>,
}

impl<'a> HostingClient<'a> {
    pub fn new(transport: &'a dyn Transport, cache: &'a dyn ResponseCache, api_base: &str) -> Self {
        Self {
            transport,
            cache,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Attach a bearer token to every request.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    fn repo_url(&self, repo: &str) -> String {
        format!("{}/repos/{}", self.api_base, repo)
    }

    /// Fetch `url` as text, applying the cache and status policy.
    fn fetch_text(&self, url: &str, accept: &'static str) -> Result<Option<String>, FetchError> {
        if let Some(body) = self.cache.get(url) {
            debug!(url, "cache hit");
            return Ok(Some(body));
        }

        let request = Request {
            url: url.to_string(),
            accept,
            token: self.token.clone(),
        };
        let response = self.transport.get(&request)?;
        if response.status == 404 {
            debug!(url, "not found");
            return Ok(None);
        }
        if !response.is_success() {
            return Err(FetchError::Status {
                status: response.status,
                url: url.to_string(),
            });
        }

        self.cache.set(url, response.body.clone());
        Ok(Some(response.body))
    }

    fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, FetchError> {
        let Some(body) = self.fetch_text(url, ACCEPT_JSON)? else {
            return Ok(None);
        };
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|source| FetchError::Json {
                url: url.to_string(),
                source,
            })
    }

    pub fn repository(&self, repo: &str) -> Result<Option<RepoInfo>, FetchError> {
        let api: Option<ApiRepository> = self.fetch_json(&self.repo_url(repo))?;
        Ok(api.map(RepoInfo::from))
    }

    pub fn latest_release(&self, repo: &str) -> Result<Option<Release>, FetchError> {
        let url = format!("{}/releases/latest", self.repo_url(repo));
        let api: Option<ApiRelease> = self.fetch_json(&url)?;
        Ok(api.map(Release::from))
    }

    /// Up to `per_page` releases, newest first. A missing repository yields
    /// an empty list.
    pub fn releases(&self, repo: &str, per_page: u32) -> Result<Vec<Release>, FetchError> {
        let url = format!("{}/releases?per_page={}", self.repo_url(repo), per_page);
        let api: Option<Vec<ApiRelease>> = self.fetch_json(&url)?;
        Ok(api
            .unwrap_or_default()
            .into_iter()
            .map(Release::from)
            .collect())
    }

    /// README as raw Markdown.
    pub fn readme(&self, repo: &str) -> Result<Option<String>, FetchError> {
        let url = format!("{}/readme", self.repo_url(repo));
        self.fetch_text(&url, ACCEPT_RAW)
    }

    /// A repository file, decoded from the base64 contents representation.
    ///
    /// A response without content (a directory, say) counts as absent.
    pub fn file_content(&self, repo: &str, path: &str) -> Result<Option<String>, FetchError> {
        let url = format!("{}/contents/{}", self.repo_url(repo), path);
        let Some(api) = self.fetch_json::<ApiContent>(&url)? else {
            return Ok(None);
        };
        let Some(encoded) = api.content else {
            return Ok(None);
        };

        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD.decode(compact).map_err(|e| FetchError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| FetchError::Decode {
                url,
                message: e.to_string(),
            })
    }

    pub fn changelog(&self, repo: &str) -> Result<Option<String>, FetchError> {
        self.file_content(repo, "CHANGELOG.md")
    }

    pub fn roadmap(&self, repo: &str) -> Result<Option<String>, FetchError> {
        self.file_content(repo, "ROADMAP.md")
    }

    /// Open issues (including pull requests); zero for a missing repository.
    pub fn open_issue_count(&self, repo: &str) -> Result<u64, FetchError> {
        Ok(self.repository(repo)?.map_or(0, |info| info.open_issues))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::hosting::cache::{MemoryCache, NoCache};
    use crate::hosting::transport::tests::MockTransport;
    use std::time::Duration;

    pub const API: &str = "https://api.test";

    pub const REPO_JSON: &str = r#"{
        "stargazers_count": 42, "forks_count": 7, "open_issues_count": 3,
        "description": "A tool", "homepage": "", "topics": ["rust", "cli"]
    }"#;

    pub const RELEASE_JSON: &str = r#"{
        "tag_name": "v1.2.0", "name": "Spring", "body": "**Fixed** things",
        "published_at": "2024-05-01T10:00:00Z",
        "html_url": "https://github.com/o/r/releases/tag/v1.2.0"
    }"#;

    /// Contents-endpoint JSON for `text`, wrapped at 60 columns like the API.
    pub fn contents_json(text: &str) -> String {
        let encoded = STANDARD.encode(text);
        let wrapped: Vec<String> = encoded
            .as_bytes()
            .chunks(60)
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect();
        serde_json::json!({ "encoding": "base64", "content": wrapped.join("\n") }).to_string()
    }

    #[test]
    fn repository_maps_api_fields() {
        let transport = MockTransport::new().respond(&format!("{API}/repos/o/r"), 200, REPO_JSON);
        let client = HostingClient::new(&transport, &NoCache, API);

        let info = client.repository("o/r").unwrap().unwrap();
        assert_eq!(info.stars, 42);
        assert_eq!(info.forks, 7);
        assert_eq!(info.open_issues, 3);
        assert_eq!(info.homepage, None);
        assert_eq!(info.topics, vec!["rust", "cli"]);
    }

    #[test]
    fn not_found_is_none() {
        let transport = MockTransport::new();
        let client = HostingClient::new(&transport, &NoCache, API);
        assert_eq!(client.latest_release("o/r").unwrap(), None);
        assert_eq!(client.readme("o/r").unwrap(), None);
        assert_eq!(client.changelog("o/r").unwrap(), None);
        assert!(client.releases("o/r", 10).unwrap().is_empty());
        assert_eq!(client.open_issue_count("o/r").unwrap(), 0);
    }

    #[test]
    fn other_status_is_an_error_with_url() {
        let url = format!("{API}/repos/o/r");
        let transport = MockTransport::new().respond(&url, 403, "rate limited");
        let client = HostingClient::new(&transport, &NoCache, API);

        match client.repository("o/r") {
            Err(FetchError::Status { status, url: got }) => {
                assert_eq!(status, 403);
                assert_eq!(got, url);
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn transport_failure_is_an_error() {
        let transport = MockTransport::new().fail(&format!("{API}/repos/o/r"), "reset");
        let client = HostingClient::new(&transport, &NoCache, API);
        assert!(matches!(
            client.repository("o/r"),
            Err(FetchError::Transport(_))
        ));
    }

    #[test]
    fn invalid_json_is_an_error() {
        let transport = MockTransport::new().respond(&format!("{API}/repos/o/r"), 200, "<html>");
        let client = HostingClient::new(&transport, &NoCache, API);
        assert!(matches!(
            client.repository("o/r"),
            Err(FetchError::Json { .. })
        ));
    }

    #[test]
    fn fresh_cache_hit_skips_the_transport() {
        let url = format!("{API}/repos/o/r");
        let transport = MockTransport::new().respond(&url, 200, REPO_JSON);
        let cache = MemoryCache::new(Duration::from_secs(300));
        let client = HostingClient::new(&transport, &cache, API);

        client.repository("o/r").unwrap();
        client.repository("o/r").unwrap();
        assert_eq!(transport.request_count(&url), 1);
    }

    #[test]
    fn not_found_is_not_cached() {
        let url = format!("{API}/repos/o/r/releases/latest");
        let transport = MockTransport::new();
        let cache = MemoryCache::new(Duration::from_secs(300));
        let client = HostingClient::new(&transport, &cache, API);

        client.latest_release("o/r").unwrap();
        client.latest_release("o/r").unwrap();
        assert_eq!(transport.request_count(&url), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn readme_asks_for_raw_content() {
        let transport =
            MockTransport::new().respond(&format!("{API}/repos/o/r/readme"), 200, "# Hi");
        let client = HostingClient::new(&transport, &NoCache, API);

        assert_eq!(client.readme("o/r").unwrap().as_deref(), Some("# Hi"));
        assert_eq!(transport.get_requests()[0].accept, ACCEPT_RAW);
    }

    #[test]
    fn token_is_attached_to_requests() {
        let transport = MockTransport::new();
        let client =
            HostingClient::new(&transport, &NoCache, API).with_token(Some("secret".to_string()));
        client.readme("o/r").unwrap();
        assert_eq!(transport.get_requests()[0].token.as_deref(), Some("secret"));
    }

    #[test]
    fn empty_token_is_ignored() {
        let transport = MockTransport::new();
        let client = HostingClient::new(&transport, &NoCache, API).with_token(Some(String::new()));
        client.readme("o/r").unwrap();
        assert_eq!(transport.get_requests()[0].token, None);
    }

    #[test]
    fn file_content_decodes_wrapped_base64_utf8() {
        let text = "# Änderungen\n\n- Größere Übersicht, schneller Start und viele kleine Korrekturen\n";
        let transport = MockTransport::new().respond(
            &format!("{API}/repos/o/r/contents/CHANGELOG.md"),
            200,
            &contents_json(text),
        );
        let client = HostingClient::new(&transport, &NoCache, API);
        assert_eq!(client.changelog("o/r").unwrap().as_deref(), Some(text));
    }

    #[test]
    fn invalid_base64_is_a_decode_error() {
        let transport = MockTransport::new().respond(
            &format!("{API}/repos/o/r/contents/ROADMAP.md"),
            200,
            r#"{"content": "!!!not base64"}"#,
        );
        let client = HostingClient::new(&transport, &NoCache, API);
        assert!(matches!(
            client.roadmap("o/r"),
            Err(FetchError::Decode { .. })
        ));
    }

    #[test]
    fn releases_use_per_page() {
        let url = format!("{API}/repos/o/r/releases?per_page=3");
        let transport = MockTransport::new().respond(&url, 200, &format!("[{RELEASE_JSON}]"));
        let client = HostingClient::new(&transport, &NoCache, API);

        let releases = client.releases("o/r", 3).unwrap();
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].title(), "Spring");
    }

    #[test]
    fn open_issue_count_reads_repository() {
        let transport = MockTransport::new().respond(&format!("{API}/repos/o/r"), 200, REPO_JSON);
        let client = HostingClient::new(&transport, &NoCache, API);
        assert_eq!(client.open_issue_count("o/r").unwrap(), 3);
    }
}
