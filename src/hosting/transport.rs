//! The HTTP seam of the hosting client.
//!
//! [`Transport`] performs exactly one GET request and reports the status and
//! body. It knows nothing about status semantics, caching or JSON; those
//! live in [`HostingClient`](super::client::HostingClient). The production
//! implementation is [`HttpTransport`](super::http::HttpTransport); tests
//! use `MockTransport`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(String),
}

/// Media type for JSON API responses.
pub const ACCEPT_JSON: &str = "application/vnd.github.v3+json";
/// Media type asking the API for a file's raw content.
pub const ACCEPT_RAW: &str = "application/vnd.github.raw";

/// A GET request against the hosting API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub accept: &'static str,
    /// Sent as `Authorization: Bearer <token>` when present.
    pub token: Option<String>,
}

/// Status and body text of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs HTTP GET requests.
///
/// `Sync` so one transport can serve the rayon fan-out in
/// [`snapshot`](crate::snapshot).
pub trait Transport: Sync {
    fn get(&self, request: &Request) -> Result<Response, TransportError>;
}
