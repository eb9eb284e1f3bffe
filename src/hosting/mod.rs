//! Remote metadata fetching from a GitHub-compatible hosting API.
//!
//! | Module | Role |
//! |---|---|
//! | [`transport`] | one GET request; the seam tests replace |
//! | [`http`] | reqwest-backed production transport |
//! | [`cache`] | per-URL freshness cache |
//! | [`client`] | typed endpoints and the not-found policy |

pub mod cache;
pub mod client;
pub mod http;
pub mod transport;

pub use cache::{MemoryCache, NoCache, ResponseCache};
pub use client::{FetchError, HostingClient};
pub use http::HttpTransport;
pub use transport::{Request, Response, Transport, TransportError};
