//! Network collaborator
//!
//! Everything in the crate that touches the network goes through
//! [`FetchText`], so caches and parsers can be exercised against
//! [`MockFetcher`] in tests.

use async_trait::async_trait;

use crate::error::FetchError;

pub mod http;
#[cfg(test)]
pub mod mock;

pub use http::HttpFetcher;
#[cfg(test)]
pub use mock::MockFetcher;

/// Fetch the body of a URL as text.
///
/// Implementations fail with [`FetchError`] on non-success statuses and on
/// connectivity problems. They never retry.
#[async_trait]
pub trait FetchText: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}
