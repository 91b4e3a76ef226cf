//! Mock fetcher for testing
//!
//! Serves canned bodies per URL and counts calls so tests can assert how many
//! network round-trips a cache actually made.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::FetchText;
use crate::error::FetchError;

/// Mock network collaborator.
///
/// # Example
/// ```ignore
/// let mock = MockFetcher::new().with_body("http://x/a.m3u8", "#EXTM3U");
/// let text = mock.fetch_text("http://x/a.m3u8").await?;
/// assert_eq!(mock.calls("http://x/a.m3u8"), 1);
/// ```
#[derive(Clone, Default)]
pub struct MockFetcher {
    /// Bodies to return per URL
    bodies: Arc<Mutex<HashMap<String, String>>>,
    /// Errors per URL - consumed on first use
    errors: Arc<Mutex<HashMap<String, FetchError>>>,
    /// Calls made per URL
    calls: Arc<Mutex<HashMap<String, usize>>>,
    /// Artificial latency applied to every fetch
    delay: Option<Duration>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`
    pub fn with_body(self, url: &str, body: &str) -> Self {
        self.set_body(url, body);
        self
    }

    /// Fail the next fetch of `url` with `error`
    pub fn with_error(self, url: &str, error: FetchError) -> Self {
        self.errors
            .lock()
            .unwrap()
            .insert(url.to_string(), error);
        self
    }

    /// Delay every response by `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace the body served for `url`
    pub fn set_body(&self, url: &str, body: &str) {
        self.bodies
            .lock()
            .unwrap()
            .insert(url.to_string(), body.to_string());
    }

    /// Number of fetches issued for `url`
    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    /// Number of fetches issued for any URL
    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl FetchText for MockFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.errors.lock().unwrap().remove(url) {
            return Err(error);
        }

        self.bodies
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or(FetchError::Status(404))
    }
}
