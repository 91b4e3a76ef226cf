//! reqwest-backed fetcher

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client as HttpClient;

use super::FetchText;
use crate::config::HttpConfig;
use crate::error::FetchError;

/// HTTP implementation of [`FetchText`].
///
/// Requests are rate limited client-side so a detail screen probing dozens of
/// episode playlists does not hammer a single origin.
pub struct HttpFetcher {
    http: HttpClient,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl HttpFetcher {
    /// Create a fetcher from HTTP settings
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let per_second = NonZeroU32::new(config.requests_per_second)
            .ok_or_else(|| FetchError::Network("requests_per_second must be > 0".to_string()))?;
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));

        Ok(Self { http, rate_limiter })
    }
}

#[async_trait]
impl FetchText for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.rate_limiter.until_ready().await;

        log::debug!("GET {}", url);
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            log::debug!("GET {} returned {}", url, status);
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}
