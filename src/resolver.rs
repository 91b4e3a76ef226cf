//! Resolution resolver
//!
//! Answers "what is the best resolution of this stream URL?" with a TTL cache
//! in front of the playlist probe. Concurrent lookups of the same URL share a
//! single fetch: the first caller starts it and installs an in-flight marker
//! before yielding, later callers wait on the same outcome.
//!
//! The probe runs in its own task, so it completes and fills the cache even
//! when every caller has gone away.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::cache::clock::{Clock, is_fresh};
use crate::client::FetchText;
use crate::config::ResolutionConfig;
use crate::error::FetchError;
use crate::playlist::probe_resolution;

/// Outcome of one probe, shared by every coalesced caller
pub type ResolveOutcome = Result<Option<String>, FetchError>;

type SharedProbe = Shared<BoxFuture<'static, ResolveOutcome>>;

/// A determined resolution.
///
/// `value: None` records that the URL has no resolution (not HLS, or no
/// resolution tag); that answer is cached like any other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionEntry {
    pub value: Option<String>,
    /// Epoch milliseconds of the probe
    pub timestamp: i64,
}

#[derive(Default)]
struct ResolverState {
    cache: HashMap<String, ResolutionEntry>,
    in_flight: HashMap<String, SharedProbe>,
}

struct Inner {
    state: Mutex<ResolverState>,
    fetcher: Arc<dyn FetchText>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, ResolverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fresh cached entry, dropping it if it has expired
    fn lookup(&self, state: &mut ResolverState, url: &str) -> Option<ResolutionEntry> {
        let entry = state.cache.get(url)?;
        if is_fresh(entry.timestamp, self.clock.now_ms(), self.ttl) {
            return Some(entry.clone());
        }
        state.cache.remove(url);
        log::debug!("Resolution expired: {}", url);
        None
    }

    /// Record a finished probe and retire its in-flight marker
    fn settle(&self, url: &str, outcome: &ResolveOutcome) {
        let mut state = self.state();
        state.in_flight.remove(url);

        match outcome {
            Ok(value) => {
                state.cache.insert(
                    url.to_string(),
                    ResolutionEntry {
                        value: value.clone(),
                        timestamp: self.clock.now_ms(),
                    },
                );
            }
            Err(e) => {
                state.cache.remove(url);
                log::debug!("Resolution probe failed for {}: {}", url, e);
            }
        }
    }
}

/// Removes the in-flight marker if the probe task dies before settling
struct InFlightGuard {
    inner: Arc<Inner>,
    url: String,
    armed: bool,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.armed {
            self.inner.state().in_flight.remove(&self.url);
        }
    }
}

/// Shared handle to the resolution resolver
#[derive(Clone)]
pub struct ResolutionResolver {
    inner: Arc<Inner>,
}

impl ResolutionResolver {
    pub fn new(fetcher: Arc<dyn FetchText>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(ResolverState::default()),
                fetcher,
                clock,
                ttl,
            }),
        }
    }

    pub fn from_config(
        config: &ResolutionConfig,
        fetcher: Arc<dyn FetchText>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(fetcher, clock, config.ttl())
    }

    /// Best resolution label for `url`, e.g. `Some("1080p")`.
    ///
    /// Served from cache while fresh. Otherwise joins the probe already in
    /// flight for `url`, or starts one. A failed probe is reported to every
    /// waiting caller and leaves nothing cached.
    pub async fn resolve(&self, url: &str) -> ResolveOutcome {
        let probe = {
            let mut state = self.inner.state();

            if let Some(hit) = self.inner.lookup(&mut state, url) {
                log::debug!("Resolution cache hit: {}", url);
                return Ok(hit.value);
            }

            if let Some(probe) = state.in_flight.get(url).cloned() {
                log::debug!("Joining in-flight probe: {}", url);
                probe
            } else {
                let probe = self.start_probe(url);
                state.in_flight.insert(url.to_string(), probe.clone());
                probe
            }
        };

        probe.await
    }

    /// Like [`resolve`](Self::resolve), but gives up waiting once `token` is
    /// cancelled.
    ///
    /// Cancelling only abandons this caller's wait. The probe keeps running
    /// for other callers and still caches its result.
    pub async fn resolve_with_cancel(&self, url: &str, token: &CancellationToken) -> ResolveOutcome {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                log::debug!("Resolution wait cancelled: {}", url);
                Err(FetchError::Cancelled)
            }
            outcome = self.resolve(url) => outcome,
        }
    }

    /// Resolve many URLs with at most `max_concurrent` probes at once.
    ///
    /// Output order matches `urls`. Failures read as `None`.
    pub async fn resolve_all(&self, urls: &[String], max_concurrent: usize) -> Vec<Option<String>> {
        stream::iter(urls)
            .map(|url| async move {
                match self.resolve(url).await {
                    Ok(value) => value,
                    Err(e) => {
                        log::warn!("Could not resolve {}: {}", url, e);
                        None
                    }
                }
            })
            .buffered(max_concurrent.max(1))
            .collect()
            .await
    }

    /// Fresh cached entry for `url` without probing
    pub fn peek(&self, url: &str) -> Option<ResolutionEntry> {
        let mut state = self.inner.state();
        self.inner.lookup(&mut state, url)
    }

    /// Drop every cached resolution. Probes in flight are left to finish.
    pub fn clear(&self) {
        let mut state = self.inner.state();
        let removed = state.cache.len();
        state.cache.clear();
        log::info!("Cleared resolution cache ({} entries)", removed);
    }

    /// Number of cached resolutions, including expired ones not yet examined
    pub fn len(&self) -> usize {
        self.inner.state().cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn in_flight(&self) -> usize {
        self.inner.state().in_flight.len()
    }

    /// Spawn the probe task. Called with the state lock held, so the task
    /// cannot settle before its marker is installed.
    fn start_probe(&self, url: &str) -> SharedProbe {
        log::debug!("Probing resolution: {}", url);

        let inner = Arc::clone(&self.inner);
        let url = url.to_string();
        let task = tokio::spawn(async move {
            let mut guard = InFlightGuard {
                inner: Arc::clone(&inner),
                url: url.clone(),
                armed: true,
            };

            let outcome = probe_resolution(inner.fetcher.as_ref(), &url).await;
            inner.settle(&url, &outcome);
            guard.armed = false;
            outcome
        });

        async move {
            task.await
                .unwrap_or_else(|e| Err(FetchError::Network(format!("Probe task failed: {}", e))))
        }
        .boxed()
        .shared()
    }
}
