//! Content listing cache
//!
//! Bounded, time-expiring cache of paginated listing rows, persisted to a
//! [`KeyValueStore`] as one versioned JSON payload.
//!
//! - Expired entries are dropped when examined (lazy expiry on read) and in a
//!   full sweep before every write.
//! - Capacity is enforced by insertion order: rewriting a key moves it to the
//!   back, overflow removes the front. Reads do not change the order.
//! - Persistence is debounced; a burst of writes produces one store write.
//!   Store failures are logged and otherwise ignored.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as AsyncMutex, OnceCell};
use tokio::task::JoinHandle;

use super::clock::{Clock, is_fresh};
use super::storage::KeyValueStore;
use crate::config::ListingConfig;
use crate::error::FetchError;
use crate::models::{ContentType, RowItem};

/// Version of the persisted payload shape. Bump whenever [`PersistedEntry`]
/// changes; older payloads are discarded, never migrated.
pub const PAYLOAD_VERSION: u32 = 1;

/// Fixed store key the payload lives under
pub const STORAGE_KEY: &str = "content_listing_cache";

/// One cached listing page (or accumulated pages)
#[derive(Debug, Clone, PartialEq)]
pub struct CacheItem {
    pub data: Vec<RowItem>,
    /// Epoch milliseconds of the write
    pub timestamp: i64,
    pub content_type: ContentType,
    pub has_more: bool,
}

/// Size and freshness limits
#[derive(Debug, Clone, Copy)]
pub struct ListingLimits {
    pub ttl: Duration,
    pub max_entries: usize,
    pub max_items: usize,
    pub persist_debounce: Duration,
}

impl From<&ListingConfig> for ListingLimits {
    fn from(config: &ListingConfig) -> Self {
        Self {
            ttl: config.ttl(),
            max_entries: config.max_entries.max(1),
            max_items: config.max_items.max(1),
            persist_debounce: config.persist_debounce(),
        }
    }
}

impl Default for ListingLimits {
    fn default() -> Self {
        Self::from(&ListingConfig::default())
    }
}

/// Persisted payload
#[derive(Debug, Serialize, Deserialize)]
struct PersistedPayload {
    version: u32,
    entries: Vec<PersistedEntry>,
}

/// Only the version, read first so a foreign shape is reported as a version
/// mismatch rather than a parse error
#[derive(Debug, Deserialize)]
struct PayloadHeader {
    version: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedEntry {
    key: String,
    data: Vec<RowItem>,
    timestamp: i64,
    /// Kept as a raw literal so unknown types can be sanitized on load
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    has_more: bool,
}

#[derive(Debug, Default)]
struct ListingState {
    entries: HashMap<String, CacheItem>,
    /// Keys in insertion order, oldest first
    order: VecDeque<String>,
}

impl ListingState {
    fn remove(&mut self, key: &str) -> Option<CacheItem> {
        let removed = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(removed)
    }

    fn purge_expired(&mut self, now: i64, ttl: Duration) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, item| is_fresh(item.timestamp, now, ttl));
        let entries = &self.entries;
        self.order.retain(|k| entries.contains_key(k));
        before - self.entries.len()
    }

    /// Insert at the back, evicting from the front while at capacity
    fn insert(&mut self, key: &str, item: CacheItem, max_entries: usize) {
        self.remove(key);
        while self.entries.len() >= max_entries {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            log::debug!("Listing cache full, evicted {}", oldest);
        }
        self.order.push_back(key.to_string());
        self.entries.insert(key.to_string(), item);
    }

    /// Admit entries that predate everything already held.
    ///
    /// They are queued ahead of the current keys, so overflow evicts them
    /// first and never a key written in this process.
    fn admit_older(&mut self, older: Vec<(String, CacheItem)>, max_entries: usize) -> usize {
        let mut queued: VecDeque<String> = VecDeque::with_capacity(older.len());
        for (key, item) in older {
            if self.entries.contains_key(&key) && !queued.contains(&key) {
                continue;
            }
            queued.retain(|k| k != &key);
            queued.push_back(key.clone());
            self.entries.insert(key, item);
        }

        let admitted = queued.len();
        queued.extend(self.order.drain(..));
        self.order = queued;

        while self.entries.len() > max_entries {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            log::debug!("Listing cache full, dropped persisted {}", oldest);
        }
        admitted
    }

    fn snapshot(&self) -> PersistedPayload {
        let entries = self
            .order
            .iter()
            .filter_map(|key| {
                self.entries.get(key).map(|item| PersistedEntry {
                    key: key.clone(),
                    data: item.data.clone(),
                    timestamp: item.timestamp,
                    content_type: item.content_type.as_str().to_string(),
                    has_more: item.has_more,
                })
            })
            .collect();

        PersistedPayload {
            version: PAYLOAD_VERSION,
            entries,
        }
    }
}

struct Inner {
    state: Mutex<ListingState>,
    pending_flush: Mutex<Option<JoinHandle<()>>>,
    /// Snapshot counter, bumped under the state lock
    generation: AtomicU64,
    /// Serializes store writes; holds the generation last written
    written: AsyncMutex<u64>,
    hydration: OnceCell<()>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    limits: ListingLimits,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, ListingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pending_flush(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending_flush
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Write the live entries to the store, swallowing failures.
    ///
    /// Writes are serialized and a snapshot older than the one last written
    /// is dropped, so storage never moves backwards.
    async fn persist(&self) {
        let (generation, payload) = {
            let mut state = self.state();
            state.purge_expired(self.clock.now_ms(), self.limits.ttl);
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            (generation, state.snapshot())
        };

        let json = match serde_json::to_string(&payload) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to serialize listing cache: {}", e);
                return;
            }
        };

        let mut written = self.written.lock().await;
        if *written > generation {
            log::debug!("Skipping superseded listing snapshot {}", generation);
            return;
        }

        match self.store.set(STORAGE_KEY, &json).await {
            Ok(()) => log::debug!("Persisted {} listing entries", payload.entries.len()),
            Err(e) => log::warn!("Failed to persist listing cache: {}", e),
        }
        *written = generation;
    }

    /// Returns whether a valid payload was found and applied
    async fn load(&self) -> bool {
        let raw = match self.store.get(STORAGE_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                log::debug!("No persisted listing cache");
                return false;
            }
            Err(e) => {
                log::warn!("Failed to read persisted listing cache: {}", e);
                return false;
            }
        };

        let Some(payload) = decode_payload(&raw) else {
            return false;
        };

        let now = self.clock.now_ms();
        let older: Vec<(String, CacheItem)> = payload
            .entries
            .into_iter()
            .filter(|entry| is_fresh(entry.timestamp, now, self.limits.ttl))
            .map(|entry| {
                let content_type =
                    ContentType::from_literal(&entry.content_type).unwrap_or_default();
                let mut data = entry.data;
                data.truncate(self.limits.max_items);
                let item = CacheItem {
                    data,
                    timestamp: entry.timestamp,
                    content_type,
                    has_more: entry.has_more,
                };
                (entry.key, item)
            })
            .collect();

        // Writes made before hydration finished are newer than disk
        let mut state = self.state();
        let admitted = state.admit_older(older, self.limits.max_entries);

        let purged = state.purge_expired(now, self.limits.ttl);
        log::info!(
            "Hydrated listing cache: {} admitted, {} purged",
            admitted,
            purged
        );
        true
    }
}

/// Parse a stored payload, rejecting it wholesale on any problem
fn decode_payload(raw: &str) -> Option<PersistedPayload> {
    let header: PayloadHeader = match serde_json::from_str(raw) {
        Ok(header) => header,
        Err(e) => {
            log::warn!("Discarding malformed listing cache payload: {}", e);
            return None;
        }
    };

    if header.version != PAYLOAD_VERSION {
        log::info!(
            "Discarding listing cache payload version {} (expected {})",
            header.version,
            PAYLOAD_VERSION
        );
        return None;
    }

    match serde_json::from_str(raw) {
        Ok(payload) => Some(payload),
        Err(e) => {
            log::warn!("Discarding malformed listing cache payload: {}", e);
            None
        }
    }
}

/// Shared handle to the content listing cache.
///
/// Cloning is cheap; all clones see the same entries.
#[derive(Clone)]
pub struct ContentListingCache {
    inner: Arc<Inner>,
}

impl ContentListingCache {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        limits: ListingLimits,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(ListingState::default()),
                pending_flush: Mutex::new(None),
                generation: AtomicU64::new(0),
                written: AsyncMutex::new(0),
                hydration: OnceCell::new(),
                store,
                clock,
                limits,
            }),
        }
    }

    pub fn limits(&self) -> ListingLimits {
        self.inner.limits
    }

    /// Get a live entry. An expired entry is removed and reported absent.
    pub fn read(&self, key: &str) -> Option<CacheItem> {
        let now = self.inner.clock.now_ms();
        let mut state = self.inner.state();

        let fresh = is_fresh(state.entries.get(key)?.timestamp, now, self.inner.limits.ttl);
        if !fresh {
            state.remove(key);
            log::debug!("Listing cache expired: {}", key);
            return None;
        }

        state.entries.get(key).cloned()
    }

    /// Store a page of rows under `key`, replacing what was there.
    ///
    /// Rows beyond the per-entry cap are dropped from the tail.
    pub fn write(&self, key: &str, content_type: ContentType, data: Vec<RowItem>, has_more: bool) {
        self.put(key, content_type, data, has_more);
    }

    /// Append a further page to the rows cached under `key`.
    ///
    /// The merged list is capped like any other entry, so once the cap is
    /// reached the newest rows are the ones dropped.
    pub fn append(&self, key: &str, content_type: ContentType, items: Vec<RowItem>, has_more: bool) {
        let mut merged = self.read(key).map(|item| item.data).unwrap_or_default();
        merged.extend(items);
        self.write(key, content_type, merged, has_more);
    }

    /// Read-through helper: serve `key` from cache or fetch, store and return it
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        content_type: ContentType,
        fetch: F,
    ) -> Result<CacheItem, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(Vec<RowItem>, bool), FetchError>>,
    {
        if let Some(cached) = self.read(key) {
            log::debug!("Listing cache hit: {}", key);
            return Ok(cached);
        }

        log::debug!("Listing cache miss: {}", key);
        let (data, has_more) = fetch().await?;
        Ok(self.put(key, content_type, data, has_more))
    }

    /// Drop one key
    pub fn remove(&self, key: &str) -> bool {
        let removed = self.inner.state().remove(key).is_some();
        if removed {
            self.schedule_persist();
        }
        removed
    }

    /// Drop everything. Safe to call at any time.
    pub fn clear(&self) {
        let removed = {
            let mut state = self.inner.state();
            let removed = state.entries.len();
            *state = ListingState::default();
            removed
        };
        log::info!("Cleared listing cache ({} entries)", removed);
        self.schedule_persist();
    }

    /// Keys currently held, oldest first (may include not-yet-examined
    /// expired entries)
    pub fn keys(&self) -> Vec<String> {
        self.inner.state().order.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load persisted entries once.
    ///
    /// Concurrent and repeated calls share a single store read. Missing,
    /// malformed or version-mismatched payloads leave the cache untouched.
    pub async fn hydrate(&self) {
        self.inner
            .hydration
            .get_or_init(|| async {
                if self.inner.load().await {
                    // Reconcile storage with what survived sanitizing
                    self.schedule_persist();
                }
            })
            .await;
    }

    pub fn is_hydrated(&self) -> bool {
        self.inner.hydration.initialized()
    }

    /// Persist immediately, cancelling any pending debounced flush
    pub async fn flush(&self) {
        if let Some(pending) = self.inner.pending_flush().take() {
            pending.abort();
        }
        self.inner.persist().await;
    }

    fn put(
        &self,
        key: &str,
        content_type: ContentType,
        mut data: Vec<RowItem>,
        has_more: bool,
    ) -> CacheItem {
        data.truncate(self.inner.limits.max_items);

        let now = self.inner.clock.now_ms();
        let item = CacheItem {
            data,
            timestamp: now,
            content_type,
            has_more,
        };

        {
            let mut state = self.inner.state();
            let purged = state.purge_expired(now, self.inner.limits.ttl);
            if purged > 0 {
                log::debug!("Purged {} expired listing entries", purged);
            }
            state.insert(key, item.clone(), self.inner.limits.max_entries);
        }

        self.schedule_persist();
        item
    }

    /// (Re)arm the debounced flush
    fn schedule_persist(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::debug!("No async runtime, listing cache not persisted");
            return;
        };

        let inner = Arc::clone(&self.inner);
        let delay = self.inner.limits.persist_debounce;

        let mut pending = self.inner.pending_flush();
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        let write_runtime = runtime.clone();
        *pending = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            // Aborting this handle only cancels the wait; a write that has
            // started runs to completion in its own task
            let _ = write_runtime.spawn(async move { inner.persist().await }).await;
        }));
    }
}
