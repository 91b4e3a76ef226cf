//! Detail aggregate cache
//!
//! In-memory cache of a title's resolved sources, episodes and resolution
//! data, keyed by the search query used to look the title up. Entries expire
//! after a TTL; when the cache overflows, the entry with the smallest
//! timestamp is evicted (one entry per insertion).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::clock::{Clock, is_fresh};
use crate::config::DetailConfig;
use crate::models::{SearchResult, SourceSummary};

/// One cached title aggregate
#[derive(Debug, Clone, PartialEq)]
pub struct DetailEntry {
    /// Epoch milliseconds of the last write
    pub timestamp: i64,
    /// The result the user picked, if any
    pub detail: Option<SearchResult>,
    pub search_results: Vec<SearchResult>,
    pub sources: Vec<SourceSummary>,
    /// Whether every source finished answering when this was written
    pub all_sources_loaded: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct DetailLimits {
    pub ttl: Duration,
    pub max_entries: usize,
}

impl From<&DetailConfig> for DetailLimits {
    fn from(config: &DetailConfig) -> Self {
        Self {
            ttl: config.ttl(),
            max_entries: config.max_entries.max(1),
        }
    }
}

impl Default for DetailLimits {
    fn default() -> Self {
        Self::from(&DetailConfig::default())
    }
}

struct Slot {
    entry: DetailEntry,
    // Breaks timestamp ties in favour of the earlier write
    seq: u64,
}

#[derive(Default)]
struct DetailState {
    slots: HashMap<String, Slot>,
    next_seq: u64,
}

impl DetailState {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Evict the single oldest entry other than `keep`
    fn evict_oldest(&mut self, keep: &str) -> Option<String> {
        let oldest = self
            .slots
            .iter()
            .filter(|(key, _)| key.as_str() != keep)
            .min_by_key(|(_, slot)| (slot.entry.timestamp, slot.seq))
            .map(|(key, _)| key.clone())?;
        self.slots.remove(&oldest);
        Some(oldest)
    }
}

/// Cache of per-title detail aggregates
pub struct DetailAggregateCache {
    state: Mutex<DetailState>,
    clock: Arc<dyn Clock>,
    limits: DetailLimits,
}

impl DetailAggregateCache {
    pub fn new(clock: Arc<dyn Clock>, limits: DetailLimits) -> Self {
        Self {
            state: Mutex::new(DetailState::default()),
            clock,
            limits,
        }
    }

    fn state(&self) -> MutexGuard<'_, DetailState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a live entry. An expired entry is removed and reported absent.
    pub fn read(&self, key: &str) -> Option<DetailEntry> {
        let now = self.clock.now_ms();
        let mut state = self.state();

        let timestamp = state.slots.get(key)?.entry.timestamp;
        if !is_fresh(timestamp, now, self.limits.ttl) {
            state.slots.remove(key);
            log::debug!("Detail cache expired: {}", key);
            return None;
        }

        state.slots.get(key).map(|slot| slot.entry.clone())
    }

    /// Store an aggregate under `key`.
    ///
    /// The arguments are copied; later changes to the caller's values never
    /// reach the cache.
    pub fn write(
        &self,
        key: &str,
        detail: Option<&SearchResult>,
        search_results: &[SearchResult],
        sources: &[SourceSummary],
        all_sources_loaded: bool,
    ) -> DetailEntry {
        let entry = DetailEntry {
            timestamp: self.clock.now_ms(),
            detail: detail.cloned(),
            search_results: search_results.to_vec(),
            sources: sources.to_vec(),
            all_sources_loaded,
        };

        let mut state = self.state();
        let seq = state.next_seq();
        state.slots.insert(
            key.to_string(),
            Slot {
                entry: entry.clone(),
                seq,
            },
        );

        if state.slots.len() > self.limits.max_entries {
            if let Some(evicted) = state.evict_oldest(key) {
                log::debug!("Detail cache full, evicted {}", evicted);
            }
        }

        entry
    }

    /// Record that the source fan-out for `key` has finished.
    ///
    /// Replaces the source list, sets the completion flag and refreshes the
    /// timestamp. Returns `false` when there is no live entry to update.
    pub fn mark_all_sources_loaded(&self, key: &str, sources: &[SourceSummary]) -> bool {
        let now = self.clock.now_ms();
        let mut state = self.state();

        let live = state
            .slots
            .get(key)
            .is_some_and(|slot| is_fresh(slot.entry.timestamp, now, self.limits.ttl));
        if !live {
            state.slots.remove(key);
            return false;
        }

        let seq = state.next_seq();
        let Some(slot) = state.slots.get_mut(key) else {
            return false;
        };
        slot.entry.sources = sources.to_vec();
        slot.entry.all_sources_loaded = true;
        slot.entry.timestamp = now;
        slot.seq = seq;
        true
    }

    pub fn remove(&self, key: &str) -> bool {
        self.state().slots.remove(key).is_some()
    }

    /// Drop everything. Safe to call at any time.
    pub fn clear(&self) {
        let mut state = self.state();
        let removed = state.slots.len();
        state.slots.clear();
        log::info!("Cleared detail cache ({} entries)", removed);
    }

    /// Number of held entries, including expired ones not yet examined
    pub fn len(&self) -> usize {
        self.state().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;

    const T0: i64 = 1_700_000_000_000;

    fn setup(max_entries: usize) -> (DetailAggregateCache, ManualClock) {
        let clock = ManualClock::new(T0);
        let limits = DetailLimits {
            ttl: Duration::from_secs(600),
            max_entries,
        };
        (DetailAggregateCache::new(Arc::new(clock.clone()), limits), clock)
    }

    fn result(source: &str) -> SearchResult {
        SearchResult {
            id: format!("{}-1", source),
            title: "Arrival".to_string(),
            source: source.to_string(),
            source_name: source.to_uppercase(),
            episodes: vec![format!("https://{}.example/ep1.m3u8", source)],
            episode_titles: vec!["EP1".to_string()],
            resolution: Some("1080p".to_string()),
            ..Default::default()
        }
    }

    fn write_simple(cache: &DetailAggregateCache, key: &str) {
        cache.write(key, None, &[result("a")], &[], false);
    }

    #[test]
    fn test_write_then_read() {
        let (cache, _clock) = setup(20);
        let results = vec![result("a"), result("b")];
        let sources: Vec<SourceSummary> = results.iter().map(SourceSummary::from).collect();

        cache.write("arrival", Some(&results[0]), &results, &sources, true);

        let entry = cache.read("arrival").unwrap();
        assert_eq!(entry.timestamp, T0);
        assert_eq!(entry.detail, Some(result("a")));
        assert_eq!(entry.search_results, results);
        assert_eq!(entry.sources, sources);
        assert!(entry.all_sources_loaded);
    }

    #[test]
    fn test_expiry_boundary() {
        let (cache, clock) = setup(20);
        write_simple(&cache, "k");

        clock.set(T0 + 600_000 - 1);
        assert!(cache.read("k").is_some());

        clock.set(T0 + 600_000 + 1);
        assert!(cache.read("k").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_write_copies_arguments() {
        let (cache, _clock) = setup(20);
        let mut detail = result("a");
        let mut results = vec![result("a")];
        let mut sources = vec![SourceSummary::from(&results[0])];

        cache.write("k", Some(&detail), &results, &sources, false);

        detail.title = "Changed".to_string();
        results[0].episodes.clear();
        results.push(result("z"));
        sources[0].resolution = None;

        let entry = cache.read("k").unwrap();
        assert_eq!(entry.detail.unwrap().title, "Arrival");
        assert_eq!(entry.search_results, vec![result("a")]);
        assert_eq!(entry.sources[0].resolution.as_deref(), Some("1080p"));
    }

    #[test]
    fn test_returned_entries_are_independent() {
        let (cache, _clock) = setup(20);
        write_simple(&cache, "k");

        let mut first = cache.read("k").unwrap();
        first.search_results.clear();

        assert_eq!(cache.read("k").unwrap().search_results.len(), 1);
    }

    #[test]
    fn test_overflow_evicts_smallest_timestamp() {
        let (cache, clock) = setup(3);
        for key in ["a", "b", "c"] {
            write_simple(&cache, key);
            clock.advance(Duration::from_millis(10));
        }

        // Rewriting "a" gives it the newest timestamp
        write_simple(&cache, "a");
        clock.advance(Duration::from_millis(10));
        write_simple(&cache, "d");

        assert_eq!(cache.len(), 3);
        assert!(cache.read("b").is_none());
        assert!(cache.read("a").is_some());
        assert!(cache.read("c").is_some());
        assert!(cache.read("d").is_some());
    }

    #[test]
    fn test_overflow_evicts_exactly_one() {
        let (cache, clock) = setup(2);
        write_simple(&cache, "a");
        clock.advance(Duration::from_millis(1));
        write_simple(&cache, "b");
        clock.advance(Duration::from_millis(1));
        write_simple(&cache, "c");

        assert_eq!(cache.len(), 2);
        assert!(cache.read("a").is_none());
    }

    #[test]
    fn test_same_millisecond_writes_evict_earliest() {
        let (cache, _clock) = setup(2);
        for key in ["a", "b", "c"] {
            write_simple(&cache, key);
        }

        assert!(cache.read("a").is_none());
        assert!(cache.read("b").is_some());
        assert!(cache.read("c").is_some());
    }

    #[test]
    fn test_mark_all_sources_loaded() {
        let (cache, clock) = setup(20);
        cache.write("k", None, &[result("a")], &[], false);
        clock.advance(Duration::from_secs(300));

        let sources = vec![SourceSummary::from(&result("a")), SourceSummary::from(&result("b"))];
        assert!(cache.mark_all_sources_loaded("k", &sources));

        let entry = cache.read("k").unwrap();
        assert!(entry.all_sources_loaded);
        assert_eq!(entry.sources, sources);
        assert_eq!(entry.timestamp, T0 + 300_000);
        assert_eq!(entry.search_results.len(), 1);
    }

    #[test]
    fn test_mark_all_sources_loaded_needs_live_entry() {
        let (cache, clock) = setup(20);
        assert!(!cache.mark_all_sources_loaded("missing", &[]));

        write_simple(&cache, "k");
        clock.advance(Duration::from_secs(601));

        assert!(!cache.mark_all_sources_loaded("k", &[]));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_remove_and_clear() {
        let (cache, _clock) = setup(20);
        write_simple(&cache, "a");
        write_simple(&cache, "b");

        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));

        cache.clear();
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.read("b").is_none());
    }
}
