//! Size- and TTL-bounded page cache.
//!
//! One read-write lock guards the entry map and the size accumulator.
//! Concurrent `set`/`get` on the same key are last-writer-wins.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use super::hash::compute_cache_key;
use crate::clock::{Clock, SystemClock};
use crate::types::{Response, TEXT_GEMINI, TEXT_PLAIN};

/// A cached response.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub url: String,
    pub response: Response,
    pub stored_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    fn size(&self) -> u64 {
        self.response.body.len() as u64
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        older_than(self.stored_at, self.ttl, now)
    }

    /// Eviction threshold: older than half of its own TTL.
    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        older_than(self.stored_at, self.ttl / 2, now)
    }
}

fn older_than(stored_at: DateTime<Utc>, age: Duration, now: DateTime<Utc>) -> bool {
    let age = TimeDelta::from_std(age).unwrap_or(TimeDelta::MAX);
    match stored_at.checked_add_signed(age) {
        Some(deadline) => now > deadline,
        None => false,
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    current_size: u64,
}

impl CacheState {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.current_size -= entry.size();
        Some(entry)
    }
}

/// Page cache keyed by `sha256(url)`.
#[derive(Debug)]
pub struct PageCache {
    state: RwLock<CacheState>,
    max_size: u64,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl PageCache {
    /// Create a cache holding at most `max_size` body bytes.
    pub fn new(max_size: u64, default_ttl: Duration) -> Self {
        Self::with_clock(max_size, default_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(max_size: u64, default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { state: RwLock::new(CacheState::default()), max_size, default_ttl, clock }
    }

    /// Look up a fresh response. Expired entries are reported as misses but kept.
    pub fn get(&self, url: &str) -> Option<Response> {
        let key = compute_cache_key(url);
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let entry = state.entries.get(&key)?;

        if entry.is_expired(self.clock.now()) {
            tracing::debug!(url, "cache entry expired");
            return None;
        }

        Some(entry.response.clone())
    }

    /// Store a response. Non-text responses and inserts that cannot fit are dropped silently.
    ///
    /// A zero `ttl` uses the cache default.
    pub fn set(&self, url: &str, response: &Response, ttl: Duration) {
        if response.meta != TEXT_GEMINI && response.meta != TEXT_PLAIN {
            tracing::debug!(url, meta = %response.meta, "not caching non-text response");
            return;
        }

        let ttl = if ttl.is_zero() { self.default_ttl } else { ttl };
        let key = compute_cache_key(url);
        let entry_size = response.body.len() as u64;
        let now = self.clock.now();

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.remove(&key);

        if state.current_size + entry_size > self.max_size {
            let before = state.entries.len();
            let stale: Vec<String> = state
                .entries
                .iter()
                .filter(|(_, entry)| entry.is_stale(now))
                .map(|(key, _)| key.clone())
                .collect();
            for key in &stale {
                state.remove(key);
            }
            tracing::debug!(evicted = before - state.entries.len(), "cache eviction pass");
        }

        if state.current_size + entry_size > self.max_size {
            tracing::debug!(url, size = entry_size, "cache full, dropping insert");
            return;
        }

        state.current_size += entry_size;
        state
            .entries
            .insert(key, CacheEntry { url: url.to_string(), response: response.clone(), stored_at: now, ttl });
    }

    /// Remove one URL from the cache.
    pub fn invalidate(&self, url: &str) {
        let key = compute_cache_key(url);
        self.state.write().unwrap_or_else(PoisonError::into_inner).remove(&key);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.entries.clear();
        state.current_size = 0;
    }

    /// Total cached body bytes.
    pub fn size(&self) -> u64 {
        self.state.read().unwrap_or_else(PoisonError::into_inner).current_size
    }

    pub fn entry_count(&self) -> usize {
        self.state.read().unwrap_or_else(PoisonError::into_inner).entries.len()
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}
