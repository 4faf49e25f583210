//! Response caching for repeated calls.
//!
//! Entries are keyed by operation name and expire after a fixed TTL. Values
//! of any type can be stored; a lookup with the wrong type is a miss.

use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::clock::{Clock, TokioClock};
use crate::config::CacheConfig;
use crate::observability::metrics;

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    inserted_at: Instant,
}

/// A thread-safe TTL cache with a cap on entries.
pub struct ResponseCache {
    inner: DashMap<String, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entries", &self.inner.len())
            .field("ttl", &self.ttl)
            .field("max_entries", &self.max_entries)
            .finish()
    }
}

impl ResponseCache {
    pub fn new(ttl: Duration, max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
            clock,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl(), config.max_entries, Arc::new(TokioClock))
    }

    fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.inserted_at) < self.ttl
    }

    /// Cached value for `key`, if present, fresh and of type `T`.
    pub fn get<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        let now = self.clock.now();
        let expired = match self.inner.get(key) {
            None => {
                metrics::record_cache_lookup(false);
                return None;
            }
            Some(entry) if self.is_fresh(&entry, now) => {
                let value = entry.value.downcast_ref::<T>().cloned();
                metrics::record_cache_lookup(value.is_some());
                return value;
            }
            Some(_) => true,
        };

        // The read guard is gone by now; removing under it would deadlock.
        if expired {
            self.inner.remove(key);
        }
        metrics::record_cache_lookup(false);
        None
    }

    /// Store `value` under `key`, evicting the oldest entry when full.
    pub fn insert<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        let key = key.into();
        if !self.inner.contains_key(&key) && self.inner.len() >= self.max_entries {
            self.purge_expired();
            if self.inner.len() >= self.max_entries {
                self.evict_oldest();
            }
        }

        self.inner.insert(
            key,
            CacheEntry {
                value: Arc::new(value),
                inserted_at: self.clock.now(),
            },
        );
    }

    fn evict_oldest(&self) {
        let oldest = self
            .inner
            .iter()
            .min_by_key(|r| r.value().inserted_at)
            .map(|r| r.key().clone());
        if let Some(key) = oldest {
            tracing::debug!(key = %key, "Evicting oldest cache entry");
            self.inner.remove(&key);
        }
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.inner.len();
        self.inner.retain(|_, entry| now.saturating_duration_since(entry.inserted_at) < self.ttl);
        before.saturating_sub(self.inner.len())
    }

    pub fn invalidate(&self, key: &str) -> bool {
        self.inner.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
