//! Time-bounded memo of leave-validation results.
//!
//! Entries expire after a fixed TTL. When the cache is full the oldest entry
//! is evicted. Lookups use `peek`, so a hit never refreshes an entry's place
//! in the eviction order.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use serde::Serialize;

use crate::config::CacheConfig;
use crate::context::ValidationContext;
use crate::error::ValidationError;

/// A replayable validation result.
#[derive(Debug, Clone)]
pub struct CachedValidation {
    pub valid: bool,
    /// Errors recorded by the call, keyed by field.
    pub errors: Vec<(String, ValidationError)>,
    pub context: ValidationContext,
    stored_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStatistics {
    pub hits: u64,
    pub misses: u64,
    /// Hit percentage, 0 when nothing was looked up yet.
    pub ratio: f64,
    pub size: usize,
}

#[derive(Debug)]
pub struct ValidationCache {
    /// `None` when the capacity is zero and caching is off.
    entries: Option<LruCache<String, CachedValidation>>,
    ttl: Duration,
    hits: u64,
    misses: u64,
}

impl ValidationCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
            ttl,
            hits: 0,
            misses: 0,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(Duration::from_secs(config.ttl_secs), config.capacity)
    }

    /// Look up `key`, dropping the entry if it has expired. Counts a hit or a
    /// miss.
    pub fn get(&mut self, key: &str) -> Option<CachedValidation> {
        let Some(entries) = self.entries.as_mut() else {
            self.misses += 1;
            return None;
        };
        let expired = match entries.peek(key) {
            Some(entry) => entry.stored_at.elapsed() > self.ttl,
            None => {
                self.misses += 1;
                return None;
            }
        };
        if expired {
            entries.pop(key);
            self.misses += 1;
            return None;
        }
        self.hits += 1;
        tracing::debug!(hits = self.hits, misses = self.misses, "validation cache hit");
        entries.peek(key).cloned()
    }

    pub fn insert(
        &mut self,
        key: String,
        valid: bool,
        errors: Vec<(String, ValidationError)>,
        context: ValidationContext,
    ) {
        let Some(entries) = self.entries.as_mut() else {
            return;
        };
        entries.put(
            key,
            CachedValidation {
                valid,
                errors,
                context,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop every entry and reset the hit/miss counters.
    pub fn clear(&mut self) {
        if let Some(entries) = self.entries.as_mut() {
            entries.clear();
        }
        self.hits = 0;
        self.misses = 0;
    }

    pub fn capacity(&self) -> usize {
        self.entries.as_ref().map_or(0, |e| e.cap().get())
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn statistics(&self) -> CacheStatistics {
        let lookups = self.hits + self.misses;
        let ratio = if lookups > 0 {
            self.hits as f64 / lookups as f64 * 100.0
        } else {
            0.0
        };
        CacheStatistics {
            hits: self.hits,
            misses: self.misses,
            ratio,
            size: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_after_insert_and_statistics() {
        let mut cache = ValidationCache::new(Duration::from_secs(60), 10);
        assert!(cache.get("a").is_none());
        cache.insert("a".into(), true, vec![], ValidationContext::default());
        assert!(cache.get("a").unwrap().valid);

        let stats = cache.statistics();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert!((stats.ratio - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn oldest_entry_evicted_past_capacity() {
        let mut cache = ValidationCache::new(Duration::from_secs(60), 2);
        cache.insert("first".into(), true, vec![], ValidationContext::default());
        cache.insert("second".into(), true, vec![], ValidationContext::default());
        cache.insert("third".into(), false, vec![], ValidationContext::default());

        assert_eq!(cache.len(), 2);
        assert!(cache.get("first").is_none());
        assert!(cache.get("second").is_some());
        assert!(cache.get("third").is_some());
    }

    #[test]
    fn hits_do_not_refresh_eviction_order() {
        let mut cache = ValidationCache::new(Duration::from_secs(60), 2);
        cache.insert("first".into(), true, vec![], ValidationContext::default());
        cache.insert("second".into(), true, vec![], ValidationContext::default());
        assert!(cache.get("first").is_some());
        cache.insert("third".into(), true, vec![], ValidationContext::default());

        assert!(cache.get("first").is_none());
        assert!(cache.get("second").is_some());
    }

    #[test]
    fn reinserting_a_key_keeps_one_entry() {
        let mut cache = ValidationCache::new(Duration::from_secs(60), 2);
        cache.insert("a".into(), true, vec![], ValidationContext::default());
        cache.insert("a".into(), false, vec![], ValidationContext::default());
        assert_eq!(cache.len(), 1);
        assert!(!cache.get("a").unwrap().valid);
    }

    #[test]
    fn zero_capacity_never_stores() {
        let mut cache = ValidationCache::new(Duration::from_secs(60), 0);
        cache.insert("a".into(), true, vec![], ValidationContext::default());
        assert_eq!(cache.capacity(), 0);
        assert!(cache.is_empty());
        assert!(cache.get("a").is_none());
        assert_eq!(cache.statistics().misses, 1);
    }

    #[test]
    fn expired_entries_are_misses() {
        let mut cache = ValidationCache::new(Duration::from_millis(1), 10);
        cache.insert("a".into(), true, vec![], ValidationContext::default());
        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.statistics().misses, 1);
    }

    #[test]
    fn clear_resets_counters() {
        let mut cache = ValidationCache::new(Duration::from_secs(60), 10);
        cache.insert("a".into(), true, vec![], ValidationContext::default());
        cache.get("a");
        cache.clear();
        assert_eq!(cache.statistics(), CacheStatistics { hits: 0, misses: 0, ratio: 0.0, size: 0 });
    }
}
