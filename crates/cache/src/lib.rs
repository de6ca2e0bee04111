//! Bounded response cache: LRU eviction plus per-entry expiry.
//!
//! Keys are normalized (trim + lowercase) by the cache itself, so callers
//! never have to pre-normalize. Values are plan-shaped JSON; the entry
//! timestamp lives beside the value and is never visible to readers.

use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_MAX_SIZE: usize = 200;
pub const DEFAULT_TTL: Duration = Duration::from_secs(7200);

struct CacheEntry {
    value: Value,
    cached_at: Instant,
}

/// LRU + TTL cache for instant repeated answers.
///
/// One coarse lock guards every read/write/evict sequence; all operations
/// are O(1). Two concurrent misses for the same key both fall through to
/// the caller; there is no request coalescing.
pub struct ResponseCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    max_size: usize,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_size.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            max_size: max_size.max(1),
            ttl,
        }
    }

    /// Look up a cached response. Expired entries are purged on the spot
    /// and reported as absent; hits are promoted to most-recently-used.
    pub fn get(&self, key: &str) -> Option<Value> {
        let key = normalize(key);
        let mut entries = self.entries.lock();

        let expired = match entries.peek(&key) {
            None => return None,
            Some(entry) => entry.cached_at.elapsed() > self.ttl,
        };

        if expired {
            entries.pop(&key);
            debug!("cache expired: {}", truncate(&key));
            return None;
        }

        let entry = entries.get(&key)?;
        debug!("cache hit: {}", truncate(&key));
        Some(entry.value.clone())
    }

    /// Store a response. Replaces any existing entry for the key; when the
    /// cache is full the single least-recently-used entry is evicted.
    pub fn set(&self, key: &str, value: Value) {
        let key = normalize(key);
        let mut entries = self.entries.lock();

        let was_full = entries.len() == self.max_size && !entries.contains(&key);
        entries.put(
            key.clone(),
            CacheEntry {
                value,
                cached_at: Instant::now(),
            },
        );
        if was_full {
            debug!("cache evicted least-recently-used entry");
        }
        debug!("cache set: {}", truncate(&key));
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
        debug!("cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.len(),
            max_size: self.max_size,
            ttl_seconds: self.ttl.as_secs(),
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE, DEFAULT_TTL)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub ttl_seconds: u64,
}

fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}

fn truncate(key: &str) -> &str {
    let mut cut = key.len().min(50);
    while !key.is_char_boundary(cut) {
        cut -= 1;
    }
    &key[..cut]
}
