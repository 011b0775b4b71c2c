//! Result cache
//!
//! Results are keyed by `(source, target, SHA-256(input), options
//! fingerprint)`, so two requests share an entry only when they would produce
//! the same output. The cache holds a bounded number of entries and evicts the
//! least recently used one.

use crate::config::TranspileOptions;
use crate::dialects::DialectType;
use crate::transpiler::TranspileResult;
use lru::LruCache;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

/// SHA-256 of `data` as lowercase hex
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source: DialectType,
    pub target: DialectType,
    pub input_digest: String,
    pub options: String,
}

impl CacheKey {
    pub fn new(source: DialectType, target: DialectType, sql: &str, options: &TranspileOptions) -> Self {
        Self {
            source,
            target,
            input_digest: hash_bytes(sql.as_bytes()),
            options: options.fingerprint(),
        }
    }
}

/// Bounded LRU cache of finished results, safe to share between threads
#[derive(Debug)]
pub struct TranspileCache {
    capacity: usize,
    /// `None` when the capacity is zero
    entries: Mutex<Option<LruCache<CacheKey, Arc<TranspileResult>>>>,
}

impl TranspileCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(NonZeroUsize::new(capacity).map(LruCache::new)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .map_or(0, |entries| entries.as_ref().map_or(0, |cache| cache.len()))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<TranspileResult>> {
        let mut entries = self.entries.lock().ok()?;
        entries.as_mut()?.get(key).cloned()
    }

    pub fn insert(&self, key: CacheKey, result: Arc<TranspileResult>) {
        if let Ok(mut entries) = self.entries.lock() {
            if let Some(entries) = entries.as_mut() {
                entries.put(key, result);
            }
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            if let Some(entries) = entries.as_mut() {
                entries.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(sql: &str) -> Arc<TranspileResult> {
        Arc::new(TranspileResult::empty(DialectType::Oracle, DialectType::Databricks, sql))
    }

    fn key(sql: &str) -> CacheKey {
        CacheKey::new(DialectType::Oracle, DialectType::Databricks, sql, &TranspileOptions::default())
    }

    #[test]
    fn test_hash_bytes() {
        assert_eq!(
            hash_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_key_tracks_options() {
        let mut options = TranspileOptions::default();
        options.default_schema = Some("s".into());
        let other = CacheKey::new(DialectType::Oracle, DialectType::Databricks, "SELECT 1", &options);
        assert_ne!(key("SELECT 1"), other);
        assert_eq!(key("SELECT 1"), key("SELECT 1"));
    }

    #[test]
    fn test_least_recently_used_is_evicted() {
        let cache = TranspileCache::new(2);
        cache.insert(key("a"), result("a"));
        cache.insert(key("b"), result("b"));
        assert!(cache.get(&key("a")).is_some());
        cache.insert(key("c"), result("c"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("b")).is_none());
        assert_eq!(cache.get(&key("a")).map(|r| r.sql.clone()), Some("a".to_string()));
    }

    #[test]
    fn test_reinsert_refreshes_entry() {
        let cache = TranspileCache::new(2);
        cache.insert(key("a"), result("a"));
        cache.insert(key("b"), result("b"));
        cache.insert(key("a"), result("a2"));
        cache.insert(key("c"), result("c"));
        assert!(cache.get(&key("b")).is_none());
        assert_eq!(cache.get(&key("a")).map(|r| r.sql.clone()), Some("a2".to_string()));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 2);
    }

    #[test]
    fn test_zero_capacity_disables_caching() {
        let cache = TranspileCache::new(0);
        cache.insert(key("a"), result("a"));
        assert!(cache.is_empty());
    }
}
