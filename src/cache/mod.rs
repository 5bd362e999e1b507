//! # Analysis Result Cache
//!
//! Concurrent key/value store mapping a deterministic schema fingerprint to a
//! previously accepted analysis result. Keys embed the schema hash, so any
//! schema change invalidates entries implicitly. Expiry is lazy: an entry
//! whose TTL has elapsed is treated as a miss on read and becomes eligible
//! for overwrite. Failures are never cached.

use crate::models::{AnalysisCategory, TableDescriptor};
use crate::orchestration::types::AnalysisResult;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Derive the cache key for a (table, category) pair: `{table_id}_{category}_{schema_hash}`
pub fn cache_key(table: &TableDescriptor, category: AnalysisCategory) -> String {
    format!(
        "{}_{}_{}",
        table.table_id,
        category,
        table.schema_fingerprint()
    )
}

/// A cached analysis result. Immutable once written; superseded entries are
/// overwritten, not patched.
#[derive(Debug, Clone)]
struct CacheEntry {
    result: AnalysisResult,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}

/// Concurrent analysis cache with lazy TTL expiry.
///
/// Distinct keys never contend; a write racing a read on the same key
/// resolves as last-write-wins.
#[derive(Debug)]
pub struct AnalysisCache {
    entries: DashMap<String, CacheEntry>,
    default_ttl: Duration,
}

impl AnalysisCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    /// Fetch a fresh entry. An expired entry is reported as a miss and left
    /// in place until overwritten, so the stale-results fallback can still
    /// reach it.
    pub fn get(&self, key: &str) -> Option<AnalysisResult> {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                debug!(key = %key, "Cache entry expired on read");
                None
            }
            Some(entry) => Some(entry.result.clone()),
            None => None,
        }
    }

    /// Fetch an entry regardless of TTL. Used only by the stale-results
    /// fallback when the upstream is degraded; normal reads go through
    /// [`AnalysisCache::get`].
    pub fn get_stale(&self, key: &str) -> Option<AnalysisResult> {
        self.entries.get(key).map(|entry| entry.result.clone())
    }

    /// Store a result under the default TTL
    pub fn put(&self, key: String, result: AnalysisResult) {
        self.put_with_ttl(key, result, self.default_ttl);
    }

    /// Store a result with an explicit TTL
    pub fn put_with_ttl(&self, key: String, result: AnalysisResult, ttl: Duration) {
        self.entries.insert(
            key,
            CacheEntry {
                result,
                created_at: Instant::now(),
                ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
