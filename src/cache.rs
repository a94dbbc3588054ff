//! Short-TTL memoization of query results.
//!
//! Keyed by the exact (query, exact_match, include_subfolders) tuple; no
//! partial or prefix reuse. Entries self-invalidate on read once older than
//! the TTL and are overwritten on recompute, so no eviction sweep exists.
//! Growth is bounded by the set of distinct queries actually issued.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::models::SearchHit;

pub const CACHE_TTL: Duration = Duration::from_secs(300);

type CacheKey = (String, bool, bool);

struct CacheEntry {
    computed_at: Instant,
    hits: Vec<SearchHit>,
}

pub struct SearchCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl SearchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached hits if a live entry exists. An expired entry is
    /// treated as a miss; the caller recomputes and overwrites it.
    pub fn get(&self, query: &str, exact_match: bool, include_subfolders: bool) -> Option<Vec<SearchHit>> {
        let entries = self.entries.lock().unwrap();
        let entry = entries.get(&(query.to_string(), exact_match, include_subfolders))?;
        if entry.computed_at.elapsed() < self.ttl {
            Some(entry.hits.clone())
        } else {
            None
        }
    }

    pub fn insert(
        &self,
        query: &str,
        exact_match: bool,
        include_subfolders: bool,
        hits: Vec<SearchHit>,
    ) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            (query.to_string(), exact_match, include_subfolders),
            CacheEntry {
                computed_at: Instant::now(),
                hits,
            },
        );
    }
}
