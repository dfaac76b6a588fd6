//! Bounded LRU cache of geocoding results
//!
//! A cached `None` records a place known to be unresolvable so it is not
//! looked up again.

use super::GeocodedLocation;
use lru::LruCache;
use std::num::NonZeroUsize;

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeocodeCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub capacity: usize,
}

impl GeocodeCacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct GeocodeCache {
    entries: LruCache<String, Option<GeocodedLocation>>,
    hits: u64,
    misses: u64,
}

impl GeocodeCache {
    /// Capacity of zero is raised to one
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Outer `None` is a miss; `Some(None)` is a cached "unresolvable".
    pub fn get(&mut self, key: &str) -> Option<Option<GeocodedLocation>> {
        match self.entries.get(key) {
            Some(entry) => {
                self.hits += 1;
                Some(entry.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn put(&mut self, key: String, value: Option<GeocodedLocation>) {
        self.entries.put(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> GeocodeCacheStats {
        GeocodeCacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
            capacity: self.entries.cap().get(),
        }
    }
}
