//! Geocoding resolver: cache, static table, then a single coalesced lookup
//!
//! Resolution order for one location string:
//! 1. empty or "remote" is skipped
//! 2. cache (a cached `None` short-circuits too)
//! 3. exact, then partial, match in the known-location table
//! 4. join an identical in-flight lookup if there is one
//! 5. otherwise one external lookup; failures are cached as unresolvable

use super::backend::{GeocodeBackend, GeocodeHit, HttpGeocodeBackend};
use super::cache::{GeocodeCache, GeocodeCacheStats};
use super::{known, GeocodedLocation};
use crate::config::{GeocodingConfig, HttpConfig};
use crate::error::{ExpboardError, Result};
use crate::model::Coordinates;
use crate::outcome::{SkipReason, StageOutcome};
use ahash::AHashSet;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

type PendingLookup = Arc<OnceCell<Option<GeocodedLocation>>>;

/// Cache key for a location string
pub fn normalize_key(text: &str) -> String {
    text.trim().to_lowercase()
}

pub struct GeocodingResolver {
    backend: Arc<dyn GeocodeBackend>,
    cache: Mutex<GeocodeCache>,
    /// In-flight external lookups keyed by normalized location
    pending: Mutex<HashMap<String, PendingLookup>>,
    enabled: bool,
    result_limit: usize,
    batch_size: usize,
    batch_delay: Duration,
}

impl GeocodingResolver {
    pub fn new(backend: Arc<dyn GeocodeBackend>, config: &GeocodingConfig) -> Self {
        Self {
            backend,
            cache: Mutex::new(GeocodeCache::new(config.cache_capacity)),
            pending: Mutex::new(HashMap::new()),
            enabled: config.enabled,
            result_limit: config.result_limit.max(1),
            batch_size: config.batch_size.max(1),
            batch_delay: config.batch_delay(),
        }
    }

    /// Resolver backed by the configured HTTP geocoder
    pub fn from_config(config: &GeocodingConfig, http: &HttpConfig) -> Result<Self> {
        let backend = HttpGeocodeBackend::from_config(config, http)
            .map_err(|e| ExpboardError::Config(format!("Failed to build geocoder: {}", e)))?;
        Ok(Self::new(Arc::new(backend), config))
    }

    /// Resolve one free-text location
    pub async fn resolve(&self, text: &str) -> StageOutcome<GeocodedLocation> {
        match self.resolve_local(text) {
            Some(outcome) => outcome,
            None => self.resolve_external(text.trim()).await,
        }
    }

    /// Everything short of the external geocoder. `None` means a lookup is needed.
    fn resolve_local(&self, text: &str) -> Option<StageOutcome<GeocodedLocation>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Some(StageOutcome::Skipped(SkipReason::EmptyInput));
        }
        if trimmed.eq_ignore_ascii_case("remote") {
            return Some(StageOutcome::Skipped(SkipReason::Remote));
        }

        let key = normalize_key(trimmed);

        if let Some(entry) = self.lock_cache().get(&key) {
            debug!("Geocode cache hit: {}", key);
            return Some(entry.into());
        }

        if let Some(coordinates) = known::exact(&key).or_else(|| known::partial(&key)) {
            let location = GeocodedLocation {
                coordinates,
                display_name: trimmed.to_string(),
            };
            self.lock_cache().put(key, Some(location.clone()));
            return Some(StageOutcome::Resolved(location));
        }

        if !self.enabled {
            return Some(StageOutcome::Skipped(SkipReason::Disabled));
        }

        None
    }

    /// One external lookup per key, shared by every caller asking meanwhile
    async fn resolve_external(&self, trimmed: &str) -> StageOutcome<GeocodedLocation> {
        let key = normalize_key(trimmed);

        let cell = {
            let mut pending = self.lock_pending();
            match pending.get(&key) {
                Some(existing) => {
                    debug!("Joining in-flight geocode lookup: {}", key);
                    Arc::clone(existing)
                }
                None => {
                    let cell: PendingLookup = Arc::new(OnceCell::new());
                    pending.insert(key.clone(), Arc::clone(&cell));
                    cell
                }
            }
        };

        let value = cell
            .get_or_init(|| self.lookup_external(trimmed))
            .await
            .clone();

        self.lock_cache().put(key.clone(), value.clone());
        {
            let mut pending = self.lock_pending();
            if pending
                .get(&key)
                .is_some_and(|current| Arc::ptr_eq(current, &cell))
            {
                pending.remove(&key);
            }
        }

        value.into()
    }

    /// Coordinates for `text`, if it resolves
    pub async fn coordinates(&self, text: &str) -> Option<Coordinates> {
        self.resolve(text).await.resolved().map(|l| l.coordinates)
    }

    /// Resolve many locations. Duplicates are resolved once and every input
    /// string appears in the returned map. Cached and known places answer
    /// immediately; only external lookups run in fixed-size batches with a
    /// pause between batches.
    pub async fn resolve_batch(
        &self,
        texts: &[String],
    ) -> HashMap<String, Option<GeocodedLocation>> {
        let mut seen: AHashSet<&str> = AHashSet::new();
        let unique: Vec<&str> = texts
            .iter()
            .map(String::as_str)
            .filter(|text| seen.insert(*text))
            .collect();

        let mut results = HashMap::with_capacity(unique.len());
        let mut external: Vec<&str> = Vec::new();

        for text in unique.iter().copied() {
            match self.resolve_local(text) {
                Some(outcome) => {
                    results.insert(text.to_string(), outcome.resolved());
                }
                None => external.push(text),
            }
        }

        let batch_count = external.len().div_ceil(self.batch_size);

        for (index, batch) in external.chunks(self.batch_size).enumerate() {
            let resolved = futures::future::join_all(
                batch.iter().map(|text| self.resolve_external(text.trim())),
            )
            .await;

            for (text, outcome) in batch.iter().zip(resolved) {
                results.insert(text.to_string(), outcome.resolved());
            }

            if index + 1 < batch_count && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        info!(
            "Geocoded {} unique locations ({} external, {} batches)",
            unique.len(),
            external.len(),
            batch_count
        );

        results
    }

    pub fn cache_stats(&self) -> GeocodeCacheStats {
        self.lock_cache().stats()
    }

    /// Number of external lookups currently in flight
    pub fn pending_lookups(&self) -> usize {
        self.lock_pending().len()
    }

    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    async fn lookup_external(&self, text: &str) -> Option<GeocodedLocation> {
        match self.backend.lookup(text, self.result_limit).await {
            Ok(hits) => {
                let location = hits.first().and_then(to_location);
                if location.is_none() {
                    debug!("No geocoding result for '{}'", text);
                }
                location
            }
            Err(e) => {
                warn!("Geocoding '{}' failed: {}", text, e);
                None
            }
        }
    }

    fn lock_cache(&self) -> MutexGuard<'_, GeocodeCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<String, PendingLookup>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn to_location(hit: &GeocodeHit) -> Option<GeocodedLocation> {
    let (lat, lng) = hit.coordinates()?;
    Some(GeocodedLocation {
        coordinates: Coordinates::new(lat, lng),
        display_name: hit.short_display_name(),
    })
}
