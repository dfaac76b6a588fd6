//! Opportunity search pipeline
//!
//! query -> semantic ranking -> origin geocoding -> composition -> facets -> pages
//!
//! Every external stage degrades instead of failing; what happened is reported
//! in [`SearchDiagnostics`]. Each search is stamped with a [`Generation`] so a
//! caller that started a newer search can drop stale answers.

mod composer;
mod filters;
mod paginate;

pub use composer::{rank_by_query, SearchComposer};
pub use filters::{FacetValue, Filters};
pub use paginate::{paginate, total_pages, Page, PageState};

use crate::config::Config;
use crate::error::Result;
use crate::geo::{GeocodedLocation, GeocodingResolver};
use crate::model::{Candidate, SearchRequest};
use crate::outcome::{SkipReason, StageOutcome};
use crate::semantic::SemanticMatcher;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Monotonic search sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// What each optional stage did during one search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchDiagnostics {
    pub semantic: StageOutcome<usize>,
    pub origin: StageOutcome<GeocodedLocation>,
    pub processing_time_ms: u64,
}

impl SearchDiagnostics {
    /// Transient failure messages worth surfacing as a notice
    pub fn notices(&self) -> Vec<&str> {
        [self.semantic.failure(), self.origin.failure()]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Results of one search, ordered and deduplicated
#[derive(Debug, Clone)]
pub struct SearchResults<'a> {
    pub generation: Generation,
    /// The request as executed, with `origin` filled in when it was resolved
    pub request: SearchRequest,
    pub candidates: Vec<&'a Candidate>,
    pub diagnostics: SearchDiagnostics,
}

impl<'a> SearchResults<'a> {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn page(&self, page_size: usize, page: usize) -> Page<'_, &'a Candidate> {
        paginate(&self.candidates, page_size, page)
    }
}

/// Runs searches over a candidate list
pub struct SearchService {
    matcher: SemanticMatcher,
    resolver: Option<Arc<GeocodingResolver>>,
    composer: SearchComposer,
    latest: AtomicU64,
}

impl SearchService {
    pub fn new(matcher: SemanticMatcher, resolver: Option<Arc<GeocodingResolver>>) -> Self {
        let composer = SearchComposer::new(resolver.clone());
        Self {
            matcher,
            resolver,
            composer,
            latest: AtomicU64::new(0),
        }
    }

    /// Service wired to the configured HTTP geocoder and semantic oracle
    pub fn from_config(config: &Config) -> Result<Self> {
        let resolver = GeocodingResolver::from_config(&config.geocoding, &config.http)?;
        let matcher = SemanticMatcher::from_config(&config.semantic, &config.http)?;
        Ok(Self::new(matcher, Some(Arc::new(resolver))))
    }

    pub fn resolver(&self) -> Option<&Arc<GeocodingResolver>> {
        self.resolver.as_ref()
    }

    pub fn matcher_mut(&mut self) -> &mut SemanticMatcher {
        &mut self.matcher
    }

    /// Start a new search, superseding all earlier ones
    pub fn begin(&self) -> Generation {
        Generation(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.latest.load(Ordering::SeqCst) == generation.0
    }

    /// Run one search. Returns `None` when a newer search began while this one
    /// was waiting on an external service.
    pub async fn search<'a>(
        &self,
        candidates: &'a [Candidate],
        request: &SearchRequest,
        filters: &Filters,
    ) -> Option<SearchResults<'a>> {
        let generation = self.begin();
        self.search_as(generation, candidates, request, filters).await
    }

    /// Run a search under a generation obtained from [`SearchService::begin`]
    pub async fn search_as<'a>(
        &self,
        generation: Generation,
        candidates: &'a [Candidate],
        request: &SearchRequest,
        filters: &Filters,
    ) -> Option<SearchResults<'a>> {
        let start = Instant::now();
        let mut request = request.clone();

        let location_hint = Some(request.location_text()).filter(|l| !l.is_empty());
        let semantic = self
            .matcher
            .match_query(request.query_text(), location_hint)
            .await;

        let origin = self.resolve_origin(&mut request).await;

        if !self.is_current(generation) {
            debug!("Discarding stale search {}", generation.value());
            return None;
        }

        let results = self
            .composer
            .compose(candidates, &request, &semantic, filters)
            .await;

        if !self.is_current(generation) {
            debug!("Discarding stale search {}", generation.value());
            return None;
        }

        let diagnostics = SearchDiagnostics {
            semantic: match &semantic {
                StageOutcome::Resolved(ids) => StageOutcome::Resolved(ids.len()),
                StageOutcome::Unresolved => StageOutcome::Unresolved,
                StageOutcome::Skipped(reason) => StageOutcome::Skipped(reason.clone()),
            },
            origin,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "Search {} matched {} of {} candidates in {}ms",
            generation.value(),
            results.len(),
            candidates.len(),
            diagnostics.processing_time_ms
        );

        Some(SearchResults {
            generation,
            request,
            candidates: results,
            diagnostics,
        })
    }

    /// Fill in `origin` from the location text when the caller did not supply it
    async fn resolve_origin(&self, request: &mut SearchRequest) -> StageOutcome<GeocodedLocation> {
        if let Some(origin) = request.origin {
            return StageOutcome::Resolved(GeocodedLocation {
                coordinates: origin,
                display_name: request.location_text().to_string(),
            });
        }
        if request.radius.km().is_none() {
            // any distance: the location is matched as text only
            return StageOutcome::Skipped(SkipReason::NotRequested);
        }

        let Some(resolver) = &self.resolver else {
            return StageOutcome::Skipped(SkipReason::Disabled);
        };

        let outcome = resolver.resolve(request.location_text()).await;
        if let Some(location) = outcome.as_resolved() {
            request.origin = Some(location.coordinates);
        }
        outcome
    }
}
