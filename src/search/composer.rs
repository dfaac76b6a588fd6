//! Merges text, semantic and location matching into one ordered result list

use super::filters::Filters;
use crate::geo::GeocodingResolver;
use crate::model::{Candidate, Coordinates, SearchRequest};
use crate::outcome::StageOutcome;
use ahash::{AHashMap, AHashSet};
use std::sync::Arc;
use tracing::debug;

/// Order candidates by the query.
///
/// With semantic ids: semantic hits in oracle order, then the remaining
/// candidates that match the text, in their original order. Without: plain
/// text matching. An empty query keeps everything.
pub fn rank_by_query<'a>(
    candidates: &'a [Candidate],
    query: &str,
    semantic: &StageOutcome<Vec<String>>,
) -> Vec<&'a Candidate> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return candidates.iter().collect();
    }

    let ranked_ids = match semantic.as_resolved() {
        Some(ids) if !ids.is_empty() => ids,
        _ => {
            return candidates
                .iter()
                .filter(|c| c.matches_text(&needle))
                .collect();
        }
    };

    let by_id: AHashMap<&str, &Candidate> =
        candidates.iter().map(|c| (c.id.as_str(), c)).collect();
    let mut seen: AHashSet<&str> = AHashSet::new();
    let mut results = Vec::with_capacity(candidates.len());

    for id in ranked_ids {
        // ids the oracle knows about but that are not in this list are dropped
        if let Some(candidate) = by_id.get(id.as_str()) {
            if seen.insert(candidate.id.as_str()) {
                results.push(*candidate);
            }
        }
    }

    results.extend(
        candidates
            .iter()
            .filter(|c| !seen.contains(c.id.as_str()) && c.matches_text(&needle)),
    );

    results
}

/// Applies the query, location and facet stages in that order
pub struct SearchComposer {
    resolver: Option<Arc<GeocodingResolver>>,
}

impl SearchComposer {
    /// `resolver` is used to place candidates for radius searches; without one
    /// the location stage falls back to text matching.
    pub fn new(resolver: Option<Arc<GeocodingResolver>>) -> Self {
        Self { resolver }
    }

    pub async fn compose<'a>(
        &self,
        candidates: &'a [Candidate],
        request: &SearchRequest,
        semantic: &StageOutcome<Vec<String>>,
        filters: &Filters,
    ) -> Vec<&'a Candidate> {
        let ranked = rank_by_query(candidates, &request.query, semantic);
        let located = self.filter_by_location(ranked, request).await;
        filters.apply(located)
    }

    /// Location stage on its own, order-preserving
    pub async fn filter_by_location<'a>(
        &self,
        candidates: Vec<&'a Candidate>,
        request: &SearchRequest,
    ) -> Vec<&'a Candidate> {
        let location = request.location_text();
        if location.is_empty() {
            return candidates;
        }

        let needle = location.to_lowercase();

        if request.is_remote_location() {
            // radius never applies to a remote search
            return candidates
                .into_iter()
                .filter(|c| c.is_remote() || c.location_contains(&needle))
                .collect();
        }

        match (request.origin, request.radius.km()) {
            (Some(origin), Some(radius_km)) => {
                self.filter_by_radius(candidates, origin, radius_km, &needle)
                    .await
            }
            _ => candidates
                .into_iter()
                .filter(|c| c.location_contains(&needle))
                .collect(),
        }
    }

    async fn filter_by_radius<'a>(
        &self,
        candidates: Vec<&'a Candidate>,
        origin: Coordinates,
        radius_km: f64,
        needle: &str,
    ) -> Vec<&'a Candidate> {
        let places: Vec<String> = candidates
            .iter()
            .filter(|c| !c.is_remote())
            .map(|c| c.location.clone())
            .collect();

        let resolved = match &self.resolver {
            Some(resolver) if !places.is_empty() => resolver.resolve_batch(&places).await,
            _ => Default::default(),
        };

        candidates
            .into_iter()
            .filter(|c| {
                if c.is_remote() {
                    return true;
                }
                match resolved.get(&c.location).and_then(Option::as_ref) {
                    Some(place) => {
                        let distance = origin.distance_to(&place.coordinates);
                        debug!(
                            "Candidate {} is {:.1}km from origin (limit {}km)",
                            c.id, distance, radius_km
                        );
                        distance <= radius_km
                    }
                    None => c.location_contains(needle),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LocationType, Radius};
    use crate::outcome::SkipReason;

    fn ids(results: &[&Candidate]) -> Vec<String> {
        results.iter().map(|c| c.id.clone()).collect()
    }

    fn postings() -> Vec<Candidate> {
        vec![
            Candidate::new("1", "Frontend Developer", "Acme").with_skills(["React"]),
            Candidate::new("2", "Data Analyst", "Numbers Inc"),
            Candidate::new("3", "Backend Developer", "Beta").with_skills(["Rust", "SQL"]),
        ]
    }

    #[test]
    fn test_semantic_order_then_text_matches() {
        let all = postings();
        let semantic = StageOutcome::Resolved(vec!["3".to_string(), "2".to_string()]);

        let ranked = rank_by_query(&all, "developer", &semantic);
        // 3 and 2 from the oracle, then 1 through text matching
        assert_eq!(ids(&ranked), vec!["3", "2", "1"]);
    }

    #[test]
    fn test_semantic_duplicates_and_unknown_ids_dropped() {
        let all = postings();
        let semantic = StageOutcome::Resolved(vec![
            "2".to_string(),
            "99".to_string(),
            "2".to_string(),
        ]);

        let ranked = rank_by_query(&all, "zzz", &semantic);
        assert_eq!(ids(&ranked), vec!["2"]);
    }

    #[test]
    fn test_text_only_when_semantic_skipped() {
        let all = postings();
        let skipped = StageOutcome::Skipped(SkipReason::Unauthenticated);

        assert_eq!(ids(&rank_by_query(&all, "SQL", &skipped)), vec!["3"]);
        assert_eq!(
            ids(&rank_by_query(&all, "", &StageOutcome::Unresolved)),
            vec!["1", "2", "3"]
        );
    }

    #[tokio::test]
    async fn test_location_substring_without_origin() {
        let all = vec![
            Candidate::new("1", "Analyst", "A").with_location("Austin, TX", LocationType::OnSite),
            Candidate::new("2", "Analyst", "B").with_location("Dallas, TX", LocationType::OnSite),
            Candidate::new("3", "Analyst", "C"),
        ];
        let composer = SearchComposer::new(None);
        let request = SearchRequest::new("").with_location("austin", Radius::Km(25));

        let results = composer
            .compose(&all, &request, &StageOutcome::Unresolved, &Filters::new())
            .await;
        // no origin: remote postings get no special treatment
        assert_eq!(ids(&results), vec!["1"]);
    }

    #[tokio::test]
    async fn test_remote_search_ignores_radius() {
        let all = vec![
            Candidate::new("1", "Analyst", "A").with_location("Austin, TX", LocationType::OnSite),
            Candidate::new("2", "Analyst", "B"),
            Candidate::new("3", "Analyst", "C")
                .with_location("Remote (US only)", LocationType::Hybrid),
        ];
        let composer = SearchComposer::new(None);
        let request = SearchRequest::new("")
            .with_location("Remote", Radius::Km(5))
            .with_origin(Coordinates::new(0.0, 0.0));

        let results = composer
            .compose(&all, &request, &StageOutcome::Unresolved, &Filters::new())
            .await;
        assert_eq!(ids(&results), vec!["2", "3"]);
    }

    #[tokio::test]
    async fn test_radius_without_resolver_falls_back_to_text() {
        let all = vec![
            Candidate::new("1", "Analyst", "A").with_location("Austin, TX", LocationType::OnSite),
            Candidate::new("2", "Analyst", "B").with_location("Houston, TX", LocationType::Hybrid),
            Candidate::new("3", "Analyst", "C"),
        ];
        let composer = SearchComposer::new(None);
        let request = SearchRequest::new("")
            .with_location("Austin", Radius::Km(10))
            .with_origin(Coordinates::new(30.2672, -97.7431));

        let results = composer
            .compose(&all, &request, &StageOutcome::Unresolved, &Filters::new())
            .await;
        assert_eq!(ids(&results), vec!["1", "3"]);
    }
}
