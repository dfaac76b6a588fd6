//! Facet filters: OR within a facet, AND across facets

use crate::error::{ExpboardError, Result};
use crate::model::{Candidate, DurationLabel, Industry, LocationType, SkillLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One selectable facet value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacetValue {
    Industry(Industry),
    SkillLevel(SkillLevel),
    LocationType(LocationType),
    Duration(DurationLabel),
}

impl FacetValue {
    /// Parse `facet=value`, e.g. `industry=tech` or `duration=3-6 months`
    pub fn parse(pair: &str) -> Result<Self> {
        let (facet, value) = pair.split_once('=').ok_or_else(|| ExpboardError::InvalidEnum {
            kind: "facet filter",
            value: pair.to_string(),
        })?;

        match facet.trim().to_lowercase().as_str() {
            "industry" => Ok(FacetValue::Industry(value.parse()?)),
            "skill" | "skill-level" | "skill_level" => Ok(FacetValue::SkillLevel(value.parse()?)),
            "type" | "location-type" | "location_type" => {
                Ok(FacetValue::LocationType(value.parse()?))
            }
            "duration" => Ok(FacetValue::Duration(value.parse()?)),
            _ => Err(ExpboardError::InvalidEnum {
                kind: "facet",
                value: facet.to_string(),
            }),
        }
    }
}

/// Selected facet values; an empty set does not restrict
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    #[serde(default)]
    pub industry: BTreeSet<Industry>,
    #[serde(default)]
    pub skill_level: BTreeSet<SkillLevel>,
    #[serde(default)]
    pub location_type: BTreeSet<LocationType>,
    #[serde(default)]
    pub duration: BTreeSet<DurationLabel>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select or deselect a value. Returns whether the value is now selected.
    pub fn toggle(&mut self, value: FacetValue) -> bool {
        let selected = !self.contains(value);
        self.set(value, selected);
        selected
    }

    /// Explicitly select or deselect a value
    pub fn set(&mut self, value: FacetValue, selected: bool) {
        fn apply<T: Ord>(set: &mut BTreeSet<T>, item: T, selected: bool) {
            if selected {
                set.insert(item);
            } else {
                set.remove(&item);
            }
        }

        match value {
            FacetValue::Industry(v) => apply(&mut self.industry, v, selected),
            FacetValue::SkillLevel(v) => apply(&mut self.skill_level, v, selected),
            FacetValue::LocationType(v) => apply(&mut self.location_type, v, selected),
            FacetValue::Duration(v) => apply(&mut self.duration, v, selected),
        }
    }

    pub fn contains(&self, value: FacetValue) -> bool {
        match value {
            FacetValue::Industry(v) => self.industry.contains(&v),
            FacetValue::SkillLevel(v) => self.skill_level.contains(&v),
            FacetValue::LocationType(v) => self.location_type.contains(&v),
            FacetValue::Duration(v) => self.duration.contains(&v),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Total number of selected values across all facets
    pub fn active_count(&self) -> usize {
        self.industry.len() + self.skill_level.len() + self.location_type.len() + self.duration.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    pub fn matches(&self, candidate: &Candidate) -> bool {
        facet_allows(&self.industry, &candidate.industry)
            && facet_allows(&self.skill_level, &candidate.skill_level)
            && facet_allows(&self.location_type, &candidate.location_type)
            && facet_allows(&self.duration, &candidate.duration_label)
    }

    /// Keep matching candidates, preserving order
    pub fn apply<'a, I>(&self, candidates: I) -> Vec<&'a Candidate>
    where
        I: IntoIterator<Item = &'a Candidate>,
    {
        candidates.into_iter().filter(|c| self.matches(c)).collect()
    }
}

fn facet_allows<T: Ord>(selected: &BTreeSet<T>, value: &T) -> bool {
    selected.is_empty() || selected.contains(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn candidates() -> Vec<Candidate> {
        vec![
            Candidate::new("1", "Frontend Developer", "Acme")
                .with_industry(Industry::Tech)
                .with_skill_level(SkillLevel::Beginner),
            Candidate::new("2", "Brand Designer", "Pixel")
                .with_industry(Industry::Design)
                .with_skill_level(SkillLevel::Intermediate)
                .with_location("Austin, TX", LocationType::OnSite),
            Candidate::new("3", "Growth Intern", "Rocket")
                .with_industry(Industry::Marketing)
                .with_skill_level(SkillLevel::Beginner)
                .with_duration(DurationLabel::OneToThreeMonths),
        ]
    }

    #[test]
    fn test_empty_filters_pass_everything() {
        let all = candidates();
        assert_eq!(Filters::new().apply(&all).len(), 3);
    }

    #[test]
    fn test_or_within_facet() {
        let all = candidates();
        let mut filters = Filters::new();
        filters.toggle(FacetValue::Industry(Industry::Tech));
        filters.toggle(FacetValue::Industry(Industry::Design));

        let ids: Vec<&str> = filters.apply(&all).iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_and_across_facets() {
        let all = candidates();
        let mut filters = Filters::new();
        filters.toggle(FacetValue::SkillLevel(SkillLevel::Beginner));
        filters.toggle(FacetValue::Duration(DurationLabel::OneToThreeMonths));

        let ids: Vec<&str> = filters.apply(&all).iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["3"]);
    }

    #[test]
    fn test_toggle_reports_state() {
        let mut filters = Filters::new();
        let value = FacetValue::LocationType(LocationType::Hybrid);
        assert!(filters.toggle(value));
        assert_eq!(filters.active_count(), 1);
        assert!(!filters.toggle(value));
        assert!(filters.is_empty());
    }

    #[test]
    fn test_set_is_idempotent() {
        let mut filters = Filters::new();
        let value = FacetValue::Industry(Industry::Business);
        filters.set(value, true);
        filters.set(value, true);
        assert_eq!(filters.active_count(), 1);
    }

    #[test]
    fn test_parse_facet() {
        assert_eq!(
            FacetValue::parse("industry=tech").unwrap(),
            FacetValue::Industry(Industry::Tech)
        );
        assert_eq!(
            FacetValue::parse("type=on-site").unwrap(),
            FacetValue::LocationType(LocationType::OnSite)
        );
        assert!(FacetValue::parse("salary=high").is_err());
        assert!(FacetValue::parse("industry").is_err());
    }

    fn facet_value() -> impl Strategy<Value = FacetValue> {
        prop_oneof![
            prop::sample::select(Industry::ALL).prop_map(FacetValue::Industry),
            prop::sample::select(SkillLevel::ALL).prop_map(FacetValue::SkillLevel),
            prop::sample::select(LocationType::ALL).prop_map(FacetValue::LocationType),
            prop::sample::select(DurationLabel::ALL).prop_map(FacetValue::Duration),
        ]
    }

    proptest! {
        #[test]
        fn prop_double_toggle_restores(
            initial in prop::collection::vec(facet_value(), 0..8),
            value in facet_value(),
        ) {
            let mut filters = Filters::new();
            for v in initial {
                filters.set(v, true);
            }
            let before = filters.clone();

            filters.toggle(value);
            filters.toggle(value);

            prop_assert_eq!(filters, before);
        }
    }
}
