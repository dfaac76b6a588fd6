//! Job posting records and the closed vocabularies used to facet them

mod request;

pub use request::{Coordinates, Radius, SearchRequest};

use crate::error::ExpboardError;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a closed vocabulary: canonical string form, case-insensitive
/// parsing and an `ALL` listing in display order.
macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $canonical:literal $(| $alias:literal)*),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        pub enum $name {
            $(
                #[serde(rename = $canonical)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $canonical,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        // accepts the same aliases and casing as `FromStr`
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(de::Error::custom)
            }
        }

        impl FromStr for $name {
            type Err = ExpboardError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_lowercase();
                match normalized.as_str() {
                    $($canonical $(| $alias)* => Ok($name::$variant),)+
                    _ => Err(ExpboardError::InvalidEnum {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

vocabulary! {
    /// Where the work happens
    LocationType, "location type" {
        Remote => "remote",
        OnSite => "on-site" | "onsite" | "on site",
        Hybrid => "hybrid",
    }
}

vocabulary! {
    /// Experience expected from the applicant
    SkillLevel, "skill level" {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
    }
}

vocabulary! {
    Industry, "industry" {
        Tech => "tech" | "technology",
        Design => "design",
        Marketing => "marketing",
        Business => "business",
    }
}

vocabulary! {
    /// Commitment length offered by a posting
    DurationLabel, "duration" {
        UnderOneMonth => "less than 1 month" | "<1 month",
        OneToThreeMonths => "1-3 months",
        ThreeToSixMonths => "3-6 months",
        SixPlusMonths => "6+ months",
        Flexible => "flexible",
    }
}

/// A job posting evaluated against search requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub title: String,
    pub company_name: String,
    /// Free-text location, may be "Remote"
    pub location: String,
    pub location_type: LocationType,
    pub duration_label: DurationLabel,
    pub skill_level: SkillLevel,
    pub industry: Industry,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl Candidate {
    /// Create a remote, flexible, beginner tech posting; adjust with the `with_*` methods
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        company_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            company_name: company_name.into(),
            location: "Remote".to_string(),
            location_type: LocationType::Remote,
            duration_label: DurationLabel::Flexible,
            skill_level: SkillLevel::Beginner,
            industry: Industry::Tech,
            skills: Vec::new(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>, kind: LocationType) -> Self {
        self.location = location.into();
        self.location_type = kind;
        self
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_industry(mut self, industry: Industry) -> Self {
        self.industry = industry;
        self
    }

    pub fn with_skill_level(mut self, level: SkillLevel) -> Self {
        self.skill_level = level;
        self
    }

    pub fn with_duration(mut self, duration: DurationLabel) -> Self {
        self.duration_label = duration;
        self
    }

    pub fn is_remote(&self) -> bool {
        self.location_type == LocationType::Remote
    }

    /// Case-insensitive substring match against title, company name or any skill.
    /// `needle` must already be lower-cased.
    pub fn matches_text(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.company_name.to_lowercase().contains(needle)
            || self
                .skills
                .iter()
                .any(|skill| skill.to_lowercase().contains(needle))
    }

    /// Case-insensitive substring match against the raw location text.
    /// `needle` must already be lower-cased.
    pub fn location_contains(&self, needle: &str) -> bool {
        self.location.to_lowercase().contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_parsing() {
        assert_eq!("On-Site".parse::<LocationType>().unwrap(), LocationType::OnSite);
        assert_eq!("onsite".parse::<LocationType>().unwrap(), LocationType::OnSite);
        assert_eq!(" ADVANCED ".parse::<SkillLevel>().unwrap(), SkillLevel::Advanced);
        assert_eq!("3-6 months".parse::<DurationLabel>().unwrap(), DurationLabel::ThreeToSixMonths);
        assert!("finance".parse::<Industry>().is_err());
    }

    #[test]
    fn test_display_matches_canonical() {
        for kind in LocationType::ALL {
            assert_eq!(kind.to_string().parse::<LocationType>().unwrap(), *kind);
        }
        assert_eq!(DurationLabel::SixPlusMonths.to_string(), "6+ months");
    }

    #[test]
    fn test_candidate_json_shape() {
        let json = r#"{
            "id": "42",
            "title": "Junior Designer",
            "companyName": "Pixel Co",
            "location": "Austin, TX",
            "locationType": "on-site",
            "durationLabel": "1-3 months",
            "skillLevel": "beginner",
            "industry": "design",
            "skills": ["Figma"]
        }"#;

        let candidate: Candidate = serde_json::from_str(json).unwrap();
        assert_eq!(candidate.location_type, LocationType::OnSite);
        assert_eq!(candidate.industry, Industry::Design);
        assert_eq!(candidate.skills, vec!["Figma".to_string()]);
    }

    #[test]
    fn test_candidate_json_accepts_aliases() {
        let json = r#"{
            "id": "7",
            "title": "Growth Intern",
            "companyName": "Loud Co",
            "location": "Chicago",
            "locationType": "On-Site",
            "durationLabel": "<1 month",
            "skillLevel": "Intermediate",
            "industry": "Technology"
        }"#;

        let candidate: Candidate = serde_json::from_str(json).unwrap();
        assert_eq!(candidate.location_type, LocationType::OnSite);
        assert_eq!(candidate.duration_label, DurationLabel::UnderOneMonth);
        assert_eq!(candidate.skill_level, SkillLevel::Intermediate);
        assert_eq!(candidate.industry, Industry::Tech);

        // written back in canonical form
        let value = serde_json::to_value(&candidate).unwrap();
        assert_eq!(value["locationType"], "on-site");
        assert_eq!(value["durationLabel"], "less than 1 month");

        let bad = json.replace("Technology", "finance");
        assert!(serde_json::from_str::<Candidate>(&bad).is_err());
    }

    #[test]
    fn test_matches_text() {
        let candidate = Candidate::new("1", "Frontend Developer", "Acme")
            .with_skills(["React", "TypeScript"]);

        assert!(candidate.matches_text("frontend"));
        assert!(candidate.matches_text("acme"));
        assert!(candidate.matches_text("typescript"));
        assert!(!candidate.matches_text("python"));
    }
}
