//! Search requests and their deep-link query-string form
//!
//! Query parameters: `q`, `location`, `radius` (omitted for any distance),
//! `lat` and `lng` (only ever present together). A missing parameter means
//! "unset", never zero or the empty string.

use crate::error::{ExpboardError, Result};
use crate::geo::distance_km;
use serde::{Deserialize, Serialize};

/// Latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance to `other` in kilometres
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        distance_km(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Radius limit for a location search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Radius {
    /// No distance restriction (the `-1` sentinel)
    #[default]
    Any,
    Km(u32),
}

impl Radius {
    /// Sentinel value used by the signed integer form
    pub const ANY_SENTINEL: i64 = -1;

    pub fn from_signed(value: i64) -> Result<Self> {
        match value {
            Self::ANY_SENTINEL => Ok(Radius::Any),
            v if v >= 0 => u32::try_from(v)
                .map(Radius::Km)
                .map_err(|_| invalid_param("radius", &v.to_string())),
            v => Err(invalid_param("radius", &v.to_string())),
        }
    }

    pub fn to_signed(self) -> i64 {
        match self {
            Radius::Any => Self::ANY_SENTINEL,
            Radius::Km(km) => i64::from(km),
        }
    }

    pub fn km(self) -> Option<f64> {
        match self {
            Radius::Any => None,
            Radius::Km(km) => Some(f64::from(km)),
        }
    }
}

/// One search over the candidate list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub location: String,
    pub radius: Radius,
    /// Present only once `location` has been resolved to a known place
    pub origin: Option<Coordinates>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>, radius: Radius) -> Self {
        self.location = location.into();
        self.radius = radius;
        self
    }

    pub fn with_origin(mut self, origin: Coordinates) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Trimmed query text
    pub fn query_text(&self) -> &str {
        self.query.trim()
    }

    /// Trimmed location text
    pub fn location_text(&self) -> &str {
        self.location.trim()
    }

    pub fn is_remote_location(&self) -> bool {
        self.location_text().eq_ignore_ascii_case("remote")
    }

    /// Encode as URL query parameters (without a leading `?`)
    pub fn to_query_string(&self) -> String {
        let mut params: Vec<(&str, String)> = Vec::new();

        if !self.query_text().is_empty() {
            params.push(("q", self.query_text().to_string()));
        }
        if !self.location_text().is_empty() {
            params.push(("location", self.location_text().to_string()));
        }
        if let Radius::Km(km) = self.radius {
            params.push(("radius", km.to_string()));
        }
        if let Some(origin) = self.origin {
            params.push(("lat", origin.lat.to_string()));
            params.push(("lng", origin.lng.to_string()));
        }

        params
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(&value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Decode from a raw query string (a leading `?` is accepted)
    pub fn from_query_string(query: &str) -> Result<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut pairs = Vec::new();

        for part in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            pairs.push((decode_component(key)?, decode_component(value)?));
        }

        Self::from_query_pairs(pairs)
    }

    /// Decode from already-split key/value pairs. Unknown keys are ignored.
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut request = SearchRequest::default();
        let mut lat: Option<f64> = None;
        let mut lng: Option<f64> = None;

        for (key, value) in pairs {
            let value = value.as_ref();
            match key.as_ref() {
                "q" => request.query = value.to_string(),
                "location" => request.location = value.to_string(),
                "radius" => {
                    let parsed: i64 = value
                        .trim()
                        .parse()
                        .map_err(|_| invalid_param("radius", value))?;
                    request.radius = Radius::from_signed(parsed)?;
                }
                "lat" => lat = Some(parse_degrees("lat", value, 90.0)?),
                "lng" => lng = Some(parse_degrees("lng", value, 180.0)?),
                other => tracing::debug!("Ignoring unknown query parameter: {}", other),
            }
        }

        request.origin = match (lat, lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            (None, None) => None,
            (Some(_), None) => return Err(invalid_param("lng", "")),
            (None, Some(_)) => return Err(invalid_param("lat", "")),
        };

        Ok(request)
    }
}

fn decode_component(raw: &str) -> Result<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| invalid_param("query", raw))
}

fn parse_degrees(name: &str, value: &str, bound: f64) -> Result<f64> {
    let degrees: f64 = value
        .trim()
        .parse()
        .map_err(|_| invalid_param(name, value))?;
    if !degrees.is_finite() || degrees.abs() > bound {
        return Err(invalid_param(name, value));
    }
    Ok(degrees)
}

fn invalid_param(name: &str, value: &str) -> ExpboardError {
    ExpboardError::InvalidQueryParam {
        name: name.to_string(),
        value: value.to_string(),
    }
}
