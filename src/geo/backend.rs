//! External geocoding lookup and the HTTP (Nominatim-compatible) implementation
use crate::config::{GeocodingConfig, HttpConfig};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeocodeError {
    #[error("Geocoding request timed out")]
    Timeout,

    #[error("Geocoding transport error: {0}")]
    Transport(String),

    #[error("Geocoding service returned status {0}")]
    Status(u16),

    #[error("Failed to decode geocoding response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for GeocodeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GeocodeError::Timeout
        } else if err.is_decode() {
            GeocodeError::Decode(err.to_string())
        } else {
            GeocodeError::Transport(err.to_string())
        }
    }
}

/// One place returned by the geocoding service
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeHit {
    pub lat: String,
    pub lon: String,
    pub display_name: String,
    #[serde(default)]
    pub address: Option<GeocodeAddress>,
}

/// Structured address parts of a hit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeocodeAddress {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl GeocodeHit {
    /// Parsed `(lat, lon)`, `None` if either is not a finite number
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat: f64 = self.lat.trim().parse().ok()?;
        let lon: f64 = self.lon.trim().parse().ok()?;
        (lat.is_finite() && lon.is_finite()).then_some((lat, lon))
    }

    /// "City, State, Country" built from the address parts, falling back to
    /// the first three components of the full display name.
    pub fn short_display_name(&self) -> String {
        if let Some(address) = &self.address {
            let locality = address
                .city
                .as_ref()
                .or(address.town.as_ref())
                .or(address.village.as_ref());
            let parts: Vec<&str> = [locality, address.state.as_ref(), address.country.as_ref()]
                .into_iter()
                .flatten()
                .map(|s| s.as_str())
                .collect();
            if !parts.is_empty() {
                return parts.join(", ");
            }
        }

        self.display_name
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .take(3)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Resolves free-text place names to ordered candidate places
#[async_trait]
pub trait GeocodeBackend: Send + Sync {
    async fn lookup(&self, query: &str, limit: usize) -> Result<Vec<GeocodeHit>, GeocodeError>;
}

/// Geocoder speaking the Nominatim `/search?format=json` protocol
pub struct HttpGeocodeBackend {
    client: Client,
    endpoint: String,
}

impl HttpGeocodeBackend {
    pub fn new(endpoint: impl Into<String>, http: &HttpConfig) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(http.timeout())
            .user_agent(http.user_agent.clone())
            .build()
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &GeocodingConfig, http: &HttpConfig) -> Result<Self, GeocodeError> {
        Self::new(config.endpoint.clone(), http)
    }
}

#[async_trait]
impl GeocodeBackend for HttpGeocodeBackend {
    async fn lookup(&self, query: &str, limit: usize) -> Result<Vec<GeocodeHit>, GeocodeError> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("addressdetails", "1"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let hits: Vec<GeocodeHit> = response.json().await?;
        Ok(hits)
    }
}
