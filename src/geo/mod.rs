//! Geographic helpers: distance, place resolution and its cache

mod backend;
mod cache;
mod distance;
mod known;
mod resolver;

pub use backend::{GeocodeAddress, GeocodeBackend, GeocodeError, GeocodeHit, HttpGeocodeBackend};
pub use cache::{GeocodeCache, GeocodeCacheStats};
pub use distance::{distance_km, EARTH_RADIUS_KM};
pub use resolver::{normalize_key, GeocodingResolver};

use crate::model::Coordinates;
use serde::{Deserialize, Serialize};

/// A place resolved to coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedLocation {
    pub coordinates: Coordinates,
    /// Short normalized form, e.g. "City, State, Country"
    pub display_name: String,
}
