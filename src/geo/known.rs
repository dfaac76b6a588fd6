//! Static table of frequently searched places
//!
//! Consulted before the external geocoder so common searches never leave the
//! process. Keys are lower-case.

use crate::model::Coordinates;

const KNOWN_LOCATIONS: &[(&str, f64, f64)] = &[
    ("new york", 40.7128, -74.0060),
    ("new york, ny", 40.7128, -74.0060),
    ("nyc", 40.7128, -74.0060),
    ("brooklyn", 40.6782, -73.9442),
    ("san francisco", 37.7749, -122.4194),
    ("san francisco, ca", 37.7749, -122.4194),
    ("los angeles", 34.0522, -118.2437),
    ("los angeles, ca", 34.0522, -118.2437),
    ("san diego", 32.7157, -117.1611),
    ("san jose", 37.3382, -121.8863),
    ("seattle", 47.6062, -122.3321),
    ("portland", 45.5152, -122.6784),
    ("chicago", 41.8781, -87.6298),
    ("austin", 30.2672, -97.7431),
    ("austin, tx", 30.2672, -97.7431),
    ("dallas", 32.7767, -96.7970),
    ("houston", 29.7604, -95.3698),
    ("denver", 39.7392, -104.9903),
    ("boston", 42.3601, -71.0589),
    ("washington, dc", 38.9072, -77.0369),
    ("atlanta", 33.7490, -84.3880),
    ("miami", 25.7617, -80.1918),
    ("toronto", 43.6532, -79.3832),
    ("vancouver", 49.2827, -123.1207),
    ("london", 51.5074, -0.1278),
    ("berlin", 52.5200, 13.4050),
    ("paris", 48.8566, 2.3522),
    ("amsterdam", 52.3676, 4.9041),
    ("dublin", 53.3498, -6.2603),
    ("sydney", -33.8688, 151.2093),
    ("singapore", 1.3521, 103.8198),
    ("bangalore", 12.9716, 77.5946),
];

/// Exact match on the normalized key
pub fn exact(key: &str) -> Option<Coordinates> {
    KNOWN_LOCATIONS
        .iter()
        .find(|(name, _, _)| *name == key)
        .map(|(_, lat, lng)| Coordinates::new(*lat, *lng))
}

/// Substring match in either direction, first table entry wins
pub fn partial(key: &str) -> Option<Coordinates> {
    if key.is_empty() {
        return None;
    }

    KNOWN_LOCATIONS
        .iter()
        .find(|(name, _, _)| key.contains(name) || name.contains(key))
        .map(|(_, lat, lng)| Coordinates::new(*lat, *lng))
}
