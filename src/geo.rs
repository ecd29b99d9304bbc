//! Geolocation: provider lookup, per-run caching, and distance math

pub mod cache;
pub mod distance;
pub mod provider;
pub mod service;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use cache::GeoCache;
pub use distance::{distance_km, EARTH_RADIUS_KM};
pub use provider::{GeoError, GeoProvider, IpApi};
pub use service::GeoLookup;

/// Geographic position of a host, or the not-found marker.
///
/// A missing record is a valid terminal state, not an error: provider
/// failures and unknown IPs both produce `GeoLocation::not_found()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Latitude in degrees, in [-90, 90]
    pub latitude: Option<f64>,
    /// Longitude in degrees, in [-180, 180]
    pub longitude: Option<f64>,
    /// City name, when the provider reports one
    pub city: Option<String>,
    /// Country name, when the provider reports one
    pub country: Option<String>,
    /// Whether the provider returned a usable record
    pub found: bool,
}

impl GeoLocation {
    /// A located record with coordinates and optional labels.
    pub fn found(latitude: f64, longitude: f64, city: Option<String>, country: Option<String>) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            city,
            country,
            found: true,
        }
    }

    /// The not-found marker.
    pub fn not_found() -> Self {
        Self {
            latitude: None,
            longitude: None,
            city: None,
            country: None,
            found: false,
        }
    }

    /// Coordinates as a pair, present only for found records
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if self.found => Some((lat, lon)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_found_location() {
        let loc = GeoLocation::found(
            40.4444,
            -86.9256,
            Some("West Lafayette".to_string()),
            Some("United States".to_string()),
        );
        assert!(loc.found);
        assert_eq!(loc.coordinates(), Some((40.4444, -86.9256)));
        assert_eq!(loc.city.as_deref(), Some("West Lafayette"));
    }

    #[test]
    fn test_not_found_location() {
        let loc = GeoLocation::not_found();
        assert!(!loc.found);
        assert!(loc.coordinates().is_none());
        assert!(loc.city.is_none());
        assert!(loc.country.is_none());
    }
}
