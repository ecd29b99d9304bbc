//! Per-run geolocation cache

use crate::geo::GeoLocation;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

/// Cache of geolocation lookups keyed by IP address.
///
/// Entries live for the duration of a survey run; not-found results are
/// cached too, so an unresolvable IP is queried at most once.
#[derive(Debug, Clone)]
pub struct GeoCache {
    cache: Arc<Mutex<HashMap<IpAddr, GeoLocation>>>,
}

impl GeoCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Look up an IP address in the cache
    pub fn get(&self, ip: &IpAddr) -> Option<GeoLocation> {
        let cache = self.cache.lock().expect("mutex poisoned");
        cache.get(ip).cloned()
    }

    /// Insert a location for an IP address
    pub fn insert(&self, ip: IpAddr, location: GeoLocation) {
        let mut cache = self.cache.lock().expect("mutex poisoned");
        cache.insert(ip, location);
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        let cache = self.cache.lock().expect("mutex poisoned");
        cache.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        let cache = self.cache.lock().expect("mutex poisoned");
        cache.is_empty()
    }

    /// Clear all entries from the cache
    pub fn clear(&self) {
        let mut cache = self.cache.lock().expect("mutex poisoned");
        cache.clear();
    }
}

impl Default for GeoCache {
    fn default() -> Self {
        Self::new()
    }
}
