//! Geolocation lookup service
//!
//! Wraps a provider with the per-run cache and degrades provider failures
//! to not-found results, so callers never see a geolocation error.

use super::cache::GeoCache;
use super::provider::{GeoProvider, IpApi};
use crate::geo::GeoLocation;
use std::net::IpAddr;
use std::sync::Arc;

/// Cached geolocation lookups over an injectable provider.
///
/// Resolution is idempotent within a run: the first query for an IP hits
/// the provider, every later query returns the cached record, found or not.
#[derive(Clone)]
pub struct GeoLookup {
    cache: GeoCache,
    provider: Arc<dyn GeoProvider>,
}

impl GeoLookup {
    /// Create a service backed by ip-api.com with a fresh cache
    pub fn new() -> Self {
        Self::with_provider(Arc::new(IpApi::new()))
    }

    /// Create a service over a specific provider (used by tests and
    /// alternative backends)
    pub fn with_provider(provider: Arc<dyn GeoProvider>) -> Self {
        Self {
            cache: GeoCache::new(),
            provider,
        }
    }

    /// Resolve the location of an IP address.
    ///
    /// Provider errors and missing records both come back as
    /// `GeoLocation::not_found()`; the outcome is cached either way.
    pub async fn resolve(&self, ip: IpAddr) -> GeoLocation {
        if let Some(cached) = self.cache.get(&ip) {
            return cached;
        }

        let location = match self.provider.lookup(ip).await {
            Ok(location) => location,
            Err(_) => GeoLocation::not_found(),
        };

        self.cache.insert(ip, location.clone());
        location
    }

    /// Number of cached entries
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Drop all cached entries, forcing fresh provider queries
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

impl Default for GeoLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GeoLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoLookup")
            .field("cached_entries", &self.cache.len())
            .finish_non_exhaustive()
    }
}
