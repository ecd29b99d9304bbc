//! Geolocation providers

use crate::geo::GeoLocation;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

/// Error type for geolocation lookups
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Request timeout
    #[error("Request timed out")]
    Timeout,

    /// Provider returned a response we could not decode
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

/// A geolocation backend that maps an IP address to a location.
///
/// Implementations return `GeoLocation::not_found()` when the provider has
/// no record for the IP; transport failures surface as `GeoError` and are
/// degraded to not-found by the lookup service.
#[async_trait::async_trait]
pub trait GeoProvider: Send + Sync {
    /// Look up the location of a single IP address
    async fn lookup(&self, ip: IpAddr) -> Result<GeoLocation, GeoError>;
}

/// Default delay after each provider query, to stay inside ip-api.com's
/// free-tier rate limit.
pub const DEFAULT_QUERY_DELAY: Duration = Duration::from_millis(1500);

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Wire format of an ip-api.com JSON response.
///
/// Success shape: `{"status":"success","country":...,"city":...,"lat":..,"lon":..}`.
/// Failure shape: `{"status":"fail","message":...}`.
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    country: Option<String>,
    city: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Geolocation provider backed by ip-api.com.
#[derive(Debug, Clone)]
pub struct IpApi {
    base_url: String,
    timeout: Duration,
    query_delay: Duration,
}

impl IpApi {
    /// Create a provider with default endpoint, timeout, and rate-limit delay
    pub fn new() -> Self {
        Self {
            base_url: "http://ip-api.com/json".to_string(),
            timeout: DEFAULT_TIMEOUT,
            query_delay: DEFAULT_QUERY_DELAY,
        }
    }

    /// Override the delay inserted after each query
    pub fn with_query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = delay;
        self
    }

    /// Override the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the provider endpoint (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for IpApi {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode an ip-api.com response body into a location.
fn parse_response(body: &str) -> Result<GeoLocation, GeoError> {
    let response: IpApiResponse =
        serde_json::from_str(body).map_err(|e| GeoError::InvalidResponse(e.to_string()))?;

    if response.status != "success" {
        return Ok(GeoLocation::not_found());
    }

    match (response.lat, response.lon) {
        (Some(lat), Some(lon)) => Ok(GeoLocation::found(lat, lon, response.city, response.country)),
        // A "success" record without coordinates is useless for distance
        // computation; treat it like a missing record.
        _ => Ok(GeoLocation::not_found()),
    }
}

#[async_trait::async_trait]
impl GeoProvider for IpApi {
    async fn lookup(&self, ip: IpAddr) -> Result<GeoLocation, GeoError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| GeoError::HttpError(e.to_string()))?;

        let url = format!("{}/{}", self.base_url, ip);
        let result = client.get(&url).send().await;

        // The pause applies whether or not the query succeeded, so a run
        // that hits errors does not hammer the provider.
        let response = match result {
            Ok(r) => r,
            Err(e) => {
                tokio::time::sleep(self.query_delay).await;
                return Err(if e.is_timeout() {
                    GeoError::Timeout
                } else {
                    GeoError::HttpError(e.to_string())
                });
            }
        };

        let body = response
            .text()
            .await
            .map_err(|e| GeoError::HttpError(e.to_string()))?;

        tokio::time::sleep(self.query_delay).await;
        parse_response(&body)
    }
}
