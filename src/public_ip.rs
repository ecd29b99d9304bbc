//! Observer public IP detection
//!
//! The observer's own location anchors every distance computation. When no
//! coordinates are configured, the public IP is fetched from an HTTP
//! provider (with failover) and handed to the geolocation service.

use std::net::IpAddr;
use std::time::Duration;

/// Error type for public IP detection
#[derive(Debug, thiserror::Error)]
pub enum PublicIpError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Request timeout
    #[error("Request timed out")]
    Timeout,

    /// Provider returned something that is not an IP address
    #[error("Failed to parse IP address: {0}")]
    ParseError(String),

    /// Every provider failed
    #[error("All public IP providers failed")]
    AllProvidersFailed,
}

/// Public IP provider services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublicIpProvider {
    /// AWS checkip service
    #[default]
    AwsCheckIp,
    /// ipify.org service
    Ipify,
    /// icanhazip.com service
    ICanHazIp,
}

impl PublicIpProvider {
    /// Get the URL for this provider
    pub fn url(&self) -> &'static str {
        match self {
            PublicIpProvider::AwsCheckIp => "https://checkip.amazonaws.com",
            PublicIpProvider::Ipify => "https://api.ipify.org",
            PublicIpProvider::ICanHazIp => "https://icanhazip.com",
        }
    }

    /// Get all available providers
    pub fn all() -> &'static [PublicIpProvider] {
        &[
            PublicIpProvider::AwsCheckIp,
            PublicIpProvider::Ipify,
            PublicIpProvider::ICanHazIp,
        ]
    }
}

/// Fetch the public IP from one provider.
pub async fn public_ip_from_provider(
    provider: PublicIpProvider,
    timeout: Duration,
) -> Result<IpAddr, PublicIpError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| PublicIpError::HttpError(e.to_string()))?;

    let response = client.get(provider.url()).send().await.map_err(|e| {
        if e.is_timeout() {
            PublicIpError::Timeout
        } else {
            PublicIpError::HttpError(e.to_string())
        }
    })?;

    let body = response
        .text()
        .await
        .map_err(|e| PublicIpError::HttpError(e.to_string()))?;
    let ip_str = body.trim();

    ip_str
        .parse::<IpAddr>()
        .map_err(|e| PublicIpError::ParseError(format!("{e}: {ip_str}")))
}

/// Detect the public IP, falling back through the remaining providers when
/// the default one fails.
pub async fn detect_public_ip() -> Result<IpAddr, PublicIpError> {
    let timeout = Duration::from_secs(5);

    for provider in PublicIpProvider::all() {
        if let Ok(ip) = public_ip_from_provider(*provider, timeout).await {
            return Ok(ip);
        }
    }

    Err(PublicIpError::AllProvidersFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_urls() {
        assert_eq!(
            PublicIpProvider::AwsCheckIp.url(),
            "https://checkip.amazonaws.com"
        );
        assert_eq!(PublicIpProvider::Ipify.url(), "https://api.ipify.org");
        assert_eq!(PublicIpProvider::ICanHazIp.url(), "https://icanhazip.com");
    }

    #[test]
    fn test_provider_all_covers_default() {
        let providers = PublicIpProvider::all();
        assert_eq!(providers.len(), 3);
        assert!(providers.contains(&PublicIpProvider::default()));
    }

    #[tokio::test]
    async fn test_timeout_handling() {
        let very_short = Duration::from_millis(1);
        let result = public_ip_from_provider(PublicIpProvider::AwsCheckIp, very_short).await;
        assert!(result.is_err());
        match result.unwrap_err() {
            PublicIpError::Timeout | PublicIpError::HttpError(_) => {}
            e => panic!("Unexpected error type: {e}"),
        }
    }

    #[tokio::test]
    async fn test_detect_public_ip() {
        match detect_public_ip().await {
            Ok(IpAddr::V4(ip)) => {
                assert!(!ip.is_private());
                assert!(!ip.is_loopback());
            }
            Ok(IpAddr::V6(ip)) => assert!(!ip.is_loopback()),
            Err(e) => {
                // Network errors are okay in tests
                eprintln!("Public IP detection failed (expected in some test environments): {e}");
            }
        }
    }
}
