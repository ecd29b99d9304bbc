//! Latency probing via ICMP echo
//!
//! Sends a fixed count of sequential echo probes to one host and reduces
//! the replies to min/avg/max statistics. Zero replies is a normal result,
//! not an error; `ProbeError` covers only probe-machinery failures such as
//! being unable to open an ICMP socket.

use crate::survey::types::LatencyStats;
use std::net::IpAddr;
use std::time::Duration;
use surge_ping::{Client, Config, PingIdentifier, PingSequence, ICMP};

/// Default number of echo probes per host
pub const DEFAULT_PROBE_COUNT: u32 = 100;

/// Default per-probe timeout
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default pause between successive probes to one host
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(200);

/// Error type for latency probing
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// ICMP socket could not be created (often a permissions problem)
    #[error("Failed to create ICMP client: {0}")]
    Socket(String),
}

/// A latency measurement backend.
///
/// The engine drives this over every host in the list; test code swaps in
/// scripted implementations.
#[async_trait::async_trait]
pub trait LatencyProber: Send + Sync {
    /// Send `count` sequential probes to `host` and return the statistics.
    ///
    /// A host that never replies yields `LatencyStats` with zero received
    /// packets, not an error.
    async fn probe(&self, host: IpAddr, count: u32) -> Result<LatencyStats, ProbeError>;
}

/// ICMP echo prober with a bounded per-probe timeout and a fixed pause
/// between probes.
#[derive(Debug, Clone)]
pub struct IcmpProber {
    timeout: Duration,
    interval: Duration,
}

impl IcmpProber {
    /// Create a prober with default timeout and interval
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_PROBE_TIMEOUT,
            interval: DEFAULT_PROBE_INTERVAL,
        }
    }

    /// Set the per-probe timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the pause between successive probes
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl Default for IcmpProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LatencyProber for IcmpProber {
    async fn probe(&self, host: IpAddr, count: u32) -> Result<LatencyStats, ProbeError> {
        let config = match host {
            IpAddr::V4(_) => Config::default(),
            IpAddr::V6(_) => Config::builder().kind(ICMP::V6).build(),
        };
        let client = Client::new(&config).map_err(|e| ProbeError::Socket(e.to_string()))?;

        let mut pinger = client.pinger(host, PingIdentifier(rand::random())).await;
        pinger.timeout(self.timeout);

        let mut samples = Vec::with_capacity(count as usize);
        for seq in 0..count {
            if let Ok((_, rtt)) = pinger.ping(PingSequence(seq as u16), &[]).await {
                samples.push(rtt);
            }
            // Lost probes already spent the full timeout waiting.
            if seq + 1 < count {
                tokio::time::sleep(self.interval).await;
            }
        }

        Ok(LatencyStats::from_samples(count, &samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prober_builder() {
        let prober = IcmpProber::new()
            .with_timeout(Duration::from_millis(500))
            .with_interval(Duration::from_millis(50));
        assert_eq!(prober.timeout, Duration::from_millis(500));
        assert_eq!(prober.interval, Duration::from_millis(50));
    }

    #[test]
    fn test_default_constants() {
        assert_eq!(DEFAULT_PROBE_COUNT, 100);
        let prober = IcmpProber::default();
        assert_eq!(prober.timeout, DEFAULT_PROBE_TIMEOUT);
        assert_eq!(prober.interval, DEFAULT_PROBE_INTERVAL);
    }

    #[tokio::test]
    async fn test_probe_loopback() {
        // Needs ICMP socket privileges; treat a socket error as an
        // acceptable outcome in restricted test environments.
        let prober = IcmpProber::new()
            .with_timeout(Duration::from_millis(500))
            .with_interval(Duration::from_millis(1));
        match prober.probe("127.0.0.1".parse().unwrap(), 2).await {
            Ok(stats) => {
                assert_eq!(stats.packets_sent, 2);
                assert!(stats.packets_received <= stats.packets_sent);
                if stats.reachable() {
                    assert!(stats.min_rtt.unwrap() <= stats.max_rtt.unwrap());
                }
            }
            Err(ProbeError::Socket(e)) => {
                eprintln!("ICMP socket unavailable in test environment: {e}");
            }
        }
    }
}
