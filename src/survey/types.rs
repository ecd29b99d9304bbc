//! Core record types for survey measurements

use crate::geo::GeoLocation;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Round-trip statistics from a fixed-count latency probe against one host.
///
/// Zero replies is a normal outcome: `reachable()` returns false and the
/// RTT fields are absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyStats {
    /// Number of echo probes sent
    pub packets_sent: u32,
    /// Number of echo replies received
    pub packets_received: u32,
    /// Smallest observed round-trip time
    pub min_rtt: Option<Duration>,
    /// Mean round-trip time over received replies
    pub avg_rtt: Option<Duration>,
    /// Largest observed round-trip time
    pub max_rtt: Option<Duration>,
}

impl LatencyStats {
    /// Build stats from the individual reply RTTs of a probe run.
    pub fn from_samples(packets_sent: u32, samples: &[Duration]) -> Self {
        if samples.is_empty() {
            return Self::unreachable(packets_sent);
        }
        let sum: Duration = samples.iter().sum();
        Self {
            packets_sent,
            packets_received: samples.len() as u32,
            min_rtt: samples.iter().min().copied(),
            avg_rtt: Some(sum / samples.len() as u32),
            max_rtt: samples.iter().max().copied(),
        }
    }

    /// Stats for a host that never replied.
    pub fn unreachable(packets_sent: u32) -> Self {
        Self {
            packets_sent,
            packets_received: 0,
            min_rtt: None,
            avg_rtt: None,
            max_rtt: None,
        }
    }

    /// Whether at least one probe was answered
    pub fn reachable(&self) -> bool {
        self.packets_received > 0
    }

    /// Fraction of probes lost, in [0, 1]
    pub fn packet_loss(&self) -> f64 {
        if self.packets_sent == 0 {
            return 0.0;
        }
        1.0 - f64::from(self.packets_received) / f64::from(self.packets_sent)
    }
}

/// One hop on the traced path to a host.
///
/// Silent or filtered intermediate nodes are retained as `Unresponsive`
/// so hop indices stay contiguous; they carry no address and no timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Hop {
    /// The hop replied with an identifiable address
    Responsive {
        /// Address the hop replied from
        addr: IpAddr,
        /// Round-trip sample, absent when the reply carried no usable timing
        rtt: Option<Duration>,
    },
    /// The hop never replied
    Unresponsive,
}

impl Hop {
    /// Whether this hop returned an identifiable address
    pub fn is_responsive(&self) -> bool {
        matches!(self, Hop::Responsive { .. })
    }

    /// Address of the hop, if it replied
    pub fn addr(&self) -> Option<IpAddr> {
        match self {
            Hop::Responsive { addr, .. } => Some(*addr),
            Hop::Unresponsive => None,
        }
    }

    /// Round-trip sample of the hop, if any
    pub fn rtt(&self) -> Option<Duration> {
        match self {
            Hop::Responsive { rtt, .. } => *rtt,
            Hop::Unresponsive => None,
        }
    }
}

/// Per-host output row: latency stats joined with geolocation and distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostReport {
    /// Host identifier as it appeared in the input list
    pub host: String,
    /// Latency probe outcome
    pub latency: LatencyStats,
    /// Geolocation of the host (found or not-found)
    pub geo: GeoLocation,
    /// Great-circle distance from the observer in kilometers, present only
    /// when both the observer's and the host's locations are known
    pub distance_km: Option<f64>,
}

/// Per-hop output row: one hop of the trace toward `host`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HopReport {
    /// Target host of the trace
    pub host: String,
    /// Position on the path, 1-based and contiguous per host
    pub hop_index: u32,
    /// The hop itself
    pub hop: Hop,
}
