//! Result types for survey runs

use crate::geo::GeoLocation;
use crate::survey::types::{HopReport, HostReport};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Everything produced by one survey run.
///
/// `host_reports` holds one row per input host, in input order;
/// `hop_reports` holds one row per hop per traced host, grouped by host
/// with ascending hop indices. Both collections are written once at the end
/// of a run and never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyResult {
    /// Per-host latency, geolocation, and distance rows (Phase A)
    pub host_reports: Vec<HostReport>,
    /// Per-hop trace rows (Phase B)
    pub hop_reports: Vec<HopReport>,
    /// Location of the observer, anchoring the distance column
    pub observer: GeoLocation,
    /// Total duration of the run
    pub total_duration: Duration,
}

impl SurveyResult {
    /// Number of hosts that answered at least one probe
    pub fn reachable_count(&self) -> usize {
        self.host_reports
            .iter()
            .filter(|r| r.latency.reachable())
            .count()
    }

    /// Number of hosts that never answered
    pub fn unreachable_count(&self) -> usize {
        self.host_reports.len() - self.reachable_count()
    }

    /// Number of distinct hosts with at least one hop row
    pub fn traced_host_count(&self) -> usize {
        let mut hosts: Vec<&str> = self.hop_reports.iter().map(|r| r.host.as_str()).collect();
        hosts.dedup();
        hosts.len()
    }

    /// Number of hop rows whose hop replied
    pub fn responsive_hop_count(&self) -> usize {
        self.hop_reports
            .iter()
            .filter(|r| r.hop.is_responsive())
            .count()
    }

    /// Mean RTT in milliseconds across all responsive hops, if any replied
    pub fn average_hop_rtt_ms(&self) -> Option<f64> {
        let rtts: Vec<f64> = self
            .hop_reports
            .iter()
            .filter_map(|r| r.hop.rtt())
            .map(|d| d.as_secs_f64() * 1000.0)
            .collect();
        if rtts.is_empty() {
            None
        } else {
            Some(rtts.iter().sum::<f64>() / rtts.len() as f64)
        }
    }

    /// Render the per-host table as CSV.
    ///
    /// Columns: ip, packets_sent, packets_received, min_rtt_ms, avg_rtt_ms,
    /// max_rtt_ms, reachable, latitude, longitude, geo_found, distance_km.
    /// Absent values render as empty fields.
    pub fn host_csv(&self) -> String {
        let mut out = String::from(
            "ip,packets_sent,packets_received,min_rtt_ms,avg_rtt_ms,max_rtt_ms,reachable,latitude,longitude,geo_found,distance_km\n",
        );
        for report in &self.host_reports {
            let latency = &report.latency;
            out.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{},{}\n",
                report.host,
                latency.packets_sent,
                latency.packets_received,
                fmt_rtt_ms(latency.min_rtt),
                fmt_rtt_ms(latency.avg_rtt),
                fmt_rtt_ms(latency.max_rtt),
                latency.reachable(),
                fmt_coord(report.geo.latitude),
                fmt_coord(report.geo.longitude),
                report.geo.found,
                report
                    .distance_km
                    .map(|d| format!("{d:.3}"))
                    .unwrap_or_default(),
            ));
        }
        out
    }

    /// Render the per-hop table as CSV.
    ///
    /// Columns: ip, hop_index, hop_address, responsive, rtt_ms. Unresponsive
    /// hops carry the literal address `unresponsive` and an empty RTT.
    pub fn hop_csv(&self) -> String {
        let mut out = String::from("ip,hop_index,hop_address,responsive,rtt_ms\n");
        for report in &self.hop_reports {
            let address = report
                .hop
                .addr()
                .map_or_else(|| "unresponsive".to_string(), |a| a.to_string());
            out.push_str(&format!(
                "{},{},{},{},{}\n",
                report.host,
                report.hop_index,
                address,
                report.hop.is_responsive(),
                fmt_rtt_ms(report.hop.rtt()),
            ));
        }
        out
    }
}

fn fmt_rtt_ms(rtt: Option<Duration>) -> String {
    rtt.map(|d| format!("{:.3}", d.as_secs_f64() * 1000.0))
        .unwrap_or_default()
}

fn fmt_coord(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
