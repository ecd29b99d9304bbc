//! netmeter - Batch network latency survey
//!
//! This library measures round-trip latency, geographic distance, and
//! per-hop path latency for a list of remote hosts in one bounded batch
//! run, producing per-host and per-hop tables suitable for correlation
//! analysis.

pub mod geo;
pub mod probe;
pub mod public_ip;
pub mod survey;
pub mod trace;

// Re-export core types for library users
pub use geo::{distance_km, GeoCache, GeoLocation, GeoLookup};
pub use probe::{IcmpProber, LatencyProber, ProbeError};
pub use survey::{
    run_survey, Hop, HopReport, HostReport, LatencyStats, SurveyConfig, SurveyConfigBuilder,
    SurveyEngine, SurveyError, SurveyResult,
};
pub use trace::{HopTracer, SystemTracer, TraceError};
