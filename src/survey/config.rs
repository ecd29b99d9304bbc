//! Configuration types for survey runs

use crate::probe::{DEFAULT_PROBE_COUNT, DEFAULT_PROBE_INTERVAL, DEFAULT_PROBE_TIMEOUT};
use crate::trace::{DEFAULT_HOP_TIMEOUT, DEFAULT_MAX_HOPS, DEFAULT_TRACE_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of hosts sampled for the trace phase
pub const DEFAULT_TRACE_SAMPLE_SIZE: usize = 5;

/// Configuration for one survey run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    /// Echo probes per host (default: 100)
    pub probe_count: u32,
    /// Timeout for an individual echo probe (default: 10s)
    pub probe_timeout: Duration,
    /// Pause between successive echo probes to one host (default: 200ms)
    pub probe_interval: Duration,
    /// Maximum number of hops per trace (default: 30)
    pub max_hops: u32,
    /// Per-hop wait passed to the trace command (default: 1s)
    pub hop_timeout: Duration,
    /// Overall bound on one trace invocation (default: 120s)
    pub trace_timeout: Duration,
    /// Number of hosts randomly sampled for the trace phase (default: 5)
    pub trace_sample_size: usize,
    /// Observer latitude in degrees; auto-detected when absent
    pub observer_latitude: Option<f64>,
    /// Observer longitude in degrees; auto-detected when absent
    pub observer_longitude: Option<f64>,
    /// Skip the latency+geo phase (default: false)
    pub skip_latency: bool,
    /// Skip the trace phase (default: false)
    pub skip_trace: bool,
    /// Verbosity level for progress output
    pub verbose: u8,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            probe_count: DEFAULT_PROBE_COUNT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            probe_interval: DEFAULT_PROBE_INTERVAL,
            max_hops: DEFAULT_MAX_HOPS,
            hop_timeout: DEFAULT_HOP_TIMEOUT,
            trace_timeout: DEFAULT_TRACE_TIMEOUT,
            trace_sample_size: DEFAULT_TRACE_SAMPLE_SIZE,
            observer_latitude: None,
            observer_longitude: None,
            skip_latency: false,
            skip_trace: false,
            verbose: 0,
        }
    }
}

impl SurveyConfig {
    /// Create a new SurveyConfig builder
    pub fn builder() -> SurveyConfigBuilder {
        SurveyConfigBuilder::new()
    }

    /// Configured observer coordinates, when both are present
    pub fn observer_coordinates(&self) -> Option<(f64, f64)> {
        match (self.observer_latitude, self.observer_longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.probe_count < 1 {
            return Err("probe_count must be at least 1".to_string());
        }
        if self.probe_timeout.as_millis() == 0 {
            return Err("probe_timeout must be greater than 0".to_string());
        }
        if self.max_hops < 1 {
            return Err("max_hops must be at least 1".to_string());
        }
        if self.trace_timeout.as_millis() == 0 {
            return Err("trace_timeout must be greater than 0".to_string());
        }
        if self.trace_sample_size < 1 {
            return Err("trace_sample_size must be at least 1".to_string());
        }
        match (self.observer_latitude, self.observer_longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    return Err("observer latitude must be in [-90, 90]".to_string());
                }
                if !(-180.0..=180.0).contains(&lon) {
                    return Err("observer longitude must be in [-180, 180]".to_string());
                }
            }
            (None, None) => {}
            _ => {
                return Err(
                    "observer latitude and longitude must be given together".to_string(),
                );
            }
        }
        Ok(())
    }
}

/// Builder for SurveyConfig
pub struct SurveyConfigBuilder {
    config: SurveyConfig,
}

impl SurveyConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: SurveyConfig::default(),
        }
    }

    /// Set the number of echo probes per host
    pub fn probe_count(mut self, count: u32) -> Self {
        self.config.probe_count = count;
        self
    }

    /// Set the per-probe timeout
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout = timeout;
        self
    }

    /// Set the pause between successive echo probes
    pub fn probe_interval(mut self, interval: Duration) -> Self {
        self.config.probe_interval = interval;
        self
    }

    /// Set the maximum number of hops per trace
    pub fn max_hops(mut self, hops: u32) -> Self {
        self.config.max_hops = hops;
        self
    }

    /// Set the per-hop wait passed to the trace command
    pub fn hop_timeout(mut self, timeout: Duration) -> Self {
        self.config.hop_timeout = timeout;
        self
    }

    /// Set the overall bound on one trace invocation
    pub fn trace_timeout(mut self, timeout: Duration) -> Self {
        self.config.trace_timeout = timeout;
        self
    }

    /// Set the trace sample size
    pub fn trace_sample_size(mut self, size: usize) -> Self {
        self.config.trace_sample_size = size;
        self
    }

    /// Set the observer coordinates
    pub fn observer(mut self, latitude: f64, longitude: f64) -> Self {
        self.config.observer_latitude = Some(latitude);
        self.config.observer_longitude = Some(longitude);
        self
    }

    /// Skip or run the latency+geo phase
    pub fn skip_latency(mut self, skip: bool) -> Self {
        self.config.skip_latency = skip;
        self
    }

    /// Skip or run the trace phase
    pub fn skip_trace(mut self, skip: bool) -> Self {
        self.config.skip_trace = skip;
        self
    }

    /// Set the verbosity level
    pub fn verbose(mut self, verbose: u8) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<SurveyConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for SurveyConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SurveyConfig::default();
        assert_eq!(config.probe_count, 100);
        assert_eq!(config.max_hops, 30);
        assert_eq!(config.trace_sample_size, 5);
        assert_eq!(config.probe_interval.as_millis(), 200);
        assert!(!config.skip_latency);
        assert!(!config.skip_trace);
        assert!(config.observer_coordinates().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = SurveyConfig::builder()
            .probe_count(4)
            .probe_timeout(Duration::from_millis(500))
            .max_hops(15)
            .trace_sample_size(3)
            .observer(40.4444, -86.9256)
            .build()
            .unwrap();

        assert_eq!(config.probe_count, 4);
        assert_eq!(config.probe_timeout.as_millis(), 500);
        assert_eq!(config.max_hops, 15);
        assert_eq!(config.observer_coordinates(), Some((40.4444, -86.9256)));
    }

    #[test]
    fn test_config_validation() {
        // Zero probe count
        let result = SurveyConfig::builder().probe_count(0).build();
        assert!(result.is_err());

        // Zero probe timeout
        let result = SurveyConfig::builder()
            .probe_timeout(Duration::from_millis(0))
            .build();
        assert!(result.is_err());

        // Zero max hops
        let result = SurveyConfig::builder().max_hops(0).build();
        assert!(result.is_err());

        // Zero sample size
        let result = SurveyConfig::builder().trace_sample_size(0).build();
        assert!(result.is_err());

        // Out-of-range observer coordinates
        let result = SurveyConfig::builder().observer(91.0, 0.0).build();
        assert!(result.is_err());
        let result = SurveyConfig::builder().observer(0.0, 181.0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_observer_rejected() {
        let mut config = SurveyConfig::default();
        config.observer_latitude = Some(40.0);
        assert!(config.validate().is_err());
        assert!(config.observer_coordinates().is_none());
    }
}
