//! Survey engine: drives both measurement phases over the host list
//!
//! Phase A probes every host for latency and resolves its geolocation and
//! distance from the observer. Phase B traces the path to a random sample
//! of hosts. Hosts are processed one at a time; every network call is
//! bounded by a timeout, and one host's failure never affects another's
//! record.

use crate::geo::{distance_km, GeoLocation, GeoLookup};
use crate::probe::{IcmpProber, LatencyProber};
use crate::public_ip::detect_public_ip;
use crate::survey::config::SurveyConfig;
use crate::survey::error::SurveyError;
use crate::survey::result::SurveyResult;
use crate::survey::types::{HopReport, HostReport, LatencyStats};
use crate::trace::{HopTracer, SystemTracer};
use rand::seq::IndexedRandom;
use std::net::IpAddr;
use std::time::Instant;

/// Orchestrates one survey run.
///
/// The engine owns the result collections for the duration of the run; the
/// probe, trace, and geolocation backends hand back immutable records.
pub struct SurveyEngine {
    config: SurveyConfig,
    prober: Box<dyn LatencyProber>,
    tracer: Box<dyn HopTracer>,
    geo: GeoLookup,
}

impl SurveyEngine {
    /// Create an engine with the default ICMP prober, system tracer, and
    /// ip-api.com geolocation service.
    pub fn new(config: SurveyConfig) -> Result<Self, SurveyError> {
        let prober = IcmpProber::new()
            .with_timeout(config.probe_timeout)
            .with_interval(config.probe_interval);
        let tracer = SystemTracer::new()
            .with_hop_timeout(config.hop_timeout)
            .with_overall_timeout(config.trace_timeout);
        Self::with_services(config, Box::new(prober), Box::new(tracer), GeoLookup::new())
    }

    /// Create an engine over specific backends (used by tests and
    /// alternative measurement implementations).
    pub fn with_services(
        config: SurveyConfig,
        prober: Box<dyn LatencyProber>,
        tracer: Box<dyn HopTracer>,
        geo: GeoLookup,
    ) -> Result<Self, SurveyError> {
        config.validate().map_err(SurveyError::ConfigError)?;
        Ok(Self {
            config,
            prober,
            tracer,
            geo,
        })
    }

    /// Run both phases over the host list.
    ///
    /// Fatal errors (empty list, both phases skipped) surface before any
    /// measurement begins; from then on every failure is captured as data
    /// in the output rows.
    pub async fn run(self, hosts: &[String]) -> Result<SurveyResult, SurveyError> {
        if hosts.is_empty() {
            return Err(SurveyError::EmptyHostList);
        }
        if self.config.skip_latency && self.config.skip_trace {
            return Err(SurveyError::NothingToDo);
        }

        let start = Instant::now();

        let observer = if self.config.skip_latency {
            GeoLocation::not_found()
        } else {
            self.locate_observer().await
        };

        let host_reports = if self.config.skip_latency {
            Vec::new()
        } else {
            self.run_latency_phase(hosts, &observer).await
        };

        let hop_reports = if self.config.skip_trace {
            Vec::new()
        } else {
            self.run_trace_phase(hosts).await
        };

        Ok(SurveyResult {
            host_reports,
            hop_reports,
            observer,
            total_duration: start.elapsed(),
        })
    }

    /// Determine the observer's location: configured coordinates when
    /// given, otherwise public IP detection plus geolocation. Failure
    /// leaves every distance column empty rather than aborting the run.
    async fn locate_observer(&self) -> GeoLocation {
        if let Some((lat, lon)) = self.config.observer_coordinates() {
            return GeoLocation::found(lat, lon, None, None);
        }

        match detect_public_ip().await {
            Ok(ip) => {
                let location = self.geo.resolve(ip).await;
                if self.config.verbose > 0 {
                    match location.coordinates() {
                        Some((lat, lon)) => println!("Observer located at ({lat}, {lon})"),
                        None => println!("Observer geolocation unavailable; distances omitted"),
                    }
                }
                location
            }
            Err(e) => {
                if self.config.verbose > 0 {
                    eprintln!("Public IP detection failed: {e}; distances omitted");
                }
                GeoLocation::not_found()
            }
        }
    }

    /// Phase A: latency probe, geolocation, and distance for every host,
    /// one row per host in input order.
    async fn run_latency_phase(&self, hosts: &[String], observer: &GeoLocation) -> Vec<HostReport> {
        let mut reports = Vec::with_capacity(hosts.len());

        for (i, host) in hosts.iter().enumerate() {
            if self.config.verbose > 0 {
                println!("[{}/{}] probing {host}", i + 1, hosts.len());
            }

            let report = match host.parse::<IpAddr>() {
                Ok(ip) => self.survey_host(host, ip, observer).await,
                Err(_) => {
                    // List validation is the caller's job; an unparsable
                    // entry still gets its row.
                    if self.config.verbose > 0 {
                        eprintln!("  {host} is not an IP address; recorded as unreachable");
                    }
                    HostReport {
                        host: host.clone(),
                        latency: LatencyStats::unreachable(self.config.probe_count),
                        geo: GeoLocation::not_found(),
                        distance_km: None,
                    }
                }
            };
            reports.push(report);
        }

        reports
    }

    async fn survey_host(&self, host: &str, ip: IpAddr, observer: &GeoLocation) -> HostReport {
        let latency = match self.prober.probe(ip, self.config.probe_count).await {
            Ok(stats) => stats,
            Err(e) => {
                if self.config.verbose > 0 {
                    eprintln!("  probe machinery failed for {host}: {e}");
                }
                LatencyStats::unreachable(self.config.probe_count)
            }
        };

        let geo = self.geo.resolve(ip).await;
        let distance = match (observer.coordinates(), geo.coordinates()) {
            (Some((olat, olon)), Some((lat, lon))) => Some(distance_km(olat, olon, lat, lon)),
            _ => None,
        };

        HostReport {
            host: host.to_string(),
            latency,
            geo,
            distance_km: distance,
        }
    }

    /// Phase B: trace the path to a random sample of hosts, without
    /// replacement. A list shorter than the sample size is traced whole, in
    /// input order.
    async fn run_trace_phase(&self, hosts: &[String]) -> Vec<HopReport> {
        let candidates: Vec<(String, IpAddr)> = hosts
            .iter()
            .filter_map(|h| h.parse::<IpAddr>().ok().map(|ip| (h.clone(), ip)))
            .collect();

        let selected: Vec<&(String, IpAddr)> = if candidates.len() <= self.config.trace_sample_size
        {
            candidates.iter().collect()
        } else {
            let mut rng = rand::rng();
            candidates
                .choose_multiple(&mut rng, self.config.trace_sample_size)
                .collect()
        };

        let mut reports = Vec::new();
        for (i, (host, ip)) in selected.iter().enumerate() {
            if self.config.verbose > 0 {
                println!("[{}/{}] tracing {host}", i + 1, selected.len());
            }

            let hops = match self.tracer.trace(*ip, self.config.max_hops).await {
                Ok(hops) => hops,
                Err(e) => {
                    // A failed trace leaves no rows for this host and the
                    // run moves on.
                    if self.config.verbose > 0 {
                        eprintln!("  trace failed for {host}: {e}");
                    }
                    continue;
                }
            };

            for (index, hop) in hops.into_iter().enumerate() {
                reports.push(HopReport {
                    host: host.clone(),
                    hop_index: index as u32 + 1,
                    hop,
                });
            }
        }

        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::provider::{GeoError, GeoProvider};
    use crate::probe::ProbeError;
    use crate::survey::types::Hop;
    use crate::trace::TraceError;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    struct ScriptedProber {
        replies: HashMap<IpAddr, Vec<Duration>>,
    }

    #[async_trait::async_trait]
    impl LatencyProber for ScriptedProber {
        async fn probe(&self, host: IpAddr, count: u32) -> Result<LatencyStats, ProbeError> {
            let samples = self.replies.get(&host).cloned().unwrap_or_default();
            Ok(LatencyStats::from_samples(count, &samples))
        }
    }

    struct ScriptedTracer {
        paths: HashMap<IpAddr, Vec<Hop>>,
    }

    #[async_trait::async_trait]
    impl HopTracer for ScriptedTracer {
        async fn trace(&self, host: IpAddr, _max_hops: u32) -> Result<Vec<Hop>, TraceError> {
            Ok(self.paths.get(&host).cloned().unwrap_or_default())
        }
    }

    struct NoGeo;

    #[async_trait::async_trait]
    impl GeoProvider for NoGeo {
        async fn lookup(&self, _ip: IpAddr) -> Result<GeoLocation, GeoError> {
            Ok(GeoLocation::not_found())
        }
    }

    fn engine_with(
        config: SurveyConfig,
        replies: HashMap<IpAddr, Vec<Duration>>,
        paths: HashMap<IpAddr, Vec<Hop>>,
    ) -> SurveyEngine {
        SurveyEngine::with_services(
            config,
            Box::new(ScriptedProber { replies }),
            Box::new(ScriptedTracer { paths }),
            GeoLookup::with_provider(Arc::new(NoGeo)),
        )
        .unwrap()
    }

    fn hosts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_host_list_is_fatal() {
        let engine = engine_with(SurveyConfig::default(), HashMap::new(), HashMap::new());
        let result = engine.run(&[]).await;
        assert!(matches!(result, Err(SurveyError::EmptyHostList)));
    }

    #[tokio::test]
    async fn test_both_phases_skipped_is_fatal() {
        let config = SurveyConfig::builder()
            .skip_latency(true)
            .skip_trace(true)
            .build()
            .unwrap();
        let engine = engine_with(config, HashMap::new(), HashMap::new());
        let result = engine.run(&hosts(&["10.0.0.1"])).await;
        assert!(matches!(result, Err(SurveyError::NothingToDo)));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let mut config = SurveyConfig::default();
        config.probe_count = 0;
        let result = SurveyEngine::with_services(
            config,
            Box::new(ScriptedProber {
                replies: HashMap::new(),
            }),
            Box::new(ScriptedTracer {
                paths: HashMap::new(),
            }),
            GeoLookup::with_provider(Arc::new(NoGeo)),
        );
        assert!(matches!(result, Err(SurveyError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_rows_in_input_order() {
        let config = SurveyConfig::builder()
            .probe_count(1)
            .skip_trace(true)
            .observer(0.0, 0.0)
            .build()
            .unwrap();
        let list = hosts(&["10.0.0.3", "10.0.0.1", "10.0.0.2"]);
        let engine = engine_with(config, HashMap::new(), HashMap::new());
        let result = engine.run(&list).await.unwrap();
        let order: Vec<&str> = result.host_reports.iter().map(|r| r.host.as_str()).collect();
        assert_eq!(order, vec!["10.0.0.3", "10.0.0.1", "10.0.0.2"]);
    }

    #[tokio::test]
    async fn test_unparsable_host_recorded_not_fatal() {
        let config = SurveyConfig::builder()
            .probe_count(2)
            .skip_trace(true)
            .observer(0.0, 0.0)
            .build()
            .unwrap();
        let mut replies = HashMap::new();
        replies.insert(
            "10.0.0.1".parse().unwrap(),
            vec![Duration::from_millis(8), Duration::from_millis(9)],
        );
        let engine = engine_with(config, replies, HashMap::new());
        let result = engine
            .run(&hosts(&["not-an-ip", "10.0.0.1"]))
            .await
            .unwrap();

        assert_eq!(result.host_reports.len(), 2);
        assert!(!result.host_reports[0].latency.reachable());
        assert!(result.host_reports[1].latency.reachable());
    }

    #[tokio::test]
    async fn test_skip_latency_emits_no_host_rows() {
        let config = SurveyConfig::builder().skip_latency(true).build().unwrap();
        let mut paths = HashMap::new();
        paths.insert(
            "10.0.0.1".parse::<IpAddr>().unwrap(),
            vec![Hop::Responsive {
                addr: "10.0.0.1".parse().unwrap(),
                rtt: Some(Duration::from_millis(3)),
            }],
        );
        let engine = engine_with(config, HashMap::new(), paths);
        let result = engine.run(&hosts(&["10.0.0.1"])).await.unwrap();
        assert!(result.host_reports.is_empty());
        assert_eq!(result.hop_reports.len(), 1);
    }

    #[tokio::test]
    async fn test_small_list_traced_whole() {
        let config = SurveyConfig::builder()
            .probe_count(1)
            .skip_latency(true)
            .trace_sample_size(5)
            .build()
            .unwrap();
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();
        let mut paths = HashMap::new();
        for ip in [a, b] {
            paths.insert(
                ip,
                vec![Hop::Responsive {
                    addr: ip,
                    rtt: Some(Duration::from_millis(1)),
                }],
            );
        }
        let engine = engine_with(config, HashMap::new(), paths);
        let result = engine.run(&hosts(&["10.0.0.1", "10.0.0.2"])).await.unwrap();

        // Fewer hosts than the sample size: every host is traced.
        assert_eq!(result.traced_host_count(), 2);
    }

    #[tokio::test]
    async fn test_sample_size_bounds_trace_phase() {
        let config = SurveyConfig::builder()
            .skip_latency(true)
            .trace_sample_size(2)
            .build()
            .unwrap();
        let list = hosts(&["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4"]);
        let mut paths = HashMap::new();
        for host in &list {
            let ip: IpAddr = host.parse().unwrap();
            paths.insert(
                ip,
                vec![Hop::Responsive {
                    addr: ip,
                    rtt: Some(Duration::from_millis(1)),
                }],
            );
        }
        let engine = engine_with(config, HashMap::new(), paths);
        let result = engine.run(&list).await.unwrap();
        assert_eq!(result.traced_host_count(), 2);
    }

    #[tokio::test]
    async fn test_hop_indices_contiguous() {
        let config = SurveyConfig::builder().skip_latency(true).build().unwrap();
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        let mut paths = HashMap::new();
        paths.insert(
            ip,
            vec![
                Hop::Responsive {
                    addr: "10.0.0.5".parse().unwrap(),
                    rtt: Some(Duration::from_millis(5)),
                },
                Hop::Unresponsive,
                Hop::Responsive {
                    addr: ip,
                    rtt: Some(Duration::from_millis(9)),
                },
            ],
        );
        let engine = engine_with(config, HashMap::new(), paths);
        let result = engine.run(&hosts(&["10.0.0.1"])).await.unwrap();

        let indices: Vec<u32> = result.hop_reports.iter().map(|r| r.hop_index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }
}
