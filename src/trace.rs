//! Path tracing via the platform trace command
//!
//! Spawns `traceroute` (or `tracert` on Windows), parses the hop lines, and
//! returns an ordered hop sequence. Unresponsive hops are retained so hop
//! indices stay contiguous; a trace that times out yields an empty or
//! partial sequence rather than an error.

use crate::survey::types::Hop;
use std::net::IpAddr;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Default maximum number of hops per trace
pub const DEFAULT_MAX_HOPS: u32 = 30;

/// Default per-hop wait passed to the trace command
pub const DEFAULT_HOP_TIMEOUT: Duration = Duration::from_secs(1);

/// Default overall bound on one trace invocation
pub const DEFAULT_TRACE_TIMEOUT: Duration = Duration::from_secs(120);

/// Error type for path tracing
///
/// Per-hop failures are not errors; they come back as unresponsive hops.
/// These variants cover the trace machinery itself.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// The platform trace command is not installed
    #[error("Trace command not found: {0}")]
    CommandNotFound(String),

    /// The trace command could not be started
    #[error("Failed to run trace command: {0}")]
    Spawn(String),
}

/// A path discovery backend.
///
/// Returns hops in path order; the hop at position `i` has hop index
/// `i + 1`. Test code swaps in scripted implementations.
#[async_trait::async_trait]
pub trait HopTracer: Send + Sync {
    /// Trace the path to `host`, visiting at most `max_hops` hops.
    async fn trace(&self, host: IpAddr, max_hops: u32) -> Result<Vec<Hop>, TraceError>;
}

/// Tracer that shells out to the platform trace command.
#[derive(Debug, Clone)]
pub struct SystemTracer {
    hop_timeout: Duration,
    overall_timeout: Duration,
}

impl SystemTracer {
    /// Create a tracer with default timeouts
    pub fn new() -> Self {
        Self {
            hop_timeout: DEFAULT_HOP_TIMEOUT,
            overall_timeout: DEFAULT_TRACE_TIMEOUT,
        }
    }

    /// Set the per-hop wait passed to the trace command
    pub fn with_hop_timeout(mut self, timeout: Duration) -> Self {
        self.hop_timeout = timeout;
        self
    }

    /// Set the overall bound on one trace invocation
    pub fn with_overall_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = timeout;
        self
    }

    fn command(&self, host: IpAddr, max_hops: u32) -> Command {
        let mut cmd = if cfg!(windows) {
            let mut cmd = Command::new("tracert");
            cmd.arg("-d")
                .arg("-h")
                .arg(max_hops.to_string())
                .arg("-w")
                .arg(self.hop_timeout.as_millis().to_string());
            cmd
        } else {
            let mut cmd = Command::new("traceroute");
            cmd.arg("-n")
                .arg("-m")
                .arg(max_hops.to_string())
                .arg("-w")
                .arg(self.hop_timeout.as_secs().max(1).to_string());
            cmd
        };
        cmd.arg(host.to_string())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for SystemTracer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl HopTracer for SystemTracer {
    async fn trace(&self, host: IpAddr, max_hops: u32) -> Result<Vec<Hop>, TraceError> {
        let mut cmd = self.command(host, max_hops);

        let output = match tokio::time::timeout(self.overall_timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                let name = if cfg!(windows) { "tracert" } else { "traceroute" };
                return Err(TraceError::CommandNotFound(name.to_string()));
            }
            Ok(Err(e)) => return Err(TraceError::Spawn(e.to_string())),
            // Overall timeout: the child is killed on drop and the host is
            // recorded as a failed trace with no hops.
            Err(_) => return Ok(Vec::new()),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(normalize_hops(parse_trace_output(&stdout), host))
    }
}

/// Parse raw trace command output into `(hop_index, hop)` pairs.
///
/// The tokenizer covers both Unix `traceroute` and Windows `tracert`
/// formats: a line starts with the hop number, and the remaining tokens are
/// some mix of RTT samples (`12.3 ms`, `<1 ms`, `*` for a lost sample),
/// addresses (bare, parenthesized, or bracketed), hostnames, and filler
/// text such as `Request timed out.`. Only the first address and the RTT
/// samples matter.
pub fn parse_trace_output(output: &str) -> Vec<(u32, Hop)> {
    let mut hops = Vec::new();

    for line in output.lines() {
        let mut tokens = line.split_whitespace();
        let Some(index) = tokens.next().and_then(|t| t.parse::<u32>().ok()) else {
            // Header or banner line
            continue;
        };

        let mut addr: Option<IpAddr> = None;
        let mut samples: Vec<f64> = Vec::new();
        let mut pending_rtt: Option<f64> = None;

        for token in tokens {
            if token == "ms" {
                if let Some(rtt) = pending_rtt.take() {
                    samples.push(rtt);
                }
                continue;
            }
            pending_rtt = None;

            if token == "*" {
                continue;
            }
            if let Some(rtt) = parse_rtt_token(token) {
                pending_rtt = Some(rtt);
                continue;
            }
            let trimmed = token
                .trim_start_matches(['(', '['])
                .trim_end_matches([')', ']']);
            if addr.is_none() {
                if let Ok(parsed) = trimmed.parse::<IpAddr>() {
                    addr = Some(parsed);
                }
            }
        }

        let hop = match addr {
            Some(addr) => Hop::Responsive {
                addr,
                rtt: mean_rtt(&samples),
            },
            None => Hop::Unresponsive,
        };
        hops.push((index, hop));
    }

    hops
}

/// Parse a candidate RTT token; `<1` becomes 0.5 ms as in Windows tracert
/// output, where sub-millisecond timings are reported as `<1 ms`.
fn parse_rtt_token(token: &str) -> Option<f64> {
    if let Some(rest) = token.strip_prefix('<') {
        return rest.parse::<f64>().ok().map(|upper| upper / 2.0);
    }
    token.parse::<f64>().ok()
}

fn mean_rtt(samples: &[f64]) -> Option<Duration> {
    if samples.is_empty() {
        return None;
    }
    let mean_ms = samples.iter().sum::<f64>() / samples.len() as f64;
    Some(Duration::from_secs_f64(mean_ms / 1000.0))
}

/// Turn parsed `(hop_index, hop)` pairs into a contiguous hop sequence.
///
/// Indices the parser never saw are filled with unresponsive placeholders,
/// duplicate indices keep the first occurrence, and the sequence is
/// truncated once the target itself appears as a hop.
pub fn normalize_hops(parsed: Vec<(u32, Hop)>, target: IpAddr) -> Vec<Hop> {
    let mut hops: Vec<Hop> = Vec::new();

    for (index, hop) in parsed {
        let next = hops.len() as u32 + 1;
        if index < next {
            continue;
        }
        for _ in next..index {
            hops.push(Hop::Unresponsive);
        }
        let reached = hop.addr() == Some(target);
        hops.push(hop);
        if reached {
            break;
        }
    }

    hops
}
