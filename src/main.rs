//! netmeter - Batch network latency survey CLI
//!
//! Loads a host list, runs the latency and trace phases, and writes the
//! per-host and per-hop CSV tables.

use anyhow::{Context, Result};
use clap::Parser;
use netmeter::{SurveyConfig, SurveyResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Command-line arguments for the survey tool.
#[derive(Parser, Debug)]
#[clap(author, version, about = "Batch network latency survey with geo-distance correlation", long_about = None)]
struct Args {
    /// Host list file: plain text (one address per line, # comments) or CSV
    /// with an ip/host column
    input: PathBuf,

    /// Output directory for the result tables
    #[clap(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Number of echo probes per host
    #[clap(short = 'c', long, default_value_t = 100)]
    probe_count: u32,

    /// Timeout for an individual echo probe in milliseconds
    #[clap(long, default_value_t = 10_000)]
    probe_timeout_ms: u64,

    /// Pause between successive echo probes in milliseconds
    #[clap(long, default_value_t = 200)]
    probe_interval_ms: u64,

    /// Maximum number of hops per trace
    #[clap(short = 'm', long, default_value_t = 30)]
    max_hops: u32,

    /// Per-hop wait for the trace command in milliseconds
    #[clap(long, default_value_t = 1000)]
    hop_timeout_ms: u64,

    /// Overall timeout for one trace in milliseconds
    #[clap(long, default_value_t = 120_000)]
    trace_timeout_ms: u64,

    /// Number of hosts randomly sampled for the trace phase
    #[clap(long, default_value_t = 5)]
    trace_sample: usize,

    /// Observer latitude (skips public IP geolocation)
    #[clap(long, requires = "longitude")]
    latitude: Option<f64>,

    /// Observer longitude (skips public IP geolocation)
    #[clap(long, requires = "latitude")]
    longitude: Option<f64>,

    /// Skip the latency phase (reuse an existing per-host table)
    #[clap(long)]
    skip_ping: bool,

    /// Skip the trace phase (reuse an existing per-hop table)
    #[clap(long)]
    skip_traceroute: bool,

    /// Print the full result as JSON instead of a summary
    #[clap(long)]
    json: bool,

    /// Enable verbose progress output
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    // Single-threaded runtime: the survey is sequential by design.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime");

    if let Err(e) = runtime.block_on(async_main()) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn async_main() -> Result<()> {
    let args = Args::parse();

    let hosts = load_hosts(&args.input)
        .with_context(|| format!("failed to load host list from {}", args.input.display()))?;
    if args.verbose > 0 {
        println!("Loaded {} hosts from {}", hosts.len(), args.input.display());
    }

    let mut builder = SurveyConfig::builder()
        .probe_count(args.probe_count)
        .probe_timeout(Duration::from_millis(args.probe_timeout_ms))
        .probe_interval(Duration::from_millis(args.probe_interval_ms))
        .max_hops(args.max_hops)
        .hop_timeout(Duration::from_millis(args.hop_timeout_ms))
        .trace_timeout(Duration::from_millis(args.trace_timeout_ms))
        .trace_sample_size(args.trace_sample)
        .skip_latency(args.skip_ping)
        .skip_trace(args.skip_traceroute)
        .verbose(args.verbose);
    if let (Some(lat), Some(lon)) = (args.latitude, args.longitude) {
        builder = builder.observer(lat, lon);
    }
    let config = builder
        .build()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    let result = netmeter::run_survey(&hosts, config).await?;

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("failed to create {}", args.output_dir.display()))?;
    write_tables(&args, &result)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&args, &hosts, &result);
    }

    Ok(())
}

/// Load host identifiers from a text or CSV file.
///
/// Text files carry one address per line with `#` comment lines ignored.
/// CSV files are read from their `ip`, `host`, or `IP/HOST` column, falling
/// back to the first column.
fn load_hosts(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;

    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let hosts = if is_csv {
        parse_csv_hosts(&content)
    } else {
        content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(ToString::to_string)
            .collect()
    };

    if hosts.is_empty() {
        anyhow::bail!("no host addresses found in {}", path.display());
    }
    Ok(hosts)
}

fn parse_csv_hosts(content: &str) -> Vec<String> {
    let mut lines = content.lines();
    let Some(header) = lines.next() else {
        return Vec::new();
    };

    let column = header
        .split(',')
        .position(|name| {
            let name = name.trim();
            name.eq_ignore_ascii_case("ip")
                || name.eq_ignore_ascii_case("host")
                || name.eq_ignore_ascii_case("IP/HOST")
        })
        .unwrap_or(0);

    lines
        .filter_map(|line| line.split(',').nth(column))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn write_tables(args: &Args, result: &SurveyResult) -> Result<()> {
    if !args.skip_ping {
        let path = args.output_dir.join("ping_results.csv");
        std::fs::write(&path, result.host_csv())
            .with_context(|| format!("failed to write {}", path.display()))?;
        if args.verbose > 0 {
            println!("Wrote {}", path.display());
        }
    }
    if !args.skip_traceroute {
        let path = args.output_dir.join("traceroute_results.csv");
        std::fs::write(&path, result.hop_csv())
            .with_context(|| format!("failed to write {}", path.display()))?;
        if args.verbose > 0 {
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn print_summary(args: &Args, hosts: &[String], result: &SurveyResult) {
    println!("Survey complete in {:.1}s", result.total_duration.as_secs_f64());
    println!("  Hosts:       {}", hosts.len());
    if !args.skip_ping {
        println!("  Reachable:   {}", result.reachable_count());
        println!("  Unreachable: {}", result.unreachable_count());
    }
    if !args.skip_traceroute {
        println!("  Traced:      {}", result.traced_host_count());
        println!(
            "  Hops:        {} ({} responsive)",
            result.hop_reports.len(),
            result.responsive_hop_count()
        );
        if let Some(avg) = result.average_hop_rtt_ms() {
            println!("  Avg hop RTT: {avg:.2} ms");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_hosts_named_column() {
        let content = "name,IP/HOST,port\na,10.0.0.1,5201\nb,10.0.0.2,5201\n";
        assert_eq!(parse_csv_hosts(content), vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn test_parse_csv_hosts_first_column_fallback() {
        let content = "addr,port\n10.0.0.1,5201\n10.0.0.2,5201\n";
        assert_eq!(parse_csv_hosts(content), vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn test_parse_csv_hosts_skips_empty_cells() {
        let content = "ip\n10.0.0.1\n\n10.0.0.2\n";
        assert_eq!(parse_csv_hosts(content), vec!["10.0.0.1", "10.0.0.2"]);
    }
}
