//! Survey orchestration: configuration, engine, and result records

pub mod config;
pub mod engine;
pub mod error;
pub mod result;
pub mod types;

// Re-export commonly used types
pub use config::{SurveyConfig, SurveyConfigBuilder, DEFAULT_TRACE_SAMPLE_SIZE};
pub use engine::SurveyEngine;
pub use error::SurveyError;
pub use result::SurveyResult;
pub use types::{Hop, HopReport, HostReport, LatencyStats};

/// Run a full survey over `hosts` with the default measurement backends.
///
/// Convenience wrapper over [`SurveyEngine::new`] followed by
/// [`SurveyEngine::run`].
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> Result<(), netmeter::SurveyError> {
/// let config = netmeter::SurveyConfig::builder()
///     .probe_count(10)
///     .build()
///     .map_err(netmeter::SurveyError::ConfigError)?;
/// let hosts = vec!["8.8.8.8".to_string(), "1.1.1.1".to_string()];
/// let result = netmeter::run_survey(&hosts, config).await?;
/// println!("{} hosts reachable", result.reachable_count());
/// # Ok(())
/// # }
/// ```
pub async fn run_survey(hosts: &[String], config: SurveyConfig) -> Result<SurveyResult, SurveyError> {
    SurveyEngine::new(config)?.run(hosts).await
}
