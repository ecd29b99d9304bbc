//! Error types for survey runs
//!
//! Per-host and per-hop failures never surface here; they are recorded as
//! data in the output rows. These variants cover the fatal conditions that
//! stop a run before any measurement begins.

use thiserror::Error;

/// Errors that can abort a survey run
#[derive(Debug, Error)]
pub enum SurveyError {
    /// The host list was empty
    #[error("Host list is empty")]
    EmptyHostList,

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Both phases were disabled, leaving nothing to measure
    #[error("Both survey phases are skipped; nothing to do")]
    NothingToDo,
}
