//! Grader Error Types
//!
//! Scoring itself never fails: malformed feedback is dropped and degenerate
//! configuration falls back to defined values. [`GraderError`] only covers the
//! seams around it, i.e. result persistence, logger setup and configuration
//! loading or validation.

use thiserror::Error;
use util::grading_config::GradingConfigError;

#[derive(Debug, Error)]
pub enum GraderError {
    /// The result store could not be read or written.
    #[error("result store error: {0}")]
    Store(String),
    /// Exercise or test case configuration failed validation.
    #[error("invalid grading configuration: {0}")]
    InvalidConfig(String),
    /// The log file could not be opened.
    #[error("logger initialization failed: {0}")]
    Logger(String),
    /// Engine settings could not be loaded.
    #[error(transparent)]
    Settings(#[from] GradingConfigError),
}
