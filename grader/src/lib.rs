//! # Grader Library
//!
//! Turns raw test results and static-analysis findings of a programming
//! submission into a normalized score, a short result summary and per-exercise
//! statistics.
//!
//! ## Key Concepts
//! - **GradingContext**: The exercise's parameters, test cases and static-analysis catalog.
//! - **ResultAssembler**: Grades one submission: visibility filtering, weighted test points,
//!   static-analysis penalty, score and result string.
//! - **ReEvaluationCoordinator**: Re-grades every stored result of an exercise after its
//!   configuration changed.
//! - **GradingStatisticsAggregator**: Pass/fail counts per test case and issue histograms per
//!   category over the latest result of each participation.
//!
//! Grading itself is synchronous and never fails. Only the result store seam and
//! configuration loading return errors.
//!
//! ```
//! use grader::{Feedback, GradingContext, ResultAssembler, Submission};
//! use grader::types::{ExerciseGradingParameters, TestCase};
//!
//! let ctx = GradingContext::new(
//!     ExerciseGradingParameters::new(42.0),
//!     vec![
//!         TestCase::new("test1", 5.0).with_bonus_points(7.0),
//!         TestCase::new("test2", 2.0).with_bonus_multiplier(2.0),
//!         TestCase::new("test3", 3.0).with_bonus_points(10.5),
//!     ],
//! );
//! let submission = Submission::student(vec![Feedback::test_case("test3", true)]);
//!
//! let result = ResultAssembler::default().assemble(&ctx, &submission);
//! assert_eq!(result.score, 55);
//! assert_eq!(result.result_string, "1 of 3 passed");
//! ```

pub mod assembler;
pub mod error;
pub mod penalty;
pub mod reevaluation;
pub mod scorer;
pub mod static_analysis;
pub mod statistics;
pub mod store;
pub mod traits;
pub mod types;
pub mod visibility;

pub use assembler::{GradingContext, ResultAssembler, Submission};
pub use error::GraderError;
pub use reevaluation::ReEvaluationCoordinator;
pub use statistics::{GradingStatistics, GradingStatisticsAggregator, TestCaseStats};
pub use store::InMemoryResultStore;
pub use traits::ResultStore;
pub use types::{Feedback, GradingResult, StoredResult};

use common::config::Config;
use common::logger::init_logger;
use tracing::{debug, info};
use util::grading_config::GradingConfig;

/// Loads the grading settings named by `GRADING_CONFIG_PATH`, or the defaults
/// when the variable is unset or the config has not been initialised.
pub fn load_settings(config: Option<&Config>) -> Result<GradingConfig, GraderError> {
    let path = config.and_then(|c| c.grading_config_path.as_deref());
    let settings = GradingConfig::load_or_default(path)?;
    info!(
        path = path.unwrap_or("<defaults>"),
        zero_point_placeholder = settings.zero_point_placeholder,
        score_precision = settings.score_precision,
        "Loaded grading settings"
    );
    Ok(settings)
}

/// A [`ResultAssembler`] configured from the global [`Config`].
pub fn assembler_from_env() -> Result<ResultAssembler, GraderError> {
    Ok(ResultAssembler::new(load_settings(Config::get())?))
}

/// Installs the stdout and file logger described by `config`, then builds a
/// [`ResultAssembler`] from its grading settings.
///
/// A logger installed earlier in the process is kept as is.
pub fn init_from_config(config: &Config) -> Result<ResultAssembler, GraderError> {
    match init_logger(&config.log_level, &config.log_file) {
        Ok(()) => {}
        Err(fern::InitError::SetLoggerError(_)) => debug!("Logger already installed"),
        Err(e) => return Err(GraderError::Logger(e.to_string())),
    }
    Ok(ResultAssembler::new(load_settings(Some(config))?))
}

/// Loads `.env`, initialises the global [`Config`] and calls [`init_from_config`].
pub fn init_from_env(env_path: &str) -> Result<ResultAssembler, GraderError> {
    init_from_config(Config::init(env_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use util::test_helpers::write_temp_file;

    fn config(path: Option<String>) -> Config {
        Config {
            project_name: "grader".to_string(),
            log_level: "info".to_string(),
            log_file: "logs/grader.log".to_string(),
            grading_config_path: path,
        }
    }

    #[test]
    fn test_load_settings_defaults() {
        assert_eq!(load_settings(None).unwrap(), GradingConfig::default());
        assert_eq!(load_settings(Some(&config(None))).unwrap(), GradingConfig::default());
    }

    #[test]
    fn test_load_settings_from_file() {
        let (_dir, path) = write_temp_file("grading.json", r#"{ "zero_point_placeholder": 50.0 }"#);
        let settings = load_settings(Some(&config(Some(path.display().to_string())))).unwrap();
        assert_eq!(settings.zero_point_placeholder, 50.0);
        assert_eq!(settings.score_precision, 4);
    }

    #[test]
    fn test_init_from_config_creates_log_file() {
        let (dir, settings) = write_temp_file("grading.json", r#"{ "score_precision": 2 }"#);
        let log_file = dir.path().join("logs").join("grader.log");
        let mut config = config(Some(settings.display().to_string()));
        config.log_file = log_file.display().to_string();

        init_from_config(&config).unwrap();
        assert!(log_file.exists());
        // A second call keeps the installed logger.
        init_from_config(&config).unwrap();
    }

    #[test]
    fn test_init_from_config_unwritable_log_file() {
        let (_dir, blocker) = write_temp_file("not_a_dir", "");
        let mut config = config(None);
        config.log_file = blocker.join("grader.log").display().to_string();
        let err = init_from_config(&config).unwrap_err();
        assert!(matches!(err, GraderError::Logger(_)));
    }

    #[test]
    fn test_load_settings_missing_file() {
        let err = load_settings(Some(&config(Some("/nonexistent/grading.json".to_string())))).unwrap_err();
        assert!(matches!(err, GraderError::Settings(_)));
    }
}
