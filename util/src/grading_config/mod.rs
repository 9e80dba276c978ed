pub mod grading_config;

pub use grading_config::{GradingConfig, GradingConfigError};
