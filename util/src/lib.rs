pub mod grading_config;
pub mod test_helpers;
