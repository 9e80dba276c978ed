use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    /// Optional path to a grading settings JSON file.
    pub grading_config_path: Option<String>,
}

static CONFIG: OnceCell<Config> = OnceCell::new();

impl Config {
    /// Reads the process environment, after loading `env_path` if it exists.
    pub fn from_env(env_path: &str) -> Self {
        dotenvy::from_filename(env_path).ok();

        let project_name = env::var("PROJECT_NAME").unwrap_or_else(|_| "grader".into());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| "logs/grader.log".into());
        let grading_config_path = env::var("GRADING_CONFIG_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty());

        Config {
            project_name,
            log_level,
            log_file,
            grading_config_path,
        }
    }

    /// Initialises the global config once; later calls return the first value.
    pub fn init(env_path: &str) -> &'static Self {
        CONFIG.get_or_init(|| Self::from_env(env_path))
    }

    pub fn get() -> Option<&'static Self> {
        CONFIG.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_vars() {
        for key in ["PROJECT_NAME", "LOG_LEVEL", "LOG_FILE", "GRADING_CONFIG_PATH"] {
            env::remove_var(key);
        }
    }

    /// Missing variables fall back to defaults.
    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_vars();
        let cfg = Config::from_env("does-not-exist.env");
        assert_eq!(cfg.project_name, "grader");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.log_file, "logs/grader.log");
        assert!(cfg.grading_config_path.is_none());
    }

    /// Values from a dotenv file are picked up.
    #[test]
    #[serial]
    fn test_from_env_reads_dotenv_file() {
        clear_vars();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "LOG_LEVEL=debug").unwrap();
        writeln!(file, "GRADING_CONFIG_PATH=/tmp/grading.json").unwrap();

        let cfg = Config::from_env(file.path().to_str().unwrap());
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.grading_config_path.as_deref(), Some("/tmp/grading.json"));
        clear_vars();
    }

    /// The global instance is set once and then shared.
    #[test]
    #[serial]
    fn test_init_is_idempotent() {
        clear_vars();
        let first = Config::init("does-not-exist.env");
        env::set_var("PROJECT_NAME", "changed");
        let second = Config::init("does-not-exist.env");
        assert_eq!(first.project_name, second.project_name);
        assert!(Config::get().is_some());
        clear_vars();
    }
}
