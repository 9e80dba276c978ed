//! Engine-wide grading settings.
//!
//! These are not per-exercise values; every exercise graded by one process
//! shares them. They are loaded from a JSON file where every field is
//! optional and falls back to its default function.

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error;

/// Value substituted for `max_points` when an exercise offers zero points.
///
/// The number has no meaning of its own; it only has to be non-zero so the
/// ratios between test cases survive the percentage conversion.
pub const DEFAULT_ZERO_POINT_PLACEHOLDER: f64 = 100.0;

#[derive(Debug, Error)]
pub enum GradingConfigError {
    #[error("failed to access grading config at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid grading config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GradingConfig {
    #[serde(default = "default_zero_point_placeholder")]
    pub zero_point_placeholder: f64,

    /// Decimal places the raw percentage is rounded to before the final
    /// integer rounding.
    #[serde(default = "default_score_precision")]
    pub score_precision: u32,

    #[serde(default = "default_re_evaluation_concurrency")]
    pub re_evaluation_concurrency: usize,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            zero_point_placeholder: default_zero_point_placeholder(),
            score_precision: default_score_precision(),
            re_evaluation_concurrency: default_re_evaluation_concurrency(),
        }
    }
}

impl GradingConfig {
    /// Clamps values that would break the arithmetic back to usable ones.
    pub fn sanitize(mut self) -> Self {
        if !(self.zero_point_placeholder.is_finite() && self.zero_point_placeholder > 0.0) {
            tracing::warn!(
                "zero_point_placeholder {} is unusable, falling back to {}",
                self.zero_point_placeholder,
                DEFAULT_ZERO_POINT_PLACEHOLDER
            );
            self.zero_point_placeholder = DEFAULT_ZERO_POINT_PLACEHOLDER;
        }
        self.score_precision = self.score_precision.min(10);
        self.re_evaluation_concurrency = self.re_evaluation_concurrency.max(1);
        self
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, GradingConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| GradingConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let cfg: GradingConfig = serde_json::from_str(&contents)?;
        Ok(cfg.sanitize())
    }

    /// Loads from `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&str>) -> Result<Self, GradingConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), GradingConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| GradingConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

//Default Functions

fn default_zero_point_placeholder() -> f64 {
    DEFAULT_ZERO_POINT_PLACEHOLDER
}

fn default_score_precision() -> u32 {
    4
}

fn default_re_evaluation_concurrency() -> usize {
    8
}
