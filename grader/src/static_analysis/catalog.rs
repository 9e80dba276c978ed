//! # Category Catalog
//!
//! Static-analysis categories group tool-specific issue categories under a
//! single name with a shared penalty. Feedback does not store a reference to
//! its category; the catalog resolves `(tool, tool category)` every time the
//! feedback is graded, so reconfiguring a category changes grading on the next
//! re-evaluation without rewriting stored feedback.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;
use validator::Validate;

use crate::error::GraderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryState {
    /// Issues are shown and penalised.
    #[default]
    Active,
    /// Issues are shown but carry no penalty.
    Feedback,
    /// Issues are discarded.
    Inactive,
}

/// Links one tool-specific issue category to a catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMapping {
    pub tool: String,
    pub category: String,
}

impl CategoryMapping {
    pub fn new(tool: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            category: category.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StaticAnalysisCategory {
    #[validate(length(min = 1, message = "category name must not be empty"))]
    pub name: String,
    #[validate(range(min = 0.0, message = "penalty_per_issue must not be negative"))]
    pub penalty_per_issue: f64,
    /// Per-category cap; `None` is unbounded.
    #[serde(default)]
    #[validate(range(min = 0.0, message = "max_penalty must not be negative"))]
    pub max_penalty: Option<f64>,
    #[serde(default)]
    pub state: CategoryState,
    #[serde(default)]
    pub mappings: Vec<CategoryMapping>,
}

impl StaticAnalysisCategory {
    pub fn new(name: impl Into<String>, penalty_per_issue: f64) -> Self {
        Self {
            name: name.into(),
            penalty_per_issue,
            max_penalty: None,
            state: CategoryState::Active,
            mappings: Vec::new(),
        }
    }

    pub fn with_max_penalty(mut self, max_penalty: f64) -> Self {
        self.max_penalty = Some(max_penalty);
        self
    }

    pub fn with_state(mut self, state: CategoryState) -> Self {
        self.state = state;
        self
    }

    pub fn with_mapping(mut self, tool: impl Into<String>, category: impl Into<String>) -> Self {
        self.mappings.push(CategoryMapping::new(tool, category));
        self
    }

    pub fn is_penalised(&self) -> bool {
        self.state == CategoryState::Active
    }

    /// Penalty for `issue_count` issues after the per-category cap.
    pub fn penalty_for(&self, issue_count: usize) -> f64 {
        let raw = issue_count as f64 * self.penalty_per_issue.max(0.0);
        match self.max_penalty {
            Some(cap) => raw.min(cap.max(0.0)),
            None => raw,
        }
    }

    pub fn check(&self) -> Result<(), GraderError> {
        self.validate()
            .map_err(|e| GraderError::InvalidConfig(common::format_validation_errors(&e)))
    }
}

/// Lookup table from `(tool, tool category)` to a configured category.
///
/// Tool names compare case-insensitively. If two categories claim the same
/// mapping, the one listed first wins.
#[derive(Debug, Clone, Default)]
pub struct CategoryCatalog {
    categories: Vec<StaticAnalysisCategory>,
    index: HashMap<(String, String), usize>,
}

impl CategoryCatalog {
    pub fn new(categories: Vec<StaticAnalysisCategory>) -> Self {
        let mut index = HashMap::new();
        for (position, category) in categories.iter().enumerate() {
            for mapping in &category.mappings {
                let key = (mapping.tool.to_ascii_lowercase(), mapping.category.clone());
                if let Some(existing) = index.get(&key) {
                    let owner: &StaticAnalysisCategory = &categories[*existing];
                    warn!(
                        tool = %mapping.tool,
                        tool_category = %mapping.category,
                        kept = %owner.name,
                        ignored = %category.name,
                        "Static analysis mapping claimed by two categories"
                    );
                    continue;
                }
                index.insert(key, position);
            }
        }
        Self { categories, index }
    }

    pub fn resolve(&self, tool: &str, tool_category: &str) -> Option<&StaticAnalysisCategory> {
        self.index
            .get(&(tool.to_ascii_lowercase(), tool_category.to_string()))
            .map(|&position| &self.categories[position])
    }

    pub fn get(&self, name: &str) -> Option<&StaticAnalysisCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn categories(&self) -> &[StaticAnalysisCategory] {
        &self.categories
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl From<Vec<StaticAnalysisCategory>> for CategoryCatalog {
    fn from(categories: Vec<StaticAnalysisCategory>) -> Self {
        Self::new(categories)
    }
}
