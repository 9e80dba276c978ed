//! # Static Analysis Penalty Engine
//!
//! Turns the static-analysis issues that survived filtering into a point
//! deduction. Issues are grouped by category; each category deducts
//! `issue_count × penalty_per_issue`, limited by its own `max_penalty`. The sum
//! over all categories is then limited by the exercise-wide cap, expressed as a
//! percentage of the exercise's max points.
//!
//! The exercise-wide cap is consumed category by category in name order, which
//! fixes how much of the total each category is charged with.

use std::collections::BTreeMap;

use crate::static_analysis::CategoryCatalog;
use crate::types::{ExerciseGradingParameters, Feedback};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CategoryPenalty {
    pub issue_count: usize,
    /// Points deducted for this category after both caps.
    pub penalty: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PenaltyBreakdown {
    pub total: f64,
    pub per_category: BTreeMap<String, CategoryPenalty>,
}

impl PenaltyBreakdown {
    /// Credits for one issue of `category`, zero or negative.
    pub fn credit_per_issue(&self, category: &str) -> f64 {
        match self.per_category.get(category) {
            Some(entry) if entry.issue_count > 0 && entry.penalty > 0.0 => {
                -entry.penalty / entry.issue_count as f64
            }
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StaticAnalysisPenaltyEngine<'a> {
    catalog: &'a CategoryCatalog,
    enabled: bool,
    max_penalty: Option<f64>,
}

impl<'a> StaticAnalysisPenaltyEngine<'a> {
    /// `max_points` must already have the zero-point placeholder applied.
    pub fn new(catalog: &'a CategoryCatalog, params: &ExerciseGradingParameters, max_points: f64) -> Self {
        let max_penalty = params
            .max_static_analysis_penalty_percent
            .map(|percent| percent.clamp(0.0, 100.0) / 100.0 * max_points);
        Self {
            catalog,
            enabled: params.static_analysis_enabled,
            max_penalty,
        }
    }

    /// Computes the static-analysis deduction for already filtered feedback.
    ///
    /// # Arguments
    /// * `feedbacks` - Feedback whose static-analysis entries carry a resolved
    ///   category name; other kinds are ignored.
    ///
    /// # Returns
    /// A [`PenaltyBreakdown`] with the issue count of every category seen and
    /// the points charged to it. All zero when static analysis is disabled.
    ///
    /// # Behavior
    /// - A category deducts `issues × penalty`, limited by its own max penalty.
    /// - Only active categories are charged; feedback-only ones count issues.
    /// - The exercise cap is consumed in category-name order; the total never
    ///   exceeds it.
    pub fn compute_penalty(&self, feedbacks: &[Feedback]) -> PenaltyBreakdown {
        let mut breakdown = PenaltyBreakdown::default();
        if !self.enabled {
            return breakdown;
        }

        for feedback in feedbacks.iter().filter(|f| f.is_static_analysis()) {
            if let Some(name) = feedback.static_analysis_category_name.as_deref() {
                breakdown
                    .per_category
                    .entry(name.to_string())
                    .or_default()
                    .issue_count += 1;
            }
        }

        let mut remaining = self.max_penalty.unwrap_or(f64::INFINITY);
        for (name, entry) in breakdown.per_category.iter_mut() {
            let Some(category) = self.catalog.get(name) else {
                continue;
            };
            if !category.is_penalised() {
                continue;
            }
            let penalty = category.penalty_for(entry.issue_count).min(remaining);
            entry.penalty = penalty;
            remaining -= penalty;
            breakdown.total += penalty;
        }
        breakdown
    }
}
