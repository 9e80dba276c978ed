//! # Grading Statistics
//!
//! Summarises the latest automatic result of every student participation of an
//! exercise:
//! how many passed or failed each active test case, and how many results
//! contained exactly `N` issues of each static-analysis category.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::assembler::GradingContext;
use crate::error::GraderError;
use crate::traits::ResultStore;
use crate::types::{AssessmentType, StoredResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseStats {
    pub num_passed: usize,
    pub num_failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingStatistics {
    pub num_participations: usize,
    pub test_case_stats: BTreeMap<String, TestCaseStats>,
    /// Category name to issue count to number of results with that count.
    pub category_issues_map: BTreeMap<String, BTreeMap<usize, usize>>,
}

pub struct GradingStatisticsAggregator;

impl GradingStatisticsAggregator {
    /// Aggregates `results`, keeping only the latest automatic result of each
    /// student participation of `exercise_id`.
    ///
    /// # Arguments
    /// * `exercise_id` - Exercise whose results are counted; others are skipped.
    /// * `results` - Stored results, in any order.
    /// * `ctx` - Supplies the active test cases and the category catalog.
    ///
    /// # Returns
    /// A [`GradingStatistics`] with an entry for every active test case and
    /// every catalog category, even when no result qualifies.
    ///
    /// # Behavior
    /// - Template, solution and semi-automatic results are ignored.
    /// - A test case without non-synthesized passing feedback counts as failed.
    pub fn aggregate(
        exercise_id: i64,
        results: &[StoredResult],
        ctx: &GradingContext,
    ) -> GradingStatistics {
        let latest = latest_per_participation(exercise_id, results);

        let mut stats = GradingStatistics {
            num_participations: latest.len(),
            ..GradingStatistics::default()
        };

        for test_case in ctx.test_cases.iter().filter(|tc| tc.active) {
            let num_passed = latest
                .iter()
                .filter(|r| {
                    r.result
                        .feedbacks
                        .iter()
                        .any(|f| !f.synthesized && f.refers_to(&test_case.name) && f.is_passed())
                })
                .count();
            stats.test_case_stats.insert(
                test_case.name.clone(),
                TestCaseStats {
                    num_passed,
                    num_failed: latest.len() - num_passed,
                },
            );
        }

        for category in ctx.catalog.categories() {
            let histogram = stats
                .category_issues_map
                .entry(category.name.clone())
                .or_default();
            for result in &latest {
                let issues = result
                    .result
                    .feedbacks
                    .iter()
                    .filter(|f| {
                        f.is_static_analysis()
                            && f.static_analysis_category_name.as_deref() == Some(category.name.as_str())
                    })
                    .count();
                *histogram.entry(issues).or_insert(0) += 1;
            }
        }

        debug!(
            exercise_id,
            participations = stats.num_participations,
            "Aggregated grading statistics"
        );
        stats
    }

    /// Loads the exercise's results from `store` and aggregates them.
    pub async fn aggregate_from_store(
        store: &dyn ResultStore,
        exercise_id: i64,
        ctx: &GradingContext,
    ) -> Result<GradingStatistics, GraderError> {
        let results = store.find_by_exercise(exercise_id).await?;
        Ok(Self::aggregate(exercise_id, &results, ctx))
    }
}

/// The automatic result with the greatest `(completion_date, id)` per student
/// participation. Semi-automatic results carry tutor feedback and are skipped.
fn latest_per_participation(exercise_id: i64, results: &[StoredResult]) -> Vec<&StoredResult> {
    let mut latest: HashMap<i64, &StoredResult> = HashMap::new();
    for result in results.iter().filter(|r| {
        r.exercise_id == exercise_id
            && r.participation.is_student()
            && r.result.assessment_type == AssessmentType::Automatic
    }) {
        latest
            .entry(result.participation_id)
            .and_modify(|current| {
                if (result.completion_date, result.id) > (current.completion_date, current.id) {
                    *current = result;
                }
            })
            .or_insert(result);
    }
    let mut latest: Vec<&StoredResult> = latest.into_values().collect();
    latest.sort_by_key(|r| r.participation_id);
    latest
}
