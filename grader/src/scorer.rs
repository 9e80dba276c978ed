//! # Weighted Score Calculator
//!
//! Converts the pass/fail verdicts of visible test cases into points.
//!
//! A passed test contributes `weight × bonus_multiplier` to the weighted sum
//! and its `bonus_points` as flat points. The weighted sum is taken relative to
//! the total weight of all visible test cases, passed or not:
//!
//! ```text
//! points = weighted_pass_sum / total_weight × max_points + bonus_sum
//! ```
//!
//! When no visible test case carries weight, only the bonus points count.

use std::collections::BTreeMap;

use crate::types::TestCase;
use crate::visibility::VisibleFeedback;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TestCasePoints {
    pub points: f64,
    pub total_weight: f64,
    /// Points earned by each passed test case, keyed by test name.
    pub credits: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct WeightedScoreCalculator {
    max_points: f64,
}

impl WeightedScoreCalculator {
    /// `max_points` must already have the zero-point placeholder applied.
    pub fn new(max_points: f64) -> Self {
        Self { max_points }
    }

    /// Sums the points earned by the visible test cases.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::Utc;
    /// use grader::scorer::WeightedScoreCalculator;
    /// use grader::static_analysis::CategoryCatalog;
    /// use grader::types::{ExerciseGradingParameters, Feedback, ParticipationKind, TestCase};
    /// use grader::visibility::FeedbackVisibilityFilter;
    ///
    /// let tests = vec![TestCase::new("a", 3.0), TestCase::new("b", 1.0).with_bonus_points(2.0)];
    /// let params = ExerciseGradingParameters::new(20.0);
    /// let catalog = CategoryCatalog::default();
    /// let visible = FeedbackVisibilityFilter::new(&tests, &catalog, &params).filter(
    ///     &[Feedback::test_case("a", false), Feedback::test_case("b", true)],
    ///     ParticipationKind::Student,
    ///     Utc::now(),
    /// );
    ///
    /// // 1 / 4 × 20 + 2
    /// let points = WeightedScoreCalculator::new(20.0).compute_test_case_points(&visible);
    /// assert_eq!(points.points, 7.0);
    /// assert_eq!(points.total_weight, 4.0);
    /// ```
    pub fn compute_test_case_points(&self, visible: &VisibleFeedback<'_>) -> TestCasePoints {
        let total_weight: f64 = visible.test_cases.iter().map(|tc| tc.weight.max(0.0)).sum();

        let mut result = TestCasePoints {
            total_weight,
            ..TestCasePoints::default()
        };
        for test_case in visible.test_cases.iter().filter(|tc| visible.passed(tc)) {
            let credit = self.credit_for(test_case, total_weight);
            result.points += credit;
            result.credits.insert(test_case.name.clone(), credit);
        }
        result
    }

    fn credit_for(&self, test_case: &TestCase, total_weight: f64) -> f64 {
        let bonus = test_case.bonus_points.max(0.0);
        if total_weight > 0.0 {
            let weighted = test_case.weight.max(0.0) * test_case.bonus_multiplier.max(0.0);
            weighted / total_weight * self.max_points + bonus
        } else {
            bonus
        }
    }
}
