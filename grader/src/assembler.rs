//! # Result Assembler
//!
//! Orchestrates one grading run: filters the raw feedback, scores the visible
//! test cases, deducts the static-analysis penalty and produces the final
//! [`GradingResult`].
//!
//! An assembly ends in one of three states:
//!
//! - **Build failed**: the build is flagged as failed, or an automatic
//!   submission has no test feedback at all while the exercise has active test
//!   cases. Score 0, `"Build Failed"`, no test counters.
//! - **Duplicated tests**: a test case reported more than once. Score 0,
//!   `"Error: Found duplicated tests!"` and one notice per duplicated test.
//! - **Normal**: the score is the earned points relative to the exercise's max
//!   points.
//!
//! Exercise bonus points raise the ceiling of the earned points to
//! `max_points + exercise_bonus_points`, allowing scores up to 200%.
//! Assembly never fails; configuration that makes no sense degrades to a
//! well-defined result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use util::grading_config::GradingConfig;

use crate::penalty::{PenaltyBreakdown, StaticAnalysisPenaltyEngine};
use crate::scorer::{TestCasePoints, WeightedScoreCalculator};
use crate::static_analysis::CategoryCatalog;
use crate::types::{
    AssessmentType, ExerciseGradingParameters, Feedback, GradingResult, ParticipationKind,
    TestCase,
};
use crate::visibility::{FeedbackVisibilityFilter, VisibleFeedback};

pub const BUILD_FAILED_RESULT: &str = "Build Failed";
pub const DUPLICATE_TESTS_RESULT: &str = "Error: Found duplicated tests!";

/// The grading configuration of one exercise.
#[derive(Debug, Clone)]
pub struct GradingContext {
    pub params: ExerciseGradingParameters,
    pub test_cases: Vec<TestCase>,
    pub catalog: CategoryCatalog,
}

impl GradingContext {
    pub fn new(params: ExerciseGradingParameters, test_cases: Vec<TestCase>) -> Self {
        Self {
            params,
            test_cases,
            catalog: CategoryCatalog::default(),
        }
    }

    pub fn with_catalog(mut self, catalog: impl Into<CategoryCatalog>) -> Self {
        self.catalog = catalog.into();
        self
    }

    fn has_active_test_cases(&self) -> bool {
        self.test_cases.iter().any(|tc| tc.active)
    }
}

/// A single submission's raw feedback and how it should be graded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub feedbacks: Vec<Feedback>,
    pub participation: ParticipationKind,
    #[serde(default)]
    pub build_failed: bool,
    #[serde(default)]
    pub assessment_type: AssessmentType,
}

impl Submission {
    pub fn new(participation: ParticipationKind, feedbacks: Vec<Feedback>) -> Self {
        Self {
            feedbacks,
            participation,
            build_failed: false,
            assessment_type: AssessmentType::Automatic,
        }
    }

    pub fn student(feedbacks: Vec<Feedback>) -> Self {
        Self::new(ParticipationKind::Student, feedbacks)
    }

    pub fn build_failed(mut self) -> Self {
        self.build_failed = true;
        self
    }

    pub fn semi_automatic(mut self) -> Self {
        self.assessment_type = AssessmentType::SemiAutomatic;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResultAssembler {
    settings: GradingConfig,
}

impl ResultAssembler {
    /// Settings are sanitized first, so unusable values fall back to working ones.
    pub fn new(settings: GradingConfig) -> Self {
        Self {
            settings: settings.sanitize(),
        }
    }

    pub fn settings(&self) -> &GradingConfig {
        &self.settings
    }

    /// Grades `submission` as of now.
    pub fn assemble(&self, ctx: &GradingContext, submission: &Submission) -> GradingResult {
        self.assemble_at(ctx, submission, Utc::now())
    }

    /// Grades `submission` as of `now`.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The exercise's parameters, test cases and category catalog.
    /// * `submission` - Raw feedback, participation kind, build flag and assessment type.
    /// * `now` - Evaluation time. Decides whether tests hidden until the
    ///   build-and-test date are visible to students.
    ///
    /// # Returns
    ///
    /// The graded result. Assembly never fails.
    ///
    /// # Behavior
    ///
    /// - A flagged build failure yields score 0 and `"Build Failed"`. So does an
    ///   automatic submission without any test feedback while the exercise has
    ///   active test cases. Semi-automatic submissions are scored from their
    ///   credits instead, since a tutor may grade them without test results.
    /// - Duplicated test reports yield score 0 and one notice per duplicated test.
    /// - Otherwise the score is the earned points relative to the exercise's max
    ///   points, rounded half-up and clamped to the cap percent.
    pub fn assemble_at(
        &self,
        ctx: &GradingContext,
        submission: &Submission,
        now: DateTime<Utc>,
    ) -> GradingResult {
        let filter = FeedbackVisibilityFilter::new(&ctx.test_cases, &ctx.catalog, &ctx.params);
        let visible = filter.filter(&submission.feedbacks, submission.participation, now);

        let reported_tests = submission.feedbacks.iter().any(Feedback::is_test_case);
        let missing_tests = !reported_tests
            && ctx.has_active_test_cases()
            && submission.assessment_type == AssessmentType::Automatic;
        if submission.build_failed || missing_tests {
            debug!(
                participation = ?submission.participation,
                flagged = submission.build_failed,
                "Grading submission as build failure"
            );
            return build_failed_result(submission, &visible);
        }

        if !visible.duplicate_test_names.is_empty() {
            warn!(
                tests = ?visible.duplicate_test_names,
                "Submission reported duplicated test cases"
            );
            return duplicate_tests_result(submission, visible);
        }

        let max_points = ctx
            .params
            .effective_max_points(self.settings.zero_point_placeholder);
        let point_cap = ctx.params.point_cap(self.settings.zero_point_placeholder);

        let test_points = WeightedScoreCalculator::new(max_points).compute_test_case_points(&visible);
        let penalty = StaticAnalysisPenaltyEngine::new(&ctx.catalog, &ctx.params, max_points)
            .compute_penalty(&visible.feedbacks);

        let passed = visible.passed_count();
        let total = visible.test_cases.len();
        let issue_count = visible.static_analysis_issue_count();
        let has_feedback = has_feedback(&visible.feedbacks);
        let feedbacks = assign_credits(visible.feedbacks, &test_points, &penalty);

        let mut result_string = format!("{passed} of {total} passed");
        if ctx.params.static_analysis_enabled && issue_count > 0 {
            let noun = if issue_count == 1 { "issue" } else { "issues" };
            result_string.push_str(&format!(", {issue_count} {noun}"));
        }

        let points = match submission.assessment_type {
            AssessmentType::Automatic => {
                (test_points.points.min(point_cap) - penalty.total).max(0.0)
            }
            AssessmentType::SemiAutomatic => {
                let points = semi_automatic_points(&feedbacks, point_cap);
                result_string.push_str(&format!(
                    ", {} of {} points",
                    format_points(points),
                    format_points(ctx.params.max_points)
                ));
                points
            }
        };

        GradingResult {
            score: self.score_for(points, max_points, ctx.params.cap_percent()),
            result_string,
            has_feedback,
            successful: Some(total > 0 && passed == total),
            assessment_type: submission.assessment_type,
            test_case_count: total,
            passed_test_case_count: passed,
            code_issue_count: issue_count,
            feedbacks,
        }
    }

    /// Percentage of `max_points`, rounded half-up and clamped to `[0, cap_percent]`.
    fn score_for(&self, points: f64, max_points: f64, cap_percent: u32) -> u32 {
        if max_points <= 0.0 || !points.is_finite() {
            return 0;
        }
        let factor = 10f64.powi(self.settings.score_precision as i32);
        let percent = (points / max_points * 100.0 * factor).round() / factor;
        percent.round().clamp(0.0, cap_percent as f64) as u32
    }
}

fn build_failed_result(submission: &Submission, visible: &VisibleFeedback<'_>) -> GradingResult {
    let feedbacks = visible
        .feedbacks
        .iter()
        .filter(|f| !f.is_test_case())
        .cloned()
        .collect();
    GradingResult {
        score: 0,
        result_string: BUILD_FAILED_RESULT.to_string(),
        has_feedback: false,
        successful: None,
        assessment_type: submission.assessment_type,
        test_case_count: 0,
        passed_test_case_count: 0,
        code_issue_count: 0,
        feedbacks,
    }
}

fn duplicate_tests_result(submission: &Submission, visible: VisibleFeedback<'_>) -> GradingResult {
    let test_case_count = visible.test_cases.len();
    let code_issue_count = visible.static_analysis_issue_count();
    let mut feedbacks = visible.feedbacks;
    feedbacks.extend(
        visible
            .duplicate_test_names
            .iter()
            .map(|name| Feedback::duplicate_notice(name)),
    );
    for feedback in &mut feedbacks {
        feedback.credits.get_or_insert(0.0);
    }
    GradingResult {
        score: 0,
        result_string: DUPLICATE_TESTS_RESULT.to_string(),
        has_feedback: true,
        successful: Some(false),
        assessment_type: submission.assessment_type,
        test_case_count,
        passed_test_case_count: 0,
        code_issue_count,
        feedbacks,
    }
}

/// Real negative test feedback, any static-analysis issue, or manual
/// feedback with non-zero credits.
fn has_feedback(feedbacks: &[Feedback]) -> bool {
    feedbacks.iter().any(|f| {
        if f.is_test_case() {
            !f.synthesized && f.positive == Some(false)
        } else if f.is_static_analysis() {
            true
        } else {
            f.credits.is_some_and(|c| c != 0.0)
        }
    })
}

fn assign_credits(
    mut feedbacks: Vec<Feedback>,
    test_points: &TestCasePoints,
    penalty: &PenaltyBreakdown,
) -> Vec<Feedback> {
    for feedback in &mut feedbacks {
        if feedback.is_test_case() {
            let credit = match feedback.test_case_name.as_deref() {
                Some(name) if feedback.is_passed() && !feedback.synthesized => {
                    test_points.credits.get(name).copied().unwrap_or(0.0)
                }
                _ => 0.0,
            };
            feedback.credits = Some(credit);
        } else if feedback.is_static_analysis() {
            let credit = feedback
                .static_analysis_category_name
                .as_deref()
                .map_or(0.0, |name| penalty.credit_per_issue(name));
            feedback.credits = Some(credit);
        } else {
            feedback.credits.get_or_insert(0.0);
        }
    }
    feedbacks
}

/// Points of a semi-automatic result: automatic test credits up to the cap,
/// plus static-analysis and manual credits, clamped to `[0, point_cap]`.
fn semi_automatic_points(feedbacks: &[Feedback], point_cap: f64) -> f64 {
    let credits = |pred: fn(&Feedback) -> bool| -> f64 {
        feedbacks
            .iter()
            .filter(|f| pred(f))
            .filter_map(|f| f.credits)
            .sum()
    };
    let tests = credits(Feedback::is_test_case).min(point_cap);
    let other = credits(|f| !f.is_test_case());
    (tests + other).clamp(0.0, point_cap.max(0.0))
}

/// Formats points with at most one decimal, dropping a trailing `.0`.
fn format_points(points: f64) -> String {
    let rounded = (points * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::static_analysis::StaticAnalysisCategory;

    fn context() -> GradingContext {
        GradingContext::new(
            ExerciseGradingParameters::new(42.0),
            vec![
                TestCase::new("test1", 5.0).with_bonus_points(7.0),
                TestCase::new("test2", 2.0).with_bonus_multiplier(2.0),
                TestCase::new("test3", 3.0).with_bonus_points(10.5),
            ],
        )
    }

    fn assemble(ctx: &GradingContext, feedbacks: Vec<Feedback>) -> GradingResult {
        ResultAssembler::default().assemble(ctx, &Submission::student(feedbacks))
    }

    #[test]
    fn test_assemble_normal_result() {
        let result = assemble(&context(), vec![Feedback::test_case("test3", true)]);
        assert_eq!(result.score, 55);
        assert_eq!(result.result_string, "1 of 3 passed");
        assert_eq!(result.successful, Some(false));
        assert!(!result.has_feedback);
        assert_eq!(result.test_case_count, 3);
        assert_eq!(result.passed_test_case_count, 1);
        assert_eq!(result.feedbacks.len(), 3);
    }

    #[test]
    fn test_assemble_all_passed_is_capped() {
        let result = assemble(
            &context(),
            vec![
                Feedback::test_case("test1", true),
                Feedback::test_case("test2", true),
                Feedback::test_case("test3", true),
            ],
        );
        assert_eq!(result.score, 100);
        assert_eq!(result.successful, Some(true));
        assert_eq!(result.result_string, "3 of 3 passed");
    }

    /// Credits of passed tests equal the points they earned.
    #[test]
    fn test_assemble_assigns_test_credits() {
        let result = assemble(
            &context(),
            vec![Feedback::test_case("test3", true), Feedback::test_case("test1", false)],
        );
        let credits: Vec<f64> = result.feedbacks.iter().map(|f| f.credits.unwrap()).collect();
        assert!((credits[0] - 23.1).abs() < 1e-9);
        assert_eq!(credits[1], 0.0);
        assert_eq!(credits[2], 0.0);
        assert!(result.has_feedback);
    }

    #[test]
    fn test_assemble_build_failed() {
        let result = assemble(&context(), vec![Feedback::note("Build Failed")]);
        assert_eq!(result.score, 0);
        assert_eq!(result.result_string, BUILD_FAILED_RESULT);
        assert!(!result.has_feedback);
        assert_eq!(result.successful, None);
        assert_eq!(result.feedbacks.len(), 1);

        let flagged = ResultAssembler::default().assemble(
            &context(),
            &Submission::student(vec![Feedback::test_case("test1", true)]).build_failed(),
        );
        assert_eq!(flagged.result_string, BUILD_FAILED_RESULT);
        assert!(flagged.feedbacks.is_empty());
        assert_eq!(flagged.test_case_count, 0);
    }

    /// Build failures keep only feedback that survives filtering.
    #[test]
    fn test_build_failed_drops_unresolved_static_analysis() {
        let submission = Submission::student(vec![
            Feedback::test_case("test1", true),
            Feedback::static_analysis("SPOTBUGS", r#"{"category":"BAD_PRACTICE"}"#),
            Feedback::manual(1.0),
        ])
        .build_failed();
        let result = ResultAssembler::default().assemble(&context(), &submission);
        assert_eq!(result.result_string, BUILD_FAILED_RESULT);
        assert_eq!(result.feedbacks.len(), 1);
        assert!(result.feedbacks[0].is_manual());
        assert_eq!(result.test_case_count, 0);
        assert_eq!(result.passed_test_case_count, 0);
    }

    /// Out-of-range settings are sanitized instead of zeroing every score.
    #[test]
    fn test_new_sanitizes_settings() {
        let settings = GradingConfig {
            zero_point_placeholder: -5.0,
            score_precision: 400,
            re_evaluation_concurrency: 0,
        };
        let assembler = ResultAssembler::new(settings);
        assert_eq!(assembler.settings().score_precision, 10);
        assert_eq!(assembler.settings().re_evaluation_concurrency, 1);

        let result = assembler.assemble(&context(), &Submission::student(vec![Feedback::test_case("test3", true)]));
        assert_eq!(result.score, 55);
    }

    #[test]
    fn test_assemble_duplicate_tests() {
        let result = assemble(
            &context(),
            vec![
                Feedback::test_case("test1", true),
                Feedback::test_case("TEST1", true),
                Feedback::test_case("test2", true),
            ],
        );
        assert_eq!(result.score, 0);
        assert_eq!(result.result_string, DUPLICATE_TESTS_RESULT);
        assert!(result.has_feedback);
        assert_eq!(result.successful, Some(false));
        let notice = result.feedbacks.last().unwrap();
        assert_eq!(notice.text.as_deref(), Some("test1 - Duplicate Test Case!"));
    }

    /// Zero-credit manual feedback does not count as feedback.
    #[test]
    fn test_has_feedback_ignores_zero_credit_manual() {
        let all_passed = vec![
            Feedback::test_case("test1", true),
            Feedback::test_case("test2", true),
            Feedback::test_case("test3", true),
        ];
        let mut feedbacks = all_passed.clone();
        feedbacks.push(Feedback::manual(0.0));
        assert!(!assemble(&context(), feedbacks).has_feedback);

        let mut feedbacks = all_passed;
        feedbacks.push(Feedback::manual_unreferenced(1.5));
        assert!(assemble(&context(), feedbacks).has_feedback);
    }

    #[test]
    fn test_assemble_zero_point_exercise_uses_placeholder() {
        let ctx = GradingContext::new(
            ExerciseGradingParameters::new(0.0),
            vec![TestCase::new("test1", 1.0), TestCase::new("test2", 3.0)],
        );
        let result = assemble(&ctx, vec![Feedback::test_case("test2", true)]);
        assert_eq!(result.score, 75);
    }

    #[test]
    fn test_assemble_static_analysis_penalty() {
        let ctx = GradingContext {
            params: ExerciseGradingParameters::new(42.0).with_static_analysis(Some(20.0)),
            ..context()
        }
        .with_catalog(vec![
            StaticAnalysisCategory::new("Bad Practice", 3.0)
                .with_max_penalty(10.0)
                .with_mapping("SPOTBUGS", "BAD_PRACTICE"),
        ]);
        let result = assemble(
            &ctx,
            vec![
                Feedback::test_case("test1", true),
                Feedback::test_case("test2", true),
                Feedback::test_case("test3", true),
                Feedback::static_analysis("SPOTBUGS", r#"{"category":"BAD_PRACTICE"}"#),
                Feedback::static_analysis("SPOTBUGS", r#"{"category":"BAD_PRACTICE"}"#),
            ],
        );
        // 42 - 6 = 36 of 42
        assert_eq!(result.score, 86);
        assert_eq!(result.result_string, "3 of 3 passed, 2 issues");
        assert_eq!(result.code_issue_count, 2);
        let issue = result.feedbacks.iter().find(|f| f.is_static_analysis()).unwrap();
        assert_eq!(issue.credits, Some(-3.0));
    }

    #[test]
    fn test_assemble_semi_automatic() {
        let submission = Submission::student(vec![
            Feedback::test_case("test3", true),
            Feedback::manual(5.0),
            Feedback::manual_unreferenced(-2.0),
        ])
        .semi_automatic();
        let result = ResultAssembler::default().assemble(&context(), &submission);
        // 23.1 + 5 - 2 = 26.1 of 42
        assert_eq!(result.score, 62);
        assert_eq!(result.result_string, "1 of 3 passed, 26.1 of 42 points");
        assert_eq!(result.assessment_type, AssessmentType::SemiAutomatic);
    }

    #[test]
    fn test_format_points() {
        assert_eq!(format_points(42.0), "42");
        assert_eq!(format_points(26.14), "26.1");
        assert_eq!(format_points(8.96), "9");
    }
}
