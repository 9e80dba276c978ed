//! # Types Module
//!
//! Core data structures shared by every stage of the grading pipeline:
//! exercise parameters, test case and static-analysis configuration, raw
//! feedback as delivered by the build system, and the assembled result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::GraderError;

/// Detail text attached to feedback synthesized for a test that never reported.
pub const NOT_EXECUTED_DETAIL: &str = "Test was not executed.";

/// Detail text attached to the extra feedback created for duplicated tests.
pub const DUPLICATE_TEST_DETAIL: &str =
    "This is a duplicate test case. Please review all your test cases and verify that your test cases have unique names!";

/// Which kind of participation a result belongs to.
///
/// Template and solution participations are instructor indicators and always
/// see every active test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipationKind {
    Template,
    Solution,
    Student,
}

impl ParticipationKind {
    pub fn is_student(self) -> bool {
        matches!(self, ParticipationKind::Student)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentType {
    #[default]
    Automatic,
    SemiAutomatic,
}

/// Per-exercise grading parameters, owned by the exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ExerciseGradingParameters {
    #[validate(range(min = 0.0, message = "max_points must not be negative"))]
    pub max_points: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "exercise_bonus_points must not be negative"))]
    pub exercise_bonus_points: f64,
    #[serde(default)]
    pub static_analysis_enabled: bool,
    /// Percent of `max_points` that static analysis may deduct; `None` is unbounded.
    #[serde(default)]
    #[validate(range(
        min = 0.0,
        max = 100.0,
        message = "max_static_analysis_penalty_percent must be within 0 and 100"
    ))]
    pub max_static_analysis_penalty_percent: Option<f64>,
    #[serde(default)]
    pub build_and_test_after_due_date: Option<DateTime<Utc>>,
}

impl ExerciseGradingParameters {
    pub fn new(max_points: f64) -> Self {
        Self {
            max_points,
            exercise_bonus_points: 0.0,
            static_analysis_enabled: false,
            max_static_analysis_penalty_percent: None,
            build_and_test_after_due_date: None,
        }
    }

    pub fn with_bonus_points(mut self, bonus_points: f64) -> Self {
        self.exercise_bonus_points = bonus_points;
        self
    }

    pub fn with_static_analysis(mut self, max_penalty_percent: Option<f64>) -> Self {
        self.static_analysis_enabled = true;
        self.max_static_analysis_penalty_percent = max_penalty_percent;
        self
    }

    pub fn with_build_and_test_date(mut self, date: DateTime<Utc>) -> Self {
        self.build_and_test_after_due_date = Some(date);
        self
    }

    /// `max_points`, or `placeholder` for zero-point exercises.
    pub fn effective_max_points(&self, placeholder: f64) -> f64 {
        if self.max_points > 0.0 {
            self.max_points
        } else {
            placeholder
        }
    }

    /// Highest number of points a result may reach before penalties.
    pub fn point_cap(&self, placeholder: f64) -> f64 {
        self.effective_max_points(placeholder) + self.exercise_bonus_points.max(0.0)
    }

    /// Upper bound of the final score in percent.
    pub fn cap_percent(&self) -> u32 {
        if self.exercise_bonus_points > 0.0 { 200 } else { 100 }
    }

    /// True once the build-and-test date exists and lies at or before `now`.
    pub fn after_due_date_tests_released(&self, now: DateTime<Utc>) -> bool {
        self.build_and_test_after_due_date
            .is_some_and(|date| now >= date)
    }

    pub fn check(&self) -> Result<(), GraderError> {
        self.validate()
            .map_err(|e| GraderError::InvalidConfig(common::format_validation_errors(&e)))
    }
}

/// A named automated check configured for an exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TestCase {
    #[validate(length(min = 1, message = "test case name must not be empty"))]
    pub name: String,
    #[validate(range(min = 0.0, message = "weight must not be negative"))]
    pub weight: f64,
    #[serde(default = "default_bonus_multiplier")]
    #[validate(range(min = 0.0, message = "bonus_multiplier must not be negative"))]
    pub bonus_multiplier: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "bonus_points must not be negative"))]
    pub bonus_points: f64,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub visible_after_due_date_only: bool,
}

fn default_bonus_multiplier() -> f64 {
    1.0
}

fn default_active() -> bool {
    true
}

impl TestCase {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            bonus_multiplier: default_bonus_multiplier(),
            bonus_points: 0.0,
            active: true,
            visible_after_due_date_only: false,
        }
    }

    pub fn with_bonus_multiplier(mut self, multiplier: f64) -> Self {
        self.bonus_multiplier = multiplier;
        self
    }

    pub fn with_bonus_points(mut self, points: f64) -> Self {
        self.bonus_points = points;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn after_due_date(mut self) -> Self {
        self.visible_after_due_date_only = true;
        self
    }

    pub fn matches(&self, test_name: &str) -> bool {
        self.name.eq_ignore_ascii_case(test_name)
    }

    /// Whether results of `participation` may see this test at `now`.
    pub fn is_visible_for(
        &self,
        participation: ParticipationKind,
        params: &ExerciseGradingParameters,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.active {
            return false;
        }
        if self.visible_after_due_date_only && participation.is_student() {
            return params.after_due_date_tests_released(now);
        }
        true
    }

    pub fn check(&self) -> Result<(), GraderError> {
        self.validate()
            .map_err(|e| GraderError::InvalidConfig(common::format_validation_errors(&e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackKind {
    TestCase,
    StaticAnalysis,
    Manual,
    ManualUnreferenced,
}

/// A single feedback entry of a result.
///
/// Test case feedback sets `test_case_name`; static-analysis feedback sets
/// `reference` (the reporting tool) and `static_analysis_rule` (the raw issue
/// payload). `static_analysis_category_name` is filled in during grading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub kind: FeedbackKind,
    #[serde(default)]
    pub test_case_name: Option<String>,
    #[serde(default)]
    pub positive: Option<bool>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub static_analysis_rule: Option<String>,
    #[serde(default)]
    pub static_analysis_category_name: Option<String>,
    #[serde(default)]
    pub credits: Option<f64>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub detail_text: Option<String>,
    /// Set on entries the engine fabricated for tests that did not report.
    #[serde(default)]
    pub synthesized: bool,
}

impl Feedback {
    fn empty(kind: FeedbackKind) -> Self {
        Self {
            kind,
            test_case_name: None,
            positive: None,
            reference: None,
            static_analysis_rule: None,
            static_analysis_category_name: None,
            credits: None,
            text: None,
            detail_text: None,
            synthesized: false,
        }
    }

    pub fn test_case(name: impl Into<String>, positive: bool) -> Self {
        let mut feedback = Self::empty(FeedbackKind::TestCase);
        feedback.test_case_name = Some(name.into());
        feedback.positive = Some(positive);
        feedback
    }

    pub fn static_analysis(tool: impl Into<String>, payload: impl Into<String>) -> Self {
        let mut feedback = Self::empty(FeedbackKind::StaticAnalysis);
        feedback.reference = Some(tool.into());
        feedback.static_analysis_rule = Some(payload.into());
        feedback.positive = Some(false);
        feedback
    }

    pub fn manual(credits: f64) -> Self {
        let mut feedback = Self::empty(FeedbackKind::Manual);
        feedback.credits = Some(credits);
        feedback
    }

    pub fn manual_unreferenced(credits: f64) -> Self {
        let mut feedback = Self::empty(FeedbackKind::ManualUnreferenced);
        feedback.credits = Some(credits);
        feedback
    }

    /// Free-standing text feedback without credits, e.g. a build log notice.
    pub fn note(text: impl Into<String>) -> Self {
        let mut feedback = Self::empty(FeedbackKind::Manual);
        feedback.text = Some(text.into());
        feedback
    }

    pub(crate) fn not_executed(test_name: &str) -> Self {
        let mut feedback = Self::test_case(test_name, false);
        feedback.detail_text = Some(NOT_EXECUTED_DETAIL.to_string());
        feedback.synthesized = true;
        feedback
    }

    pub(crate) fn duplicate_notice(test_name: &str) -> Self {
        let mut feedback = Self::empty(FeedbackKind::TestCase);
        feedback.text = Some(format!("{test_name} - Duplicate Test Case!"));
        feedback.detail_text = Some(DUPLICATE_TEST_DETAIL.to_string());
        feedback.positive = Some(false);
        feedback.synthesized = true;
        feedback
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail_text = Some(detail.into());
        self
    }

    pub fn is_test_case(&self) -> bool {
        self.kind == FeedbackKind::TestCase
    }

    pub fn is_static_analysis(&self) -> bool {
        self.kind == FeedbackKind::StaticAnalysis
    }

    pub fn is_manual(&self) -> bool {
        matches!(
            self.kind,
            FeedbackKind::Manual | FeedbackKind::ManualUnreferenced
        )
    }

    pub fn is_passed(&self) -> bool {
        self.positive == Some(true)
    }

    /// True for test case feedback reported for `test_name`.
    pub fn refers_to(&self, test_name: &str) -> bool {
        self.is_test_case()
            && self
                .test_case_name
                .as_deref()
                .is_some_and(|name| name.eq_ignore_ascii_case(test_name))
    }
}

/// The graded outcome of one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingResult {
    /// Rounded percentage, within `0..=cap_percent`.
    pub score: u32,
    pub result_string: String,
    pub has_feedback: bool,
    /// `None` for build failures.
    pub successful: Option<bool>,
    pub assessment_type: AssessmentType,
    pub test_case_count: usize,
    pub passed_test_case_count: usize,
    pub code_issue_count: usize,
    pub feedbacks: Vec<Feedback>,
}

/// A persisted result together with everything needed to grade it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResult {
    pub id: i64,
    pub exercise_id: i64,
    pub participation_id: i64,
    pub participation: ParticipationKind,
    #[serde(default)]
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub build_failed: bool,
    /// Feedback exactly as the build system delivered it, before filtering.
    pub original_feedbacks: Vec<Feedback>,
    pub result: GradingResult,
}
