//! # Feedback Visibility Filter
//!
//! First stage of grading. Decides which raw feedback entries take part in
//! scoring for a given participation at a given point in time, and adds a
//! negative feedback for every visible test case that did not report.
//!
//! Test case feedback is dropped when its test case is unknown, inactive,
//! hidden from the participation until the build-and-test date, or lacks a
//! pass/fail verdict. Static-analysis feedback is dropped when static analysis
//! is disabled, the payload cannot be read, or its category is unknown or
//! inactive. Manual feedback always passes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::static_analysis::{CategoryCatalog, CategoryState, StaticAnalysisPayload};
use crate::types::{ExerciseGradingParameters, Feedback, FeedbackKind, ParticipationKind, TestCase};

/// Output of [`FeedbackVisibilityFilter::filter`].
#[derive(Debug, Clone)]
pub struct VisibleFeedback<'a> {
    /// Active test cases the participation may see, in configuration order.
    pub test_cases: Vec<&'a TestCase>,
    /// Kept feedback in input order, followed by synthesized entries.
    pub feedbacks: Vec<Feedback>,
    /// Test cases reported more than once, in order of first appearance.
    pub duplicate_test_names: Vec<String>,
}

impl VisibleFeedback<'_> {
    pub fn static_analysis_issue_count(&self) -> usize {
        self.feedbacks.iter().filter(|f| f.is_static_analysis()).count()
    }

    /// True if `test_case` has a passing, non-synthesized feedback.
    pub fn passed(&self, test_case: &TestCase) -> bool {
        self.feedbacks
            .iter()
            .any(|f| !f.synthesized && f.refers_to(&test_case.name) && f.is_passed())
    }

    pub fn passed_count(&self) -> usize {
        self.test_cases.iter().filter(|tc| self.passed(tc)).count()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FeedbackVisibilityFilter<'a> {
    test_cases: &'a [TestCase],
    catalog: &'a CategoryCatalog,
    params: &'a ExerciseGradingParameters,
}

impl<'a> FeedbackVisibilityFilter<'a> {
    pub fn new(
        test_cases: &'a [TestCase],
        catalog: &'a CategoryCatalog,
        params: &'a ExerciseGradingParameters,
    ) -> Self {
        Self {
            test_cases,
            catalog,
            params,
        }
    }

    /// Filters `feedbacks` for `participation` as of `now`.
    ///
    /// # Arguments
    /// * `feedbacks` - Raw feedback of one result, in report order.
    /// * `participation` - Decides whether hidden tests are visible before the
    ///   build-and-test date.
    /// * `now` - Evaluation time compared against that date.
    ///
    /// # Returns
    /// The visible test cases, the kept feedback and the names of test cases
    /// reported more than once.
    ///
    /// # Behavior
    /// - Test feedback without a name or verdict, or for an unknown, inactive or
    ///   hidden test case, is dropped. Kept test feedback carries the canonical name.
    /// - Static-analysis feedback is kept only when static analysis is enabled
    ///   and its category resolves and is not inactive.
    /// - Manual feedback is always kept.
    /// - Every visible test case without feedback gets a synthesized failed entry.
    pub fn filter(
        &self,
        feedbacks: &[Feedback],
        participation: ParticipationKind,
        now: DateTime<Utc>,
    ) -> VisibleFeedback<'a> {
        let visible: Vec<&'a TestCase> = self
            .test_cases
            .iter()
            .filter(|tc| tc.is_visible_for(participation, self.params, now))
            .collect();

        let mut kept = Vec::with_capacity(feedbacks.len());
        let mut reports: HashMap<&str, usize> = HashMap::new();
        let mut duplicate_test_names = Vec::new();

        for feedback in feedbacks {
            match feedback.kind {
                FeedbackKind::TestCase => {
                    let Some(test_case) = self.visible_test_case(feedback, &visible) else {
                        continue;
                    };
                    let count = reports.entry(test_case.name.as_str()).or_insert(0);
                    *count += 1;
                    if *count == 2 {
                        duplicate_test_names.push(test_case.name.clone());
                    }
                    let mut feedback = feedback.clone();
                    feedback.test_case_name = Some(test_case.name.clone());
                    kept.push(feedback);
                }
                FeedbackKind::StaticAnalysis => {
                    if let Some(feedback) = self.resolve_static_analysis(feedback) {
                        kept.push(feedback);
                    }
                }
                FeedbackKind::Manual | FeedbackKind::ManualUnreferenced => {
                    kept.push(feedback.clone());
                }
            }
        }

        for test_case in &visible {
            if !reports.contains_key(test_case.name.as_str()) {
                kept.push(Feedback::not_executed(&test_case.name));
            }
        }

        VisibleFeedback {
            test_cases: visible,
            feedbacks: kept,
            duplicate_test_names,
        }
    }

    fn visible_test_case(&self, feedback: &Feedback, visible: &[&'a TestCase]) -> Option<&'a TestCase> {
        let Some(name) = feedback.test_case_name.as_deref() else {
            debug!("Dropping test case feedback without a test name");
            return None;
        };
        if feedback.positive.is_none() {
            debug!(test = name, "Dropping test case feedback without a verdict");
            return None;
        }
        let found = visible.iter().copied().find(|tc| tc.matches(name));
        if found.is_none() {
            debug!(
                test = name,
                "Dropping feedback for an unknown, inactive or hidden test case"
            );
        }
        found
    }

    fn resolve_static_analysis(&self, feedback: &Feedback) -> Option<Feedback> {
        if !self.params.static_analysis_enabled {
            debug!("Dropping static analysis feedback, static analysis is disabled");
            return None;
        }
        let Some(tool) = feedback.reference.as_deref() else {
            debug!("Dropping static analysis feedback without a tool reference");
            return None;
        };
        let payload = StaticAnalysisPayload::parse(feedback.static_analysis_rule.as_deref());
        let Some(tool_category) = payload.tool_category() else {
            debug!(tool, "Dropping unparseable static analysis feedback");
            return None;
        };
        let Some(category) = self.catalog.resolve(tool, tool_category) else {
            debug!(tool, tool_category, "Dropping static analysis feedback of an unknown category");
            return None;
        };
        if category.state == CategoryState::Inactive {
            debug!(category = %category.name, "Dropping static analysis feedback of an inactive category");
            return None;
        }

        let mut feedback = feedback.clone();
        feedback.static_analysis_category_name = Some(category.name.clone());
        Some(feedback)
    }
}
