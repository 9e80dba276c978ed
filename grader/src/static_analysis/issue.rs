//! # Static Analysis Issue Payloads
//!
//! Static-analysis tools report each issue as a small JSON object stored on the
//! feedback entry. This module turns that payload into a typed value. A payload
//! that cannot be read yields [`StaticAnalysisPayload::Unparseable`] instead of an
//! error, so filtering can drop it like any other unusable feedback.

use serde::{Deserialize, Serialize};

/// A single issue reported by a static-analysis tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticAnalysisIssue {
    /// The tool's own category for the issue, e.g. `BAD_PRACTICE`.
    pub category: String,
    #[serde(default)]
    pub rule: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub start_line: Option<u32>,
    #[serde(default)]
    pub end_line: Option<u32>,
    #[serde(default)]
    pub priority: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticAnalysisPayload {
    Issue(StaticAnalysisIssue),
    Unparseable,
}

impl StaticAnalysisPayload {
    /// Parses a raw issue payload.
    ///
    /// # Example
    ///
    /// ```
    /// use grader::static_analysis::StaticAnalysisPayload;
    ///
    /// let payload = StaticAnalysisPayload::parse(Some(r#"{"category":"BAD_PRACTICE"}"#));
    /// assert_eq!(payload.tool_category(), Some("BAD_PRACTICE"));
    ///
    /// assert_eq!(StaticAnalysisPayload::parse(Some("not json")), StaticAnalysisPayload::Unparseable);
    /// assert_eq!(StaticAnalysisPayload::parse(None), StaticAnalysisPayload::Unparseable);
    /// ```
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return StaticAnalysisPayload::Unparseable;
        };
        match serde_json::from_str::<StaticAnalysisIssue>(raw) {
            Ok(issue) if !issue.category.trim().is_empty() => StaticAnalysisPayload::Issue(issue),
            _ => StaticAnalysisPayload::Unparseable,
        }
    }

    pub fn tool_category(&self) -> Option<&str> {
        match self {
            StaticAnalysisPayload::Issue(issue) => Some(issue.category.as_str()),
            StaticAnalysisPayload::Unparseable => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reads every optional field of a complete payload.
    #[test]
    fn test_parse_full_payload() {
        let raw = r#"{
            "category": "STYLE",
            "rule": "LineLength",
            "message": "Line is longer than 100 characters",
            "filePath": "src/Main.java",
            "startLine": 12,
            "endLine": 12,
            "priority": "low"
        }"#;
        let StaticAnalysisPayload::Issue(issue) = StaticAnalysisPayload::parse(Some(raw)) else {
            panic!("expected an issue");
        };
        assert_eq!(issue.category, "STYLE");
        assert_eq!(issue.rule.as_deref(), Some("LineLength"));
        assert_eq!(issue.file_path.as_deref(), Some("src/Main.java"));
        assert_eq!(issue.start_line, Some(12));
        assert_eq!(issue.priority.as_deref(), Some("low"));
    }

    #[test]
    fn test_parse_missing_category_is_unparseable() {
        assert_eq!(
            StaticAnalysisPayload::parse(Some(r#"{"rule":"LineLength"}"#)),
            StaticAnalysisPayload::Unparseable
        );
        assert_eq!(
            StaticAnalysisPayload::parse(Some(r#"{"category":"  "}"#)),
            StaticAnalysisPayload::Unparseable
        );
    }

    #[test]
    fn test_parse_wrong_shape_is_unparseable() {
        assert_eq!(
            StaticAnalysisPayload::parse(Some(r#"["BAD_PRACTICE"]"#)),
            StaticAnalysisPayload::Unparseable
        );
        assert_eq!(StaticAnalysisPayload::parse(Some("")), StaticAnalysisPayload::Unparseable);
        assert_eq!(StaticAnalysisPayload::Unparseable.tool_category(), None);
    }
}
